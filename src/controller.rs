//! The presentation controller: navigation, autoplay and music bundled into
//! one owned structure, driven by [`Command`]s and per-frame [`tick`]s.
//!
//! [`tick`]: PresentationController::tick

use std::time::{Duration, Instant};

use crate::autoplay::AutoplayScheduler;
use crate::errors::MediaError;
use crate::model::Slide;
use crate::music::{MediaResource, MusicState, MusicToggle};
use crate::navigation::{NavigationState, Thumbnail};
use log::{debug, trace, warn};

/// A user action the controller understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    GoTo(usize),
    ToggleAutoplay,
    ToggleMusic,
    HoverEnter,
    HoverLeave,
}

/// Keyboard binding for `key`, if any.
pub fn command_for_key(key: egui::Key) -> Option<Command> {
    match key {
        egui::Key::ArrowRight => Some(Command::Next),
        egui::Key::ArrowLeft => Some(Command::Previous),
        egui::Key::Space => Some(Command::ToggleAutoplay),
        egui::Key::M => Some(Command::ToggleMusic),
        _ => None,
    }
}

/// Hover command for a change in pointer-over-slides state between two frames.
pub fn hover_command(was_hovered: bool, is_hovered: bool) -> Option<Command> {
    match (was_hovered, is_hovered) {
        (false, true) => Some(Command::HoverEnter),
        (true, false) => Some(Command::HoverLeave),
        _ => None,
    }
}

pub struct PresentationController<R: MediaResource> {
    navigation: NavigationState,
    autoplay: AutoplayScheduler,
    music: MusicToggle<R>,
}

impl<R: MediaResource> PresentationController<R> {
    /// Builds the controller for `slides`. Returns `None` when there are no slides.
    pub fn new(slides: &[Slide], autoplay_interval: Duration, music: R) -> Option<Self> {
        let navigation = NavigationState::new(slides)?;
        debug!("PresentationController ready with {} slide(s).", navigation.len());
        Some(Self {
            navigation,
            autoplay: AutoplayScheduler::new(autoplay_interval),
            music: MusicToggle::new(music),
        })
    }

    pub fn current(&self) -> usize {
        self.navigation.current()
    }

    pub fn slide_count(&self) -> usize {
        self.navigation.len()
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        self.navigation.thumbnails()
    }

    pub fn is_slide_active(&self, index: usize) -> bool {
        self.navigation.is_slide_active(index)
    }

    pub fn autoplay(&self) -> &AutoplayScheduler {
        &self.autoplay
    }

    pub fn music(&self) -> &MusicToggle<R> {
        &self.music
    }

    pub fn handle(&mut self, command: Command, now: Instant) {
        trace!("Handling command {:?}", command);
        match command {
            Command::Next => {
                self.navigation.next();
                self.autoplay.reset(now);
            }
            Command::Previous => {
                self.navigation.previous();
                self.autoplay.reset(now);
            }
            Command::GoTo(index) => {
                self.navigation.go_to(index as i64);
                self.autoplay.reset(now);
            }
            Command::ToggleAutoplay => self.autoplay.toggle(now),
            Command::ToggleMusic => self.music.toggle(),
            Command::HoverEnter => self.autoplay.hover_enter(),
            Command::HoverLeave => self.autoplay.hover_leave(now),
        }
    }

    /// Advances time: fires the autoplay timer and settles a pending play request.
    ///
    /// Returns the reason a play request was rejected, if one settled now.
    /// Rejections are logged and otherwise leave every control as it was.
    pub fn tick(&mut self, now: Instant) -> Option<MediaError> {
        if self.autoplay.tick(now) {
            debug!("Autoplay timer fired.");
            self.navigation.next();
        }
        let failure = self.music.poll();
        if let Some(e) = &failure {
            warn!("Background music could not start: {}. Press the music button to try again.", e);
        }
        failure
    }

    pub fn music_state(&self) -> MusicState {
        self.music.state()
    }

    /// How long the host may sleep before the next autoplay firing.
    pub fn time_until_next_firing(&self, now: Instant) -> Option<Duration> {
        self.autoplay.next_due().map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoplay::AutoplayState;
    use crate::music::tests::FakeResource;

    const PERIOD: Duration = Duration::from_millis(7000);

    fn controller(n: usize) -> (PresentationController<FakeResource>, FakeResource) {
        let slides: Vec<Slide> = (0..n).map(|_| Slide::default()).collect();
        let fake = FakeResource::default();
        (PresentationController::new(&slides, PERIOD, fake.clone()).unwrap(), fake)
    }

    #[test]
    fn no_controller_without_slides() {
        assert!(PresentationController::new(&[], PERIOD, FakeResource::default()).is_none());
    }

    #[test]
    fn key_bindings() {
        assert_eq!(command_for_key(egui::Key::ArrowRight), Some(Command::Next));
        assert_eq!(command_for_key(egui::Key::ArrowLeft), Some(Command::Previous));
        assert_eq!(command_for_key(egui::Key::Space), Some(Command::ToggleAutoplay));
        assert_eq!(command_for_key(egui::Key::M), Some(Command::ToggleMusic));
        assert_eq!(command_for_key(egui::Key::Enter), None);
    }

    #[test]
    fn hover_edges() {
        assert_eq!(hover_command(false, true), Some(Command::HoverEnter));
        assert_eq!(hover_command(true, false), Some(Command::HoverLeave));
        assert_eq!(hover_command(true, true), None);
        assert_eq!(hover_command(false, false), None);
    }

    #[test]
    fn three_timer_firings_advance_three_slides() {
        let (mut c, _) = controller(4);
        let t0 = Instant::now();
        c.handle(Command::ToggleAutoplay, t0);
        assert_eq!(c.autoplay().state(), AutoplayState::Running);
        for i in 1..=3u32 {
            c.tick(t0 + PERIOD * i);
        }
        assert_eq!(c.current(), 3);
        assert!(c.is_slide_active(3));
        assert!(c.thumbnails()[3].is_active);
    }

    #[test]
    fn manual_navigation_restarts_interval() {
        let (mut c, _) = controller(4);
        let t0 = Instant::now();
        c.handle(Command::ToggleAutoplay, t0);
        let clicked = t0 + Duration::from_millis(5000);
        c.handle(Command::Next, clicked);
        assert_eq!(c.current(), 1);
        c.tick(t0 + PERIOD);
        assert_eq!(c.current(), 1);
        assert_eq!(c.time_until_next_firing(t0 + PERIOD), Some(Duration::from_millis(5000)));
        c.tick(clicked + PERIOD);
        assert_eq!(c.current(), 2);
    }

    #[test]
    fn manual_navigation_while_stopped_keeps_autoplay_off() {
        let (mut c, _) = controller(4);
        let t0 = Instant::now();
        c.handle(Command::Previous, t0);
        c.handle(Command::GoTo(2), t0);
        assert_eq!(c.current(), 2);
        assert_eq!(c.autoplay().state(), AutoplayState::Stopped);
        assert_eq!(c.time_until_next_firing(t0), None);
    }

    #[test]
    fn hover_alone_never_runs_autoplay() {
        let (mut c, _) = controller(3);
        let t0 = Instant::now();
        for i in 0..6u32 {
            let cmd = if i % 2 == 0 { Command::HoverEnter } else { Command::HoverLeave };
            c.handle(cmd, t0);
            c.tick(t0 + PERIOD * (i + 1));
            assert_eq!(c.autoplay().state(), AutoplayState::Stopped);
        }
        assert_eq!(c.current(), 0);
    }

    #[test]
    fn hover_pauses_timer_firings() {
        let (mut c, _) = controller(3);
        let t0 = Instant::now();
        c.handle(Command::ToggleAutoplay, t0);
        c.handle(Command::HoverEnter, t0);
        c.tick(t0 + PERIOD * 2);
        assert_eq!(c.current(), 0);
        let left = t0 + PERIOD * 2;
        c.handle(Command::HoverLeave, left);
        c.tick(left + PERIOD);
        assert_eq!(c.current(), 1);
    }

    #[test]
    fn music_toggle_settles_on_tick() {
        let (mut c, fake) = controller(2);
        let t0 = Instant::now();
        c.handle(Command::ToggleMusic, t0);
        assert_eq!(c.music_state(), MusicState::Requesting);
        fake.answer(Ok(()));
        c.tick(t0);
        assert_eq!(c.music_state(), MusicState::Playing);
        assert_eq!(c.music().aria_pressed(), "true");

        c.handle(Command::ToggleMusic, t0);
        assert_eq!(c.music_state(), MusicState::Paused);
        assert_eq!(*fake.pauses.borrow(), 1);
    }

    #[test]
    fn rejected_music_does_not_disturb_navigation() {
        let (mut c, fake) = controller(2);
        let t0 = Instant::now();
        c.handle(Command::ToggleMusic, t0);
        c.handle(Command::Next, t0);
        let label = c.music().label();
        fake.answer(Err(MediaError::PlayRejected("blocked".into())));
        let failure = c.tick(t0);
        assert!(matches!(failure, Some(MediaError::PlayRejected(_))));
        assert_eq!(c.music_state(), MusicState::Paused);
        assert_eq!(c.music().label(), label);
        assert!(!c.music().is_pressed());
        assert_eq!(c.music().aria_pressed(), "false");
        assert_eq!(c.current(), 1);
        assert_eq!(c.autoplay().state(), AutoplayState::Stopped);
    }
}
