//! Background-music toggle.
//!
//! The toggle owns one [`MediaResource`]. Pausing is immediate; playing is an
//! asynchronous request whose reply arrives on a oneshot channel and is picked
//! up by [`MusicToggle::poll`]. While a request is pending further toggles are
//! ignored, so the button never disagrees with what is actually audible.

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::errors::MediaError;
use log::{debug, info};

/// Music button text while paused.
pub const PLAY_LABEL: &str = "🎵 Music";
/// Music button text while playing.
pub const MUTE_LABEL: &str = "🔇 Mute";

/// Reply to a play request.
pub type PlayReply = oneshot::Receiver<Result<(), MediaError>>;

/// A playable media resource.
pub trait MediaResource {
    /// Requests playback. The outcome is delivered on the returned channel.
    fn play(&mut self) -> PlayReply;
    /// Pauses playback immediately.
    fn pause(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MusicState {
    Paused,
    /// A play request has been issued and not yet answered.
    Requesting,
    Playing,
}

pub struct MusicToggle<R: MediaResource> {
    resource: R,
    state: MusicState,
    pending: Option<PlayReply>,
    label: &'static str,
    pressed: bool,
}

impl<R: MediaResource> MusicToggle<R> {
    /// Wraps `resource`, which is assumed paused.
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            state: MusicState::Paused,
            pending: None,
            label: PLAY_LABEL,
            pressed: false,
        }
    }

    pub fn state(&self) -> MusicState {
        self.state
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Pressed state in accessibility attribute form.
    pub fn aria_pressed(&self) -> &'static str {
        if self.pressed { "true" } else { "false" }
    }

    pub fn toggle(&mut self) {
        match self.state {
            MusicState::Requesting => {
                debug!("Music toggle ignored: play request still pending.");
            }
            MusicState::Playing => {
                self.resource.pause();
                self.state = MusicState::Paused;
                self.label = PLAY_LABEL;
                self.pressed = false;
                info!("Background music paused.");
            }
            MusicState::Paused => {
                debug!("Requesting background music playback.");
                self.pending = Some(self.resource.play());
                self.state = MusicState::Requesting;
            }
        }
    }

    /// Settles a pending play request if its reply has arrived.
    ///
    /// A rejected request is returned for diagnostics only; the button keeps
    /// the label and pressed state it had before the request.
    pub fn poll(&mut self) -> Option<MediaError> {
        let reply = self.pending.as_mut()?;
        let outcome = match reply.try_recv() {
            Err(TryRecvError::Empty) => return None,
            Ok(result) => result,
            Err(TryRecvError::Closed) => {
                Err(MediaError::ChannelClosed("play request dropped without a reply".to_string()))
            }
        };
        self.pending = None;
        match outcome {
            Ok(()) => {
                self.state = MusicState::Playing;
                self.label = MUTE_LABEL;
                self.pressed = true;
                info!("Background music playing.");
                None
            }
            Err(e) => {
                self.state = MusicState::Paused;
                Some(e)
            }
        }
    }
}
