//! Autoplay scheduling.
//!
//! A single repeating timer advances the deck. The timer is driven by the UI
//! frame loop through [`AutoplayScheduler::tick`], so "arming" a timer means
//! recording when it is next due. User intent ("autoplay is on") is tracked
//! separately from the armed timer so that hovering the slide area can
//! suspend autoplay without ever turning it on.

use std::time::{Duration, Instant};

use log::{debug, info, trace};

/// Toggle button text while autoplay is enabled.
pub const STOP_LABEL: &str = "⏸ AutoPlay";
/// Toggle button text while autoplay is disabled.
pub const START_LABEL: &str = "▶ AutoPlay";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoplayState {
    Stopped,
    Running,
}

/// The one armed repeating timer.
#[derive(Clone, Copy, Debug)]
struct IntervalTimer {
    next_due: Instant,
}

#[derive(Debug)]
pub struct AutoplayScheduler {
    period: Duration,
    timer: Option<IntervalTimer>,
    user_enabled: bool,
    hover_suspended: bool,
    label: &'static str,
}

impl AutoplayScheduler {
    pub fn new(period: Duration) -> Self {
        debug!("Initializing AutoplayScheduler with period {:?}.", period);
        Self {
            period,
            timer: None,
            user_enabled: false,
            hover_suspended: false,
            label: START_LABEL,
        }
    }

    pub fn state(&self) -> AutoplayState {
        if self.timer.is_some() { AutoplayState::Running } else { AutoplayState::Stopped }
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.user_enabled
    }

    /// Text for the autoplay toggle button.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Instant of the next firing, if a timer is armed.
    pub fn next_due(&self) -> Option<Instant> {
        self.timer.map(|t| t.next_due)
    }

    /// Enables autoplay and (re)arms the timer from `now`.
    ///
    /// While the pointer is over the slide area the timer stays disarmed
    /// until [`hover_leave`](Self::hover_leave).
    pub fn start(&mut self, now: Instant) {
        self.disarm();
        self.user_enabled = true;
        self.label = STOP_LABEL;
        if self.hover_suspended {
            debug!("Autoplay enabled while suspended by hover; timer deferred.");
        } else {
            self.arm(now);
            info!("Autoplay started.");
        }
    }

    /// Disables autoplay and clears the timer. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.user_enabled || self.timer.is_some() {
            info!("Autoplay stopped.");
        }
        self.disarm();
        self.user_enabled = false;
        self.label = START_LABEL;
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.user_enabled {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Restarts the interval from `now` if the timer is armed; otherwise does nothing.
    pub fn reset(&mut self, now: Instant) {
        if self.state() == AutoplayState::Running {
            trace!("Autoplay interval restarted after manual navigation.");
            self.disarm();
            self.arm(now);
        }
    }

    /// Pointer entered the slide display region.
    pub fn hover_enter(&mut self) {
        self.hover_suspended = true;
        if self.timer.is_some() {
            debug!("Autoplay suspended while hovering.");
            self.disarm();
        }
    }

    /// Pointer left the slide display region.
    pub fn hover_leave(&mut self, now: Instant) {
        self.hover_suspended = false;
        if self.user_enabled && self.timer.is_none() {
            debug!("Autoplay resumed after hover.");
            self.arm(now);
        }
    }

    /// Returns true when the armed timer fires at `now`.
    ///
    /// Fires at most once per call. When more than a whole period has been
    /// missed the timer re-anchors on `now` instead of bursting.
    pub fn tick(&mut self, now: Instant) -> bool {
        let period = self.period;
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        if now < timer.next_due {
            return false;
        }
        timer.next_due += period;
        if timer.next_due <= now {
            trace!("Autoplay fell behind; re-anchoring timer.");
            timer.next_due = now + period;
        }
        true
    }

    fn arm(&mut self, now: Instant) {
        self.timer = Some(IntervalTimer { next_due: now + self.period });
    }

    fn disarm(&mut self) {
        self.timer = None;
    }
}
