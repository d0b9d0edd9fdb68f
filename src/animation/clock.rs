//! Pause-aware elapsed-time base for one playback.

use std::time::{Duration, Instant};

/// Measures elapsed playback time, excluding any time spent paused.
///
/// Resuming continues from the elapsed value at the moment of the pause, so
/// the animation never jumps forward after a long pause.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    origin: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh run at `now`.
    pub fn start(&mut self, now: Instant) {
        self.origin = Some(now);
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }

    /// Freeze elapsed time.  No-op when stopped or already paused.
    pub fn pause(&mut self, now: Instant) {
        if self.origin.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Unfreeze elapsed time.  No-op unless paused.
    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.origin.is_some() && self.paused_at.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Active playback time as of `now`; zero when stopped.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let Some(origin) = self.origin else {
            return Duration::ZERO;
        };
        let reference = self.paused_at.unwrap_or(now);
        reference
            .saturating_duration_since(origin)
            .saturating_sub(self.paused_total)
    }
}
