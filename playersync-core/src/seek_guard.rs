//! Seek echo suppression
//!
//! Corrective seeks issued to peers come back as `Seeked` notifications
//! from those peers. Any seek notification that arrives within the debounce
//! window of the last accepted one (from any player) is dropped, otherwise
//! every correction would trigger another round of corrections.

use std::time::{Duration, Instant};

/// Default debounce window
pub const DEFAULT_SEEK_DEBOUNCE: Duration = Duration::from_secs(1);

/// Timestamp of the last accepted seek notification
#[derive(Debug)]
pub struct SeekGuard {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl SeekGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Decide whether a seek notification arriving at `now` should be acted
    /// upon. Accepting it restarts the window.
    pub fn try_accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                tracing::debug!(
                    "Seek guard: dropping seek {}ms after last accepted",
                    now.saturating_duration_since(last).as_millis()
                );
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

impl Default for SeekGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SEEK_DEBOUNCE)
    }
}
