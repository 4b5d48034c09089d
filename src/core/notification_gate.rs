// Notification gate - decides when a hand detection may trigger a notification

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Minimum time between two notifications
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Time-based gate guarding the notification dispatcher
///
/// The gate opens at most once per cooldown period, measured between the instants at which it
/// opened. It never looks at what was detected. The check-and-record step runs under a mutex, so
/// one gate can be shared between several frame loops.
pub struct NotificationGate {
    cooldown: Duration,
    last_dispatch_time: Mutex<Option<DateTime<Utc>>>,
}

impl NotificationGate {
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_dispatch_time: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// When the gate last opened, `None` if it never has
    pub fn last_dispatch_time(&self) -> Option<DateTime<Utc>> {
        *self
            .last_dispatch_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the gate if the cooldown has elapsed since it last opened
    ///
    /// Returns `true` and records `now` when permission is granted. Otherwise the state is left
    /// untouched. A `now` earlier than the last recorded time never opens the gate.
    pub fn try_acquire(&self, now: DateTime<Utc>) -> bool {
        let mut last = self
            .last_dispatch_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let eligible = match *last {
            None => true,
            Some(previous) => now
                .signed_duration_since(previous)
                .to_std()
                .map(|elapsed| elapsed >= self.cooldown)
                .unwrap_or(false),
        };

        if eligible {
            *last = Some(now);
        }
        eligible
    }
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new()
    }
}
