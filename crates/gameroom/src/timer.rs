use std::time::Duration;
use tetris_core::DROP_INTERVAL_MS;

/// Configuration for a Room's gravity ticker. There is no per-turn
/// decision clock in this game — commands are accepted at any time
/// during `playing` — so the only cadence to track is the drop interval
/// itself.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub drop_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            drop_interval: Duration::from_millis(DROP_INTERVAL_MS),
        }
    }
}

impl TimerConfig {
    pub fn new(drop_interval: Duration) -> Self {
        Self { drop_interval }
    }

    /// A periodic ticker firing once per drop interval, ready to be
    /// selected alongside a Room's inbound command channel.
    pub fn ticker(&self) -> tokio::time::Interval {
        tokio::time::interval(self.drop_interval)
    }
}
