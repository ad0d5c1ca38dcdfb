//! Compile-time tunables. There is no runtime configuration.

use embassy_time::Duration;

/// Number of people allowed inside at the same time.
pub const CAPACITY: usize = 8;

/// How often the entry and exit buttons are sampled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cooldown after a recognised press before the button is sampled again.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(300);

pub const ALERT_FREQUENCY_HZ: u32 = 1_000;
pub const REJECT_PULSE: Duration = Duration::from_millis(200);
pub const RESET_PULSE: Duration = Duration::from_millis(100);
pub const PULSE_GAP: Duration = Duration::from_millis(100);

/// Size of the buffer the count line is formatted into.
pub const STATUS_LINE_CAPACITY: usize = 32;
