//! Delay directive.
//!
//! The gate only computes how long to wait. Suspending is the transport's
//! job: the async binding awaits `tokio::time::sleep`, which yields to other
//! requests, while the serial binding calls `std::thread::sleep` and so holds
//! up every other client for the duration. That serialization is a known
//! property of the serial binding, not something this module tries to hide.

use std::num::IntErrorKind;
use std::time::Duration;

use crate::config::TimingConfig;

/// Clamps requested delays into the configured window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingGate {
    min_ms: u64,
    max_ms: u64,
}

impl TimingGate {
    pub fn new(config: &TimingConfig) -> Self {
        Self {
            min_ms: config.min_delay_ms,
            max_ms: config.max_delay_ms.max(config.min_delay_ms),
        }
    }

    /// Effective delay in milliseconds for a delay directive value.
    ///
    /// Absent means `"0"`. Text that is not an integer yields 0 without
    /// clamping; numbers (negative or out of range included) are clamped
    /// into `[min_delay_ms, max_delay_ms]`.
    pub fn delay_millis(&self, raw: Option<&str>) -> u64 {
        let raw = raw.unwrap_or("0");
        let requested = match raw.trim().parse::<i64>() {
            Ok(requested) => u64::try_from(requested).unwrap_or(0),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => u64::MAX,
                IntErrorKind::NegOverflow => 0,
                _ => return 0,
            },
        };
        requested.clamp(self.min_ms, self.max_ms)
    }

    pub fn delay(&self, raw: Option<&str>) -> Duration {
        Duration::from_millis(self.delay_millis(raw))
    }
}
