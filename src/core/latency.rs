//! Purpose: Artificial latency used by the staged listing and the simulated save.
//! Exports: `Latency`.
//! Role: Keeps delay math and randomness out of the service logic.
//! Invariants: Save delay is `random * title_chars * save_scale`.
//! Invariants: A delay that overflows `Duration` is an `Internal` error, never a panic.
//! Invariants: A zero scale or step disables the corresponding delay.
use std::time::Duration;

use super::error::{Error, ErrorKind};

pub const DEFAULT_LIST_STEP_MS: u64 = 100;
pub const DEFAULT_SAVE_SCALE_MS: u64 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Latency {
    pub list_step: Duration,
    pub save_scale: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            list_step: Duration::from_millis(DEFAULT_LIST_STEP_MS),
            save_scale: Duration::from_millis(DEFAULT_SAVE_SCALE_MS),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Self {
            list_step: Duration::ZERO,
            save_scale: Duration::ZERO,
        }
    }

    pub fn from_millis(list_step_ms: u64, save_scale_ms: u64) -> Self {
        Self {
            list_step: Duration::from_millis(list_step_ms),
            save_scale: Duration::from_millis(save_scale_ms),
        }
    }

    pub fn save_delay(&self, title: &str) -> Result<Duration, Error> {
        if self.save_scale.is_zero() {
            return Ok(Duration::ZERO);
        }
        scaled_delay(rand::random::<f64>(), title, self.save_scale)
    }
}

fn scaled_delay(unit: f64, title: &str, scale: Duration) -> Result<Duration, Error> {
    let chars = title.chars().count() as f64;
    Duration::try_from_secs_f64(unit * chars * scale.as_secs_f64()).ok().ok_or_else(|| {
        Error::new(ErrorKind::Internal)
            .with_message("simulated save delay is out of range")
            .with_hint("Use a smaller --save-scale-ms.")
    })
}

#[cfg(test)]
mod tests {
    use super::{Latency, scaled_delay};
    use crate::core::error::ErrorKind;
    use std::time::Duration;

    #[test]
    fn delay_scales_with_title_length() {
        let scale = Duration::from_millis(100);
        assert_eq!(
            scaled_delay(0.5, "Dune", scale).expect("delay"),
            Duration::from_millis(200)
        );
        assert_eq!(scaled_delay(0.0, "Dune", scale).expect("delay"), Duration::ZERO);
        assert_eq!(scaled_delay(0.5, "", scale).expect("delay"), Duration::ZERO);
    }

    #[test]
    fn delay_counts_characters_not_bytes() {
        let scale = Duration::from_millis(10);
        assert_eq!(
            scaled_delay(1.0, "Ωμέγα", scale).expect("delay"),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn save_delay_is_bounded_by_length_times_scale() {
        let latency = Latency::from_millis(0, 100);
        for _ in 0..100 {
            let delay = latency.save_delay("Moby Dick").expect("delay");
            assert!(delay < Duration::from_millis(900));
        }
    }

    #[test]
    fn oversized_delay_is_internal_error() {
        let title = "x".repeat(5000);
        let err = scaled_delay(0.9, &title, Duration::from_millis(u64::MAX)).expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.hint().is_some());
    }

    #[test]
    fn zero_scale_disables_save_delay() {
        let delay = Latency::none().save_delay("War and Peace").expect("delay");
        assert_eq!(delay, Duration::ZERO);
    }
}
