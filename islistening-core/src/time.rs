//! Time and duration helpers.
//!
//! Saturating `Duration` conversions for the engine's timing math, and the
//! `M:SS` clock format used by the progress labels.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Format a millisecond duration as `M:SS`.
///
/// The value is rounded half-up to the nearest whole second before it is
/// split, so the seconds field is always in `00..=59`.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms.saturating_add(500) / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_u64() {
        let duration = Duration::from_millis(1234);
        assert_eq!(duration.as_millis_u64(), 1234);
    }

    #[test]
    fn test_as_millis_u64_zero() {
        assert_eq!(Duration::ZERO.as_millis_u64(), 0);
    }

    #[test]
    fn test_as_millis_u64_saturates() {
        assert_eq!(Duration::MAX.as_millis_u64(), u64::MAX);
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_duration(0), "0:00");
    }

    #[test]
    fn test_format_pads_seconds() {
        assert_eq!(format_duration(65_000), "1:05");
    }

    #[test]
    fn test_format_ten_minutes() {
        assert_eq!(format_duration(600_000), "10:00");
    }

    #[test]
    fn test_format_rounds_to_nearest_second() {
        assert_eq!(format_duration(1_499), "0:01");
        assert_eq!(format_duration(1_500), "0:02");
        assert_eq!(format_duration(500), "0:01");
        assert_eq!(format_duration(499), "0:00");
    }

    #[test]
    fn test_format_never_shows_sixty_seconds() {
        assert_eq!(format_duration(59_600), "1:00");
        assert_eq!(format_duration(119_999), "2:00");
    }

    #[test]
    fn test_format_long_track() {
        // 1h 2m 3s stays in minutes
        assert_eq!(format_duration(3_723_000), "62:03");
    }
}
