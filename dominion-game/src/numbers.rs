//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert u32 to f64.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

fn clamp_to_i64(value: f64) -> i64 {
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(value.clamp(min, max)).unwrap_or(0)
}

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    clamp_to_i64(value.round())
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    clamp_to_i64(value.floor())
}

/// Ceil a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    clamp_to_i64(value.ceil())
}

/// Floor of `value * fraction`, never negative and never above `value`.
///
/// Used for every "lose N% of X" rule so that the removed amount plus the
/// remainder always equals the original quantity exactly.
#[must_use]
pub fn portion(value: i64, fraction: f64) -> i64 {
    if value <= 0 || fraction <= 0.0 {
        return 0;
    }
    floor_f64_to_i64(i64_to_f64(value) * fraction.min(1.0)).clamp(0, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_handle_non_finite() {
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert_eq!(floor_f64_to_i64(f64::INFINITY), 0);
        assert_eq!(ceil_f64_to_i64(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i64(1.6), 2);
        assert_eq!(floor_f64_to_i64(1.6), 1);
        assert_eq!(ceil_f64_to_i64(1.2), 2);
        assert_eq!(round_f64_to_i64(f64::MAX), i64::MAX);
    }

    #[test]
    fn portion_never_exceeds_source() {
        assert_eq!(portion(1000, 0.09), 90);
        assert_eq!(portion(7, 0.5), 3);
        assert_eq!(portion(10, 2.0), 10);
        assert_eq!(portion(-5, 0.5), 0);
        assert_eq!(portion(5, -0.5), 0);
    }
}
