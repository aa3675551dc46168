//! Shared ratio helpers.
//!
//! Every rate in the crate goes through [`safe_divide`] so that an empty
//! cohort, a funnel step nobody started, or a dataset without sessions all
//! resolve to `0.0` the same way.

/// `numerator / denominator`, or `0.0` when the denominator is zero or the
/// quotient is not finite.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// `part / whole` as a percentage rounded to one decimal place.
pub fn percentage(part: u64, whole: u64) -> f64 {
    round_to(safe_divide(part as f64 * 100.0, whole as f64), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_divide_zero_denominator_is_zero() {
        assert_eq!(safe_divide(5.0, 0.0), 0.0);
        assert_eq!(safe_divide(0.0, 0.0), 0.0);
    }

    #[test]
    fn safe_divide_regular_quotient() {
        assert_eq!(safe_divide(450.0, 4.0), 112.5);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
