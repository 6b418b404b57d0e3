//! Leading-digit extraction.
//!
//! The leading digit of a value is the first significant decimal digit of
//! its absolute value: `123 → 1`, `-123 → 1`, `0.00123 → 1`, `999999 → 9`.
//! Digits are read from the `Display` form of the `f64`, which is the
//! shortest round-trip decimal and never switches to scientific notation,
//! so `1e-7` is read from `"0.0000001"` and `2.5e21` from
//! `"2500000000000000000000"`.
//!
//! Nulls, zeros and non-finite values have no leading digit and are dropped.

use tracing::{debug, warn};

/// Leading digits retained from one column, plus how many entries the
/// column had before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitSample {
    digits: Vec<u8>,
    total: usize,
}

impl DigitSample {
    /// The retained digits, each in `1..=9`, in input order.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Number of input entries, nulls included.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of retained digits.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}

/// Returns the first significant digit of `|value|`, or `None` for zero,
/// NaN and infinities.
///
/// ```
/// use u_benford::digits::leading_digit;
///
/// assert_eq!(leading_digit(123.0), Some(1));
/// assert_eq!(leading_digit(-0.00482), Some(4));
/// assert_eq!(leading_digit(0.0), None);
/// assert_eq!(leading_digit(f64::NAN), None);
/// ```
pub fn leading_digit(value: f64) -> Option<u8> {
    let magnitude = value.abs();
    if !magnitude.is_finite() || magnitude == 0.0 {
        return None;
    }
    magnitude
        .to_string()
        .bytes()
        .find(|b| (b'1'..=b'9').contains(b))
        .map(|b| b - b'0')
}

/// Extracts leading digits from a column's entries (`None` = null).
///
/// ```
/// use u_benford::digits::extract_leading_digits;
///
/// let entries = [Some(123.0), Some(-123.0), Some(0.00123), Some(999999.0), Some(0.0), None];
/// let sample = extract_leading_digits(&entries);
/// assert_eq!(sample.digits(), &[1, 1, 1, 9]);
/// assert_eq!(sample.total(), 6);
/// ```
pub fn extract_leading_digits(entries: &[Option<f64>]) -> DigitSample {
    let digits: Vec<u8> = entries
        .iter()
        .filter_map(|v| v.and_then(leading_digit))
        .collect();

    if digits.is_empty() {
        warn!(total = entries.len(), "no valid numerical data found after filtering");
    } else {
        debug!(
            valid = digits.len(),
            total = entries.len(),
            "extracted leading digits"
        );
    }

    DigitSample {
        digits,
        total: entries.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_values() {
        let entries = [Some(123.0), Some(-123.0), Some(0.00123), Some(999999.0)];
        assert_eq!(extract_leading_digits(&entries).digits(), &[1, 1, 1, 9]);
    }

    #[test]
    fn zero_and_null_are_dropped() {
        let sample = extract_leading_digits(&[Some(0.0), None, Some(-0.0), Some(7.0)]);
        assert_eq!(sample.digits(), &[7]);
        assert_eq!(sample.total(), 4);
        assert_eq!(sample.len(), 1);
    }

    #[test]
    fn non_finite_is_dropped() {
        let sample = extract_leading_digits(&[
            Some(f64::NAN),
            Some(f64::INFINITY),
            Some(f64::NEG_INFINITY),
            Some(42.0),
        ]);
        assert_eq!(sample.digits(), &[4]);
    }

    #[test]
    fn extreme_magnitudes_use_fixed_point() {
        assert_eq!(leading_digit(1e-7), Some(1));
        assert_eq!(leading_digit(3.2e-300), Some(3));
        assert_eq!(leading_digit(2.5e21), Some(2));
        assert_eq!(leading_digit(f64::MAX), Some(1));
        assert_eq!(leading_digit(f64::MIN_POSITIVE), Some(2));
    }

    #[test]
    fn fractional_values() {
        assert_eq!(leading_digit(0.5), Some(5));
        assert_eq!(leading_digit(0.0901), Some(9));
        assert_eq!(leading_digit(8.75), Some(8));
    }

    #[test]
    fn empty_input_gives_empty_sample() {
        let sample = extract_leading_digits(&[]);
        assert!(sample.is_empty());
        assert_eq!(sample.total(), 0);
    }
}
