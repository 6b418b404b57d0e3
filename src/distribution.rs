//! Per-digit probability distributions.
//!
//! - [`TheoreticalDistribution`]: Benford's `P(d) = log10(1 + 1/d)`, computed once
//! - [`DigitDistribution`]: empirical first-digit proportions of one sample
//! - [`DistributionPair`]: the two side by side, input to every test
//! - [`PlotTable`]: long-format table of both, for grouped bar charts
//!
//! Both distributions are indexed by digit `1..=9`; index 0 of the backing
//! array is digit 1.
//!
//! ```
//! use u_benford::distribution::{DigitDistribution, TheoreticalDistribution};
//!
//! let theory = TheoreticalDistribution::new();
//! assert!((theory.probability(1) - 0.30103).abs() < 1e-5);
//!
//! let observed = DigitDistribution::from_digits(&[1, 1, 2, 9]);
//! assert_eq!(observed.proportion(1), 0.5);
//! assert_eq!(observed.count(9), 1);
//! ```

use crate::dataframe::{Column, DataFrame};
use crate::error::BenfordError;

/// The digits a first-digit distribution is defined over.
pub const DIGITS: std::ops::RangeInclusive<u8> = 1..=9;

/// Number of digit categories.
pub const N_DIGITS: usize = 9;

/// Array index of `digit`. Panics outside 1..=9.
#[inline]
fn slot(digit: u8) -> usize {
    assert!(DIGITS.contains(&digit), "digit {digit} outside 1..=9");
    usize::from(digit) - 1
}

/// Running sums over digits 1..9 in increasing order.
fn cumulate(p: &[f64; N_DIGITS]) -> [f64; N_DIGITS] {
    let mut out = [0.0; N_DIGITS];
    let mut acc = 0.0;
    for (o, &v) in out.iter_mut().zip(p) {
        acc += v;
        *o = acc;
    }
    out
}

// ── Theoretical ───────────────────────────────────────────────────────

/// Benford's first-digit law. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TheoreticalDistribution {
    probabilities: [f64; N_DIGITS],
}

impl TheoreticalDistribution {
    pub fn new() -> Self {
        let mut probabilities = [0.0; N_DIGITS];
        for d in DIGITS {
            probabilities[slot(d)] = (1.0 + 1.0 / f64::from(d)).log10();
        }
        Self { probabilities }
    }

    /// Expected probability of leading digit `digit` (1-9).
    ///
    /// # Panics
    ///
    /// Panics if `digit` is not in 1..=9.
    pub fn probability(&self, digit: u8) -> f64 {
        self.probabilities[slot(digit)]
    }

    /// Probabilities for digits 1..9.
    pub fn probabilities(&self) -> &[f64; N_DIGITS] {
        &self.probabilities
    }

    pub fn cumulative(&self) -> [f64; N_DIGITS] {
        cumulate(&self.probabilities)
    }

    /// Expected frequency of each digit in a sample of size `n`.
    pub fn expected_counts(&self, n: usize) -> [f64; N_DIGITS] {
        self.probabilities.map(|p| p * n as f64)
    }
}

impl Default for TheoreticalDistribution {
    fn default() -> Self {
        Self::new()
    }
}

// ── Observed ──────────────────────────────────────────────────────────

/// Empirical first-digit distribution of one sample.
///
/// All nine digits are present; unseen digits have proportion 0. An empty
/// sample gives all-zero proportions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitDistribution {
    counts: [usize; N_DIGITS],
    proportions: [f64; N_DIGITS],
}

impl DigitDistribution {
    /// Counts `digits` and normalizes by their number. Values outside
    /// 1..=9 are ignored.
    pub fn from_digits(digits: &[u8]) -> Self {
        let mut counts = [0usize; N_DIGITS];
        for &d in digits.iter().filter(|d| DIGITS.contains(*d)) {
            counts[slot(d)] += 1;
        }
        Self::from_counts(counts)
    }

    /// Builds a distribution from absolute digit counts.
    pub fn from_counts(counts: [usize; N_DIGITS]) -> Self {
        let total: usize = counts.iter().sum();
        let proportions = if total == 0 {
            [0.0; N_DIGITS]
        } else {
            counts.map(|c| c as f64 / total as f64)
        };
        Self {
            counts,
            proportions,
        }
    }

    /// Proportion of leading digit `digit` (1-9).
    ///
    /// # Panics
    ///
    /// Panics if `digit` is not in 1..=9.
    pub fn proportion(&self, digit: u8) -> f64 {
        self.proportions[slot(digit)]
    }

    /// Occurrences of leading digit `digit`.
    ///
    /// # Panics
    ///
    /// Panics if `digit` is not in 1..=9.
    pub fn count(&self, digit: u8) -> usize {
        self.counts[slot(digit)]
    }

    pub fn proportions(&self) -> &[f64; N_DIGITS] {
        &self.proportions
    }

    pub fn counts(&self) -> &[usize; N_DIGITS] {
        &self.counts
    }

    /// Sample size the proportions were computed from.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn cumulative(&self) -> [f64; N_DIGITS] {
        cumulate(&self.proportions)
    }
}

// ── Pair ──────────────────────────────────────────────────────────────

/// Observed and theoretical distributions of one analysis, the input
/// every conformity test works from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionPair {
    pub theoretical: TheoreticalDistribution,
    pub observed: DigitDistribution,
}

impl DistributionPair {
    pub fn new(theoretical: TheoreticalDistribution, observed: DigitDistribution) -> Self {
        Self {
            theoretical,
            observed,
        }
    }

    /// Number of valid digits behind the observed distribution.
    pub fn sample_size(&self) -> usize {
        self.observed.total()
    }
}

// ── Plot table ────────────────────────────────────────────────────────

/// Series label for observed rows in a [`PlotTable`].
pub const OBSERVED_LABEL: &str = "Observed";
/// Series label for theoretical rows in a [`PlotTable`].
pub const THEORETICAL_LABEL: &str = "Theoretical";

/// Long-format data for an observed-vs-theoretical grouped bar chart.
///
/// `data` has columns `digit`, `proportion`, `type`: nine `Observed` rows
/// followed by nine `Theoretical` rows, digits ascending within each.
#[derive(Debug, Clone)]
pub struct PlotTable {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: DataFrame,
}

impl PlotTable {
    pub fn build(
        field: &str,
        observed: &DigitDistribution,
        theoretical: &TheoreticalDistribution,
    ) -> Result<Self, BenfordError> {
        let digits: Vec<f64> = DIGITS.chain(DIGITS).map(f64::from).collect();
        let proportions: Vec<f64> = observed
            .proportions()
            .iter()
            .chain(theoretical.probabilities())
            .copied()
            .collect();
        let labels: Vec<&str> = std::iter::repeat(OBSERVED_LABEL)
            .take(N_DIGITS)
            .chain(std::iter::repeat(THEORETICAL_LABEL).take(N_DIGITS))
            .collect();

        let mut data = DataFrame::new();
        data.add_column(
            "digit".to_string(),
            Column::from_options(digits.into_iter().map(Some).collect()),
        )?;
        data.add_column(
            "proportion".to_string(),
            Column::from_options(proportions.into_iter().map(Some).collect()),
        )?;
        data.add_column("type".to_string(), Column::from_labels(&labels))?;

        Ok(Self {
            title: format!("Benford's Law Distribution for {field}"),
            x_label: "First Digit".to_string(),
            y_label: "Proportion".to_string(),
            data,
        })
    }
}
