//! Conformity tests against Benford's Law.
//!
//! Three independent measures over a [`DistributionPair`]:
//!
//! | Test | Statistic | Decision |
//! |------|-----------|----------|
//! | [`chi_square_test`] | Σ (O − E)² / E over 9 digits, df = 8 | `p < alpha` |
//! | [`ks_test`] | max \|F_obs − F_benford\| over digit boundaries | `D > c(conf) / √N` |
//! | [`mean_absolute_deviation`] | mean \|p_obs − p_benford\| | banded into [`Conformity`] |
//!
//! The functions are pure: they read nothing but their arguments.
//!
//! ```
//! use u_benford::distribution::{DigitDistribution, DistributionPair, TheoreticalDistribution};
//! use u_benford::testing::{
//!     chi_square_test, ks_test, mean_absolute_deviation, Conformity, KsConfidence,
//! };
//!
//! let observed = DigitDistribution::from_counts([301, 176, 125, 97, 79, 67, 58, 51, 46]);
//! let pair = DistributionPair::new(TheoreticalDistribution::new(), observed);
//!
//! assert!(!chi_square_test(&pair, 0.05).unwrap().significant);
//! assert!(!ks_test(&pair, KsConfidence::P95).significant);
//! assert_eq!(mean_absolute_deviation(&pair).conformity, Conformity::Low);
//! ```

use crate::distribution::{DistributionPair, N_DIGITS};
use crate::error::BenfordError;

/// Chi-square degrees of freedom: nine digit categories minus one.
pub const CHI_SQUARE_DF: usize = N_DIGITS - 1;

/// MAD at or above which the data is considered non-conforming.
pub const MAD_NONCONFORMITY_THRESHOLD: f64 = 0.015;

const CONFIDENCE_TOLERANCE: f64 = 1e-9;

// ── KS confidence ─────────────────────────────────────────────────────

/// Supported confidence levels for the KS test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KsConfidence {
    P90,
    P95,
    P99,
}

impl KsConfidence {
    pub const ALL: [KsConfidence; 3] = [Self::P90, Self::P95, Self::P99];

    /// Confidence as a fraction, e.g. `0.95`.
    pub fn level(self) -> f64 {
        match self {
            Self::P90 => 0.90,
            Self::P95 => 0.95,
            Self::P99 => 0.99,
        }
    }

    /// Large-sample multiplier `c` in the critical value `c / √N`.
    pub fn critical_multiplier(self) -> f64 {
        match self {
            Self::P90 => 1.22,
            Self::P95 => 1.36,
            Self::P99 => 1.63,
        }
    }

    /// Supported levels as fractions, for error messages.
    pub fn supported_levels() -> Vec<f64> {
        Self::ALL.iter().map(|c| c.level()).collect()
    }
}

impl TryFrom<f64> for KsConfidence {
    type Error = BenfordError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| (c.level() - value).abs() < CONFIDENCE_TOLERANCE)
            .ok_or_else(|| BenfordError::InvalidConfidenceLevel {
                value,
                supported: Self::supported_levels(),
            })
    }
}

// ── Results ───────────────────────────────────────────────────────────

/// Chi-square goodness-of-fit outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    /// Significance level the decision was made at.
    pub alpha: f64,
    /// `true` if the data differs significantly from Benford's Law.
    pub significant: bool,
    pub interpretation: String,
}

/// Kolmogorov-Smirnov outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub critical_value: f64,
    pub confidence: KsConfidence,
    /// `true` if the statistic exceeds the critical value.
    pub significant: bool,
    pub interpretation: String,
}

/// Conformity band of a mean absolute deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conformity {
    /// MAD < 0.006
    Low,
    /// 0.006 ≤ MAD < 0.012
    Acceptable,
    /// 0.012 ≤ MAD < 0.015
    Marginal,
    /// MAD ≥ 0.015
    High,
}

impl Conformity {
    pub fn from_mad(mad: f64) -> Self {
        if mad < 0.006 {
            Self::Low
        } else if mad < 0.012 {
            Self::Acceptable
        } else if mad < MAD_NONCONFORMITY_THRESHOLD {
            Self::Marginal
        } else {
            Self::High
        }
    }

    /// Short band name, e.g. `"Low Dispersion"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Dispersion",
            Self::Acceptable => "Acceptable Dispersion",
            Self::Marginal => "Marginal Dispersion",
            Self::High => "High Dispersion",
        }
    }

    /// Label plus what the band means.
    pub fn description(self) -> &'static str {
        match self {
            Self::Low => "Low Dispersion: Indicates a very close fit to Benford's Law.",
            Self::Acceptable => {
                "Acceptable Dispersion: Indicates a good fit to Benford's Law, typical for clean data."
            }
            Self::Marginal => {
                "Marginal Dispersion: Suggests some deviation from Benford's Law, which may be acceptable."
            }
            Self::High => {
                "High Dispersion: Indicates significant deviation from Benford's Law, suggesting potential data anomalies."
            }
        }
    }
}

impl std::fmt::Display for Conformity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean absolute deviation outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct MadResult {
    pub mad: f64,
    pub conformity: Conformity,
    pub interpretation: String,
}

// ── Tests ─────────────────────────────────────────────────────────────

/// Chi-square goodness-of-fit of the observed digit frequencies.
///
/// Both distributions are scaled by the sample size to frequency counts;
/// the p-value comes from the χ² distribution with 8 degrees of freedom.
///
/// # Errors
///
/// - [`BenfordError::InvalidAlpha`] if `alpha` is not in (0, 1)
/// - [`BenfordError::TestFailed`] if the sample is empty or the counts are not finite
pub fn chi_square_test(
    pair: &DistributionPair,
    alpha: f64,
) -> Result<ChiSquareResult, BenfordError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(BenfordError::InvalidAlpha { value: alpha });
    }
    let n = pair.sample_size();
    if n == 0 {
        return Err(BenfordError::TestFailed {
            test: "chi-square",
            message: "empty sample".to_string(),
        });
    }

    let observed = pair.observed.counts().map(|c| c as f64);
    let expected = pair.theoretical.expected_counts(n);

    let result = u_analytics::testing::chi_squared_goodness_of_fit(&observed, &expected)
        .ok_or_else(|| BenfordError::TestFailed {
            test: "chi-square",
            message: "non-finite or negative frequency counts".to_string(),
        })?;

    let significant = result.p_value < alpha;
    let interpretation = if significant {
        format!("Significantly different from Benford's Law (p < {alpha})")
    } else {
        format!("Not significantly different from Benford's Law (p >= {alpha})")
    };

    Ok(ChiSquareResult {
        statistic: result.statistic,
        p_value: result.p_value,
        degrees_of_freedom: CHI_SQUARE_DF,
        alpha,
        significant,
        interpretation,
    })
}

/// Kolmogorov-Smirnov comparison of the cumulative digit curves.
///
/// An empty sample yields an infinite critical value, hence never significant.
pub fn ks_test(pair: &DistributionPair, confidence: KsConfidence) -> KsResult {
    let observed = pair.observed.cumulative();
    let theoretical = pair.theoretical.cumulative();
    let statistic = observed
        .iter()
        .zip(&theoretical)
        .map(|(o, t)| (o - t).abs())
        .fold(0.0, f64::max);

    let critical_value = confidence.critical_multiplier() / (pair.sample_size() as f64).sqrt();
    let significant = statistic > critical_value;

    let percent = confidence.level() * 100.0;
    let interpretation = if significant {
        format!("Significantly different from Benford's Law at {percent:.0}% confidence")
    } else {
        format!("Not significantly different from Benford's Law at {percent:.0}% confidence")
    };

    KsResult {
        statistic,
        critical_value,
        confidence,
        significant,
        interpretation,
    }
}

/// Mean absolute deviation between observed and expected proportions.
pub fn mean_absolute_deviation(pair: &DistributionPair) -> MadResult {
    let deviations: Vec<f64> = pair
        .observed
        .proportions()
        .iter()
        .zip(pair.theoretical.probabilities())
        .map(|(o, t)| (o - t).abs())
        .collect();
    let mad = u_numflow::stats::mean(&deviations).unwrap_or(f64::NAN);
    let conformity = Conformity::from_mad(mad);

    MadResult {
        mad,
        conformity,
        interpretation: format!(
            "MAD = {mad:.6} indicates {}",
            conformity.description().to_lowercase()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{DigitDistribution, TheoreticalDistribution};

    fn pair_from_counts(counts: [usize; N_DIGITS]) -> DistributionPair {
        DistributionPair::new(
            TheoreticalDistribution::new(),
            DigitDistribution::from_counts(counts),
        )
    }

    /// Counts proportional to Benford's Law, rounded. Only sizes whose
    /// rounded counts add back up to `n` are accepted.
    fn benford_counts(n: usize) -> [usize; N_DIGITS] {
        let counts = TheoreticalDistribution::new()
            .expected_counts(n)
            .map(|c| c.round() as usize);
        assert_eq!(counts.iter().sum::<usize>(), n, "rounded counts drift for n = {n}");
        counts
    }

    fn all_ones(n: usize) -> DistributionPair {
        let mut counts = [0; N_DIGITS];
        counts[0] = n;
        pair_from_counts(counts)
    }

    // ── Confidence ──────────────────────────────────────────────

    #[test]
    fn confidence_from_level() {
        assert_eq!(KsConfidence::try_from(0.90).unwrap(), KsConfidence::P90);
        assert_eq!(KsConfidence::try_from(0.95).unwrap(), KsConfidence::P95);
        assert_eq!(KsConfidence::try_from(0.99).unwrap(), KsConfidence::P99);
    }

    #[test]
    fn unsupported_confidence_rejected() {
        let err = KsConfidence::try_from(0.80).unwrap_err();
        assert_eq!(
            err,
            BenfordError::InvalidConfidenceLevel {
                value: 0.80,
                supported: vec![0.90, 0.95, 0.99],
            }
        );
        assert!(KsConfidence::try_from(f64::NAN).is_err());
    }

    // ── Chi-square ──────────────────────────────────────────────

    #[test]
    fn chi_square_benford_sample_not_significant() {
        let counts = benford_counts(10_000);
        assert_eq!(counts.iter().sum::<usize>(), 10_000);
        let result = chi_square_test(&pair_from_counts(counts), 0.05).unwrap();
        assert!(!result.significant);
        assert!(result.statistic < 0.01, "chi2 = {}", result.statistic);
        assert!(result.p_value > 0.99, "p = {}", result.p_value);
        assert_eq!(result.degrees_of_freedom, 8);
        assert_eq!(
            result.interpretation,
            "Not significantly different from Benford's Law (p >= 0.05)"
        );
    }

    #[test]
    fn chi_square_single_digit_is_significant() {
        let result = chi_square_test(&all_ones(500), 0.05).unwrap();
        assert!(result.significant);
        assert!(result.p_value < 1e-6);
        assert_eq!(
            result.interpretation,
            "Significantly different from Benford's Law (p < 0.05)"
        );
    }

    #[test]
    fn chi_square_statistic_hand_computed() {
        // Uniform digits: 100 of each.
        let pair = pair_from_counts([100; N_DIGITS]);
        let expected = pair.theoretical.expected_counts(900);
        let chi2: f64 = expected.iter().map(|e| (100.0 - e).powi(2) / e).sum();
        let result = chi_square_test(&pair, 0.05).unwrap();
        assert!((result.statistic - chi2).abs() < 1e-9);
        assert!(result.significant);
    }

    #[test]
    fn chi_square_rejects_bad_alpha() {
        let pair = all_ones(10);
        assert_eq!(
            chi_square_test(&pair, 0.0).unwrap_err(),
            BenfordError::InvalidAlpha { value: 0.0 }
        );
        assert!(chi_square_test(&pair, 1.0).is_err());
        assert!(chi_square_test(&pair, f64::NAN).is_err());
    }

    #[test]
    fn chi_square_empty_sample_fails() {
        let err = chi_square_test(&pair_from_counts([0; N_DIGITS]), 0.05).unwrap_err();
        assert!(matches!(err, BenfordError::TestFailed { test: "chi-square", .. }));
    }

    // ── KS ──────────────────────────────────────────────────────

    #[test]
    fn ks_critical_value_for_n_1000() {
        let pair = pair_from_counts(benford_counts(1000));
        assert_eq!(pair.sample_size(), 1000);
        let result = ks_test(&pair, KsConfidence::P95);
        assert!((result.critical_value - 1.36 / 1000f64.sqrt()).abs() < 1e-12);
        assert!((result.critical_value - 0.043).abs() < 1e-3);
        assert!(!result.significant);
        assert_eq!(
            result.interpretation,
            "Not significantly different from Benford's Law at 95% confidence"
        );
    }

    #[test]
    fn ks_statistic_is_max_cdf_gap() {
        let result = ks_test(&all_ones(100), KsConfidence::P99);
        assert!((result.statistic - (1.0 - 2f64.log10())).abs() < 1e-12);
        assert!((result.critical_value - 0.163).abs() < 1e-12);
        assert!(result.significant);
        assert_eq!(
            result.interpretation,
            "Significantly different from Benford's Law at 99% confidence"
        );
    }

    #[test]
    fn ks_multiplier_table() {
        let pair = pair_from_counts(benford_counts(1000));
        let root_n = (pair.sample_size() as f64).sqrt();
        let c90 = ks_test(&pair, KsConfidence::P90).critical_value;
        let c99 = ks_test(&pair, KsConfidence::P99).critical_value;
        assert!((c90 - 1.22 / root_n).abs() < 1e-12);
        assert!((c99 - 1.63 / root_n).abs() < 1e-12);
        assert!(ks_test(&pair, KsConfidence::P90)
            .interpretation
            .ends_with("at 90% confidence"));
    }

    #[test]
    fn ks_critical_value_uses_actual_sample_size() {
        // 101 values, not a round number
        let pair = pair_from_counts([30, 18, 12, 10, 8, 7, 6, 5, 5]);
        assert_eq!(pair.sample_size(), 101);
        let c90 = ks_test(&pair, KsConfidence::P90).critical_value;
        assert!((c90 - 1.22 / 101f64.sqrt()).abs() < 1e-12);
    }

    // ── MAD ─────────────────────────────────────────────────────

    #[test]
    fn mad_bands() {
        assert_eq!(Conformity::from_mad(0.005), Conformity::Low);
        assert_eq!(Conformity::from_mad(0.010), Conformity::Acceptable);
        assert_eq!(Conformity::from_mad(0.013), Conformity::Marginal);
        assert_eq!(Conformity::from_mad(0.02), Conformity::High);
        assert_eq!(Conformity::from_mad(0.015), Conformity::High);
        assert_eq!(Conformity::from_mad(0.006), Conformity::Acceptable);
        assert_eq!(Conformity::from_mad(0.012), Conformity::Marginal);
    }

    #[test]
    fn mad_labels() {
        assert_eq!(Conformity::Low.label(), "Low Dispersion");
        assert_eq!(Conformity::Acceptable.to_string(), "Acceptable Dispersion");
        assert!(Conformity::Marginal.description().starts_with("Marginal Dispersion"));
        assert!(Conformity::High.description().contains("anomalies"));
    }

    #[test]
    fn mad_of_benford_sample_is_low() {
        let result = mean_absolute_deviation(&pair_from_counts(benford_counts(10_000)));
        assert!(result.mad < 1e-4);
        assert_eq!(result.conformity, Conformity::Low);
        assert!(result
            .interpretation
            .starts_with("MAD = 0.0000"));
        assert!(result.interpretation.contains("low dispersion: indicates a very close fit"));
    }

    #[test]
    fn mad_of_single_digit_sample() {
        let result = mean_absolute_deviation(&all_ones(50));
        let expected = 2.0 * (1.0 - 2f64.log10()) / 9.0;
        assert!((result.mad - expected).abs() < 1e-12);
        assert_eq!(result.conformity, Conformity::High);
        assert_eq!(
            result.interpretation,
            format!(
                "MAD = {expected:.6} indicates {}",
                Conformity::High.description().to_lowercase()
            )
        );
    }
}
