//! Benford's Law conformity analysis of table columns.
//!
//! [`analyze_field`] runs the whole pipeline for one column and returns a
//! self-contained [`AnalysisReport`]:
//!
//! 1. look up the column, keep nonzero, non-null finite values
//! 2. take each value's leading digit
//! 3. build the observed digit distribution
//! 4. run chi-square, KS and MAD against Benford's distribution
//! 5. combine them into a majority-vote [`Verdict`]
//!
//! [`batch_analyze`] repeats this per column and isolates failures.
//! [`BenfordAnalyzer`] wraps the same pipeline and remembers the last
//! successful analysis so its tests can be re-run at other thresholds.
//!
//! ```
//! use u_benford::analyzer::{analyze_field, BenfordConfig, Verdict};
//! use u_benford::dataframe::{Column, DataFrame};
//!
//! let values: Vec<Option<f64>> = (1..=999).map(|i| Some(f64::from(i) * 1.5)).collect();
//! let mut df = DataFrame::new();
//! df.add_column("amount".to_string(), Column::from_options(values)).unwrap();
//!
//! let report = analyze_field(&df, "amount", &BenfordConfig::default()).unwrap();
//! assert_eq!(report.valid_values, 999);
//! assert!((report.observed().proportions().iter().sum::<f64>() - 1.0).abs() < 1e-9);
//! assert!(matches!(report.verdict, Verdict::Follows | Verdict::DoesNotFollow));
//! ```

use tracing::{error, info, instrument};

use crate::dataframe::DataFrame;
use crate::digits::{extract_leading_digits, DigitSample};
use crate::distribution::{DigitDistribution, DistributionPair, PlotTable, TheoreticalDistribution};
use crate::error::BenfordError;
use crate::testing::{
    chi_square_test, ks_test, mean_absolute_deviation, ChiSquareResult, KsConfidence, KsResult,
    MadResult, MAD_NONCONFORMITY_THRESHOLD,
};

// ── Configuration ───────────────────────────────────────────────────

/// Thresholds for one analysis.
///
/// The two hypothesis tests are parameterized independently; the MAD
/// bands are fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenfordConfig {
    /// Chi-square significance level, in (0, 1). Default: 0.05.
    pub alpha: f64,
    /// KS confidence level: 0.90, 0.95 or 0.99. Default: 0.95.
    pub ks_confidence: f64,
}

impl Default for BenfordConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            ks_confidence: 0.95,
        }
    }
}

impl BenfordConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_ks_confidence(mut self, confidence: f64) -> Self {
        self.ks_confidence = confidence;
        self
    }

    /// Checks both thresholds and resolves the KS confidence level.
    pub fn validate(&self) -> Result<KsConfidence, BenfordError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(BenfordError::InvalidAlpha { value: self.alpha });
        }
        KsConfidence::try_from(self.ks_confidence)
    }
}

// ── Report ──────────────────────────────────────────────────────────

/// Majority-vote outcome over the three tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least two of: chi-square not significant, KS not significant, MAD < 0.015.
    Follows,
    DoesNotFollow,
}

/// Complete result of analyzing one column.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub field_name: String,
    /// Rows in the column, nulls included.
    pub total_values: usize,
    /// Values that yielded a leading digit.
    pub valid_values: usize,
    pub distributions: DistributionPair,
    pub chi_square: ChiSquareResult,
    pub ks_test: KsResult,
    pub mad: MadResult,
    /// How many of the three tests favored conformity (0-3).
    pub favorable_tests: usize,
    pub verdict: Verdict,
    pub summary: String,
}

impl AnalysisReport {
    pub fn theoretical(&self) -> &TheoreticalDistribution {
        &self.distributions.theoretical
    }

    pub fn observed(&self) -> &DigitDistribution {
        &self.distributions.observed
    }

    /// Observed-vs-theoretical table for a grouped bar chart.
    pub fn plot_table(&self) -> Result<PlotTable, BenfordError> {
        PlotTable::build(&self.field_name, self.observed(), self.theoretical())
    }
}

/// Counts favorable tests and phrases the verdict.
///
/// ```
/// use u_benford::analyzer::{summarize, Verdict};
/// # use u_benford::distribution::{DigitDistribution, DistributionPair, TheoreticalDistribution};
/// # use u_benford::testing::{chi_square_test, ks_test, mean_absolute_deviation, KsConfidence};
/// # let pair = DistributionPair::new(
/// #     TheoreticalDistribution::new(),
/// #     DigitDistribution::from_counts([301, 176, 125, 97, 79, 67, 58, 51, 46]),
/// # );
/// # let chi = chi_square_test(&pair, 0.05).unwrap();
/// # let ks = ks_test(&pair, KsConfidence::P95);
/// # let mad = mean_absolute_deviation(&pair);
/// let (favorable, verdict, summary) = summarize(&chi, &ks, &mad);
/// assert_eq!(favorable, 3);
/// assert_eq!(verdict, Verdict::Follows);
/// assert_eq!(summary, "The data likely follows Benford's Law. Low Dispersion detected.");
/// ```
pub fn summarize(
    chi_square: &ChiSquareResult,
    ks: &KsResult,
    mad: &MadResult,
) -> (usize, Verdict, String) {
    let favorable = [
        !chi_square.significant,
        !ks.significant,
        mad.mad < MAD_NONCONFORMITY_THRESHOLD,
    ]
    .iter()
    .filter(|&&ok| ok)
    .count();

    if favorable >= 2 {
        (
            favorable,
            Verdict::Follows,
            format!(
                "The data likely follows Benford's Law. {} detected.",
                mad.conformity.label()
            ),
        )
    } else {
        (
            favorable,
            Verdict::DoesNotFollow,
            "The data likely does not follow Benford's Law. Multiple tests indicate deviation."
                .to_string(),
        )
    }
}

// ── Pipeline ────────────────────────────────────────────────────────

/// Extracts the leading-digit sample of `field`.
fn sample_field(table: &DataFrame, field: &str) -> Result<DigitSample, BenfordError> {
    let column = table.require_column(field)?;
    let entries = column
        .numeric_entries()
        .ok_or_else(|| BenfordError::NonNumericColumn {
            column: field.to_string(),
        })?;
    let sample = extract_leading_digits(&entries);
    if sample.is_empty() {
        return Err(BenfordError::NoValidData {
            field: field.to_string(),
        });
    }
    Ok(sample)
}

/// Output of one pipeline run: the pieces a [`BenfordAnalyzer`] keeps
/// plus the report handed to the caller.
struct PipelineRun {
    sample: DigitSample,
    pair: DistributionPair,
    report: AnalysisReport,
}

/// Validates `config`, samples `field` and runs the three tests.
fn run_pipeline(
    table: &DataFrame,
    field: &str,
    config: &BenfordConfig,
    theoretical: TheoreticalDistribution,
) -> Result<PipelineRun, BenfordError> {
    let confidence = config.validate()?;
    let sample = sample_field(table, field)?;
    let pair = DistributionPair::new(theoretical, DigitDistribution::from_digits(sample.digits()));
    let report = build_report(field, &sample, pair, config.alpha, confidence)?;
    Ok(PipelineRun {
        sample,
        pair,
        report,
    })
}

fn build_report(
    field: &str,
    sample: &DigitSample,
    pair: DistributionPair,
    alpha: f64,
    confidence: KsConfidence,
) -> Result<AnalysisReport, BenfordError> {
    let chi_square = chi_square_test(&pair, alpha)?;
    let ks = ks_test(&pair, confidence);
    let mad = mean_absolute_deviation(&pair);
    let (favorable_tests, verdict, summary) = summarize(&chi_square, &ks, &mad);

    Ok(AnalysisReport {
        field_name: field.to_string(),
        total_values: sample.total(),
        valid_values: sample.len(),
        distributions: pair,
        chi_square,
        ks_test: ks,
        mad,
        favorable_tests,
        verdict,
        summary,
    })
}

/// Analyzes one numeric column for conformity with Benford's Law.
///
/// # Errors
///
/// - [`BenfordError::InvalidAlpha`] / [`BenfordError::InvalidConfidenceLevel`] for bad thresholds
/// - [`BenfordError::FieldNotFound`] if `field` is not a column of `table`
/// - [`BenfordError::NonNumericColumn`] if the column is not numeric
/// - [`BenfordError::NoValidData`] if no value has a leading digit
#[instrument(skip(table))]
pub fn analyze_field(
    table: &DataFrame,
    field: &str,
    config: &BenfordConfig,
) -> Result<AnalysisReport, BenfordError> {
    run_pipeline(table, field, config, TheoreticalDistribution::new()).map(|run| run.report)
}

// ── Batch ───────────────────────────────────────────────────────────

/// A field whose analysis failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    /// Display form of `error`.
    pub message: String,
    pub error: BenfordError,
}

impl From<BenfordError> for ErrorRecord {
    fn from(error: BenfordError) -> Self {
        Self {
            message: error.to_string(),
            error,
        }
    }
}

/// Per-field result of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Report(Box<AnalysisReport>),
    Error(ErrorRecord),
}

impl FieldOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Report(r) => Some(r),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Report(_) => None,
            Self::Error(e) => Some(e),
        }
    }
}

impl From<Result<AnalysisReport, BenfordError>> for FieldOutcome {
    fn from(result: Result<AnalysisReport, BenfordError>) -> Self {
        match result {
            Ok(report) => Self::Report(Box::new(report)),
            Err(e) => Self::Error(e.into()),
        }
    }
}

/// Outcomes of a batch, one entry per requested field in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    entries: Vec<(String, FieldOutcome)>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcome of the first entry for `field`.
    pub fn get(&self, field: &str) -> Option<&FieldOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldOutcome)> {
        self.entries.iter().map(|(name, o)| (name.as_str(), o))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Successful reports, in request order.
    pub fn reports(&self) -> impl Iterator<Item = &AnalysisReport> {
        self.entries.iter().filter_map(|(_, o)| o.report())
    }

    /// Failed fields and their errors, in request order.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &ErrorRecord)> {
        self.entries
            .iter()
            .filter_map(|(name, o)| o.error().map(|e| (name.as_str(), e)))
    }

    pub fn into_entries(self) -> Vec<(String, FieldOutcome)> {
        self.entries
    }
}

/// Runs one batch entry, logging its start and any failure.
fn analyze_logged<F>(field: &str, analyze: F) -> FieldOutcome
where
    F: FnOnce(&str) -> Result<AnalysisReport, BenfordError>,
{
    info!(field, "analyzing field");
    let result = analyze(field);
    if let Err(e) = &result {
        error!(field, error = %e, "error analyzing field");
    }
    result.into()
}

/// Analyzes several columns; a failing column becomes an [`ErrorRecord`]
/// and the remaining columns still run.
pub fn batch_analyze<S: AsRef<str>>(
    table: &DataFrame,
    fields: &[S],
    config: &BenfordConfig,
) -> BatchReport {
    let entries = fields
        .iter()
        .map(|f| {
            let field = f.as_ref();
            let outcome = analyze_logged(field, |name| analyze_field(table, name, config));
            (field.to_string(), outcome)
        })
        .collect();
    BatchReport { entries }
}

/// [`batch_analyze`] on the rayon thread pool. Output is identical.
#[cfg(feature = "parallel")]
pub fn batch_analyze_par<S: AsRef<str> + Sync>(
    table: &DataFrame,
    fields: &[S],
    config: &BenfordConfig,
) -> BatchReport {
    use rayon::prelude::*;

    let entries = fields
        .par_iter()
        .map(|f| {
            let field = f.as_ref();
            let outcome = analyze_logged(field, |name| analyze_field(table, name, config));
            (field.to_string(), outcome)
        })
        .collect();
    BatchReport { entries }
}

// ── Stateful analyzer ───────────────────────────────────────────────

/// State of the last successful analysis.
#[derive(Debug, Clone)]
struct CurrentAnalysis {
    field: String,
    sample: DigitSample,
    pair: DistributionPair,
}

/// Analyzer holding Benford's distribution and the last successful analysis.
///
/// `analyze` takes `&mut self`, so an instance cannot serve two analyses
/// at once; for concurrent work use one instance per task or the free
/// functions. A failed `analyze` leaves the previous state in place.
#[derive(Debug, Clone, Default)]
pub struct BenfordAnalyzer {
    theoretical: TheoreticalDistribution,
    current: Option<CurrentAnalysis>,
}

impl BenfordAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theoretical(&self) -> &TheoreticalDistribution {
        &self.theoretical
    }

    /// Analyzes `field` and makes it the current analysis.
    #[instrument(skip(self, table))]
    pub fn analyze(
        &mut self,
        table: &DataFrame,
        field: &str,
        config: &BenfordConfig,
    ) -> Result<AnalysisReport, BenfordError> {
        let run = run_pipeline(table, field, config, self.theoretical)?;
        self.current = Some(CurrentAnalysis {
            field: field.to_string(),
            sample: run.sample,
            pair: run.pair,
        });
        Ok(run.report)
    }

    /// Runs [`batch_analyze`] through this instance; the last field that
    /// succeeded becomes the current analysis.
    pub fn batch_analyze<S: AsRef<str>>(
        &mut self,
        table: &DataFrame,
        fields: &[S],
        config: &BenfordConfig,
    ) -> BatchReport {
        let entries = fields
            .iter()
            .map(|f| {
                let field = f.as_ref();
                let outcome = analyze_logged(field, |name| self.analyze(table, name, config));
                (field.to_string(), outcome)
            })
            .collect();
        BatchReport { entries }
    }

    fn current(&self) -> Result<&CurrentAnalysis, BenfordError> {
        self.current.as_ref().ok_or(BenfordError::NotAnalyzed)
    }

    /// Field of the current analysis.
    pub fn field_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.field.as_str())
    }

    /// Digit sample of the current analysis.
    pub fn valid_sample(&self) -> Option<&DigitSample> {
        self.current.as_ref().map(|c| &c.sample)
    }

    /// Distributions of the current analysis.
    pub fn distributions(&self) -> Result<&DistributionPair, BenfordError> {
        self.current().map(|c| &c.pair)
    }

    pub fn chi_square_test(&self, alpha: f64) -> Result<ChiSquareResult, BenfordError> {
        chi_square_test(&self.current()?.pair, alpha)
    }

    pub fn ks_test(&self, confidence: f64) -> Result<KsResult, BenfordError> {
        let pair = &self.current()?.pair;
        Ok(ks_test(pair, KsConfidence::try_from(confidence)?))
    }

    pub fn mean_absolute_deviation(&self) -> Result<MadResult, BenfordError> {
        Ok(mean_absolute_deviation(&self.current()?.pair))
    }

    /// Plot table of the current analysis.
    pub fn plot_table(&self) -> Result<PlotTable, BenfordError> {
        let current = self.current()?;
        PlotTable::build(&current.field, &current.pair.observed, &self.theoretical)
    }
}
