//! # u-benford
//!
//! Benford's Law conformity analysis for tabular numeric data, with C FFI bindings.
//!
//! Given a column of numbers, u-benford extracts each value's leading digit,
//! compares the resulting digit distribution with Benford's
//! `P(d) = log10(1 + 1/d)` and reports whether the data likely follows it.
//! Three tests vote: chi-square goodness of fit, Kolmogorov-Smirnov and
//! Mean Absolute Deviation.
//!
//! ## Modules
//!
//! - [`dataframe`]: Column-major tabular data model (DataFrame, Column, DataType)
//! - [`csv_parser`]: CSV parsing with numeric/text type inference
//! - [`digits`]: Leading-digit extraction
//! - [`distribution`]: Theoretical and observed digit distributions, plot table
//! - [`testing`]: Chi-square, KS and MAD conformity tests
//! - [`analyzer`]: Single-field and batch analysis, stateful analyzer
//! - [`ffi`]: C FFI bindings (auto-generated C header via cbindgen)
//! - [`error`]: Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_benford::analyzer::{analyze_field, BenfordConfig};
//! use u_benford::csv_parser::CsvParser;
//!
//! let csv = "invoice,amount\nA,120.5\nB,1830\nC,0.042\nD,NA\nE,0\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//!
//! let report = analyze_field(&df, "amount", &BenfordConfig::default()).unwrap();
//! assert_eq!(report.total_values, 5);
//! assert_eq!(report.valid_values, 3); // NA and 0 have no leading digit
//! assert_eq!(report.observed().count(1), 2);
//! assert_eq!(report.observed().count(4), 1);
//! ```

pub mod analyzer;
pub mod csv_parser;
pub mod dataframe;
pub mod digits;
pub mod distribution;
pub mod error;
pub mod ffi;
pub mod testing;
