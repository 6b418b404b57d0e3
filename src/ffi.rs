//! C FFI bindings for u-benford.
//!
//! # Design
//!
//! - **Opaque handle**: `*mut BenfordContext` owns a parsed table and the last report
//! - **`#[repr(C)]`**: [`CBenfordResult`] carries every number of a report
//! - **Integer error codes**: 0 = success, negative = error
//! - **Thread-local error message**: `benford_last_error()`
//! - **`catch_unwind`**: no panic crosses the FFI boundary
//!
//! Strings returned by the library are freed with `benford_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic;
use std::ptr;
use std::slice;

use crate::analyzer::{analyze_field, AnalysisReport, BenfordConfig, Verdict};
use crate::csv_parser::CsvParser;
use crate::dataframe::{Column, DataFrame};
use crate::distribution::N_DIGITS;
use crate::error::BenfordError;
use crate::testing::Conformity;

// ── Error handling ────────────────────────────────────────────────────

pub const BENFORD_OK: i32 = 0;
pub const BENFORD_ERR_NULL_PTR: i32 = -1;
pub const BENFORD_ERR_INVALID_INPUT: i32 = -2;
pub const BENFORD_ERR_PARSE_FAILED: i32 = -3;
pub const BENFORD_ERR_ANALYSIS_FAILED: i32 = -4;
pub const BENFORD_ERR_PANIC: i32 = -99;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

fn error_code(err: &BenfordError) -> i32 {
    match err {
        BenfordError::InvalidAlpha { .. } | BenfordError::InvalidConfidenceLevel { .. } => {
            BENFORD_ERR_INVALID_INPUT
        }
        BenfordError::CsvParse { .. } | BenfordError::Io(_) => BENFORD_ERR_PARSE_FAILED,
        _ => BENFORD_ERR_ANALYSIS_FAILED,
    }
}

/// Returns the last error message on this thread, or null.
///
/// # Safety
/// The caller must not free the returned pointer. It stays valid until the
/// next failing call on this thread.
#[no_mangle]
pub extern "C" fn benford_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| match cell.borrow().as_ref() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

#[no_mangle]
pub extern "C" fn benford_clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Library version, a static string. Do not free.
#[no_mangle]
pub extern "C" fn benford_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Runs `body` behind `catch_unwind`, mapping a panic to `BENFORD_ERR_PANIC`.
fn guarded<F: FnOnce() -> i32 + panic::UnwindSafe>(name: &str, body: F) -> i32 {
    panic::catch_unwind(body).unwrap_or_else(|_| {
        set_last_error(&format!("panic in {name}"));
        BENFORD_ERR_PANIC
    })
}

/// Reads a C string argument.
///
/// # Safety
/// `s` must be null or a valid null-terminated string.
unsafe fn read_str<'a>(s: *const c_char, what: &str) -> Result<&'a str, i32> {
    if s.is_null() {
        set_last_error(&format!("null {what} pointer"));
        return Err(BENFORD_ERR_NULL_PTR);
    }
    unsafe { CStr::from_ptr(s) }.to_str().map_err(|e| {
        set_last_error(&format!("invalid UTF-8 in {what}: {e}"));
        BENFORD_ERR_INVALID_INPUT
    })
}

// ── Result struct ─────────────────────────────────────────────────────

/// C-compatible Benford analysis result.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CBenfordResult {
    /// Rows in the analyzed column, nulls included.
    pub total_values: u64,
    /// Values that yielded a leading digit.
    pub valid_values: u64,
    /// Observed proportion of leading digits 1..9 (index 0 = digit 1).
    pub observed: [f64; N_DIGITS],
    /// Benford proportion of leading digits 1..9.
    pub theoretical: [f64; N_DIGITS],
    pub chi_square_statistic: f64,
    pub chi_square_p_value: f64,
    /// 1 if chi-square rejects conformity.
    pub chi_square_significant: i32,
    pub ks_statistic: f64,
    pub ks_critical_value: f64,
    /// 1 if KS rejects conformity.
    pub ks_significant: i32,
    pub mad: f64,
    /// 0=Low, 1=Acceptable, 2=Marginal, 3=High dispersion.
    pub conformity: u32,
    /// Number of tests favoring conformity (0-3).
    pub favorable_tests: u32,
    /// 1 if the data likely follows Benford's Law.
    pub follows: i32,
}

impl CBenfordResult {
    fn zeroed() -> Self {
        Self {
            total_values: 0,
            valid_values: 0,
            observed: [0.0; N_DIGITS],
            theoretical: [0.0; N_DIGITS],
            chi_square_statistic: 0.0,
            chi_square_p_value: 0.0,
            chi_square_significant: 0,
            ks_statistic: 0.0,
            ks_critical_value: 0.0,
            ks_significant: 0,
            mad: 0.0,
            conformity: 0,
            favorable_tests: 0,
            follows: 0,
        }
    }
}

impl From<&AnalysisReport> for CBenfordResult {
    fn from(r: &AnalysisReport) -> Self {
        Self {
            total_values: r.total_values as u64,
            valid_values: r.valid_values as u64,
            observed: *r.observed().proportions(),
            theoretical: *r.theoretical().probabilities(),
            chi_square_statistic: r.chi_square.statistic,
            chi_square_p_value: r.chi_square.p_value,
            chi_square_significant: i32::from(r.chi_square.significant),
            ks_statistic: r.ks_test.statistic,
            ks_critical_value: r.ks_test.critical_value,
            ks_significant: i32::from(r.ks_test.significant),
            mad: r.mad.mad,
            conformity: match r.mad.conformity {
                Conformity::Low => 0,
                Conformity::Acceptable => 1,
                Conformity::Marginal => 2,
                Conformity::High => 3,
            },
            favorable_tests: r.favorable_tests as u32,
            follows: i32::from(r.verdict == Verdict::Follows),
        }
    }
}

// ── Context (opaque handle) ──────────────────────────────────────────

/// Opaque handle: a parsed table plus the last successful report.
pub struct BenfordContext {
    table: DataFrame,
    last_report: Option<AnalysisReport>,
}

/// Parses a CSV string into a new context.
///
/// Returns null on failure; see `benford_last_error`.
///
/// # Safety
/// - `csv_data` must be a valid null-terminated UTF-8 string.
/// - The handle must be freed with `benford_context_free`.
#[no_mangle]
pub unsafe extern "C" fn benford_context_from_csv(csv_data: *const c_char) -> *mut BenfordContext {
    let result = panic::catch_unwind(|| {
        let csv = match unsafe { read_str(csv_data, "csv_data") } {
            Ok(s) => s,
            Err(_) => return ptr::null_mut(),
        };
        match CsvParser::new().parse_str(csv) {
            Ok(table) => Box::into_raw(Box::new(BenfordContext {
                table,
                last_report: None,
            })),
            Err(e) => {
                set_last_error(&format!("CSV parse error: {e}"));
                ptr::null_mut()
            }
        }
    });
    result.unwrap_or_else(|_| {
        set_last_error("panic in benford_context_from_csv");
        ptr::null_mut()
    })
}

/// Frees a context. Null is ignored.
///
/// # Safety
/// `ctx` must come from `benford_context_from_csv` and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn benford_context_free(ctx: *mut BenfordContext) {
    if !ctx.is_null() {
        drop(unsafe { Box::from_raw(ctx) });
    }
}

/// Number of rows in the context's table, or -1 for a null handle.
///
/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn benford_context_row_count(ctx: *const BenfordContext) -> i64 {
    match unsafe { ctx.as_ref() } {
        Some(c) => c.table.row_count() as i64,
        None => -1,
    }
}

/// Analyzes column `field` of the context's table.
///
/// # Safety
/// - `ctx` must be a live handle; `field` a valid null-terminated string.
/// - `out` must point to a writable `CBenfordResult`.
#[no_mangle]
pub unsafe extern "C" fn benford_analyze(
    ctx: *mut BenfordContext,
    field: *const c_char,
    alpha: f64,
    ks_confidence: f64,
    out: *mut CBenfordResult,
) -> i32 {
    let ctx = panic::AssertUnwindSafe(ctx);
    let out = panic::AssertUnwindSafe(out);
    guarded("benford_analyze", move || {
        let (ctx, out) = (*ctx, *out);
        if ctx.is_null() || out.is_null() {
            set_last_error("null pointer");
            return BENFORD_ERR_NULL_PTR;
        }
        let field = match unsafe { read_str(field, "field") } {
            Ok(s) => s,
            Err(code) => return code,
        };
        let context = unsafe { &mut *ctx };
        let config = BenfordConfig {
            alpha,
            ks_confidence,
        };
        match analyze_field(&context.table, field, &config) {
            Ok(report) => {
                unsafe { *out = CBenfordResult::from(&report) };
                context.last_report = Some(report);
                BENFORD_OK
            }
            Err(e) => {
                set_last_error(&e.to_string());
                error_code(&e)
            }
        }
    })
}

/// Summary sentence of the context's last successful analysis, or null.
///
/// # Safety
/// `ctx` must be null or a live handle. Free the result with `benford_free_string`.
#[no_mangle]
pub unsafe extern "C" fn benford_summary(ctx: *const BenfordContext) -> *mut c_char {
    let Some(context) = (unsafe { ctx.as_ref() }) else {
        set_last_error("null pointer");
        return ptr::null_mut();
    };
    match &context.last_report {
        Some(report) => CString::new(report.summary.as_str())
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
        None => {
            set_last_error(&BenfordError::NotAnalyzed.to_string());
            ptr::null_mut()
        }
    }
}

/// Frees a string returned by this library. Null is ignored.
///
/// # Safety
/// `s` must come from this library and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn benford_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ── Raw array entry point ────────────────────────────────────────────

/// Analyzes `n` values directly; NaN entries count as nulls.
///
/// # Safety
/// - `data` must point to `n` contiguous f64 values.
/// - `out` must point to a writable `CBenfordResult`.
#[no_mangle]
pub unsafe extern "C" fn benford_analyze_values(
    data: *const f64,
    n: u64,
    alpha: f64,
    ks_confidence: f64,
    out: *mut CBenfordResult,
) -> i32 {
    let data = panic::AssertUnwindSafe(data);
    let out = panic::AssertUnwindSafe(out);
    guarded("benford_analyze_values", move || {
        let (data, out) = (*data, *out);
        if data.is_null() || out.is_null() {
            set_last_error("null pointer");
            return BENFORD_ERR_NULL_PTR;
        }
        let raw = unsafe { slice::from_raw_parts(data, n as usize) };
        let values = raw.iter().map(|v| (!v.is_nan()).then_some(*v)).collect();

        let mut table = DataFrame::new();
        if let Err(e) = table.add_column("values".to_string(), Column::from_options(values)) {
            set_last_error(&e.to_string());
            return error_code(&e);
        }
        let config = BenfordConfig {
            alpha,
            ks_confidence,
        };
        match analyze_field(&table, "values", &config) {
            Ok(report) => {
                unsafe { *out = CBenfordResult::from(&report) };
                BENFORD_OK
            }
            Err(e) => {
                set_last_error(&e.to_string());
                error_code(&e)
            }
        }
    })
}
