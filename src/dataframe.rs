//! Column-major table model consumed by the analyzer.
//!
//! A [`DataFrame`] holds named, equally long columns. Missing entries are
//! tracked by a packed [`ValidityBitmap`] rather than sentinel values, so
//! a null is always distinguishable from a genuine `0.0`.
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Values under analysis |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Series labels |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | Identifiers, free text |
//!
//! ```
//! use u_benford::dataframe::{Column, DataFrame};
//!
//! let mut df = DataFrame::new();
//! df.add_column(
//!     "revenue".to_string(),
//!     Column::from_options(vec![Some(1200.0), None, Some(310.5)]),
//! ).unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_by_name("revenue").unwrap().null_count(), 1);
//! ```

use crate::error::BenfordError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// One bit per row: 1 = present, 0 = null.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    words: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let mut words = vec![u64::MAX; len.div_ceil(64)];
        if let Some(last) = words.last_mut() {
            let tail = len % 64;
            if tail != 0 {
                *last = (1u64 << tail) - 1;
            }
        }
        Self { words, len }
    }

    /// Creates a bitmap where all `len` positions are null.
    pub fn all_invalid(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Builds a bitmap from per-row presence flags.
    pub fn from_flags(flags: &[bool]) -> Self {
        let mut bitmap = Self::all_invalid(flags.len());
        for (idx, &valid) in flags.iter().enumerate() {
            if valid {
                bitmap.set_valid(idx);
            }
        }
        bitmap
    }

    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "row {idx} out of bounds (len={})", self.len);
        (self.words[idx / 64] >> (idx % 64)) & 1 == 1
    }

    #[inline]
    pub fn set_valid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "row {idx} out of bounds (len={})", self.len);
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    #[inline]
    pub fn set_invalid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "row {idx} out of bounds (len={})", self.len);
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Appends one row.
    pub fn push(&mut self, valid: bool) {
        if self.len % 64 == 0 {
            self.words.push(0);
        }
        self.len += 1;
        if valid {
            self.set_valid(self.len - 1);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts null rows.
    pub fn null_count(&self) -> usize {
        self.len - self.valid_count()
    }

    /// Counts present rows.
    pub fn valid_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Numeric,
    Categorical,
    Text,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "Numeric"),
            Self::Categorical => write!(f, "Categorical"),
            Self::Text => write!(f, "Text"),
        }
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column. Values at null positions are placeholders and must be
/// read through [`Column::numeric_at`] / [`Column::category_at`] /
/// [`Column::text_at`], which consult the validity bitmap.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values. Null positions hold `0.0`.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded labels. Null positions hold index `0`.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    /// Free-form text. Null positions hold an empty string.
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

/// Fails with [`BenfordError::DimensionMismatch`] unless `validity` covers
/// exactly `len` rows.
fn check_len(validity: &ValidityBitmap, len: usize) -> Result<(), BenfordError> {
    if validity.len() == len {
        Ok(())
    } else {
        Err(BenfordError::DimensionMismatch {
            expected: validity.len(),
            actual: len,
        })
    }
}

impl Column {
    /// Numeric column; `values` and `validity` must have the same length.
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Result<Self, BenfordError> {
        check_len(&validity, values.len())?;
        Ok(Self::Numeric { values, validity })
    }

    /// Numeric column from optional values; `None` becomes a null row.
    pub fn from_options(values: Vec<Option<f64>>) -> Self {
        let flags: Vec<bool> = values.iter().map(Option::is_some).collect();
        Self::Numeric {
            values: values.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
            validity: ValidityBitmap::from_flags(&flags),
        }
    }

    /// Dictionary-encoded column. Every valid index must point into
    /// `dictionary`.
    pub fn categorical(
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    ) -> Result<Self, BenfordError> {
        check_len(&validity, indices.len())?;
        if let Some(&bad) = indices
            .iter()
            .enumerate()
            .find(|&(row, &idx)| validity.is_valid(row) && idx as usize >= dictionary.len())
            .map(|(_, idx)| idx)
        {
            return Err(BenfordError::DimensionMismatch {
                expected: dictionary.len(),
                actual: bad as usize + 1,
            });
        }
        Ok(Self::Categorical {
            dictionary,
            indices,
            validity,
        })
    }

    /// Categorical column from labels, dictionary built in first-seen order.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut dictionary: Vec<String> = Vec::new();
        let mut indices = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            let idx = match dictionary.iter().position(|d| d == label) {
                Some(i) => i,
                None => {
                    dictionary.push(label.to_string());
                    dictionary.len() - 1
                }
            };
            indices.push(idx as u32);
        }
        Self::Categorical {
            dictionary,
            indices,
            validity: ValidityBitmap::all_valid(labels.len()),
        }
    }

    /// Text column; `values` and `validity` must have the same length.
    pub fn text(values: Vec<String>, validity: ValidityBitmap) -> Result<Self, BenfordError> {
        check_len(&validity, values.len())?;
        Ok(Self::Text { values, validity })
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
        }
    }

    pub fn len(&self) -> usize {
        self.validity().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    /// Numeric value at `idx`, `None` for null rows or non-numeric columns.
    pub fn numeric_at(&self, idx: usize) -> Option<f64> {
        match self {
            Self::Numeric { values, validity } if validity.is_valid(idx) => Some(values[idx]),
            _ => None,
        }
    }

    /// Every row of a numeric column, nulls as `None`.
    ///
    /// Returns `None` for non-numeric columns.
    pub fn numeric_entries(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Self::Numeric { .. } => Some((0..self.len()).map(|i| self.numeric_at(i)).collect()),
            _ => None,
        }
    }

    pub fn category_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } if validity.is_valid(idx) => {
                dictionary.get(indices[idx] as usize).map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn text_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Text { values, validity } if validity.is_valid(idx) => Some(&values[idx]),
            _ => None,
        }
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named column.
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn add_column(&mut self, name: String, column: Column) -> Result<(), BenfordError> {
        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(BenfordError::DimensionMismatch {
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Looks up a column, failing with [`BenfordError::FieldNotFound`]
    /// (listing the available columns) when absent.
    pub fn require_column(&self, name: &str) -> Result<&Column, BenfordError> {
        self.column_by_name(name)
            .ok_or_else(|| BenfordError::FieldNotFound {
                field: name.to_string(),
                available: self.names.clone(),
            })
    }

    /// Returns (name, type) pairs in column order.
    pub fn schema(&self) -> Vec<(&str, DataType)> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, col)| (name.as_str(), col.data_type()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_tail_word_is_masked() {
        let bm = ValidityBitmap::all_valid(65);
        assert_eq!(bm.words.len(), 2);
        assert_eq!(bm.valid_count(), 65);
        assert!(bm.is_valid(64));
    }

    #[test]
    fn bitmap_push_across_word_boundary() {
        let mut bm = ValidityBitmap::all_invalid(0);
        for i in 0..130 {
            bm.push(i % 4 != 0);
        }
        assert_eq!(bm.len(), 130);
        assert_eq!(bm.null_count(), (0..130).filter(|i| i % 4 == 0).count());
        assert!(!bm.is_valid(128));
        assert!(bm.is_valid(129));
    }

    #[test]
    fn bitmap_from_flags() {
        let mut bm = ValidityBitmap::from_flags(&[true, false, true]);
        assert_eq!(bm.null_count(), 1);
        bm.set_invalid(0);
        assert!(!bm.is_valid(0));
        assert_eq!(bm.valid_count(), 1);
    }

    #[test]
    fn numeric_nulls_are_not_zero() {
        let col = Column::from_options(vec![Some(0.0), None, Some(4.5)]);
        assert_eq!(col.numeric_at(0), Some(0.0));
        assert_eq!(col.numeric_at(1), None);
        assert_eq!(
            col.numeric_entries().unwrap(),
            vec![Some(0.0), None, Some(4.5)]
        );
    }

    #[test]
    fn labels_are_dictionary_encoded() {
        let col = Column::from_labels(&["Observed", "Observed", "Theoretical"]);
        assert_eq!(col.data_type(), DataType::Categorical);
        match &col {
            Column::Categorical { dictionary, .. } => assert_eq!(dictionary.len(), 2),
            _ => unreachable!(),
        }
        assert_eq!(col.category_at(2), Some("Theoretical"));
        assert!(col.numeric_entries().is_none());
    }

    #[test]
    fn text_null_reads_none() {
        let col = Column::text(
            vec![String::new(), "AAPL".into()],
            ValidityBitmap::from_flags(&[false, true]),
        )
        .unwrap();
        assert_eq!(col.text_at(0), None);
        assert_eq!(col.text_at(1), Some("AAPL"));
    }

    #[test]
    fn constructors_check_validity_length() {
        let err = Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(2)).unwrap_err();
        assert_eq!(
            err,
            BenfordError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert!(Column::text(vec!["a".into()], ValidityBitmap::all_valid(2)).is_err());

        let col = Column::numeric(vec![4.0, 0.0], ValidityBitmap::from_flags(&[true, false]))
            .unwrap();
        assert_eq!(col.numeric_entries(), Some(vec![Some(4.0), None]));
    }

    #[test]
    fn categorical_from_parts() {
        let dictionary = vec!["Observed".to_string(), "Theoretical".to_string()];
        let col = Column::categorical(
            dictionary.clone(),
            vec![1, 0, 0],
            ValidityBitmap::from_flags(&[true, true, false]),
        )
        .unwrap();
        assert_eq!(col.data_type(), DataType::Categorical);
        assert_eq!(col.category_at(0), Some("Theoretical"));
        assert_eq!(col.category_at(2), None);

        // index 2 on a valid row points past the dictionary
        assert!(Column::categorical(dictionary, vec![0, 2], ValidityBitmap::all_valid(2)).is_err());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut df = DataFrame::new();
        df.add_column("a".into(), Column::from_options(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        let err = df
            .add_column("b".into(), Column::from_options(vec![Some(1.0)]))
            .unwrap_err();
        assert_eq!(
            err,
            BenfordError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn require_column_names_missing_field() {
        let mut df = DataFrame::new();
        df.add_column("price".into(), Column::from_options(vec![Some(1.0)]))
            .unwrap();
        df.add_column("volume".into(), Column::from_options(vec![Some(2.0)]))
            .unwrap();

        assert!(df.require_column("price").is_ok());
        match df.require_column("market_cap") {
            Err(BenfordError::FieldNotFound { field, available }) => {
                assert_eq!(field, "market_cap");
                assert_eq!(available, vec!["price", "volume"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn schema_in_column_order() {
        let mut df = DataFrame::new();
        df.add_column("x".into(), Column::from_options(vec![Some(1.0)]))
            .unwrap();
        df.add_column("kind".into(), Column::from_labels(&["a"]))
            .unwrap();
        assert_eq!(
            df.schema(),
            vec![("x", DataType::Numeric), ("kind", DataType::Categorical)]
        );
    }
}
