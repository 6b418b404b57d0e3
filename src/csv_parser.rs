//! CSV reader producing a [`DataFrame`](crate::dataframe::DataFrame).
//!
//! Columns whose non-null cells all parse as `f64` become
//! [`Numeric`](crate::dataframe::Column::Numeric); anything else is kept
//! as [`Text`](crate::dataframe::Column::Text). Quoted fields, doubled
//! quotes, embedded delimiters/newlines, CRLF endings and a UTF-8 BOM are
//! accepted.
//!
//! ```
//! use u_benford::csv_parser::CsvParser;
//! use u_benford::dataframe::DataType;
//!
//! let csv = "symbol,market_cap\nAAPL,3.4e12\nMSFT,NA\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.schema()[1], ("market_cap", DataType::Numeric));
//! assert_eq!(df.column(1).unwrap().null_count(), 1);
//! ```

use crate::dataframe::{Column, DataFrame, ValidityBitmap};
use crate::error::BenfordError;

/// Cells treated as missing.
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "None", "none", "NaN", "nan", "#N/A",
];

/// A parsed record and the physical line it started on.
struct RawRecord {
    line: usize,
    fields: Vec<String>,
}

/// CSV parser configuration and entry point.
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    has_header: bool,
    null_markers: Vec<String>,
}

impl CsvParser {
    /// Comma delimiter, header row, standard null markers.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Without a header, columns are named `col_0`, `col_1`, ...
    pub fn has_header(mut self, header: bool) -> Self {
        self.has_header = header;
        self
    }

    /// Replaces the default null markers.
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Parses CSV text.
    pub fn parse_str(&self, input: &str) -> Result<DataFrame, BenfordError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let records = self.read_records(input)?;

        let Some(first) = records.first() else {
            return Ok(DataFrame::new());
        };
        let (headers, body) = if self.has_header {
            (first.fields.clone(), &records[1..])
        } else {
            let names = (0..first.fields.len()).map(|i| format!("col_{i}")).collect();
            (names, &records[..])
        };

        let n_cols = headers.len();
        let mut cells: Vec<Vec<&str>> = vec![Vec::with_capacity(body.len()); n_cols];
        for record in body {
            if record.fields.len() != n_cols {
                return Err(BenfordError::CsvParse {
                    line: record.line,
                    message: format!("expected {n_cols} fields, got {}", record.fields.len()),
                });
            }
            for (col, field) in cells.iter_mut().zip(&record.fields) {
                col.push(field.trim());
            }
        }

        let mut df = DataFrame::new();
        for (name, raw) in headers.into_iter().zip(&cells) {
            df.add_column(name, self.build_column(raw)?)?;
        }
        Ok(df)
    }

    /// Reads and parses a CSV file.
    pub fn parse_file(&self, path: &str) -> Result<DataFrame, BenfordError> {
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    fn read_records(&self, input: &str) -> Result<Vec<RawRecord>, BenfordError> {
        let delim = self.delimiter as char;
        let mut records = Vec::new();
        let mut fields: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut line = 1;
        let mut record_line = 1;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    '\n' => {
                        line += 1;
                        field.push(c);
                    }
                    _ => field.push(c),
                }
                continue;
            }
            match c {
                '"' if field.is_empty() => in_quotes = true,
                c if c == delim => fields.push(std::mem::take(&mut field)),
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' | '\r' => {
                    fields.push(std::mem::take(&mut field));
                    Self::finish_record(&mut records, std::mem::take(&mut fields), record_line);
                    line += 1;
                    record_line = line;
                }
                _ => field.push(c),
            }
        }

        if in_quotes {
            return Err(BenfordError::CsvParse {
                line: record_line,
                message: "unterminated quoted field".to_string(),
            });
        }
        if !field.is_empty() || !fields.is_empty() {
            fields.push(field);
            Self::finish_record(&mut records, fields, record_line);
        }
        Ok(records)
    }

    /// Blank lines carry no record.
    fn finish_record(records: &mut Vec<RawRecord>, fields: Vec<String>, line: usize) {
        if fields.iter().all(|f| f.trim().is_empty()) {
            return;
        }
        records.push(RawRecord { line, fields });
    }

    fn is_null(&self, value: &str) -> bool {
        self.null_markers.iter().any(|m| m == value)
    }

    fn build_column(&self, raw: &[&str]) -> Result<Column, BenfordError> {
        let flags: Vec<bool> = raw.iter().map(|v| !self.is_null(v)).collect();
        let validity = ValidityBitmap::from_flags(&flags);

        let parsed: Option<Vec<f64>> = raw
            .iter()
            .zip(&flags)
            .map(|(v, &present)| if present { v.parse::<f64>().ok() } else { Some(0.0) })
            .collect();

        match parsed {
            Some(values) => Column::numeric(values, validity),
            None => {
                let texts = raw
                    .iter()
                    .zip(&flags)
                    .map(|(v, &present)| if present { (*v).to_string() } else { String::new() })
                    .collect();
                Column::text(texts, validity)
            }
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::DataType;

    #[test]
    fn numeric_and_text_inference() {
        let csv = "symbol,price,volume\nAAPL,189.5,1000\nMSFT,410.2,-250\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        assert_eq!(
            df.schema(),
            vec![
                ("symbol", DataType::Text),
                ("price", DataType::Numeric),
                ("volume", DataType::Numeric),
            ]
        );
        assert_eq!(df.column(2).unwrap().numeric_at(1), Some(-250.0));
    }

    #[test]
    fn null_markers_become_nulls() {
        let csv = "x\n1\nNA\n\n3\nnull\n";
        // blank line in the middle is skipped, not a null row
        let df = CsvParser::new().parse_str(csv).unwrap();
        let col = df.column(0).unwrap();
        assert_eq!(df.row_count(), 4);
        assert_eq!(col.null_count(), 2);
        assert_eq!(col.numeric_at(2), Some(3.0));
    }

    #[test]
    fn empty_cell_is_null() {
        let df = CsvParser::new().parse_str("a,b\n1,\n2,5\n").unwrap();
        let b = df.column_by_name("b").unwrap();
        assert_eq!(b.data_type(), DataType::Numeric);
        assert_eq!(b.numeric_at(0), None);
    }

    #[test]
    fn one_word_demotes_to_text() {
        let df = CsvParser::new().parse_str("v\n1\n2\nmany\n").unwrap();
        assert_eq!(df.column(0).unwrap().data_type(), DataType::Text);
    }

    #[test]
    fn quoted_fields() {
        let csv = "name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n\"multi\nline\",x\n";
        let df = CsvParser::new().parse_str(csv).unwrap();
        let name = df.column(0).unwrap();
        assert_eq!(name.text_at(0), Some("Smith, J"));
        assert_eq!(name.text_at(1), Some("multi\nline"));
        assert_eq!(df.column(1).unwrap().text_at(0), Some("said \"hi\""));
    }

    #[test]
    fn crlf_bom_and_no_trailing_newline() {
        let df = CsvParser::new().parse_str("\u{feff}a,b\r\n1,2\r\n3,4").unwrap();
        assert_eq!(df.column_names(), &["a", "b"]);
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.column(1).unwrap().numeric_at(1), Some(4.0));
    }

    #[test]
    fn field_count_mismatch_reports_line() {
        let err = CsvParser::new().parse_str("a,b\n1,2\n3\n").unwrap_err();
        assert_eq!(
            err,
            BenfordError::CsvParse {
                line: 3,
                message: "expected 2 fields, got 1".into()
            }
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = CsvParser::new().parse_str("a\n\"open\n").unwrap_err();
        assert!(matches!(err, BenfordError::CsvParse { line: 2, .. }));
    }

    #[test]
    fn header_only_has_columns_without_rows() {
        let df = CsvParser::new().parse_str("a,b\n").unwrap();
        assert_eq!(df.column_count(), 2);
        assert_eq!(df.row_count(), 0);
    }

    #[test]
    fn no_header_and_semicolons() {
        let df = CsvParser::new()
            .delimiter(b';')
            .has_header(false)
            .parse_str("1;2\n3;4\n")
            .unwrap();
        assert_eq!(df.column_names(), &["col_0", "col_1"]);
        assert_eq!(df.row_count(), 2);
    }

    #[test]
    fn custom_null_markers() {
        let df = CsvParser::new()
            .null_markers(vec!["-".into()])
            .parse_str("x\n-\n5\n")
            .unwrap();
        assert_eq!(df.column(0).unwrap().null_count(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CsvParser::new()
            .parse_file("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, BenfordError::Io(_)));
    }
}
