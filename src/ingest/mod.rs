//! Delimited-table ingestion
//!
//! Input tables arrive as delimited text in mixed code pages (UTF-8 survey
//! exports, Windows-1251 production reports). [`RawTable`] decodes each file
//! with `encoding_rs`, splits it with the `csv` crate and keeps every cell as
//! text, together with the source file and line for error reporting. Typed
//! parsing happens in the normalizer through the cell helpers below.
//!
//! Several files of one kind are concatenated with [`RawTable::load_all`];
//! columns are aligned by header name, cells missing from a file read as
//! empty.

mod well_table;

pub use well_table::{WellRef, WellTable};

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::config::TableFile;
use crate::error::{CompileError, Result};

// ============================================================================
// Raw Table
// ============================================================================

/// One data row: its cells plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Index into [`RawTable::sources`]
    source: usize,
    /// 1-based physical line in the source file
    pub line: u64,
    pub cells: Vec<String>,
}

/// A resolved column: its position and header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub name: String,
}

/// Header plus text rows of one or more concatenated files.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    sources: Vec<String>,
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    /// Load one file relative to `input_dir`.
    pub fn load(file: &TableFile, input_dir: &Path) -> Result<Self> {
        let path = file.resolve(input_dir);
        let bytes = std::fs::read(&path).map_err(|e| CompileError::io(&path, e))?;
        let table = Self::from_bytes(&bytes, file)?;
        info!(
            file = %path.display(),
            encoding = %file.encoding,
            columns = table.headers.len(),
            rows = table.rows.len(),
            "Loaded table"
        );
        Ok(table)
    }

    /// Load and concatenate every file in `files`, in order.
    pub fn load_all(files: &[TableFile], input_dir: &Path) -> Result<Self> {
        let mut table = Self::default();
        for file in files {
            table.append(Self::load(file, input_dir)?);
        }
        Ok(table)
    }

    /// Decode and split in-memory file contents.
    ///
    /// The byte-order mark, when present, overrides the configured encoding.
    pub fn from_bytes(bytes: &[u8], file: &TableFile) -> Result<Self> {
        let encoding = encoding_rs::Encoding::for_label(file.encoding.as_bytes()).ok_or_else(
            || CompileError::UnknownEncoding {
                file: file.path.clone(),
                label: file.encoding.clone(),
            },
        )?;
        let delimiter = file.delimiter_byte().ok_or_else(|| CompileError::Format {
            file: file.path.clone(),
            line: 0,
            column: String::new(),
            value: file.delimiter.clone(),
            reason: "delimiter must be a single ASCII character".to_string(),
        })?;

        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!(
                file = %file.path,
                encoding = used.name(),
                "Malformed byte sequences replaced while decoding"
            );
        }

        let csv_error = |source| CompileError::Csv {
            file: file.path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(RawRow {
                source: 0,
                line: record.position().map_or(0, csv::Position::line),
                cells: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(Self {
            sources: vec![file.path.clone()],
            headers,
            rows,
        })
    }

    /// Append `other`'s rows, aligning its columns to ours by header name.
    ///
    /// Headers unknown so far are added at the end; earlier rows read them
    /// as empty.
    pub fn append(&mut self, other: Self) {
        if self.sources.is_empty() && self.headers.is_empty() {
            *self = other;
            return;
        }

        let mut mapping = Vec::with_capacity(other.headers.len());
        for header in &other.headers {
            let index = match self.headers.iter().position(|own| own == header) {
                Some(index) => index,
                None => {
                    self.headers.push(header.clone());
                    self.headers.len() - 1
                }
            };
            mapping.push(index);
        }

        let source_offset = self.sources.len();
        self.sources.extend(other.sources);
        let width = self.headers.len();

        for row in other.rows {
            let mut cells = vec![String::new(); width];
            for (i, cell) in row.cells.into_iter().enumerate() {
                if let Some(&target) = mapping.get(i) {
                    cells[target] = cell;
                }
            }
            self.rows.push(RawRow {
                source: row.source + source_offset,
                line: row.line,
                cells,
            });
        }
    }

    /// Remove rows whose cells exactly repeat an earlier row. Returns the
    /// number removed.
    pub fn dedup_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);
        self.rows.retain(|row| {
            let mut key = row.cells.clone();
            while key.last().is_some_and(String::is_empty) {
                key.pop();
            }
            seen.insert(key)
        });
        before - self.rows.len()
    }

    /// Resolve a required column.
    pub fn column(&self, name: &str) -> Result<Column> {
        self.optional_column(name)
            .ok_or_else(|| CompileError::MissingColumn {
                file: self.sources.join(", "),
                column: name.to_string(),
            })
    }

    pub fn optional_column(&self, name: &str) -> Option<Column> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|index| Column {
                index,
                name: name.to_string(),
            })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// File the row was read from.
    pub fn source_of(&self, row: &RawRow) -> &str {
        self.sources.get(row.source).map_or("", String::as_str)
    }

    /// Cell text with surrounding whitespace removed.
    pub fn cell<'r>(&self, row: &'r RawRow, column: &Column) -> &'r str {
        self.raw_cell(row, column).trim()
    }

    /// Cell text exactly as read.
    pub fn raw_cell<'r>(&self, row: &'r RawRow, column: &Column) -> &'r str {
        row.cells.get(column.index).map_or("", String::as_str)
    }

    /// Numeric cell; empty and `NaN` cells are `None`.
    pub fn number(&self, row: &RawRow, column: &Column) -> Result<Option<f64>> {
        let text = self.cell(row, column);
        parse_number(text).map_err(|reason| self.format_error(row, column, text, reason))
    }

    /// Date cell in `format`; empty cells are `None`.
    pub fn date(&self, row: &RawRow, column: &Column, format: &str) -> Result<Option<NaiveDate>> {
        let text = self.cell(row, column);
        parse_date(text, format).map_err(|reason| self.format_error(row, column, text, reason))
    }

    pub fn format_error(
        &self,
        row: &RawRow,
        column: &Column,
        value: &str,
        reason: impl Into<String>,
    ) -> CompileError {
        CompileError::Format {
            file: self.source_of(row).to_string(),
            line: row.line,
            column: column.name.clone(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Cell Parsing
// ============================================================================

/// Parse a decimal number. A comma is accepted as decimal separator when the
/// text has no dot.
pub fn parse_number(text: &str) -> std::result::Result<Option<f64>, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let normalized = if text.contains('.') {
        text.to_string()
    } else {
        text.replacen(',', ".", 1)
    };
    let value: f64 = normalized.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err("not a finite number".to_string())
    }
}

/// Parse a date in `format`, also accepting a trailing `HH:MM:SS`.
pub fn parse_date(text: &str, format: &str) -> std::result::Result<Option<NaiveDate>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match NaiveDate::parse_from_str(text, format) {
        Ok(date) => Ok(Some(date)),
        Err(date_err) => NaiveDateTime::parse_from_str(text, &format!("{format} %H:%M:%S"))
            .map(|dt| Some(dt.date()))
            .map_err(|_| format!("{date_err} (expected format {format})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str, delimiter: &str) -> RawTable {
        let file = TableFile::new("mem.csv", "utf-8", delimiter);
        RawTable::from_bytes(text.as_bytes(), &file).expect("table should parse")
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("12.5"), Ok(Some(12.5)));
        assert_eq!(parse_number(" 3,25 "), Ok(Some(3.25)));
        assert_eq!(parse_number(""), Ok(None));
        assert_eq!(parse_number("NaN"), Ok(None));
        assert!(parse_number("abc").is_err());
        assert!(parse_number("inf").is_err());
    }

    #[test]
    fn test_parse_date_with_and_without_time() {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 15);
        assert_eq!(parse_date("15.03.2020", "%d.%m.%Y"), Ok(expected));
        assert_eq!(parse_date("15.03.2020 00:00:00", "%d.%m.%Y"), Ok(expected));
        assert_eq!(parse_date("", "%d.%m.%Y"), Ok(None));
        assert!(parse_date("31.02.2020", "%d.%m.%Y").is_err());
    }

    #[test]
    fn test_semicolon_table_with_quoted_cells() {
        let t = table("well;date;type\n101;01.02.2020;\"ПЕРФ; повторная\"\n", ";");
        assert_eq!(t.headers(), &["well", "date", "type"]);
        assert_eq!(t.len(), 1);
        let col = t.column("type").expect("column exists");
        assert_eq!(t.cell(&t.rows()[0], &col), "ПЕРФ; повторная");
        assert_eq!(t.rows()[0].line, 2);
    }

    #[test]
    fn test_missing_column_names_file_and_column() {
        let t = table("a,b\n1,2\n", ",");
        let err = t.column("c").expect_err("column c is absent");
        assert_eq!(err.to_string(), "mem.csv: missing column 'c'");
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let t = table("a;b\n1;2\n;\n3;4\n", ";");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_windows_1251_decoding() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("Скважина,MD\nП-1,100\n");
        let file = TableFile::new("cp.csv", "windows-1251", ",");
        let t = RawTable::from_bytes(&bytes, &file).expect("table should parse");
        assert_eq!(t.headers()[0], "Скважина");
        let col = t.column("Скважина").expect("column exists");
        assert_eq!(t.cell(&t.rows()[0], &col), "П-1");
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let file = TableFile::new("x.csv", "no-such-encoding", ",");
        let err = RawTable::from_bytes(b"a\n1\n", &file).expect_err("label is unknown");
        assert!(matches!(err, CompileError::UnknownEncoding { .. }));
    }

    #[test]
    fn test_append_aligns_columns_by_name() {
        let mut first = table("well,md\nA,10\n", ",");
        let second = {
            let file = TableFile::new("second.csv", "utf-8", "\t");
            RawTable::from_bytes(b"md\twell\tz\n20\tB\t5\n", &file).expect("table should parse")
        };
        first.append(second);
        let well = first.column("well").expect("well");
        let md = first.column("md").expect("md");
        let z = first.column("z").expect("z");
        let rows = first.rows();
        assert_eq!(first.cell(&rows[1], &well), "B");
        assert_eq!(first.cell(&rows[1], &md), "20");
        assert_eq!(first.cell(&rows[0], &z), "");
        assert_eq!(first.source_of(&rows[1]), "second.csv");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut t = table("a,b\n1,2\n3,4\n1,2\n", ",");
        assert_eq!(t.dedup_rows(), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[1].line, 3);
    }

    #[test]
    fn test_number_error_carries_location() {
        let t = table("OIL\n12x\n", ",");
        let col = t.column("OIL").expect("column exists");
        let err = t.number(&t.rows()[0], &col).expect_err("not a number");
        match err {
            CompileError::Format { file, line, column, value, .. } => {
                assert_eq!((file.as_str(), line, column.as_str(), value.as_str()), ("mem.csv", 2, "OIL", "12x"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
