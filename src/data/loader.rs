//! Data loading utilities

use super::table::{ColumnRole, Table};
use super::transactions::TransactionSet;
use crate::error::{NotebookError, Result};
use csv::{ByteRecord, QuoteStyle, ReaderBuilder, WriterBuilder};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// How a delimited file is laid out and which columns need role overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    pub delimiter: char,
    pub has_header: bool,
    /// Columns read as numbers that are really labels
    pub categorical: Vec<String>,
    /// Columns that identify rows and must never become features
    pub identifiers: Vec<String>,
    /// Columns removed right after loading
    pub drop: Vec<String>,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            categorical: Vec::new(),
            identifiers: Vec::new(),
            drop: Vec::new(),
        }
    }
}

impl CsvFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_categorical(mut self, column: &str) -> Self {
        self.categorical.push(column.to_string());
        self
    }

    pub fn with_identifier(mut self, column: &str) -> Self {
        self.identifiers.push(column.to_string());
        self
    }

    pub fn with_drop(mut self, column: &str) -> Self {
        self.drop.push(column.to_string());
        self
    }

    fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(NotebookError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }
}

/// File information gathered without a full load
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub file_size: u64,
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<String>,
}

/// Loader for delimited tables and basket files
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    /// Number of rows polars inspects to infer dtypes; `None` scans everything
    infer_schema_length: Option<usize>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Load a delimited file into a table.
    ///
    /// Records are checked before polars parses them so that ragged rows are
    /// reported instead of silently padded with nulls.
    pub fn load_csv<P: AsRef<Path>>(&self, path: P, format: &CsvFormat) -> Result<Table> {
        let path = path.as_ref();
        let start = Instant::now();
        let delimiter = format.delimiter_byte()?;

        let bytes = std::fs::read(path).map_err(|e| {
            NotebookError::DataFormat(format!("cannot read {}: {}", path.display(), e))
        })?;
        let (canonical, n_records) = canonical_records(&bytes, delimiter)?;
        debug!(path = %path.display(), records = n_records, "record shape verified");

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);
        let frame = CsvReadOptions::default()
            .with_has_header(format.has_header)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(Cursor::new(canonical))
            .finish()
            .map_err(|e| NotebookError::DataFormat(format!("{}: {}", path.display(), e)))?;

        let table = apply_format(Table::from_frame(frame)?, format)?;
        info!(
            path = %path.display(),
            rows = table.n_rows(),
            cols = table.n_cols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded table"
        );
        Ok(table)
    }

    /// Load a basket file: one transaction per line, items separated by `delimiter`.
    pub fn load_transactions<P: AsRef<Path>>(&self, path: P, delimiter: char) -> Result<TransactionSet> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NotebookError::DataFormat(format!("cannot read {}: {}", path.display(), e))
        })?;
        let set = TransactionSet::parse(&content, delimiter);
        if set.is_empty() {
            return Err(NotebookError::DataFormat(format!(
                "{} contains no transactions",
                path.display()
            )));
        }
        info!(path = %path.display(), transactions = set.len(), items = set.items().len(), "loaded baskets");
        Ok(set)
    }

    /// Row and column counts from the header and a streaming record scan
    pub fn file_info<P: AsRef<Path>>(&self, path: P, format: &CsvFormat) -> Result<FileInfo> {
        let path = path.as_ref();
        let delimiter = format.delimiter_byte()?;
        let file = File::open(path)
            .map_err(|e| NotebookError::DataFormat(format!("{}: {}", path.display(), e)))?;
        let file_size = file
            .metadata()
            .map_err(|e| NotebookError::DataFormat(format!("{}: {}", path.display(), e)))?
            .len();

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(format.has_header)
            .flexible(false)
            .from_reader(file);
        let header = reader.byte_headers().map_err(record_error)?.clone();
        let n_cols = header.len();
        let columns = if format.has_header {
            header.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect()
        } else {
            (1..=n_cols).map(|i| format!("column_{}", i)).collect()
        };

        let mut record = ByteRecord::new();
        let mut n_rows = 0;
        while reader.read_byte_record(&mut record).map_err(record_error)? {
            n_rows += 1;
        }

        Ok(FileInfo {
            path: path.display().to_string(),
            file_size,
            n_rows,
            n_cols,
            columns,
        })
    }
}

fn apply_format(mut table: Table, format: &CsvFormat) -> Result<Table> {
    for column in &format.drop {
        table = table.drop(column)?;
    }
    for column in &format.categorical {
        table = table.with_role(column, ColumnRole::Categorical)?;
    }
    for column in &format.identifiers {
        table = table.with_role(column, ColumnRole::Identifier)?;
    }
    Ok(table)
}

fn record_error(e: csv::Error) -> NotebookError {
    match e.kind() {
        csv::ErrorKind::UnequalLengths { pos, expected_len, len } => NotebookError::DataFormat(format!(
            "record {} has {} fields, expected {}",
            pos.as_ref().map(|p| p.record() + 1).unwrap_or(0),
            len,
            expected_len
        )),
        _ => NotebookError::DataFormat(e.to_string()),
    }
}

/// Rewrite delimited records with quotes only where a field needs them.
///
/// Every record must have as many fields as the first. Blank lines are
/// skipped. Returns the rewritten bytes and the record count, header included.
fn canonical_records(bytes: &[u8], delimiter: u8) -> Result<(Vec<u8>, usize)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(false)
        .from_reader(bytes);
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::with_capacity(bytes.len()));

    let mut record = ByteRecord::new();
    let mut n_records = 0;
    while reader.read_byte_record(&mut record).map_err(record_error)? {
        writer.write_byte_record(&record).map_err(record_error)?;
        n_records += 1;
    }
    if n_records == 0 {
        return Err(NotebookError::DataFormat("file is empty".to_string()));
    }
    let canonical = writer
        .into_inner()
        .map_err(|e| NotebookError::DataFormat(format!("cannot buffer records: {}", e.error())))?;
    Ok((canonical, n_records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(canonical: &[u8]) -> Vec<Vec<String>> {
        ReaderBuilder::new()
            .has_headers(false)
            .from_reader(canonical)
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_quoted_fields_kept_intact() {
        let text = "type,text\nham,\"Hello, world\"\nspam,\"say \"\"hi\"\"\nnow\"\n\n";
        let (canonical, n) = canonical_records(text.as_bytes(), b',').unwrap();
        assert_eq!(n, 3);
        let records = fields(&canonical);
        assert_eq!(records[1], vec!["ham", "Hello, world"]);
        assert_eq!(records[2][1], "say \"hi\"\nnow");
    }

    #[test]
    fn test_stray_quote_inside_unquoted_field() {
        let text = "model,price\nTV 55\" screen,100\nradio,20\n";
        let (canonical, n) = canonical_records(text.as_bytes(), b',').unwrap();
        assert_eq!(n, 3);
        assert_eq!(fields(&canonical)[1], vec!["TV 55\" screen", "100"]);
    }

    #[test]
    fn test_ragged_record_reported() {
        let err = canonical_records(b"a,b,c\n1,2,3\n4,5\n", b',').unwrap_err();
        assert!(err.to_string().contains("record 3 has 2 fields, expected 3"));
    }

    #[test]
    fn test_crlf_records() {
        let (_, n) = canonical_records(b"a,b\r\n1,2\r\n3,4\r\n", b',').unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(canonical_records(b"\n\n", b','), Err(NotebookError::DataFormat(_))));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let format = CsvFormat::new().with_delimiter('§');
        assert!(matches!(format.delimiter_byte(), Err(NotebookError::Config(_))));
    }
}
