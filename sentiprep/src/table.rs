//! Positional tables and CSV ingestion
//!
//! Datasets are handled as ordered rows of optional string cells. Columns are
//! addressed by index; names are carried only for the raw upload header and
//! for the projection/rename stage of cleaning.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use thiserror::Error;
use tracing::debug;

/// A single cell; `None` is a missing value (empty CSV field)
pub type Cell = Option<String>;

/// One row of cells, positionally indexed
pub type Row = Vec<Cell>;

/// Header names that mark the text column when a header row exists
const TEXT_COLUMN_NAMES: [&str; 4] = ["text", "tweet", "content", "message"];

/// Mean cell length a column must exceed to be considered free text
pub const TEXT_COLUMN_MIN_AVG_LEN: f64 = 10.0;

/// Table parsing and shape errors
#[derive(Debug, Error)]
pub enum TableError {
    /// The CSV reader rejected the input
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A row has more fields than the table width
    #[error("Row {line} has {found} fields, expected at most {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A row passed to a table constructor has the wrong width
    #[error("Row {index} has width {found}, table width is {expected}")]
    WidthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// Column index outside the table
    #[error("Column {0} does not exist")]
    ColumnOutOfRange(usize),

    /// Writing CSV bytes failed
    #[error("CSV write error: {0}")]
    Write(String),
}

/// Ordered rows of equal width
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, checking every row has one cell per column
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, TableError> {
        let width = columns.len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(TableError::WidthMismatch {
                    index,
                    expected: width,
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a headerless table; column names are the positional indexes
    pub fn from_rows(rows: Vec<Row>) -> Result<Self, TableError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        Self::new(positional_names(width), rows)
    }

    /// Convenience constructor for tests and literals: every cell present
    pub fn from_strs(rows: &[&[&str]]) -> Result<Self, TableError> {
        Self::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: usize) -> bool {
        column < self.width()
    }

    /// Cells of one column in row order
    pub fn column(&self, column: usize) -> Result<impl Iterator<Item = &Cell> + '_, TableError> {
        if !self.has_column(column) {
            return Err(TableError::ColumnOutOfRange(column));
        }
        Ok(self.rows.iter().map(move |row| &row[column]))
    }

    /// Text of one column, missing cells rendered as empty strings
    pub fn column_text(&self, column: usize) -> Result<Vec<String>, TableError> {
        Ok(self
            .column(column)?
            .map(|c| c.clone().unwrap_or_default())
            .collect())
    }

    /// Keep rows whose mask entry is true; returns the number removed
    pub fn retain_mask(&mut self, mask: &[bool]) -> usize {
        let before = self.rows.len();
        let mut flags = mask.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&true));
        before - self.rows.len()
    }

    /// Keep rows at the given indexes, in ascending order
    pub fn retain_indexes(&mut self, keep: &std::collections::BTreeSet<usize>) -> usize {
        let mask: Vec<bool> = (0..self.rows.len()).map(|i| keep.contains(&i)).collect();
        self.retain_mask(&mask)
    }

    /// Insert a column at `index` with one value per row
    pub fn insert_column(
        &mut self,
        index: usize,
        name: impl Into<String>,
        values: Vec<Cell>,
    ) -> Result<(), TableError> {
        if index > self.width() {
            return Err(TableError::ColumnOutOfRange(index));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::WidthMismatch {
                index,
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.insert(index, name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(index, value);
        }
        Ok(())
    }

    /// Overwrite every cell of one column
    pub fn set_column(&mut self, column: usize, values: Vec<Cell>) -> Result<(), TableError> {
        if !self.has_column(column) {
            return Err(TableError::ColumnOutOfRange(column));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::WidthMismatch {
                index: column,
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[column] = value;
        }
        Ok(())
    }

    /// Keep only the listed columns (in the given order) under new names
    ///
    /// The names live in memory only. [`write_csv`] emits no header, so a
    /// cleaning run records them in the dataset's `cleaned_columns` and later
    /// stages address the written file by position.
    pub fn project(&mut self, selection: &[(usize, String)]) -> Result<(), TableError> {
        if let Some((bad, _)) = selection.iter().find(|(idx, _)| !self.has_column(*idx)) {
            return Err(TableError::ColumnOutOfRange(*bad));
        }
        self.columns = selection.iter().map(|(_, name)| name.clone()).collect();
        for row in self.rows.iter_mut() {
            let projected: Row = selection.iter().map(|(idx, _)| row[*idx].clone()).collect();
            *row = projected;
        }
        Ok(())
    }
}

fn positional_names(width: usize) -> Vec<String> {
    (0..width).map(|i| i.to_string()).collect()
}

/// Decode raw bytes with the fallback chain: declared encoding, UTF-8, Windows-1252
///
/// Never fails; the last step maps every byte. Returns the text and the name of
/// the encoding that was used.
pub fn decode_bytes(bytes: &[u8], declared: Option<&str>) -> (String, &'static str) {
    if let Some(label) = declared {
        match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) => {
                let (text, used, had_errors) = encoding.decode(bytes);
                if !had_errors {
                    return (text.into_owned(), used.name());
                }
                debug!("Declared encoding {} failed, trying UTF-8", label);
            }
            None => debug!("Unknown declared encoding {}, trying UTF-8", label),
        }
    }

    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return (text.into_owned(), UTF_8.name());
    }

    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text.into_owned(), WINDOWS_1252.name())
}

/// Parse CSV bytes into a table
///
/// Comma-delimited first; if that fails the input is retried as `|`-delimited.
/// Rows shorter than the first row (or header) are padded with missing cells.
pub fn read_csv(
    bytes: &[u8],
    has_header: bool,
    declared_encoding: Option<&str>,
) -> Result<Table, TableError> {
    let (text, encoding) = decode_bytes(bytes, declared_encoding);
    debug!("Decoded {} bytes as {}", bytes.len(), encoding);

    match parse_delimited(&text, b',', has_header) {
        Ok(table) => Ok(table),
        Err(first_error) => {
            debug!("Comma parse failed ({}), retrying with '|'", first_error);
            parse_delimited(&text, b'|', has_header).map_err(|_| first_error)
        }
    }
}

fn parse_delimited(text: &str, delimiter: u8, has_header: bool) -> Result<Table, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let mut columns: Option<Vec<String>> = None;

    if has_header {
        if let Some(record) = records.next() {
            columns = Some(record?.iter().map(|s| s.trim().to_string()).collect());
        }
    }

    let mut rows = Vec::new();
    let mut width = columns.as_ref().map(Vec::len);

    for (line, record) in records.enumerate() {
        let record = record?;
        let expected = *width.get_or_insert(record.len());
        if record.len() > expected {
            return Err(TableError::RaggedRow {
                line: line + 1,
                expected,
                found: record.len(),
            });
        }
        let mut row: Row = record
            .iter()
            .map(|field| (!field.is_empty()).then(|| field.to_string()))
            .collect();
        row.resize(expected, None);
        rows.push(row);
    }

    let columns = columns.unwrap_or_else(|| positional_names(width.unwrap_or(0)));
    Table::new(columns, rows)
}

/// Serialize a table as headerless CSV; missing cells become empty fields
///
/// Column names are dropped.
pub fn write_csv(table: &Table) -> Result<Vec<u8>, TableError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for row in table.rows() {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }

    writer
        .into_inner()
        .map_err(|e| TableError::Write(e.to_string()))
}

/// Pick the free-text column
///
/// A header named text/tweet/content/message wins. Otherwise the column with
/// the greatest mean cell length above [`TEXT_COLUMN_MIN_AVG_LEN`]; the last
/// eligible column when none qualifies. Columns in `skip` are never chosen.
pub fn detect_text_column(table: &Table, skip: &[usize]) -> Option<usize> {
    let candidates: Vec<usize> = (0..table.width()).filter(|c| !skip.contains(c)).collect();
    let fallback = candidates.last().copied()?;

    if let Some(named) = candidates.iter().copied().find(|&c| {
        let name = table.columns()[c].to_lowercase();
        TEXT_COLUMN_NAMES.contains(&name.as_str())
    }) {
        return Some(named);
    }

    if table.is_empty() {
        return Some(fallback);
    }

    let mut best: Option<(usize, f64)> = None;
    for &column in &candidates {
        let total: usize = table
            .rows()
            .iter()
            .map(|row| row[column].as_deref().map(|s| s.chars().count()).unwrap_or(0))
            .sum();
        let mean = total as f64 / table.len() as f64;
        if mean > TEXT_COLUMN_MIN_AVG_LEN && best.map_or(true, |(_, m)| mean > m) {
            best = Some((column, mean));
        }
    }

    Some(best.map(|(c, _)| c).unwrap_or(fallback))
}
