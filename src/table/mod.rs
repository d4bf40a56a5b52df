//! In-memory tables and the cleaning passes applied to them.

pub(crate) mod column;
pub(crate) mod csv;
pub(crate) mod header;
pub(crate) mod prune;
pub(crate) mod split;
pub(crate) mod value;

pub use column::classify_columns;
pub use column::ColumnClass;
pub use column::ValueClass;
pub use header::recover_header;
pub use prune::prune_columns;
pub use prune::prune_rows;
pub use split::split_table;
pub use split::SplitTables;
pub use value::is_missing;
pub use value::Value;

use std::collections::HashMap;
use std::collections::HashSet;
use thiserror::Error;

/// Errors related to table shape and column lookup.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table '{0}' has no usable rows or columns")]
    EmptyTableError(String),

    #[error("Column '{0}' not found")]
    MissingColumnError(String),

    #[error("At least one identifier column is required")]
    EmptyIdentifiersError,

    #[error("Row {row} has {found} cells, expected {expected}")]
    RowWidthError { row: usize, expected: usize, found: usize },

    #[error("Table '{0}' not found in cache")]
    UnknownTableError(String),
}

/// A named table: column names plus rows of optional values, all rows as wide as the header.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    /// Creates a table, checking that every row matches the header width.
    pub fn new(name: &str, columns: Vec<String>, rows: Vec<Vec<Option<Value>>>) -> Result<Table, TableError> {
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, cells)| cells.len() != columns.len()) {
            return Err(TableError::RowWidthError { row, expected: columns.len(), found: cells.len() });
        }
        Ok(Table { name: name.to_owned(), columns, rows })
    }

    /// Builds a table whose header is the first record; the rest are data rows.
    /// Records may be ragged; short rows are padded with missing cells.
    pub fn from_records(name: &str, mut records: Vec<Vec<Option<Value>>>) -> Table {
        if records.is_empty() {
            return Table { name: name.to_owned(), columns: Vec::new(), rows: Vec::new() };
        }
        let width = records.iter().map(Vec::len).max().unwrap_or_default();
        for record in records.iter_mut() {
            record.resize(width, None);
        }
        let header = records.remove(0);
        Table { name: name.to_owned(), columns: header_names(&header), rows: records }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// A table with no data rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.rows.iter().map(move |row| row.get(index).and_then(Option::as_ref))
    }

    /// Number of missing cells in one column.
    pub fn missing_count(&self, index: usize) -> usize {
        self.column_values(index).filter(|value| is_missing(*value)).count()
    }

    /// Keeps only the given columns, in the given order.
    pub fn select(&self, name: &str, indexes: &[usize]) -> Table {
        let columns = indexes.iter().map(|index| self.columns[*index].to_owned()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indexes.iter().map(|index| row[*index].clone()).collect())
            .collect();
        Table { name: name.to_owned(), columns, rows }
    }

    pub fn with_name(mut self, name: &str) -> Table {
        self.name = name.to_owned();
        self
    }

    pub(crate) fn retain_columns(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in self.rows.iter_mut() {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    pub(crate) fn retain_rows<F>(&mut self, keep: F)
    where
        F: FnMut(&Vec<Option<Value>>) -> bool,
    {
        self.rows.retain(keep);
    }

    /// Replaces the header with the first data row, which is removed from the data.
    /// Returns `false` when there is no data row to promote.
    pub(crate) fn promote_first_row(&mut self) -> bool {
        if self.rows.is_empty() {
            return false;
        }
        let header = self.rows.remove(0);
        self.columns = header_names(&header);
        true
    }
}

/// Column names from a header record: trimmed text, `Unnamed: <index>` for blanks,
/// and `.1`, `.2` suffixes on later duplicates.
pub(crate) fn header_names(header: &[Option<Value>]) -> Vec<String> {
    let mut seen = HashSet::<String>::new();
    let mut counts = HashMap::<String, usize>::new();
    let mut names = Vec::with_capacity(header.len());
    for (index, cell) in header.iter().enumerate() {
        let base = match cell {
            Some(value) if !value.is_blank() => value.to_string().trim().to_owned(),
            _ => format!("Unnamed: {index}"),
        };
        let mut name = base.to_owned();
        while seen.contains(&name) {
            let count = counts.entry(base.to_owned()).or_insert(0);
            *count += 1;
            name = format!("{base}.{count}");
        }
        seen.insert(name.to_owned());
        names.push(name);
    }
    names
}
