//! Delimited output and read-back of tables.

use crate::error::NormalizerError;
use crate::table::value::Value;
use crate::table::Table;
use csv::ReaderBuilder;
use csv::WriterBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes the table as comma-separated UTF-8 with a header row, creating parent directories.
/// Missing cells are empty fields; fields with delimiters, quotes or line breaks are quoted.
pub fn write_csv(table: &Table, path: &Path) -> Result<(), NormalizerError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.as_ref().map(Value::to_string).unwrap_or_default()))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = table.row_count(), columns = table.column_count(), "wrote csv");
    Ok(())
}

/// Reads a delimited file back into a table named `name`.
/// Header fields become column names as written; short rows are padded with missing cells.
pub fn read_csv(path: &Path, name: &str) -> Result<Table, NormalizerError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut records = reader.records();
    let columns: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(str::to_owned).collect(),
        None => Vec::new(),
    };
    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let mut row: Vec<Option<Value>> = record.iter().take(columns.len()).map(Value::parse_field).collect();
        row.resize(columns.len(), None);
        rows.push(row);
    }
    Ok(Table::new(name, columns, rows)?)
}
