use crate::table::column::classify_columns;
use crate::table::ColumnClass;
use crate::table::Table;
use crate::table::TableError;

/// The two projections of a split table, sharing the identifier columns.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitTables {
    /// Identifiers followed by the numeric/boolean columns
    pub numeric: Table,
    /// Identifiers followed by the free-text columns
    pub text: Table,
    /// Class of every non-identifier column, in source order
    pub classes: Vec<(String, ColumnClass)>,
}

/// Splits a table into numeric/boolean and text projections.
///
/// `identifiers` are kept at the front of both projections in the given order;
/// repeated names count once. Every identifier must exist and at least one is required.
pub fn split_table<S: AsRef<str>>(table: &Table, identifiers: &[S]) -> Result<SplitTables, TableError> {
    let mut identifier_indexes = Vec::<usize>::new();
    for identifier in identifiers {
        let identifier = identifier.as_ref();
        let index = table
            .column_index(identifier)
            .ok_or_else(|| TableError::MissingColumnError(identifier.to_owned()))?;
        if !identifier_indexes.contains(&index) {
            identifier_indexes.push(index);
        }
    }
    if identifier_indexes.is_empty() {
        return Err(TableError::EmptyIdentifiersError);
    }

    let mut numeric_indexes = identifier_indexes.to_owned();
    let mut text_indexes = identifier_indexes.to_owned();
    let mut classes = Vec::new();
    for (index, (name, class)) in classify_columns(table).into_iter().enumerate() {
        if identifier_indexes.contains(&index) {
            continue;
        }
        match class {
            ColumnClass::NumericOrBoolean => numeric_indexes.push(index),
            ColumnClass::Text => text_indexes.push(index),
        }
        classes.push((name, class));
    }

    Ok(SplitTables {
        numeric: table.select(&format!("{}_numerical", table.name()), &numeric_indexes),
        text: table.select(&format!("{}_text", table.name()), &text_indexes),
        classes,
    })
}
