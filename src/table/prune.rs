//! Column and row pruning by missing-value fractions.

use crate::table::value::is_missing;
use crate::table::Table;

/// Absorbs floating point noise in `threshold × count` before rounding up.
const EPSILON: f64 = 1e-9;

/// Drops every column whose fraction of missing cells is strictly above `max_missing_fraction`.
/// A table without data rows keeps all its columns.
pub fn prune_columns(table: &Table, max_missing_fraction: f64) -> Table {
    let mut pruned = table.clone();
    let rows = table.row_count();
    if rows == 0 {
        return pruned;
    }
    let keep: Vec<bool> = (0..table.column_count())
        .map(|index| (table.missing_count(index) as f64 / rows as f64) <= max_missing_fraction)
        .collect();
    pruned.retain_columns(&keep);
    pruned
}

/// Number of present cells a row needs: `ceil(min_present_fraction × column_count)`.
pub fn required_present(column_count: usize, min_present_fraction: f64) -> usize {
    let required = (min_present_fraction * column_count as f64 - EPSILON).ceil();
    if required <= 0.0 {
        0
    } else {
        required as usize
    }
}

/// Drops every row with fewer present cells than [`required_present`] demands.
pub fn prune_rows(table: &Table, min_present_fraction: f64) -> Table {
    let required = required_present(table.column_count(), min_present_fraction);
    let mut pruned = table.clone();
    pruned.retain_rows(|row| row.iter().filter(|value| !is_missing(value.as_ref())).count() >= required);
    pruned
}
