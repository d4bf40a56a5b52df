//! Header recovery for sheets whose real header sits below a title block.

use crate::table::Table;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Placeholder names given to blank header cells.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Unnamed(: \d+)?$").expect("Hardcode regex pattern"));

/// Blank or placeholder column name.
pub fn is_placeholder(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || PLACEHOLDER.is_match(name)
}

/// Fraction of placeholder column names; zero for a table without columns.
pub fn unnamed_fraction(table: &Table) -> f64 {
    if table.column_count() == 0 {
        return 0.0;
    }
    let unnamed = table.columns().iter().filter(|name| is_placeholder(name)).count();
    unnamed as f64 / table.column_count() as f64
}

/// Promotes the first data row to header while the unnamed fraction is above
/// `max_unnamed_fraction`. Stops when no data rows remain, so it performs at
/// most `row_count` promotions. Returns the recovered table and the promotion count.
pub fn recover_header(table: &Table, max_unnamed_fraction: f64) -> (Table, usize) {
    let mut recovered = table.clone();
    let mut promotions = 0usize;
    while unnamed_fraction(&recovered) > max_unnamed_fraction && recovered.promote_first_row() {
        promotions += 1;
    }
    if promotions > 0 {
        debug!(table = recovered.name(), promotions, "promoted header rows");
    }
    (recovered, promotions)
}
