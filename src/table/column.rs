use crate::table::value::is_missing;
use crate::table::Table;
use crate::table::Value;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Plain decimal number text: optional sign, digits with optional fraction, optional exponent.
static NUMERIC_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("Hardcode regex pattern"));

/// Classification of a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueClass {
    Missing,
    Number,
    Boolean,
    Text,
}

/// Classification of a whole column for the numeric/text split.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    /// Every present value is a number or a boolean token
    NumericOrBoolean,
    /// At least one present value is free text
    Text,
}

impl ValueClass {
    /// Classifies a cell. Text is trimmed before matching; currency symbols,
    /// thousands separators and percent signs make a value text.
    pub fn of(value: Option<&Value>) -> Self {
        if is_missing(value) {
            return ValueClass::Missing;
        }
        match value {
            Some(Value::Number(_)) => ValueClass::Number,
            Some(Value::Boolean(_)) => ValueClass::Boolean,
            Some(Value::Text(text)) => {
                let text = text.trim();
                if NUMERIC_TEXT.is_match(text) {
                    ValueClass::Number
                } else if is_boolean_token(text) {
                    ValueClass::Boolean
                } else {
                    ValueClass::Text
                }
            }
            None => ValueClass::Missing,
        }
    }
}

fn is_boolean_token(text: &str) -> bool {
    ["true", "false", "yes", "no"]
        .iter()
        .any(|token| text.eq_ignore_ascii_case(token))
}

impl ColumnClass {
    /// Detects the class of a column from the classes of its cells.
    /// A column without present values counts as numeric/boolean.
    pub fn detect<I>(classes: I) -> ColumnClass
    where
        I: IntoIterator<Item = ValueClass>,
    {
        if classes.into_iter().any(|class| class == ValueClass::Text) {
            ColumnClass::Text
        } else {
            ColumnClass::NumericOrBoolean
        }
    }

    #[inline]
    pub fn is_numeric_or_boolean(&self) -> bool {
        matches!(self, ColumnClass::NumericOrBoolean)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnClass::NumericOrBoolean => "numeric_or_boolean",
            ColumnClass::Text => "text",
        }
    }
}

/// Classifies every column of the table, in column order.
pub fn classify_columns(table: &Table) -> Vec<(String, ColumnClass)> {
    (0..table.column_count())
        .map(|index| {
            let class = ColumnClass::detect(table.column_values(index).map(ValueClass::of));
            (table.columns()[index].to_owned(), class)
        })
        .collect()
}
