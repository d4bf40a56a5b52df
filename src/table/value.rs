use std::fmt::Display;
use std::fmt::Formatter;

/// A present cell value. Missing cells are `None` in a table row.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Text that is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Parses a delimited-file field: canonical numbers and `TRUE`/`FALSE` are typed,
    /// an empty field is missing, everything else stays text.
    pub(crate) fn parse_field(field: &str) -> Option<Value> {
        if field.is_empty() {
            return None;
        }
        match field {
            "TRUE" => return Some(Value::Boolean(true)),
            "FALSE" => return Some(Value::Boolean(false)),
            _ => (),
        }
        match field.parse::<f64>() {
            Ok(number) if number.is_finite() && format_number(number) == field => Some(Value::Number(number)),
            _ => Some(Value::Text(field.to_owned())),
        }
    }
}

/// Missing means absent, or text that is blank after trimming.
pub fn is_missing(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_blank)
}

/// Shortest form that parses back to the same number; integral values have no fraction.
pub(crate) fn format_number(number: f64) -> String {
    if number == 0.0 {
        // -0 and 0 print alike
        "0".to_owned()
    } else {
        number.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(number) => f.write_str(&format_number(*number)),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Text(text) => f.write_str(text),
        }
    }
}
