use crate::spreadsheet::reference::index_to_reference;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use iso8601_duration::Duration as IsoDuration;

const MILLISECONDS_PER_DAY: f64 = 86_400_000f64;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean stored as `1` / `0`
    Boolean,
    /// Plain numeric value
    Number,
    /// Serial date/time from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Serial date/time from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// ISO 8601 date or date-time string
    IsoDateTime,
    /// ISO 8601 duration string (ods time cells)
    IsoDuration,
    /// Inline or already-resolved shared string
    Text,
    /// Index into the workbook's shared string table
    SharedString,
    /// Formula error such as `#N/A`
    Error,
}

impl CellType {
    fn date_time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }
    }

    fn date(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }
    }

    fn time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }
    }

    /// Maps the built-in number format ids that denote dates or times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::date_time(is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::date(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::time(is_1904)),
            _ => None,
        }
    }

    /// Scans a custom format code for date (`y`, `d`) and time (`h`, `s`) tokens,
    /// skipping quoted literals, escaped characters, and `[...]` sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut has_date = false;
        let mut has_time = false;
        let mut characters = format.chars();
        while let Some(character) = characters.next() {
            match character {
                '\\' | '_' | '*' => {
                    characters.next();
                }
                '"' => {
                    for literal in characters.by_ref() {
                        if literal == '"' {
                            break;
                        }
                    }
                }
                '[' => {
                    for section in characters.by_ref() {
                        if section == ']' {
                            break;
                        }
                    }
                }
                'Y' | 'y' | 'D' | 'd' => has_date = true,
                'H' | 'h' | 'S' | 's' => has_time = true,
                _ => (),
            }
        }

        match (has_date, has_time) {
            (true, true) => Self::date_time(is_1904),
            (true, false) => Self::date(is_1904),
            (false, true) => Self::time(is_1904),
            (false, false) => Self::Number,
        }
    }
}

/// One non-empty cell read from a worksheet.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value as stored in the file
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style reference of this cell.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw value to a table value; `None` for empty and error cells.
    pub(crate) fn to_value(&self) -> Result<Option<Value>, String> {
        let value = match self.kind {
            CellType::Empty | CellType::Error | CellType::SharedString => return Ok(None),
            CellType::Boolean => Value::Boolean(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => Value::Number(self.to_double()?),
            CellType::Text => Value::Text(self.value.to_owned()),
            _ => Value::Text(self.to_date_time_text()?),
        };
        Ok(Some(value))
    }

    fn to_double(&self) -> Result<f64, String> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("parse '{}' to number failed", self.value))
    }

    /// Renders date and time cells as ISO text.
    fn to_date_time_text(&self) -> Result<String, String> {
        let serial = |is_1904: bool| {
            self.to_double()
                .and_then(|value| from_serial(value, is_1904).ok_or_else(|| format!("serial date '{}' out of range", self.value)))
        };
        let text = match self.kind {
            CellType::NumberDateTime1900 => format_date_time(&serial(false)?),
            CellType::NumberDateTime1904 => format_date_time(&serial(true)?),
            CellType::NumberDate1900 => serial(false)?.format("%Y-%m-%d").to_string(),
            CellType::NumberDate1904 => serial(true)?.format("%Y-%m-%d").to_string(),
            CellType::NumberTime1900 | CellType::NumberTime1904 => format_time(&serial(false)?),
            CellType::IsoDateTime => self.value.replacen('T', " ", 1),
            CellType::IsoDuration => {
                let duration = self
                    .value
                    .parse::<IsoDuration>()
                    .map_err(|_| format!("parse '{}' to iso8601 duration failed", self.value))?;
                let hours = (duration.day * 24.0 + duration.hour) as i64;
                format!("{:02}:{:02}:{:02}", hours, duration.minute as i64, duration.second.round() as i64)
            }
            _ => self.value.to_owned(),
        };
        Ok(text)
    }
}

/// Converts a serial day number to a timestamp.
/// The 1900 system reproduces the Lotus 1-2-3 leap-year bug: serial 60 is the
/// non-existent 1900-02-29, so earlier serials shift by one day.
fn from_serial(value: f64, is_1904: bool) -> Option<NaiveDateTime> {
    let (epoch, offset) = if is_1904 {
        (NaiveDate::from_ymd_opt(1904, 1, 1)?, 0)
    } else if value < 60.0 {
        (NaiveDate::from_ymd_opt(1899, 12, 30)?, 1)
    } else {
        (NaiveDate::from_ymd_opt(1899, 12, 30)?, 0)
    };
    let milliseconds = (value * MILLISECONDS_PER_DAY).round();
    if !milliseconds.is_finite() || milliseconds.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_milliseconds(milliseconds as i64)?)?
        .checked_add_signed(Duration::try_days(offset)?)
}

fn format_date_time(value: &NaiveDateTime) -> String {
    format!("{} {}", value.format("%Y-%m-%d"), format_time(value))
}

fn format_time(value: &NaiveDateTime) -> String {
    if value.and_utc().timestamp_subsec_millis() == 0 {
        value.format("%H:%M:%S").to_string()
    } else {
        value.format("%H:%M:%S%.3f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell { row: 1, col: 2, kind, value: value.to_owned() }
    }

    #[test]
    fn builtin_and_custom_formats() {
        assert_eq!(CellType::parse_builtin_number_format_id("14", false), Some(CellType::NumberDate1900));
        assert_eq!(CellType::parse_builtin_number_format_id("22", true), Some(CellType::NumberDateTime1904));
        assert_eq!(CellType::parse_builtin_number_format_id("2", false), None);

        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", false), CellType::NumberTime1900);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", true), CellType::NumberDateTime1904);
        assert_eq!(CellType::parse_custom_number_format("#,##0.00 \"days\"", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("0\\d", false), CellType::Number);
    }

    #[test]
    fn values_by_kind() {
        assert_eq!(cell(CellType::Boolean, "1").to_value(), Ok(Some(Value::Boolean(true))));
        assert_eq!(cell(CellType::Boolean, "0").to_value(), Ok(Some(Value::Boolean(false))));
        assert_eq!(cell(CellType::Number, "1250.5").to_value(), Ok(Some(Value::Number(1250.5))));
        assert_eq!(cell(CellType::Text, "Fund IV").to_value(), Ok(Some(Value::Text("Fund IV".to_owned()))));
        assert_eq!(cell(CellType::Error, "#N/A").to_value(), Ok(None));
        assert!(cell(CellType::Number, "abc").to_value().is_err());
    }

    #[test]
    fn serial_dates() {
        let text = |kind, value| match cell(kind, value).to_value() {
            Ok(Some(Value::Text(text))) => text,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(text(CellType::NumberDate1900, "1"), "1900-01-01");
        assert_eq!(text(CellType::NumberDate1900, "61"), "1900-03-01");
        assert_eq!(text(CellType::NumberDate1900, "45292"), "2024-01-01");
        assert_eq!(text(CellType::NumberDate1904, "0"), "1904-01-01");
        assert_eq!(text(CellType::NumberDateTime1900, "45292.5"), "2024-01-01 12:00:00");
        assert_eq!(text(CellType::NumberTime1900, "0.75"), "18:00:00");
        assert_eq!(text(CellType::IsoDateTime, "2024-03-31T09:30:00"), "2024-03-31 09:30:00");
        assert_eq!(text(CellType::IsoDuration, "PT13H45M00S"), "13:45:00");
    }

    #[test]
    fn reference_of_cell() {
        assert_eq!(cell(CellType::Text, "x").reference(), "C2");
    }
}
