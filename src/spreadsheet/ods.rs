use crate::error::NormalizerError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::FileReader;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// XML element name for spreadsheet root
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");
/// XML element name for tab characters
const TAB: QName = QName(b"text:tab");
/// XML element name for line breaks inside a paragraph
const LINE_BREAK: QName = QName(b"text:line-break");

/// Error types specific to ODS spreadsheet processing
#[derive(Error, Debug)]
pub enum OdsError {
    /// Invalid ODS MIME type detected in file
    #[error("Invalid ODS MIME type")]
    MimeTypeError,
}

/// ODS spreadsheet handler for reading OpenDocument Spreadsheet files
pub(crate) struct OdsSpreadsheet {
    /// Name of the ODS file
    pub(crate) name: String,
    /// ZIP archive containing the ODS file contents
    zip: ZipArchive<FileReader>,
    /// Table names in document order
    sheets: Vec<String>,
}

impl OdsSpreadsheet {
    /// Opens an ODS file, validates its format and collects the table names.
    pub(crate) fn open(file_name: &str) -> Result<Self, NormalizerError> {
        let file = File::open(file_name)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
        }
        let sheets = load_sheet_names(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?;
        }
        debug!(file = file_name, sheets = sheets.len(), "opened ods workbook");
        Ok(OdsSpreadsheet {
            name: file_name.to_owned(),
            zip,
            sheets,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.to_owned()
    }

    /// Reads the named table from `content.xml`.
    ///
    /// Repeated rows and columns are expanded for non-empty cells, comments are
    /// skipped, and error cells are left out.
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, NormalizerError> {
        if !self.sheets.iter().any(|name| name == sheet_name) {
            Err(SpreadsheetError::SheetNotFoundError(self.name.to_owned(), sheet_name.to_owned()))?;
        }

        let mut sheet = Sheet::new(&self.name, sheet_name);
        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
        let mut found = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                if event.get_attribute_value("table:name")?.is_some_and(|name| name == sheet_name) {
                    found = true;
                    break;
                }
            }
        });
        if !found {
            Err(SpreadsheetError::SheetNotFoundError(self.name.to_owned(), sheet_name.to_owned()))?;
        }

        // Cell position
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        // Reading paragraphs of a string cell
        let mut element_context = false;
        // Inside a comment
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row = row.saturating_add(row_count);
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                element_context = false;
                col_count = event.parse_attribute_value::<usize>("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                let is_error = event.get_attribute_value("calcext:value-type")?.is_some_and(|cow| cow == "error");
                kind = match value_type.as_deref() {
                    None => CellType::Empty,
                    Some(_) if is_error => CellType::Error,
                    Some("boolean") => CellType::Boolean,
                    Some("date") => CellType::IsoDateTime,
                    Some("time") => CellType::IsoDuration,
                    Some("string") => CellType::Text,
                    Some(_) => CellType::Number,
                };

                let attribute = match kind {
                    CellType::Boolean => "office:boolean-value",
                    CellType::IsoDateTime => "office:date-value",
                    CellType::IsoDuration => "office:time-value",
                    CellType::Text => "office:string-value",
                    CellType::Number => "office:value",
                    _ => "",
                };
                if !attribute.is_empty() {
                    if let Some(data) = event.get_attribute_value(attribute)? {
                        if kind == CellType::Boolean {
                            value.push_str(if data != "false" && data != "0" { "1" } else { "0" });
                        } else {
                            value.push_str(&data);
                        }
                    } else if kind == CellType::Text {
                        element_context = true;
                    }
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if kind != CellType::Empty && kind != CellType::Error && !value.is_empty() {
                    let last_row = row.saturating_add(row_count.saturating_sub(1));
                    let last_col = col.saturating_add(col_count.saturating_sub(1));
                    sheet.check_position(last_row, last_col)?;
                    sheet.reserve(row_count.saturating_mul(col_count))?;
                    for row_offset in 0..row_count {
                        for col_offset in 0..col_count {
                            sheet.push(Cell {
                                row: row + row_offset,
                                col: col + col_offset,
                                kind,
                                value: value.to_owned(),
                            })?;
                        }
                    }
                }
                col = col.saturating_add(col_count);
                element_context = false;
                comment_context = false;
            }
            // String content
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == STRING => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1);
                for _ in 0..count {
                    value.push(' ');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == TAB => value.push('\t'),
            Event::Start(event) if element_context && !comment_context && event.name() == LINE_BREAK => value.push('\n'),
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });
        sheet.finish();
        debug!(file = %self.name, sheet = sheet_name, cells = sheet.cells.len(), "read ods sheet");
        Ok(sheet)
    }
}

/// Collects the `table:name` of every table in `content.xml`, without reading cells.
fn load_sheet_names(zip: &mut ZipArchive<FileReader>) -> Result<Vec<String>, NormalizerError> {
    let mut reader = zip
        .xml_reader("content.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
    let mut sheets = Vec::<String>::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == SPREADSHEET => break,
        Event::Start(event) if event.name() == TABLE => {
            if let Some(name) = event.get_attribute_value("table:name")? {
                sheets.push(name.to_string());
            }
        }
    });
    Ok(sheets)
}

/// Validates the `mimetype` entry when the package has one.
fn check_mime(zip: &mut ZipArchive<FileReader>) -> Result<(), NormalizerError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Checks the manifest for encryption data; a package without manifest is not encrypted.
fn is_password_protected(zip: &mut ZipArchive<FileReader>) -> Result<bool, NormalizerError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spreadsheet::fixtures::write_ods;
    use crate::spreadsheet::fixtures::write_ods_content;
    use crate::table::Value;
    use tempfile::TempDir;

    fn text(value: &str) -> Option<Value> {
        Some(Value::Text(value.to_owned()))
    }

    #[test]
    fn reads_typed_cells() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("deals.ods");
        write_ods(&path, &[
            ("Summary", vec![vec!["ignored"]]),
            ("Deals", vec![vec!["Project Name", "IRR", "Active"], vec!["Alpha", "0.25", "TRUE"], vec!["Beta", "", "FALSE"]]),
        ]);

        let mut spreadsheet = OdsSpreadsheet::open(&path.to_string_lossy()).unwrap();
        assert_eq!(spreadsheet.sheet_names(), vec!["Summary", "Deals"]);

        let records = spreadsheet.read_sheet("Deals").unwrap().records().unwrap();
        assert_eq!(records[0], vec![text("Project Name"), text("IRR"), text("Active")]);
        assert_eq!(records[1], vec![text("Alpha"), Some(Value::Number(0.25)), Some(Value::Boolean(true))]);
        assert_eq!(records[2], vec![text("Beta"), None, Some(Value::Boolean(false))]);
    }

    #[test]
    fn repeated_cells_comments_and_errors() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("repeated.ods");
        write_ods_content(&path, r#"<table:table table:name="T">
            <table:table-row table:number-rows-repeated="2">
                <table:table-cell office:value-type="float" office:value="7" table:number-columns-repeated="2"/>
                <table:table-cell/>
                <table:table-cell office:value-type="string"><office:annotation><text:p>note</text:p></office:annotation><text:p>a<text:s text:c="2"/>b</text:p><text:p>c</text:p></table:table-cell>
            </table:table-row>
            <table:table-row>
                <table:table-cell office:value-type="string" calcext:value-type="error"><text:p>#N/A</text:p></table:table-cell>
                <table:table-cell office:value-type="date" office:date-value="2024-03-31"/>
                <table:table-cell office:value-type="time" office:time-value="PT13H45M00S"/>
            </table:table-row>
            <table:table-row table:number-rows-repeated="1048573"><table:table-cell table:number-columns-repeated="16384"/></table:table-row>
        </table:table>"#);

        let mut spreadsheet = OdsSpreadsheet::open(&path.to_string_lossy()).unwrap();
        let sheet = spreadsheet.read_sheet("T").unwrap();
        assert_eq!(sheet.dimensions(), (3, 4));

        let records = sheet.records().unwrap();
        let seven = Some(Value::Number(7.0));
        assert_eq!(records[0], vec![seven.clone(), seven.clone(), None, text("a  b\nc")]);
        assert_eq!(records[1], records[0]);
        assert_eq!(records[2], vec![None, text("2024-03-31"), text("13:45:00"), None]);
    }

    #[test]
    fn unknown_sheet_is_format_error() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("book.ods");
        write_ods(&path, &[("Only", vec![vec!["a"]])]);
        let mut spreadsheet = OdsSpreadsheet::open(&path.to_string_lossy()).unwrap();
        assert_eq!(spreadsheet.read_sheet("Other").unwrap_err().kind(), ErrorKind::Format);
    }

    fn read_table(tables: &str) -> Result<Sheet, NormalizerError> {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("bounds.ods");
        write_ods_content(&path, tables);
        OdsSpreadsheet::open(&path.to_string_lossy())?.read_sheet("T")
    }

    #[test]
    fn repeats_past_grid_are_rejected() {
        let error = read_table(r#"<table:table table:name="T">
            <table:table-row table:number-rows-repeated="1048576"><table:table-cell/></table:table-row>
            <table:table-row><table:table-cell office:value-type="float" office:value="1"/></table:table-row>
        </table:table>"#)
        .unwrap_err();
        assert!(matches!(error, NormalizerError::SpreadsheetError(SpreadsheetError::CellValueError(..))), "{error}");

        let error = read_table(r#"<table:table table:name="T">
            <table:table-row><table:table-cell office:value-type="string" office:string-value="x" table:number-columns-repeated="16385"/></table:table-row>
        </table:table>"#)
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Format);
        assert!(matches!(error, NormalizerError::SpreadsheetError(SpreadsheetError::CellValueError(..))), "{error}");
    }

    #[test]
    fn repeats_past_cell_budget_are_rejected() {
        let error = read_table(r#"<table:table table:name="T">
            <table:table-row table:number-rows-repeated="1048576"><table:table-cell office:value-type="float" office:value="0" table:number-columns-repeated="16384"/></table:table-row>
        </table:table>"#)
        .unwrap_err();
        assert!(matches!(error, NormalizerError::SpreadsheetError(SpreadsheetError::SheetTooLargeError(..))), "{error}");
    }
}
