//! # Spreadsheet readers
//!
//! Pure-Rust readers for Office Open XML (`.xlsx`, `.xlsm`, `.xlam`) and
//! OpenDocument (`.ods`) workbooks. Each reader lists its sheet names on open
//! and materialises one sheet at a time as a sparse cell grid.
//!
//! Legacy binary workbooks (`.xls`, `.xla`, `.xlsb`) and password-protected
//! files are recognised and rejected.

pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::NormalizerError;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Buffered local file, the source every reader works on.
pub(crate) type FileReader = BufReader<File>;

/// Signature of an OLE2 compound file: legacy `.xls` workbooks and encrypted OOXML packages.
const COMPOUND_FILE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("File '{0}' not found")]
    FileNotFoundError(String),

    #[error("Unsupported spreadsheet format '{0}', expected .xlsx, .xlsm, .xlam or .ods")]
    UnsupportedFormatError(String),

    #[error("Missing '{0}' in the workbook container")]
    FileError(String),

    #[error("Sheet '{1}' not found in '{0}'")]
    SheetNotFoundError(String, String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Invalid value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),

    #[error("Sheet '{1}' in '{0}' spans {2} rows by {3} columns, more cells than can be loaded")]
    SheetTooLargeError(String, String, usize, usize),
}

/// A workbook opened for reading.
pub(crate) trait Spreadsheet {
    /// File name of the workbook
    fn name(&self) -> String;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads every non-empty cell of the named sheet.
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, NormalizerError>;
}

/// Opens a workbook, choosing the reader by file extension.
pub(crate) fn open_spreadsheet(path: &Path) -> Result<Box<dyn Spreadsheet>, NormalizerError> {
    let file_name = path.to_string_lossy().to_string();
    if !path.is_file() {
        Err(SpreadsheetError::FileNotFoundError(file_name.to_owned()))?;
    }

    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let is_compound_file = has_compound_file_magic(path)?;
    debug!(file = %file_name, extension = %extension, "opening spreadsheet");
    let spreadsheet: Box<dyn Spreadsheet> = match extension.as_str() {
        "xlsx" | "xlsm" | "xlam" if is_compound_file => {
            return Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name).into());
        }
        "xlsx" | "xlsm" | "xlam" => Box::new(XlsxSpreadsheet::open(&file_name)?),
        "ods" => Box::new(OdsSpreadsheet::open(&file_name)?),
        _ => return Err(SpreadsheetError::UnsupportedFormatError(file_name).into()),
    };
    Ok(spreadsheet)
}

/// Returns `true` if the file is an OLE2 compound file; short files are not.
fn has_compound_file_magic(path: &Path) -> Result<bool, NormalizerError> {
    let mut buffer = [0u8; 8];
    let mut file = File::open(path)?;
    let mut length = 0;
    while length < buffer.len() {
        match file.read(&mut buffer[length..])? {
            0 => return Ok(false),
            count => length += count,
        }
    }
    Ok(buffer == COMPOUND_FILE_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spreadsheet::fixtures::write_ods;
    use crate::spreadsheet::fixtures::write_xlsx;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_found() {
        let directory = TempDir::new().unwrap();
        let error = open_spreadsheet(&directory.path().join("absent.xlsx")).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn legacy_and_unknown_formats_are_rejected() {
        let directory = TempDir::new().unwrap();

        let legacy = directory.path().join("legacy.xls");
        std::fs::write(&legacy, COMPOUND_FILE_MAGIC).unwrap();
        let error = open_spreadsheet(&legacy).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Format);

        let text = directory.path().join("notes.txt");
        std::fs::write(&text, "hello").unwrap();
        let error = open_spreadsheet(&text).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Format);
    }

    #[test]
    fn encrypted_package_is_password_protected() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("secret.xlsx");
        let mut content = COMPOUND_FILE_MAGIC.to_vec();
        content.extend_from_slice(&[0u8; 504]);
        std::fs::write(&path, content).unwrap();

        let error = open_spreadsheet(&path).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Format);
        assert!(error.to_string().contains("password protected"), "{error}");
    }

    #[test]
    fn corrupt_container_is_format_error() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("broken.xlsx");
        std::fs::write(&path, "not a zip archive").unwrap();

        let error = open_spreadsheet(&path).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Format);
    }

    #[test]
    fn dispatch_by_extension() {
        let directory = TempDir::new().unwrap();
        let xlsx = directory.path().join("Book.XLSX");
        write_xlsx(&xlsx, &[("Data", vec![vec!["a"]]), ("Notes", vec![])]);
        let ods = directory.path().join("book.ods");
        write_ods(&ods, &[("Only", vec![vec!["a"]])]);

        assert_eq!(open_spreadsheet(&xlsx).unwrap().sheet_names(), vec!["Data", "Notes"]);
        assert_eq!(open_spreadsheet(&ods).unwrap().sheet_names(), vec!["Only"]);
    }
}
