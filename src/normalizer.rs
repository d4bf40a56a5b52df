//! Workbook to delimited-file conversion: discovery, cleaning, splitting.

use crate::config::Config;
use crate::error::NormalizerError;
use crate::error::ResultMessage;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::Spreadsheet;
use crate::table::csv::read_csv;
use crate::table::csv::write_csv;
use crate::table::recover_header;
use crate::table::prune_columns;
use crate::table::prune_rows;
use crate::table::split_table;
use crate::table::ColumnClass;
use crate::table::Table;
use crate::table::TableError;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Files produced by converting one workbook.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Conversion {
    /// Written files, in sheet order
    pub files: Vec<PathBuf>,
    /// Sheets left out because nothing usable remained after cleaning
    pub skipped_sheets: Vec<String>,
}

/// Files and column classes produced by a numeric/text split.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitOutput {
    pub numerical_file: PathBuf,
    pub text_file: PathBuf,
    pub numeric_columns: Vec<String>,
    pub text_columns: Vec<String>,
}

/// Runs the cleaning pipeline with the configured thresholds and output layout.
#[derive(Clone, Debug)]
pub struct Normalizer {
    config: Config,
}

impl Normalizer {
    pub fn new(config: Config) -> Result<Self, NormalizerError> {
        config.thresholds.validate()?;
        Ok(Normalizer { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sheet names of a workbook, in workbook order, without reading cells.
    pub fn sheet_names(&self, path: &Path) -> Result<Vec<String>, NormalizerError> {
        Ok(open_spreadsheet(path)?.sheet_names())
    }

    /// Loads one sheet as a raw table named `<stem>_<sheet>`; the first row of the used range is the header.
    pub fn load_sheet(&self, path: &Path, sheet_name: &str) -> Result<Table, NormalizerError> {
        let mut spreadsheet = open_spreadsheet(path)?;
        read_table(spreadsheet.as_mut(), &file_stem(path), sheet_name)
    }

    /// Column pruning, then header recovery, then row pruning.
    pub fn clean(&self, table: &Table) -> Table {
        let thresholds = &self.config.thresholds;
        let pruned = prune_columns(table, thresholds.max_missing_column_fraction);
        let (recovered, promotions) = recover_header(&pruned, thresholds.max_unnamed_header_fraction);
        let cleaned = prune_rows(&recovered, thresholds.min_present_row_fraction);
        debug!(
            table = table.name(),
            dropped_columns = table.column_count() - pruned.column_count(),
            promotions,
            dropped_rows = recovered.row_count() - cleaned.row_count(),
            "cleaned table"
        );
        cleaned
    }

    /// Loads and cleans one sheet.
    pub fn clean_sheet(&self, path: &Path, sheet_name: &str) -> Result<Table, NormalizerError> {
        Ok(self.clean(&self.load_sheet(path, sheet_name)?))
    }

    /// Cleans every sheet of a workbook, leaving out sheets with nothing usable.
    pub fn clean_workbook(&self, path: &Path) -> Result<Vec<Table>, NormalizerError> {
        let mut spreadsheet = open_spreadsheet(path)?;
        let stem = file_stem(path);
        let mut tables = Vec::new();
        for sheet_name in spreadsheet.sheet_names() {
            let table = read_table(spreadsheet.as_mut(), &stem, &sheet_name)
                .with_prefix(&format!("sheet '{sheet_name}'"))?;
            let cleaned = self.clean(&table);
            if cleaned.is_empty() {
                warn!(file = %path.display(), sheet = %sheet_name, "sheet is empty after cleaning");
            } else {
                tables.push(cleaned);
            }
        }
        Ok(tables)
    }

    /// Converts every sheet, or only `sheet_name`, to `<prefix_><stem>_<sheet>.csv` in `output_dir`.
    ///
    /// Stops at the first sheet that cannot be read; files already written stay.
    /// Fails with an empty-input error when every selected sheet is empty after cleaning.
    pub fn convert(
        &self,
        path: &Path,
        output_dir: &Path,
        sheet_name: Option<&str>,
        filename_prefix: Option<&str>,
    ) -> Result<Conversion, NormalizerError> {
        let mut spreadsheet = open_spreadsheet(path)?;
        let stem = file_stem(path);
        let sheet_names = match sheet_name {
            Some(name) => vec![name.to_owned()],
            None => spreadsheet.sheet_names(),
        };
        info!(file = %path.display(), sheets = sheet_names.len(), "converting workbook");

        let mut conversion = Conversion::default();
        for sheet_name in sheet_names {
            let context = format!("sheet '{sheet_name}'");
            let table = read_table(spreadsheet.as_mut(), &stem, &sheet_name).with_prefix(&context)?;
            let cleaned = self.clean(&table);
            if cleaned.is_empty() {
                warn!(file = %path.display(), sheet = %sheet_name, "skipping sheet, empty after cleaning");
                conversion.skipped_sheets.push(sheet_name);
                continue;
            }

            let file_name = match filename_prefix.filter(|prefix| !prefix.is_empty()) {
                Some(prefix) => format!("{prefix}_{stem}_{}.csv", sanitize_file_name(&sheet_name)),
                None => format!("{stem}_{}.csv", sanitize_file_name(&sheet_name)),
            };
            let output = output_dir.join(file_name);
            write_csv(&cleaned, &output).with_prefix(&context)?;
            info!(sheet = %sheet_name, path = %output.display(), rows = cleaned.row_count(), "wrote sheet");
            conversion.files.push(output);
        }

        if conversion.files.is_empty() {
            return Err(TableError::EmptyTableError(path.display().to_string()).into());
        }
        Ok(conversion)
    }

    /// Converts several workbooks, attempting each one whatever happened to the others.
    pub fn convert_workbooks<P: AsRef<Path>>(
        &self,
        paths: &[P],
        output_dir: &Path,
    ) -> Vec<(PathBuf, Result<Conversion, NormalizerError>)> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let result = self.convert(path, output_dir, None, None);
                if let Err(error) = &result {
                    warn!(file = %path.display(), error = %error, "workbook conversion failed");
                }
                (path.to_path_buf(), result)
            })
            .collect()
    }

    /// Splits a table and writes `<stem>_numerical.csv` and `<stem>_text.csv` to the split directories.
    pub fn split_table<S: AsRef<str>>(
        &self,
        table: &Table,
        identifiers: &[S],
        stem: &str,
    ) -> Result<SplitOutput, NormalizerError> {
        let split = split_table(table, identifiers)?;
        let numerical_file = self.config.output.numerical_path().join(format!("{stem}_numerical.csv"));
        let text_file = self.config.output.text_path().join(format!("{stem}_text.csv"));
        write_csv(&split.numeric, &numerical_file)?;
        write_csv(&split.text, &text_file)?;

        let columns_of = |wanted: ColumnClass| {
            split
                .classes
                .iter()
                .filter(|(_, class)| *class == wanted)
                .map(|(name, _)| name.to_owned())
                .collect::<Vec<_>>()
        };
        let output = SplitOutput {
            numerical_file,
            text_file,
            numeric_columns: columns_of(ColumnClass::NumericOrBoolean),
            text_columns: columns_of(ColumnClass::Text),
        };
        info!(
            table = table.name(),
            numeric = output.numeric_columns.len(),
            text = output.text_columns.len(),
            "split table"
        );
        Ok(output)
    }

    /// Reads a delimited file and splits it, naming outputs after the file stem.
    pub fn split_csv<S: AsRef<str>>(&self, csv_path: &Path, identifiers: &[S]) -> Result<SplitOutput, NormalizerError> {
        let stem = file_stem(csv_path);
        let table = read_csv(csv_path, &stem)?;
        self.split_table(&table, identifiers, &stem)
    }
}

/// Reads one sheet of an open workbook as a table named `<stem>_<sheet>`.
fn read_table(spreadsheet: &mut dyn Spreadsheet, stem: &str, sheet_name: &str) -> Result<Table, NormalizerError> {
    let sheet = spreadsheet.read_sheet(sheet_name)?;
    if sheet.is_empty() {
        debug!(file = %spreadsheet.name(), sheet = sheet_name, "sheet has no cells");
    }
    let records = sheet.records()?;
    Ok(Table::from_records(&format!("{stem}_{sheet_name}"), records))
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Replaces characters that are not allowed in file names.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|character| match character {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            character if character.is_control() => '_',
            character => character,
        })
        .collect()
}
