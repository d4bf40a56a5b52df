//! String-in, string-out workbook tools for a tool-calling agent.
//!
//! Every tool returns a message or a JSON report; failures are rendered as
//! messages too, so a caller never sees a `NormalizerError` from this layer.

pub(crate) mod definitions;

pub use definitions::tool_definitions;
pub use definitions::FunctionCall;
pub use definitions::FunctionDefinition;
pub use definitions::ToolCall;
pub use definitions::ToolDefinition;

use crate::config::Config;
use crate::error::NormalizerError;
use crate::normalizer::Normalizer;
use crate::table::classify_columns;
use crate::table::csv::write_csv;
use crate::table::Table;
use crate::table::TableError;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Tables loaded by `read_workbook` and derived by `analyze_table_columns`, keyed by name.
pub type TableCache = BTreeMap<String, Table>;

/// Extensions picked up when searching the knowledge directory.
const DISCOVERED_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "ods"];

/// Extensions accepted by `validate_workbook`.
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xlam", "ods"];

/// Identifier argument: one column name or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdentifierArg {
    One(String),
    Many(Vec<String>),
}

impl IdentifierArg {
    fn into_vec(self) -> Vec<String> {
        match self {
            IdentifierArg::One(name) => vec![name],
            IdentifierArg::Many(names) => names,
        }
    }
}

/// Per-column statistics reported by `analyze_table_columns`.
#[derive(Debug, Clone, PartialEq)]
struct ColumnAnalysis {
    name: String,
    missing_percentage: f64,
    distinct_values: usize,
    numeric_or_boolean: bool,
    class: &'static str,
}

impl ColumnAnalysis {
    /// Mostly present and not constant.
    fn is_relevant(&self) -> bool {
        self.missing_percentage < 50.0 && self.distinct_values > 1
    }
}

pub struct WorkbookToolkit {
    normalizer: Normalizer,
}

impl WorkbookToolkit {
    pub fn new(config: Config) -> Result<Self, NormalizerError> {
        Ok(Self {
            normalizer: Normalizer::new(config)?,
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Execute a tool call and return its message.
    pub fn execute(&self, tables: &mut TableCache, tool_call: &ToolCall) -> String {
        let name = tool_call.function.name.as_str();
        debug!("Executing tool: {} with args: {}", name, tool_call.function.arguments);

        let args = match arguments(&tool_call.function.arguments) {
            Ok(args) => args,
            Err(message) => return failed(name, message),
        };

        let result = match name {
            "list_workbooks" => Ok(self.list_workbooks()),
            "get_sheet_names" => required(&args, "path").map(|path| self.get_sheet_names(path)),
            "validate_workbook" => required(&args, "path").map(|path| self.validate_workbook(path)),
            "convert_workbook" => required(&args, "path").map(|path| {
                self.convert_workbook(
                    path,
                    optional(&args, "output_type").unwrap_or("input_questions"),
                    optional(&args, "sheet_name"),
                    optional(&args, "filename_prefix"),
                )
            }),
            "split_csv" => required(&args, "csv_path").and_then(|csv_path| {
                let identifiers = args
                    .get("identifiers")
                    .cloned()
                    .ok_or_else(|| "Missing required parameter: identifiers".to_string())?;
                let identifiers: IdentifierArg = serde_json::from_value(identifiers)
                    .map_err(|_| "Parameter 'identifiers' must be a string or a list of strings".to_string())?;
                Ok(self.split_csv(csv_path, &identifiers.into_vec()))
            }),
            "read_workbook" => required(&args, "path").map(|path| self.read_workbook(tables, path)),
            "list_tables" => Ok(self.list_tables(tables)),
            "analyze_table_columns" => {
                required(&args, "table_name").map(|table_name| self.analyze_table_columns(tables, table_name))
            }
            "export_table" => required(&args, "table_name")
                .map(|table_name| self.export_table(tables, table_name, optional(&args, "filename"))),
            _ => Err(format!("Unknown tool: {}", name)),
        };

        result.unwrap_or_else(|message| failed(name, message))
    }

    /// Configured workbooks plus the ones found in the knowledge directory.
    pub fn workbooks(&self) -> Result<Vec<String>, NormalizerError> {
        let config = self.normalizer.config();
        let mut workbooks = config.workbooks.to_owned();

        let directory = glob::Pattern::escape(&config.output.knowledge_path().to_string_lossy());
        let mut discovered = Vec::new();
        for extension in DISCOVERED_EXTENSIONS {
            for entry in glob::glob(&format!("{directory}/*.{extension}"))? {
                let path = entry?;
                discovered.push(path.to_string_lossy().to_string());
            }
        }
        discovered.sort();
        for path in discovered {
            if !workbooks.contains(&path) {
                workbooks.push(path);
            }
        }
        Ok(workbooks)
    }

    /// JSON array of the available workbooks.
    pub fn list_workbooks(&self) -> String {
        match self.workbooks().and_then(|workbooks| Ok(serde_json::to_string(&workbooks)?)) {
            Ok(json) => json,
            Err(e) => failed("list_workbooks", format!("Error listing workbooks: {e}")),
        }
    }

    /// JSON array of the sheet names of a workbook.
    pub fn get_sheet_names(&self, path: &str) -> String {
        if let Some(message) = self.not_found(path) {
            return message;
        }
        info!("Getting sheet names from file: {}", path);
        match self
            .normalizer
            .sheet_names(Path::new(path))
            .and_then(|names| Ok(serde_json::to_string(&names)?))
        {
            Ok(json) => json,
            Err(e) => failed("get_sheet_names", format!("Error getting sheet names: {e}")),
        }
    }

    pub fn validate_workbook(&self, path: &str) -> String {
        let file_path = Path::new(path);
        if !file_path.is_file() {
            return format!("Error: File does not exist: {path}");
        }
        let extension = file_path
            .extension()
            .map(|extension| extension.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            return format!("Error: File does not have a workbook extension: {path}");
        }
        match self.normalizer.sheet_names(file_path) {
            Ok(_) => format!("Valid workbook: {path}"),
            Err(e) => format!("Invalid workbook: {path}. Error: {e}"),
        }
    }

    /// Converts a workbook into the `input_questions` or `knowledge` directory.
    pub fn convert_workbook(
        &self,
        path: &str,
        output_type: &str,
        sheet_name: Option<&str>,
        filename_prefix: Option<&str>,
    ) -> String {
        if let Some(message) = self.not_found(path) {
            return message;
        }
        let output = &self.normalizer.config().output;
        let output_dir = match output_type.to_lowercase().as_str() {
            "input_questions" => output.input_questions_path(),
            "knowledge" => output.knowledge_path(),
            _ => {
                return format!("Invalid output_type: {output_type}. Must be 'input_questions' or 'knowledge'.");
            }
        };

        info!("Converting workbook: {}", path);
        let result = self
            .normalizer
            .convert(Path::new(path), &output_dir, sheet_name, filename_prefix)
            .and_then(|conversion| {
                Ok(serde_json::to_string(&json!({
                    "status": "success",
                    "output_type": output_type,
                    "output_directory": output_dir,
                    "files_created": conversion.files,
                    "skipped_sheets": conversion.skipped_sheets,
                }))?)
            });
        match result {
            Ok(json) => json,
            Err(e) => failed("convert_workbook", format!("Error converting workbook: {e}")),
        }
    }

    /// Splits a CSV file on the identifier columns.
    pub fn split_csv<S: AsRef<str>>(&self, csv_path: &str, identifiers: &[S]) -> String {
        let result = self
            .normalizer
            .split_csv(Path::new(csv_path), identifiers)
            .and_then(|output| {
                Ok(serde_json::to_string(&json!({
                    "status": "success",
                    "numerical_file": output.numerical_file,
                    "text_file": output.text_file,
                    "numeric_columns": output.numeric_columns,
                    "text_columns": output.text_columns,
                }))?)
            });
        match result {
            Ok(json) => json,
            Err(e) => failed("split_csv", format!("Error splitting CSV: {e}")),
        }
    }

    /// Cleans every sheet of a workbook into the cache.
    pub fn read_workbook(&self, tables: &mut TableCache, path: &str) -> String {
        let validation = self.validate_workbook(path);
        if !validation.starts_with("Valid") {
            return validation;
        }
        match self.normalizer.clean_workbook(Path::new(path)) {
            Ok(loaded) => {
                let names = loaded.iter().map(|table| table.name().to_owned()).collect::<Vec<_>>();
                for table in loaded {
                    debug!(table = table.name(), rows = table.row_count(), columns = table.column_count(), "loaded table");
                    tables.insert(table.name().to_owned(), table);
                }
                format!("Successfully read workbook with {} tables: {}", names.len(), names.join(", "))
            }
            Err(e) => failed("read_workbook", format!("Error reading workbook: {e}")),
        }
    }

    pub fn list_tables(&self, tables: &TableCache) -> String {
        if tables.is_empty() {
            return "No tables loaded. Please read a workbook first.".to_string();
        }
        let mut result = "Loaded tables:\n".to_string();
        for (name, table) in tables {
            result.push_str(&format!("- {}: {} rows × {} columns\n", name, table.row_count(), table.column_count()));
        }
        result
    }

    /// Reports per-column statistics and caches `<name>_filtered` with the relevant columns.
    pub fn analyze_table_columns(&self, tables: &mut TableCache, table_name: &str) -> String {
        let Some(table) = tables.get(table_name) else {
            return not_loaded(table_name);
        };

        let analyses = analyze_columns(table);
        let relevant = analyses
            .iter()
            .enumerate()
            .filter(|(_, analysis)| analysis.is_relevant())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        let filtered_name = format!("{table_name}_filtered");
        let filtered = table.select(&filtered_name, &relevant);

        let mut result = format!("Column analysis for '{table_name}':\n\n");
        for analysis in &analyses {
            result.push_str(&format!(
                "- {}: {} (Missing: {:.2}%, Distinct values: {}, Class: {})\n",
                analysis.name,
                if analysis.is_relevant() { "relevant" } else { "not relevant" },
                analysis.missing_percentage,
                analysis.distinct_values,
                analysis.class,
            ));
        }
        let numeric = analyses.iter().filter(|analysis| analysis.numeric_or_boolean).count();
        result.push_str(&format!(
            "\n{} numeric/boolean and {} text columns.\nCreated filtered table '{}' with {} relevant columns.",
            numeric,
            analyses.len() - numeric,
            filtered_name,
            relevant.len()
        ));
        tables.insert(filtered_name, filtered);
        result
    }

    /// Writes a cached table to the knowledge directory.
    pub fn export_table(&self, tables: &TableCache, table_name: &str, filename: Option<&str>) -> String {
        let Some(table) = tables.get(table_name) else {
            return not_loaded(table_name);
        };
        let mut filename = filename.filter(|name| !name.is_empty()).unwrap_or(table_name).to_string();
        if filename.contains(['/', '\\']) || filename.contains("..") {
            return failed(
                "export_table",
                format!("Invalid filename '{filename}': expected a plain file name inside the knowledge directory"),
            );
        }
        if !filename.ends_with(".csv") {
            filename.push_str(".csv");
        }
        let output_path = self.normalizer.config().output.knowledge_path().join(filename);
        match write_csv(table, &output_path) {
            Ok(()) => {
                debug!("Exported '{}' to {}", table_name, output_path.display());
                format!("Successfully exported '{}' to {}", table_name, output_path.display())
            }
            Err(e) => failed("export_table", format!("Error exporting table: {e}")),
        }
    }

    /// "not found" message listing the known workbooks, or `None` when the file exists.
    fn not_found(&self, path: &str) -> Option<String> {
        if PathBuf::from(path).is_file() {
            return None;
        }
        warn!("Workbook not found: {}", path);
        Some(format!("File {} not found. Available files: {}", path, self.list_workbooks()))
    }
}

fn analyze_columns(table: &Table) -> Vec<ColumnAnalysis> {
    classify_columns(table)
        .into_iter()
        .enumerate()
        .map(|(index, (name, class))| {
            let missing_percentage = if table.row_count() == 0 {
                100.0
            } else {
                table.missing_count(index) as f64 / table.row_count() as f64 * 100.0
            };
            let distinct_values = table
                .column_values(index)
                .flatten()
                .filter(|value| !value.is_blank())
                .map(|value| format!("{value:?}"))
                .collect::<BTreeSet<_>>()
                .len();
            ColumnAnalysis {
                name,
                missing_percentage,
                distinct_values,
                numeric_or_boolean: class.is_numeric_or_boolean(),
                class: class.as_str(),
            }
        })
        .collect()
}

fn not_loaded(table_name: &str) -> String {
    NormalizerError::from(TableError::UnknownTableError(table_name.to_owned())).to_string()
}

fn failed(tool: &str, message: String) -> String {
    error!(tool, "{}", message);
    message
}

/// Arguments as an object; a JSON-encoded string is decoded and null means none.
fn arguments(arguments: &Value) -> Result<Value, String> {
    match arguments {
        Value::Null => Ok(json!({})),
        Value::String(text) if text.trim().is_empty() => Ok(json!({})),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) if value.is_object() => Ok(value),
            _ => Err(format!("Invalid tool arguments: {text}")),
        },
        Value::Object(_) => Ok(arguments.clone()),
        other => Err(format!("Invalid tool arguments: {other}")),
    }
}

fn required<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing required parameter: {}", name))
}

fn optional<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(|v| v.as_str()).filter(|v| !v.is_empty())
}
