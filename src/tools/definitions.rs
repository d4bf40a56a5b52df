//! JSON schema definitions for the workbook tools.

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

/// Tool definition in the function-calling format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call to dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Object of arguments, or the same object encoded as a JSON string.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: &str, arguments: Value) -> Self {
        Self {
            function: FunctionCall {
                name: name.to_string(),
                arguments,
            },
        }
    }
}

fn definition(name: &str, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        },
    }
}

/// Get the definitions of every workbook tool.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        definition(
            "list_workbooks",
            "List the configured workbooks and the workbooks found in the knowledge directory.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        definition(
            "get_sheet_names",
            "Get the sheet names of a workbook, in workbook order.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the workbook"
                    }
                },
                "required": ["path"]
            }),
        ),
        definition(
            "validate_workbook",
            "Check that a file exists, has a workbook extension and can be opened.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the workbook"
                    }
                },
                "required": ["path"]
            }),
        ),
        definition(
            "convert_workbook",
            "Clean every sheet of a workbook, or one named sheet, and save each as a CSV file.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the workbook"
                    },
                    "output_type": {
                        "type": "string",
                        "enum": ["input_questions", "knowledge"],
                        "description": "Directory to write to (default: input_questions)"
                    },
                    "sheet_name": {
                        "type": "string",
                        "description": "Only convert this sheet"
                    },
                    "filename_prefix": {
                        "type": "string",
                        "description": "Prefix for the output file names"
                    }
                },
                "required": ["path"]
            }),
        ),
        definition(
            "split_csv",
            "Split a CSV file into numerical and text files that both keep the identifier columns.",
            json!({
                "type": "object",
                "properties": {
                    "csv_path": {
                        "type": "string",
                        "description": "Path to the CSV file"
                    },
                    "identifiers": {
                        "oneOf": [
                            { "type": "string" },
                            { "type": "array", "items": { "type": "string" } }
                        ],
                        "description": "Identifier column name, or list of names"
                    }
                },
                "required": ["csv_path", "identifiers"]
            }),
        ),
        definition(
            "read_workbook",
            "Clean every sheet of a workbook and keep the non-empty ones as tables named <file>_<sheet>.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to the workbook"
                    }
                },
                "required": ["path"]
            }),
        ),
        definition(
            "list_tables",
            "List the loaded tables with their shapes.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        definition(
            "analyze_table_columns",
            "Report missing percentage, distinct values and class per column, and keep the relevant columns as <name>_filtered.",
            json!({
                "type": "object",
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "Name of a loaded table"
                    }
                },
                "required": ["table_name"]
            }),
        ),
        definition(
            "export_table",
            "Write a loaded table to a CSV file in the knowledge directory.",
            json!({
                "type": "object",
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "Name of a loaded table"
                    },
                    "filename": {
                        "type": "string",
                        "description": "Output file name, with or without .csv (default: the table name)"
                    }
                },
                "required": ["table_name"]
            }),
        ),
    ]
}
