//! # Sheet Normalizer
//!
//! Converts spreadsheet workbooks into clean CSV tables that downstream
//! retrieval and question-answering pipelines can index.
//!
//! ## Features
//!
//! - **Multi-format support**: Read Excel workbooks (`.xlsx`, `.xlsm`, `.xlam`)
//!   and OpenDocument spreadsheets (`.ods`) with a pure-Rust streaming XML reader
//! - **Cleaning pipeline**: Drop mostly-empty columns, recover headers buried under
//!   title rows, then drop sparse rows
//! - **Numeric/text split**: Project a table into numerical and free-text files that
//!   share the identifier columns
//! - **Round trip**: Read written CSV files back as typed tables
//! - **Tool surface**: String-in, string-out tools with JSON schema definitions for
//!   tool-calling agents
//!
//! ## Usage
//!
//! ```no_run
//! use sheet_normalizer::{Config, Normalizer};
//! use std::path::Path;
//!
//! let normalizer = Normalizer::new(Config::default())?;
//! let conversion = normalizer.convert(Path::new("data/knowledge/portfolio.xlsx"), Path::new("out"), None, None)?;
//! for file in &conversion.files {
//!     println!("{}", file.display());
//! }
//! # Ok::<(), sheet_normalizer::NormalizerError>(())
//! ```
//!
//! Logging goes through `tracing`; install a subscriber in the host to see it.

pub mod config;
pub mod error;
mod helpers;
pub mod normalizer;
mod spreadsheet;
pub mod table;
pub mod tools;

pub use config::Config;
pub use config::ConfigError;
pub use config::OutputConfig;
pub use config::ThresholdConfig;
pub use error::ErrorKind;
pub use error::NormalizerError;
pub use normalizer::Conversion;
pub use normalizer::Normalizer;
pub use normalizer::SplitOutput;
pub use spreadsheet::ods::OdsError;
pub use spreadsheet::SpreadsheetError;
pub use table::csv::read_csv;
pub use table::csv::write_csv;
pub use table::Table;
pub use table::TableError;
pub use table::Value;
pub use tools::tool_definitions;
pub use tools::TableCache;
pub use tools::ToolCall;
pub use tools::WorkbookToolkit;
