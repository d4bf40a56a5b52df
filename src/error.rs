use thiserror::Error;

/// Coarse classification of every failure the normalizer can report.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input path does not exist.
    NotFound,
    /// The container is unreadable, unsupported, protected, or lacks the requested sheet.
    Format,
    /// Nothing usable is left after pruning.
    EmptyInput,
    /// The caller passed arguments the operation cannot honour.
    InvalidInput,
    /// Reading or writing the file system failed.
    Io,
}

/// Main error type for the normalizer.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("{context}: {source}")]
    WithContextError {
        context: String,
        #[source]
        source: Box<NormalizerError>,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    GlobError(#[from] glob::GlobError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl NormalizerError {
    /// Returns the kind of the innermost error, looking through context wrappers.
    pub fn kind(&self) -> ErrorKind {
        use crate::spreadsheet::SpreadsheetError;
        use crate::table::TableError;
        match self {
            Self::WithContextError { source, .. } => source.kind(),
            Self::IoError(error) if error.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::IoError(_) | Self::GlobError(_) => ErrorKind::Io,
            Self::CsvError(error) => match error.kind() {
                csv::ErrorKind::Io(error) if error.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                csv::ErrorKind::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Format,
            },
            Self::SpreadsheetError(SpreadsheetError::FileNotFoundError(_)) => ErrorKind::NotFound,
            Self::SpreadsheetError(SpreadsheetError::SpreadsheetEmptyError(_)) => ErrorKind::EmptyInput,
            Self::SpreadsheetError(_) => ErrorKind::Format,
            Self::TableError(TableError::EmptyTableError(_)) => ErrorKind::EmptyInput,
            Self::TableError(_) | Self::ConfigError(_) | Self::JsonError(_) | Self::PatternError(_) => ErrorKind::InvalidInput,
            Self::ParseIntError(_)
            | Self::ZipError(_)
            | Self::XmlError(_)
            | Self::XmlEncodingError(_)
            | Self::XmlAttributeError(_)
            | Self::XmlHelperError(_)
            | Self::OdsError(_) => ErrorKind::Format,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, NormalizerError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|error| NormalizerError::WithContextError {
            context: message.to_owned(),
            source: Box::new(error),
        })
    }
}
