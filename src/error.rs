use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Error type returned by every stage of a conversion run.
///
/// A single enum is shared by discovery, decoding, record parsing and workbook output. Every
/// variant is fatal to the run that produced it.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input root could not be inspected or walked, or it yielded no matching files.
    #[error("discovery failed for '{}': {message}", .path.display())]
    Discovery { path: PathBuf, message: String },

    /// The requested character encoding is unknown or has no decoder.
    #[error("unknown encoding '{0}'")]
    Encoding(String),

    /// A conversion option is out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The file extension does not map to a supported text source.
    #[error("unsupported input format '{extension}' for '{}' (expected csv, tsv or txt)", .path.display())]
    Format { path: PathBuf, extension: String },

    /// A delimited record is malformed (e.g. an unterminated quoted field).
    #[error("failed to parse '{}' at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// Reading an input file failed.
    #[error("io error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output workbook could not be opened, modified or saved.
    #[error("workbook error: {0}")]
    Write(String),

    /// A cell reference or range string is not a valid A1-style reference.
    #[error("invalid cell range '{0}'")]
    InvalidRange(String),

    /// A sheet requested for reading does not exist in the workbook.
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn discovery(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attach a file path to errors raised by readers that were built without one.
    pub(crate) fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::Parse { line, message, .. } => Self::Parse {
                path: path.to_path_buf(),
                line,
                message,
            },
            Self::Io { source, .. } => Self::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConvertError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Write(err.to_string())
    }
}
