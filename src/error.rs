//! Error types for the keystroke form.
//!
//! Request handlers never show these to the browser; they are logged and
//! answered with a generic server error.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for keystroke form operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// The submitted keystroke list was not a valid JSON event array.
    #[error("invalid keystroke data: {0}")]
    Keystrokes(#[from] serde_json::Error),

    /// A required form field was not posted.
    #[error("missing form field '{0}'")]
    MissingField(&'static str),

    /// No IDs remain to hand out.
    #[error("no user IDs left to assign")]
    IdsExhausted,

    // === Spreadsheet Errors ===
    /// A text cell would exceed the spreadsheet's per-cell character limit.
    #[error("{column} holds {length} characters, over the 32767 character cell limit")]
    CellTooLong {
        /// Header of the offending column.
        column: &'static str,
        /// Character count of the rejected cell.
        length: usize,
    },

    /// Building or writing the workbook failed.
    #[error("failed to write spreadsheet: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Opening or reading an existing workbook failed.
    #[error("failed to read spreadsheet: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    /// The workbook opened but its contents do not match the table layout.
    #[error("malformed spreadsheet {path}: {message}")]
    MalformedSheet {
        /// Path of the offending file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Template Errors ===
    /// A page template failed to compile.
    #[cfg(feature = "web")]
    #[error("failed to register template: {0}")]
    Template(Box<handlebars::TemplateError>),

    /// A page failed to render.
    #[cfg(feature = "web")]
    #[error("failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// A thread panicked while holding the store lock.
    #[error("keystroke store is unavailable")]
    StorePoisoned,

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for keystroke form operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

#[cfg(feature = "web")]
impl From<handlebars::TemplateError> for Error {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(Box::new(err))
    }
}

impl Error {
    /// Create a malformed spreadsheet error.
    #[must_use]
    pub fn malformed_sheet(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedSheet {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
