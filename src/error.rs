//! Error types for slidewright

use thiserror::Error;

/// Result type alias for slidewright operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while navigating, extracting or exporting a deck
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start a rendering backend
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a slide URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to render content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to execute the in-page extraction script
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// The measurement returned by a backend could not be decoded
    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Export was requested for a deck with no slides
    #[error("Deck has no slides; at least one slide is required")]
    EmptyDeck,

    /// Theme name does not match any built-in theme
    #[error("Unknown theme '{name}' (known themes: {})", known.join(", "))]
    UnknownTheme { name: String, known: Vec<String> },

    /// Edit command addressed a node id that does not exist
    #[error("Unknown editable node: {0}")]
    UnknownNode(String),

    /// Failed to build or merge a PDF document
    #[error("PDF error: {0}")]
    PdfError(String),

    /// Failed to write an OOXML package
    #[error("Package error: {0}")]
    PackageError(String),

    /// An external command (bundler, git) failed
    #[error("Command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::PackageError(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfError(err.to_string())
    }
}
