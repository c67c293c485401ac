//! Error types for pdfbundle.
//!
//! This module defines all error types that can occur while assembling a
//! bundle. Errors are designed to be informative and actionable, providing
//! clear context about which document or file caused the failure.
//!
//! # Error Categories
//!
//! - **I/O Errors**: File not found, permission denied, etc.
//! - **Source Errors**: A document's bytes cannot be parsed, or its recorded
//!   page count disagrees with its content
//! - **Configuration Errors**: Invalid or unreadable bundle configuration
//! - **Generation Errors**: Problems while building the output document

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for pdfbundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Main error type for pdfbundle operations.
///
/// A bundle build either completes or fails with exactly one of these; no
/// partially assembled output is ever returned alongside an error.
#[derive(Debug)]
pub enum BundleError {
    /// Input file was not found.
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Path exists but is not a regular file.
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// A source document's bytes could not be parsed as a PDF.
    MalformedSource {
        /// Display name of the offending document.
        document: String,
        /// Reason reported by the parser.
        reason: String,
    },

    /// A document's recorded page count differs from its actual content.
    PageCountMismatch {
        /// Display name of the offending document.
        document: String,
        /// Page count recorded at intake.
        expected: usize,
        /// Pages actually present in the source bytes.
        actual: usize,
    },

    /// Invalid configuration.
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Output file already exists and overwrite is not allowed.
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Building the output document failed.
    GenerationFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// User cancelled the operation.
    Cancelled,

    /// Generic I/O error.
    Io {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic error with a custom message.
    Other {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            Self::FileNotAccessible { path, source } => {
                write!(
                    f,
                    "Cannot access file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::NotAFile { path } => {
                write!(f, "Not a file: {}", path.display())
            }
            Self::MalformedSource { document, reason } => {
                write!(
                    f,
                    "Document '{document}' is not a readable PDF\n  Reason: {reason}"
                )
            }
            Self::PageCountMismatch {
                document,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Document '{document}' was recorded with {expected} page(s) but contains {actual}\n  \
                     Hint: re-add the document so its page count is probed again"
                )
            }
            Self::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {message}")
            }
            Self::OutputExists { path } => {
                write!(
                    f,
                    "Output file already exists: {}\n  \
                     Use --force to overwrite or choose a different output path",
                    path.display()
                )
            }
            Self::FailedToCreateOutput { path, source } => {
                write!(
                    f,
                    "Failed to create output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::FailedToWrite { path, source } => {
                write!(
                    f,
                    "Failed to write to output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::GenerationFailed { reason } => {
                write!(f, "Bundle generation failed: {reason}")
            }
            Self::Cancelled => {
                write!(f, "Operation cancelled by user")
            }
            Self::Io { source } => {
                write!(f, "I/O error: {source}")
            }
            Self::Other { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl std::error::Error for BundleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileNotAccessible { source, .. } => Some(source),
            Self::FailedToCreateOutput { source, .. } => Some(source),
            Self::FailedToWrite { source, .. } => Some(source),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for BundleError {
    fn from(err: io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<lopdf::Error> for BundleError {
    fn from(err: lopdf::Error) -> Self {
        Self::generation_failed(err.to_string())
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl BundleError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a MalformedSource error.
    pub fn malformed_source(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Name the document a MalformedSource error refers to.
    ///
    /// Other variants are returned unchanged.
    pub fn for_document(self, name: impl Into<String>) -> Self {
        match self {
            Self::MalformedSource { reason, .. } => Self::malformed_source(name, reason),
            other => other,
        }
    }

    /// Create a PageCountMismatch error.
    pub fn page_count_mismatch(document: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::PageCountMismatch {
            document: document.into(),
            expected,
            actual,
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create a GenerationFailed error.
    pub fn generation_failed(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FailedToCreateOutput { .. } | Self::FailedToWrite { .. } | Self::Cancelled
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::MalformedSource { .. } => 3,
            Self::PageCountMismatch { .. } => 3,
            Self::InvalidConfig { .. } => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::GenerationFailed { .. } => 6,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
