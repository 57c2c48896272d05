//! Error types for manifest and lock-file operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for manifest and lock-file operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing package descriptors.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Manifest file not found.
    #[error("Manifest file not found at path: {path}")]
    #[diagnostic(
        code(depsync::workspaces::manifest_not_found),
        help("Ensure a package.json exists at or above the given path")
    )]
    ManifestNotFound {
        /// The path where the manifest was expected.
        path: PathBuf,
    },

    /// The manifest parsed as JSON but does not have the expected shape.
    #[error("Invalid manifest at {path}: {message}")]
    #[diagnostic(
        code(depsync::workspaces::invalid_manifest),
        help("package.json must be a JSON object; dependency maps must be objects of strings")
    )]
    InvalidManifest {
        /// Path to the invalid manifest.
        path: PathBuf,
        /// Description of what is invalid.
        message: String,
    },

    /// The lock file parsed as JSON but is not an object.
    #[error("Invalid lockfile at {path}: {message}")]
    #[diagnostic(
        code(depsync::workspaces::invalid_lockfile),
        help("The lockfile may be corrupted. Try regenerating it with your package manager")
    )]
    InvalidLockfile {
        /// Path to the lockfile.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(depsync::workspaces::io_error),
        help(
            "Check that the referenced paths exist and that you have permission to read or write them"
        )
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(depsync::workspaces::json_error),
        help("Ensure the file contains valid JSON")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Build an I/O error tied to a path.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}
