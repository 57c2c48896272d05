//! Error types for dependency synchronization.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synchronizing package dependencies.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No manifest exists at or above a requested or discovered folder.
    #[error("No package.json found at or above {}", path.display())]
    #[diagnostic(
        code(depsync::sync::manifest_not_found),
        help("Check the package path; every requested folder must contain or sit below a package.json")
    )]
    ManifestNotFound {
        /// The path that was searched from.
        path: PathBuf,
    },

    /// A configured extra file does not exist.
    #[error("Extra file not found: {}", path.display())]
    #[diagnostic(
        code(depsync::sync::extra_file_not_found),
        help("Remove the entry from extra_files or create the file before syncing")
    )]
    ExtraFileNotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// The package manager install exited with a non-zero status.
    #[error("Install failed in {} with exit code {exit_code}", folder.display())]
    #[diagnostic(
        code(depsync::sync::install_failed),
        help("Run the install manually in that folder to see the full package manager output")
    )]
    InstallFailed {
        /// Folder the install ran in.
        folder: PathBuf,
        /// Exit code reported by the package manager.
        exit_code: i32,
    },

    /// The package registry could not be queried.
    #[error("Registry query for {package} failed: {message}")]
    #[diagnostic(
        code(depsync::sync::registry),
        help("Check network access and the configured registry URL")
    )]
    Registry {
        /// Package being queried.
        package: String,
        /// The error message.
        message: String,
    },

    /// Manifest or lock-file error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Workspace(depsync_workspaces::Error),

    /// I/O error outside manifest handling.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(code(depsync::sync::io))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// Configuration error.
    #[error("Sync configuration error: {message}")]
    #[diagnostic(code(depsync::sync::config), help("{help}"))]
    Config {
        /// The error message.
        message: String,
        /// Help text for the user.
        help: String,
    },

    /// Wrapped TOML parsing error.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(depsync::sync::toml_parse))]
    TomlParse(#[from] toml::de::Error),

    /// A version registration pattern could not be compiled.
    #[error("Invalid registration pattern: {message}")]
    #[diagnostic(code(depsync::sync::invalid_pattern))]
    InvalidPattern {
        /// The error message.
        message: String,
    },
}

impl Error {
    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new registry error.
    #[must_use]
    pub fn registry(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registry {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error tied to a path.
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }

    /// Process exit code for this failure.
    ///
    /// Missing manifests map to 1, missing extra files to 2, and failed
    /// installs propagate the package manager's own code. Anything else is 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ExtraFileNotFound { .. } => 2,
            Self::InstallFailed { exit_code, .. } => *exit_code,
            _ => 1,
        }
    }
}

impl From<depsync_workspaces::Error> for Error {
    fn from(error: depsync_workspaces::Error) -> Self {
        match error {
            depsync_workspaces::Error::ManifestNotFound { path } => Self::ManifestNotFound { path },
            other => Self::Workspace(other),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Self::InvalidPattern {
            message: error.to_string(),
        }
    }
}
