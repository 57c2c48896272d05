use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use depsync_sync::DependencyType;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code for CLI or configuration errors
pub const EXIT_FAILURE: i32 = 1;

/// CLI-specific error types with exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 1)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(depsync::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Failure reported by the sync engine; keeps its own exit code
    #[error(transparent)]
    #[diagnostic(transparent)]
    Sync(#[from] depsync_sync::Error),
    /// Other unexpected error (exit code 1)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(depsync::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Sync(err) => err.exit_code(),
            Self::Config { .. } | Self::Other { .. } => EXIT_FAILURE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "depsync")]
#[command(about = "Keep locally cloned npm packages wired to each other")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Diagnostic log format",
        default_value = "pretty",
        value_enum
    )]
    pub format: TracingFormat,

    #[arg(long, global = true, help = "Output events and the run report as JSON")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Show version information")]
    Version,
    #[command(about = "Rewrite dependencies on local clones and reinstall")]
    Sync(SyncArgs),
}

/// Version policy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    /// `file:` reference to the clone
    Local,
    /// Caret range on the latest published version
    Latest,
}

impl From<TypeArg> for DependencyType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Local => Self::Local,
            TypeArg::Latest => Self::Latest,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    #[arg(help = "Package folders to synchronize, added to those from the config file")]
    pub paths: Vec<PathBuf>,

    #[arg(
        long = "type",
        short = 't',
        value_enum,
        help = "Version policy for rewritten dependencies [default: local]"
    )]
    pub dependency_type: Option<TypeArg>,

    #[arg(long, short = 'r', help = "Follow local clones transitively")]
    pub recursive: bool,

    #[arg(long, help = "Install even when a manifest did not change")]
    pub force_install: bool,

    #[arg(
        long = "extra-file",
        value_name = "FILE",
        help = "Text file whose version registrations are patched (repeatable)"
    )]
    pub extra_files: Vec<PathBuf>,

    #[arg(
        long,
        short = 'c',
        value_name = "FILE",
        help = "Config file [default: ./depsync.toml when present]"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Report changes without writing files or running installs")]
    pub dry_run: bool,

    #[arg(long, value_name = "URL", help = "npm registry used for latest versions")]
    pub registry: Option<String>,

    #[arg(
        long = "install-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Extra argument passed to npm install (repeatable)"
    )]
    pub install_args: Vec<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
