//! Tracing setup for the depsync binary.
//!
//! Two layers share one registry: a fmt layer for diagnostics, filtered by
//! `--level` or `RUST_LOG`, and the [`SyncEventLayer`] that turns
//! `depsync::*` events into typed events for the renderers. The two filters
//! are disjoint: user-facing output does not depend on the log level, and
//! every sync event is printed once, by the renderer.

use depsync_events::{EventBus, EventReceiver, SyncEventLayer, correlation_id};
use std::io;
pub use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, FilterExt, filter_fn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Multi-line human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format
    Json,
}

/// Log level options for the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    #[default]
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl std::str::FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown tracing format: {s}")),
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format of the fmt layer.
    pub format: TracingFormat,
    /// Level used when no filter directive is given.
    pub level: Level,
    /// Explicit filter directive; overrides `RUST_LOG` and `level`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Pretty,
            level: Level::WARN,
            filter: None,
        }
    }
}

/// Filter directive used when neither `filter` nor `RUST_LOG` is set.
fn default_directive(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("depsync={level},depsync_sync={level},depsync_workspaces={level},depsync_events={level}")
}

fn env_filter(config: &TracingConfig) -> miette::Result<EnvFilter> {
    match &config.filter {
        Some(filter) => EnvFilter::try_new(filter),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive(config.level))),
    }
    .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))
}

/// Targets used by the `depsync_events` emit macros.
fn is_sync_event(target: &str) -> bool {
    target.starts_with("depsync::")
}

/// Installs the global subscriber and returns a receiver for sync events.
///
/// Must be called inside a tokio runtime because the [`EventBus`] spawns its
/// forwarding task on creation.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or the bus is closed.
pub fn init_tracing(config: &TracingConfig, bus: &EventBus) -> miette::Result<EventReceiver> {
    let filter = env_filter(config)?;
    let sender = bus
        .sender()
        .ok_or_else(|| miette::miette!("Event bus is already shut down"))?;

    // Subscribe before any event can be emitted.
    let receiver = bus.subscribe();
    let events = SyncEventLayer::new(sender)
        .with_filter(filter_fn(|meta| is_sync_event(meta.target())));

    let fmt = match config.format {
        TracingFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stderr)
            .with_target(true)
            .boxed(),
        TracingFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(false)
            .boxed(),
        TracingFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .boxed(),
    };

    // Sync events reach the terminal through the renderer only.
    let diagnostics = filter_fn(|meta| !is_sync_event(meta.target())).and(filter);

    tracing_subscriber::registry()
        .with(events)
        .with(fmt.with_filter(diagnostics))
        .try_init()
        .map_err(|e| miette::miette!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized for depsync"
    );

    Ok(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(
            "pretty".parse::<TracingFormat>().unwrap(),
            TracingFormat::Pretty
        );
        assert_eq!("JSON".parse::<TracingFormat>().unwrap(), TracingFormat::Json);
        assert!("dev".parse::<TracingFormat>().is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
        assert_eq!(Level::from(LogLevel::default()), Level::WARN);
    }

    #[test]
    fn test_default_directive_covers_all_crates() {
        let directive = default_directive(Level::DEBUG);
        for target in ["depsync=", "depsync_sync=", "depsync_workspaces=", "depsync_events="] {
            assert!(directive.contains(&format!("{target}debug")), "{directive}");
        }
    }

    #[test]
    fn test_sync_event_targets_are_split_from_diagnostics() {
        assert!(is_sync_event("depsync::log"));
        assert!(is_sync_event("depsync::install"));
        assert!(!is_sync_event("depsync_sync::orchestrator"));
        assert!(!is_sync_event("depsync"));
    }

    #[test]
    fn test_explicit_filter_wins() {
        let config = TracingConfig {
            filter: Some("depsync_sync=trace".to_string()),
            ..TracingConfig::default()
        };
        assert!(env_filter(&config).is_ok());

        let invalid = TracingConfig {
            filter: Some("depsync_sync=loud".to_string()),
            ..TracingConfig::default()
        };
        assert!(env_filter(&invalid).is_err());
    }
}
