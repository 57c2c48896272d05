//! Event type definitions for structured depsync events.
//!
//! Events are grouped by what they describe: plain log lines, per-package
//! progress, install steps and extra-file rewrites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured depsync event with full metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Correlation ID shared by every event of one process.
    pub correlation_id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Source information for the event.
    pub source: EventSource,
    /// The event category and data.
    pub category: EventCategory,
}

impl SyncEvent {
    /// Create a new event with the given category.
    #[must_use]
    pub fn new(correlation_id: Uuid, source: EventSource, category: EventCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_id,
            timestamp: Utc::now(),
            source,
            category,
        }
    }
}

/// Source information for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    /// The tracing target (e.g., "`depsync::package`").
    pub target: String,
}

impl EventSource {
    /// Create a new event source for a target.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Event categories organized by domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventCategory {
    /// Section headings, informational lines and errors.
    Log(LogEvent),
    /// Manifest processing events.
    Package(PackageEvent),
    /// Package-manager install events.
    Install(InstallEvent),
    /// Auxiliary text-file rewrite events.
    ExtraFile(ExtraFileEvent),
    /// Process lifecycle events.
    System(SystemEvent),
}

/// Plain log events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum LogEvent {
    /// Start of a named phase.
    Section {
        /// Section title.
        title: String,
    },
    /// Informational line.
    Info {
        /// Message text.
        message: String,
    },
    /// Failure description.
    Error {
        /// Message text.
        message: String,
        /// Path the failure relates to, if any.
        path: Option<String>,
    },
}

/// Manifest processing events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PackageEvent {
    /// A package folder was processed by the sync loop.
    Processed {
        /// Package name.
        name: String,
        /// Folder containing the manifest.
        path: String,
        /// Number of dependency entries rewritten.
        changed: usize,
    },
    /// One dependency entry was rewritten.
    DependencyChanged {
        /// Package whose manifest changed.
        package: String,
        /// Dependency name.
        dependency: String,
        /// Previous version string.
        from: String,
        /// New version string.
        to: String,
    },
}

/// Install step events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InstallEvent {
    /// An install is about to run.
    Started {
        /// Folder the install runs in.
        path: String,
    },
    /// An install finished.
    Completed {
        /// Folder the install ran in.
        path: String,
        /// Process exit code.
        exit_code: i32,
    },
}

/// Extra-file rewrite events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ExtraFileEvent {
    /// A registered version inside an extra file was rewritten.
    Updated {
        /// Extra file path.
        path: String,
        /// Package whose registration changed.
        package: String,
        /// Previous version.
        from: String,
        /// New version.
        to: String,
    },
}

/// Process lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SystemEvent {
    /// No further events will follow; renderers stop on this.
    Shutdown,
}
