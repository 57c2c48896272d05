//! Structured event system for depsync.
//!
//! The synchronization engine never prints. It emits `tracing` events with a
//! `depsync::*` target and an `event_type` field through the macros below. A
//! custom tracing Layer ([`SyncEventLayer`]) captures those events, converts
//! them to typed [`SyncEvent`] values and forwards them to an [`EventBus`],
//! where renderers subscribe.
//!
//! # Usage
//!
//! ```rust,ignore
//! use depsync_events::{EventBus, SyncEventLayer, emit_section};
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let bus = EventBus::new();
//! let layer = SyncEventLayer::new(bus.sender().unwrap());
//!
//! tracing_subscriber::registry().with(layer).init();
//!
//! emit_section!("Updating dependencies");
//! ```

pub mod bus;
pub mod event;
pub mod layer;
pub mod metadata;
pub mod renderers;

pub use bus::{EventBus, EventReceiver};
pub use event::{
    EventCategory, EventSource, ExtraFileEvent, InstallEvent, LogEvent, PackageEvent, SyncEvent,
    SystemEvent,
};
pub use layer::SyncEventLayer;
pub use metadata::correlation_id;
pub use renderers::{CliRenderer, CliRendererConfig, JsonRenderer};

// ============================================================================
// Emit Macros
// ============================================================================

/// Emit a section heading.
///
/// # Example
/// ```rust,ignore
/// emit_section!("Installing packages");
/// ```
#[macro_export]
macro_rules! emit_section {
    ($title:expr) => {
        ::tracing::info!(
            target: "depsync::log",
            event_type = "sync.section",
            title = %$title,
        )
    };
}

/// Emit an informational line.
#[macro_export]
macro_rules! emit_info {
    ($message:expr) => {
        ::tracing::info!(
            target: "depsync::log",
            event_type = "sync.info",
            message = %$message,
        )
    };
}

/// Emit an error line, optionally tied to a path.
///
/// # Example
/// ```rust,ignore
/// emit_error!("No package.json found", "/ws/missing");
/// ```
#[macro_export]
macro_rules! emit_error {
    ($message:expr) => {
        ::tracing::error!(
            target: "depsync::log",
            event_type = "sync.error",
            message = %$message,
        )
    };
    ($message:expr, $path:expr) => {
        ::tracing::error!(
            target: "depsync::log",
            event_type = "sync.error",
            message = %$message,
            path = %$path,
        )
    };
}

// Package Events

/// Emit a package processed event.
///
/// # Example
/// ```rust,ignore
/// emit_package_processed!("@scope/app", "/ws/app", 2usize);
/// ```
#[macro_export]
macro_rules! emit_package_processed {
    ($name:expr, $path:expr, $changed:expr) => {
        ::tracing::info!(
            target: "depsync::package",
            event_type = "sync.package_processed",
            name = %$name,
            path = %$path,
            changed = $changed,
        )
    };
}

/// Emit a dependency changed event.
#[macro_export]
macro_rules! emit_dependency_changed {
    ($package:expr, $dependency:expr, $from:expr, $to:expr) => {
        ::tracing::info!(
            target: "depsync::package",
            event_type = "sync.dependency_changed",
            package = %$package,
            dependency = %$dependency,
            from = %$from,
            to = %$to,
        )
    };
}

// Install Events

/// Emit an install started event.
#[macro_export]
macro_rules! emit_install_started {
    ($path:expr) => {
        ::tracing::info!(
            target: "depsync::install",
            event_type = "sync.install_started",
            path = %$path,
        )
    };
}

/// Emit an install completed event.
///
/// # Example
/// ```rust,ignore
/// emit_install_completed!("/ws/app", 0);
/// ```
#[macro_export]
macro_rules! emit_install_completed {
    ($path:expr, $exit_code:expr) => {
        ::tracing::info!(
            target: "depsync::install",
            event_type = "sync.install_completed",
            path = %$path,
            exit_code = $exit_code,
        )
    };
}

// Extra File Events

/// Emit an extra file updated event.
#[macro_export]
macro_rules! emit_extra_file_updated {
    ($path:expr, $package:expr, $from:expr, $to:expr) => {
        ::tracing::info!(
            target: "depsync::extra_file",
            event_type = "sync.extra_file_updated",
            path = %$path,
            package = %$package,
            from = %$from,
            to = %$to,
        )
    };
}

// System Events

/// Emit the shutdown marker. Renderers return after rendering it.
#[macro_export]
macro_rules! emit_shutdown {
    () => {
        ::tracing::info!(
            target: "depsync::system",
            event_type = "system.shutdown",
        )
    };
}
