//! Workspace dependency synchronization for npm packages cloned side by side.
//!
//! Given a set of package folders, depsync rewrites their `package.json`
//! dependencies on other locally cloned packages to either a `file:`
//! reference to the clone or a caret range on the clone's latest published
//! version, follows those clones transitively, runs installs where manifests
//! changed, and patches version registrations in extra text files.
//!
//! # Architecture
//!
//! - [`locator`] - breadth-first folder search for a package by name
//! - [`resolver`] - target version computation, memoized per run
//! - [`orchestrator`] - the run loop, installs and extra-file pass
//! - [`context`] - the per-run cache shared by the three above
//! - [`backends`] - registry and installer traits with npm implementations
//! - [`config`] - run inputs and the `depsync.toml` file format
//!
//! # Example
//!
//! ```rust,ignore
//! use depsync_sync::backends::{NpmInstaller, NpmRegistry};
//! use depsync_sync::{DependencyType, PackageFolderConfig, SyncOptions, SyncOrchestrator};
//!
//! let orchestrator = SyncOrchestrator::new(
//!     vec![PackageFolderConfig::new("./app")],
//!     SyncOptions::new(DependencyType::Local).with_recursive(true),
//!     Box::new(NpmRegistry::new()),
//!     Box::new(NpmInstaller::new()),
//! );
//! let report = orchestrator.run().await?;
//! ```

pub mod backends;
pub mod config;
pub mod context;
pub mod error;
pub mod extra_files;
pub mod locator;
pub mod orchestrator;
pub mod resolver;

// Re-export main types
pub use backends::{Installer, NpmInstaller, NpmRegistry, PackageRegistry};
pub use config::{
    CONFIG_FILE_NAME, DependencyType, PackageFolderConfig, SyncConfigFile, SyncOptions,
};
pub use context::{ClonedPackage, SyncContext};
pub use error::{Error, Result};
pub use extra_files::{VersionPatch, patch_versions};
pub use locator::{find_package, frontier_search};
pub use orchestrator::{DependencyEdit, ExtraFileUpdate, SyncOrchestrator, SyncReport};
pub use resolver::VersionResolver;
