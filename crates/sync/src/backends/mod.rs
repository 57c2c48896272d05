//! External collaborators of the sync engine.
//!
//! The orchestrator never spawns processes or talks to a registry itself.
//! It goes through two traits:
//!
//! - [`PackageRegistry`] - looks up the published `latest` version of a package
//! - [`Installer`] - runs the package manager install in a folder
//!
//! [`npm`] provides the implementations that shell out to `npm`. Tests
//! substitute in-memory fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use depsync_sync::backends::{BoxFuture, Installer};
//! use std::path::Path;
//!
//! struct AlwaysOk;
//!
//! impl Installer for AlwaysOk {
//!     fn name(&self) -> &'static str { "always-ok" }
//!
//!     fn install<'a>(&'a self, _folder: &'a Path) -> BoxFuture<'a, Result<i32>> {
//!         Box::pin(async move { Ok(0) })
//!     }
//! }
//! ```

pub mod npm;

use crate::error::Result;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub use npm::{NpmInstaller, NpmRegistry};

/// Boxed future returned by collaborator methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of published package versions.
pub trait PackageRegistry: Send + Sync {
    /// Returns the name of this registry backend (e.g., "npm").
    fn name(&self) -> &'static str;

    /// Returns the version the `latest` distribution tag points at.
    ///
    /// An unpublished package yields `Ok(None)`; only genuine query failures
    /// are errors.
    fn latest_version<'a>(&'a self, package: &'a str) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Runs package manager installs.
pub trait Installer: Send + Sync {
    /// Returns the name of this installer backend (e.g., "npm").
    fn name(&self) -> &'static str;

    /// Installs dependencies in `folder` and returns the exit code.
    ///
    /// A non-zero code is a normal return value; the caller decides what a
    /// failed install means.
    fn install<'a>(&'a self, folder: &'a Path) -> BoxFuture<'a, Result<i32>>;
}
