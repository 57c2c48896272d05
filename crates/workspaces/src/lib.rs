//! npm package descriptors for depsync.
//!
//! This crate owns the on-disk formats the sync engine touches:
//!
//! - [`PackageManifest`] - a `package.json`, read and written with key order
//!   and unknown fields preserved
//! - [`LockFile`] - a `package-lock.json` or `npm-shrinkwrap.json`, from which
//!   resolved entries of re-targeted dependencies are stripped
//! - [`find_nearest_manifest`] - upward lookup of the closest manifest
//!
//! # Example
//!
//! ```rust,ignore
//! use depsync_workspaces::{DependencyKind, PackageManifest};
//! use std::path::Path;
//!
//! let mut manifest = PackageManifest::read(Path::new("./app"))?;
//! manifest.set_dependency(DependencyKind::Dependencies, "lib", "file:/ws/lib");
//! manifest.write()?;
//! ```

pub mod discovery;
pub mod error;
pub mod lockfile;
pub mod manifest;

pub use discovery::{
    MANIFEST_FILE_NAME, find_nearest_manifest, read_json_file, to_json_string, write_atomic,
    write_json_file,
};
pub use error::{Error, Result};
pub use lockfile::{LOCKFILE_NAMES, LockFile};
pub use manifest::{DependencyKind, PackageManifest};
