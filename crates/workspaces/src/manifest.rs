//! npm `package.json` reading and writing.
//!
//! The manifest is held as an ordered JSON object so that unknown fields and
//! key order survive a read-modify-write cycle untouched.

use crate::discovery::{MANIFEST_FILE_NAME, read_json_file, write_json_file};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two dependency sections a manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    /// Runtime dependencies (`dependencies`).
    Dependencies,
    /// Development dependencies (`devDependencies`).
    DevDependencies,
}

impl DependencyKind {
    /// Both sections, in the order they are processed.
    pub const ALL: [Self; 2] = [Self::Dependencies, Self::DevDependencies];

    /// Key of this section inside `package.json`.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A parsed `package.json`.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    path: PathBuf,
    document: Map<String, Value>,
}

impl PackageManifest {
    /// Reads the manifest at `path`.
    ///
    /// `path` may point at the `package.json` file or at the folder containing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestNotFound`] when no file exists, and a JSON or
    /// [`Error::InvalidManifest`] error when the content is not a JSON object.
    pub fn read(path: &Path) -> Result<Self> {
        let path = if path.is_dir() {
            path.join(MANIFEST_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        if !path.is_file() {
            return Err(Error::ManifestNotFound { path });
        }

        let value: Value = read_json_file(&path)?;
        let Value::Object(document) = value else {
            return Err(Error::InvalidManifest {
                path,
                message: "root is not a JSON object".to_string(),
            });
        };

        Ok(Self { path, document })
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Folder containing the manifest.
    #[must_use]
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// The `name` field, if present and a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.document.get("name").and_then(Value::as_str)
    }

    /// The `version` field, if present and a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    /// Entries of one dependency section, in file order.
    ///
    /// Entries whose value is not a string are skipped.
    #[must_use]
    pub fn dependencies(&self, kind: DependencyKind) -> Vec<(String, String)> {
        self.document
            .get(kind.field_name())
            .and_then(Value::as_object)
            .map(|section| {
                section
                    .iter()
                    .filter_map(|(name, version)| {
                        version.as_str().map(|v| (name.clone(), v.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every dependency name across both sections, without duplicates, in file order.
    #[must_use]
    pub fn dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for kind in DependencyKind::ALL {
            for (name, _) in self.dependencies(kind) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Rewrites an existing dependency entry in place.
    ///
    /// Returns the previous version when the entry existed and was changed.
    /// Missing sections or entries are left alone and yield `None`.
    pub fn set_dependency(
        &mut self,
        kind: DependencyKind,
        name: &str,
        version: &str,
    ) -> Option<String> {
        let slot = self
            .document
            .get_mut(kind.field_name())
            .and_then(Value::as_object_mut)?
            .get_mut(name)?;

        let previous = slot.as_str()?.to_string();
        if previous == version {
            return None;
        }
        *slot = Value::String(version.to_string());
        Some(previous)
    }

    /// Writes the manifest back to its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "Writing package manifest");
        write_json_file(&self.path, &self.document)
    }
}
