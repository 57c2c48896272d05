//! npm lock-file handling.
//!
//! Only one operation matters here: dropping the resolved entries of
//! dependencies whose declared version changed, so the next install
//! re-resolves them instead of reusing the stale pin.

use crate::discovery::{read_json_file, write_json_file};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Lock-file names, in lookup priority. A shrinkwrap file wins over
/// `package-lock.json` when both exist, as npm itself does.
pub const LOCKFILE_NAMES: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];

/// A parsed npm lock file (any `lockfileVersion`).
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    document: Map<String, Value>,
}

impl LockFile {
    /// Returns the lock file that sits next to a manifest in `folder`, if any.
    #[must_use]
    pub fn find(folder: &Path) -> Option<PathBuf> {
        LOCKFILE_NAMES
            .iter()
            .map(|name| folder.join(name))
            .find(|path| path.is_file())
    }

    /// Reads the lock file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or its
    /// root is not an object.
    pub fn read(path: &Path) -> Result<Self> {
        let value: Value = read_json_file(path)?;
        let Value::Object(document) = value else {
            return Err(Error::InvalidLockfile {
                path: path.to_path_buf(),
                message: "root is not a JSON object".to_string(),
            });
        };
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes resolved entries for `names`.
    ///
    /// Covers both layouts: the v1 top-level `dependencies` map keyed by name,
    /// and the v2/v3 `packages` map keyed by install path, where any key equal
    /// to `node_modules/<name>` or ending in `/node_modules/<name>` is dropped.
    /// Returns how many entries were removed.
    pub fn remove_resolved_entries<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut removed = 0;

        if let Some(dependencies) = self
            .document
            .get_mut("dependencies")
            .and_then(Value::as_object_mut)
        {
            for name in names {
                if dependencies.remove(name.as_ref()).is_some() {
                    removed += 1;
                }
            }
        }

        if let Some(packages) = self
            .document
            .get_mut("packages")
            .and_then(Value::as_object_mut)
        {
            let before = packages.len();
            packages.retain(|key, _| !names.iter().any(|n| is_install_path_of(key, n.as_ref())));
            removed += before - packages.len();
        }

        removed
    }

    /// Writes the lock file back to its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "Writing lock file");
        write_json_file(&self.path, &self.document)
    }
}

fn is_install_path_of(key: &str, name: &str) -> bool {
    key.strip_suffix(name).is_some_and(|prefix| {
        prefix == "node_modules/" || prefix.ends_with("/node_modules/")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LOCK_V3: &str = r#"{
  "name": "app",
  "lockfileVersion": 3,
  "requires": true,
  "packages": {
    "": {
      "name": "app",
      "dependencies": {
        "@scope/lib": "^1.0.0"
      }
    },
    "node_modules/@scope/lib": {
      "version": "1.0.0"
    },
    "node_modules/other/node_modules/@scope/lib": {
      "version": "0.9.0"
    },
    "node_modules/not-@scope/lib": {
      "version": "2.0.0"
    },
    "node_modules/other": {
      "version": "3.0.0"
    }
  }
}
"#;

    #[test]
    fn test_find_prefers_shrinkwrap() {
        let temp = TempDir::new().unwrap();
        assert_eq!(LockFile::find(temp.path()), None);

        fs::write(temp.path().join("package-lock.json"), "{}").unwrap();
        assert_eq!(
            LockFile::find(temp.path()),
            Some(temp.path().join("package-lock.json"))
        );

        fs::write(temp.path().join("npm-shrinkwrap.json"), "{}").unwrap();
        assert_eq!(
            LockFile::find(temp.path()),
            Some(temp.path().join("npm-shrinkwrap.json"))
        );
    }

    #[test]
    fn test_remove_packages_entries_at_any_depth() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package-lock.json");
        fs::write(&path, LOCK_V3).unwrap();

        let mut lock = LockFile::read(&path).unwrap();
        let removed = lock.remove_resolved_entries(&["@scope/lib"]);
        assert_eq!(removed, 2);
        lock.write().unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let packages = value["packages"].as_object().unwrap();
        assert!(!packages.contains_key("node_modules/@scope/lib"));
        assert!(!packages.contains_key("node_modules/other/node_modules/@scope/lib"));
        assert!(packages.contains_key("node_modules/not-@scope/lib"));
        assert!(packages.contains_key("node_modules/other"));
        assert!(packages.contains_key(""));
    }

    #[test]
    fn test_remove_v1_dependencies_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package-lock.json");
        fs::write(
            &path,
            r#"{"lockfileVersion": 1, "dependencies": {"lib": {"version": "1.0.0"}, "keep": {"version": "1.0.0"}}}"#,
        )
        .unwrap();

        let mut lock = LockFile::read(&path).unwrap();
        assert_eq!(lock.remove_resolved_entries(&["lib", "absent"]), 1);
        lock.write().unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["dependencies"].get("lib").is_none());
        assert!(value["dependencies"].get("keep").is_some());
    }

    #[test]
    fn test_read_rejects_non_object_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package-lock.json");
        fs::write(&path, "\"nope\"").unwrap();
        assert!(matches!(
            LockFile::read(&path),
            Err(Error::InvalidLockfile { .. })
        ));
    }

    #[test]
    fn test_install_path_matching() {
        assert!(is_install_path_of("node_modules/lib", "lib"));
        assert!(is_install_path_of("a/node_modules/lib", "lib"));
        assert!(!is_install_path_of("node_modules/xlib", "lib"));
        assert!(!is_install_path_of("lib", "lib"));
    }
}
