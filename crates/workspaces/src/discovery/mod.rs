//! Manifest discovery and JSON file IO.
//!
//! [`find_nearest_manifest`] walks upward from a path to the closest folder
//! containing a `package.json`. The JSON helpers read and write documents
//! with key order preserved, formatted the way npm formats them.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of an npm package manifest.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Finds the closest `package.json` at or above `start`.
///
/// When `start` is a file, the search begins in its parent folder. Returns the
/// path of the manifest file itself.
///
/// # Errors
///
/// Returns an error only when the filesystem reports something other than
/// "not found" while probing a folder.
pub fn find_nearest_manifest(start: &Path) -> Result<Option<PathBuf>> {
    let mut current = if start.is_dir() {
        Some(start)
    } else {
        start.parent()
    };

    while let Some(folder) = current {
        let candidate = folder.join(MANIFEST_FILE_NAME);
        match fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => return Ok(Some(candidate)),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(e, candidate, "probing for package.json")),
        }
        current = folder.parent();
    }

    Ok(None)
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed as valid JSON.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io {
        source: e,
        path: Some(path.to_path_buf()),
        operation: "reading json file".to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| Error::Json {
        source: e,
        path: Some(path.to_path_buf()),
    })
}

/// Serializes a value as two-space indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    Ok(content)
}

/// Writes a JSON document, replacing the target through a sibling temp file.
///
/// # Errors
///
/// Returns an error if serialization, the temp write or the rename fails.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = to_json_string(value).map_err(|e| match e {
        Error::Json { source, .. } => Error::Json {
            source,
            path: Some(path.to_path_buf()),
        },
        other => other,
    })?;
    write_atomic(path, content.as_bytes())
}

/// Writes bytes to `path` by writing `<path>.tmp` and renaming it over the target.
///
/// # Errors
///
/// Returns an error if either filesystem step fails.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, content).map_err(|e| Error::io(e, &tmp_path, "writing temp file"))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::io(e, path, "replacing file")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn test_find_nearest_manifest_walks_upward() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pkg/src/deep")).unwrap();
        fs::write(root.join("pkg/package.json"), "{}").unwrap();
        fs::write(root.join("pkg/src/deep/index.ts"), "").unwrap();

        let from_folder = find_nearest_manifest(&root.join("pkg/src/deep")).unwrap();
        assert_eq!(from_folder, Some(root.join("pkg/package.json")));

        let from_file = find_nearest_manifest(&root.join("pkg/src/deep/index.ts")).unwrap();
        assert_eq!(from_file, Some(root.join("pkg/package.json")));

        let from_self = find_nearest_manifest(&root.join("pkg")).unwrap();
        assert_eq!(from_self, Some(root.join("pkg/package.json")));
    }

    #[test]
    fn test_find_nearest_manifest_ignores_directories_named_package_json() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("outer/inner/package.json")).unwrap();
        fs::write(root.join("outer/package.json"), "{}").unwrap();

        let found = find_nearest_manifest(&root.join("outer/inner")).unwrap();
        assert_eq!(found, Some(root.join("outer/package.json")));
    }

    #[test]
    fn test_write_json_file_preserves_key_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.json");
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": {"b": 2, "a": 1}}"#).unwrap();

        write_json_file(&path, &value).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": 2,\n    \"a\": 1\n  }\n}\n"
        );
        assert!(!temp.path().join("out.json.tmp").exists());
    }

    #[test]
    fn test_read_json_file_reports_path_on_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json_file::<Value>(&path).unwrap_err();
        match err {
            Error::Json { path: Some(p), .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }

        let ok: Value = {
            fs::write(&path, json!({"a": 1}).to_string()).unwrap();
            read_json_file(&path).unwrap()
        };
        assert_eq!(ok["a"], 1);
    }
}
