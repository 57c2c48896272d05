//! Sync configuration types.
//!
//! [`PackageFolderConfig`] and [`SyncOptions`] are the inputs of a run.
//! [`SyncConfigFile`] is the optional `depsync.toml` they can be loaded from.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "depsync.toml";

/// What version string a dependency on a local clone is rewritten to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// A `file:` reference to the clone's folder.
    #[default]
    Local,
    /// A caret range on the latest published version.
    Latest,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Latest => write!(f, "latest"),
        }
    }
}

impl FromStr for DependencyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Self::Local),
            "latest" => Ok(Self::Latest),
            other => Err(Error::config(
                format!("unknown dependency type '{other}'"),
                "Use 'local' or 'latest'",
            )),
        }
    }
}

/// A package folder the user asked to synchronize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFolderConfig {
    /// Folder (or any path inside it) of the package.
    pub path: PathBuf,
    /// Whether installs may run for this package.
    #[serde(default = "default_run_install")]
    pub run_install: bool,
    /// Version used for `latest` when the registry has no `latest` tag.
    #[serde(default)]
    pub default_version: Option<String>,
    /// Dependency names never rewritten in this package.
    #[serde(default, rename = "ignore")]
    pub dependencies_to_ignore: BTreeSet<String>,
}

const fn default_run_install() -> bool {
    true
}

impl PackageFolderConfig {
    /// Creates a config with defaults for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_install: true,
            default_version: None,
            dependencies_to_ignore: BTreeSet::new(),
        }
    }

    /// Sets whether installs may run.
    #[must_use]
    pub const fn with_run_install(mut self, run_install: bool) -> Self {
        self.run_install = run_install;
        self
    }

    /// Sets the fallback version for `latest` resolution.
    #[must_use]
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    /// Adds dependency names to leave untouched.
    #[must_use]
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies_to_ignore
            .extend(names.into_iter().map(Into::into));
        self
    }
}

/// Run-wide options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Version policy for rewritten dependencies.
    pub dependency_type: DependencyType,
    /// Follow local clones transitively.
    pub recursive: bool,
    /// Install even when a manifest did not change.
    pub force_install: bool,
    /// Text files whose registered versions are patched after installs.
    pub extra_files: Vec<PathBuf>,
    /// Compute and report without writing files or running installs.
    pub dry_run: bool,
}

impl SyncOptions {
    /// Creates options for the given dependency type.
    #[must_use]
    pub fn new(dependency_type: DependencyType) -> Self {
        Self {
            dependency_type,
            ..Self::default()
        }
    }

    /// Sets recursive propagation.
    #[must_use]
    pub const fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets forced installs.
    #[must_use]
    pub const fn with_force_install(mut self, force_install: bool) -> Self {
        self.force_install = force_install;
        self
    }

    /// Sets the extra files to patch.
    #[must_use]
    pub fn with_extra_files(mut self, files: Vec<PathBuf>) -> Self {
        self.extra_files = files;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Contents of a `depsync.toml` file.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfigFile {
    /// Version policy.
    pub dependency_type: Option<DependencyType>,
    /// Recursive propagation.
    pub recursive: Option<bool>,
    /// Forced installs.
    pub force_install: Option<bool>,
    /// Extra files to patch.
    pub extra_files: Vec<PathBuf>,
    /// npm registry URL for `latest` queries.
    pub registry: Option<String>,
    /// Package folders to synchronize.
    #[serde(rename = "package")]
    pub packages: Vec<PackageFolderConfig>,
}

impl SyncConfigFile {
    /// Parses a config document. Paths are kept as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or has unknown keys.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a config file, resolving relative paths against its folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, path, "reading config file"))?;
        let mut config = Self::parse(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(
            path = %path.display(),
            packages = config.packages.len(),
            "Loaded sync config"
        );
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for package in &mut self.packages {
            if package.path.is_relative() {
                package.path = base.join(&package.path);
            }
        }
        for file in &mut self.extra_files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_type_parse_and_display() {
        assert_eq!("local".parse::<DependencyType>().unwrap(), DependencyType::Local);
        assert_eq!(
            "latest".parse::<DependencyType>().unwrap(),
            DependencyType::Latest
        );
        assert!("newest".parse::<DependencyType>().is_err());
        assert_eq!(DependencyType::Latest.to_string(), "latest");
        assert_eq!(DependencyType::default(), DependencyType::Local);
    }

    #[test]
    fn test_package_folder_config_builder() {
        let config = PackageFolderConfig::new("/ws/app")
            .with_run_install(false)
            .with_default_version("^1.0.0")
            .with_ignored(["typescript", "eslint"]);

        assert_eq!(config.path, PathBuf::from("/ws/app"));
        assert!(!config.run_install);
        assert_eq!(config.default_version.as_deref(), Some("^1.0.0"));
        assert!(config.dependencies_to_ignore.contains("eslint"));
    }

    #[test]
    fn test_sync_options_builder() {
        let options = SyncOptions::new(DependencyType::Latest)
            .with_recursive(true)
            .with_force_install(true)
            .with_dry_run(true)
            .with_extra_files(vec![PathBuf::from("src/versions.ts")]);

        assert_eq!(options.dependency_type, DependencyType::Latest);
        assert!(options.recursive);
        assert!(options.force_install);
        assert!(options.dry_run);
        assert_eq!(options.extra_files.len(), 1);
    }

    #[test]
    fn test_parse_full_config_file() {
        let config = SyncConfigFile::parse(
            r#"
dependency_type = "latest"
recursive = true
force_install = false
extra_files = ["src/constants.ts"]
registry = "https://registry.example.com"

[[package]]
path = "../core"
default_version = "^1.0.0"
ignore = ["typescript"]

[[package]]
path = "../ui"
run_install = false
"#,
        )
        .unwrap();

        assert_eq!(config.dependency_type, Some(DependencyType::Latest));
        assert_eq!(config.recursive, Some(true));
        assert_eq!(config.registry.as_deref(), Some("https://registry.example.com"));
        assert_eq!(config.packages.len(), 2);
        assert!(config.packages[0].run_install);
        assert!(config.packages[0].dependencies_to_ignore.contains("typescript"));
        assert!(!config.packages[1].run_install);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = SyncConfigFile::parse("recursiv = true").unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(SyncConfigFile::parse("").unwrap(), SyncConfigFile::default());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "extra_files = [\"consts.ts\", \"/abs/other.ts\"]\n[[package]]\npath = \"app\"\n",
        )
        .unwrap();

        let config = SyncConfigFile::load(&path).unwrap();
        assert_eq!(config.packages[0].path, temp.path().join("app"));
        assert_eq!(config.extra_files[0], temp.path().join("consts.ts"));
        assert_eq!(config.extra_files[1], PathBuf::from("/abs/other.ts"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SyncConfigFile::load(Path::new("/definitely/not/here/depsync.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
