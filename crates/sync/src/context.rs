//! Per-run state shared by the locator, resolver and orchestrator.

use crate::config::PackageFolderConfig;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// A package found on disk during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedPackage {
    /// Absolute folder containing the package's manifest.
    pub path: PathBuf,
    /// Fallback for `latest` resolution; only set for requested packages.
    pub default_version: Option<String>,
    /// Dependency names left untouched when this package is processed.
    pub dependencies_to_ignore: BTreeSet<String>,
    /// Install permission; `None` when the package was not requested.
    pub run_install: Option<bool>,
    /// Version string dependents are rewritten to. Set at most once.
    pub target_version: Option<String>,
    /// Whether this package's own manifest has been processed.
    pub updated: bool,
}

impl ClonedPackage {
    /// A package discovered by search, without user configuration.
    #[must_use]
    pub fn discovered(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_version: None,
            dependencies_to_ignore: BTreeSet::new(),
            run_install: None,
            target_version: None,
            updated: false,
        }
    }

    /// A package the user asked for, carrying its folder configuration.
    #[must_use]
    pub fn requested(path: impl Into<PathBuf>, config: &PackageFolderConfig) -> Self {
        Self {
            path: path.into(),
            default_version: config.default_version.clone(),
            dependencies_to_ignore: config.dependencies_to_ignore.clone(),
            run_install: Some(config.run_install),
            target_version: None,
            updated: false,
        }
    }

    /// Whether installs are allowed; packages without configuration allow them.
    #[must_use]
    pub fn installs_enabled(&self) -> bool {
        self.run_install.unwrap_or(true)
    }
}

/// The `name -> clone` cache for one run.
///
/// A name maps to `Some` once found and to `None` once a search for it came
/// up empty; both results stick for the rest of the run.
#[derive(Debug, Default)]
pub struct SyncContext {
    packages: HashMap<String, Option<ClonedPackage>>,
}

impl SyncContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached lookup result: `None` when the name was never searched,
    /// `Some(None)` for a recorded miss.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Option<&ClonedPackage>> {
        self.packages.get(name).map(Option::as_ref)
    }

    /// The clone registered under `name`, if one was found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClonedPackage> {
        self.packages.get(name).and_then(Option::as_ref)
    }

    /// Mutable access to the clone registered under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClonedPackage> {
        self.packages.get_mut(name).and_then(Option::as_mut)
    }

    /// Registers a clone unless the name already has an entry.
    ///
    /// Returns the entry now stored under `name`.
    pub fn register(&mut self, name: &str, package: ClonedPackage) -> Option<&ClonedPackage> {
        self.packages
            .entry(name.to_string())
            .or_insert(Some(package))
            .as_ref()
    }

    /// Records that no clone exists for `name`.
    pub fn record_miss(&mut self, name: &str) {
        self.packages.entry(name.to_string()).or_insert(None);
    }

    /// Name of the clone living in `folder`, if any.
    #[must_use]
    pub fn name_for_folder(&self, folder: &Path) -> Option<&str> {
        self.packages.iter().find_map(|(name, package)| {
            package
                .as_ref()
                .filter(|p| p.path == folder)
                .map(|_| name.as_str())
        })
    }

    /// Every found clone whose target version was resolved, sorted by name.
    #[must_use]
    pub fn resolved_targets(&self) -> Vec<(&str, &str)> {
        let mut targets: Vec<(&str, &str)> = self
            .packages
            .iter()
            .filter_map(|(name, package)| {
                let target = package.as_ref()?.target_version.as_deref()?;
                Some((name.as_str(), target))
            })
            .collect();
        targets.sort_unstable();
        targets
    }

    /// Number of names looked up so far, hits and misses alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether nothing has been looked up yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
