//! Sync orchestrator.
//!
//! Coordinates a full run: manifest rewrites across the package graph,
//! installs, and extra-file patching.

use crate::backends::{Installer, PackageRegistry};
use crate::config::{PackageFolderConfig, SyncOptions};
use crate::context::{ClonedPackage, SyncContext};
use crate::error::{Error, Result};
use crate::extra_files::patch_versions;
use crate::locator::normalize;
use crate::resolver::VersionResolver;
use depsync_events::{
    emit_dependency_changed, emit_error, emit_extra_file_updated, emit_info,
    emit_install_completed, emit_install_started, emit_package_processed, emit_section,
};
use depsync_workspaces::{
    DependencyKind, LockFile, PackageManifest, find_nearest_manifest, write_atomic,
};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One rewritten dependency entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdit {
    /// Package whose manifest changed.
    pub package: String,
    /// Dependency name.
    pub dependency: String,
    /// Section the entry lives in.
    pub kind: DependencyKind,
    /// Version before the rewrite.
    pub old_version: String,
    /// Version after the rewrite.
    pub new_version: String,
}

/// A registration rewritten inside an extra file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraFileUpdate {
    /// File that was patched.
    pub path: PathBuf,
    /// Package whose registration changed.
    pub package: String,
    /// Previous version.
    pub from: String,
    /// New version.
    pub to: String,
}

/// What a run did (or, in dry-run mode, would do).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Package folders processed, in visit order.
    pub processed: Vec<PathBuf>,
    /// Every dependency entry rewritten.
    pub edits: Vec<DependencyEdit>,
    /// Folders scheduled for install, in scheduling order.
    pub installs: Vec<PathBuf>,
    /// Every extra-file registration rewritten.
    pub extra_files: Vec<ExtraFileUpdate>,
    /// Whether the run was a dry run.
    pub dry_run: bool,
}

impl SyncReport {
    /// Whether any manifest or extra file changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.edits.is_empty() || !self.extra_files.is_empty()
    }

    /// Edits made to one package's manifest.
    pub fn edits_for<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a DependencyEdit> {
        self.edits.iter().filter(move |edit| edit.package == package)
    }
}

/// Sync orchestrator.
///
/// Owns the run inputs and the collaborators; each call to [`run`](Self::run)
/// starts from a fresh [`SyncContext`].
pub struct SyncOrchestrator {
    packages: Vec<PackageFolderConfig>,
    options: SyncOptions,
    registry: Box<dyn PackageRegistry>,
    installer: Box<dyn Installer>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator for the given packages.
    #[must_use]
    pub fn new(
        packages: Vec<PackageFolderConfig>,
        options: SyncOptions,
        registry: Box<dyn PackageRegistry>,
        installer: Box<dyn Installer>,
    ) -> Self {
        Self {
            packages,
            options,
            registry,
            installer,
        }
    }

    /// Returns a reference to the run options.
    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Executes the sync.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no packages were requested
    /// - a requested or discovered package has no manifest
    /// - a manifest, lock file or extra file cannot be read or written
    /// - the registry query fails
    /// - an install exits non-zero
    /// - a configured extra file is missing
    pub async fn run(&self) -> Result<SyncReport> {
        if self.packages.is_empty() {
            return Err(Error::config(
                "no packages to synchronize",
                "Pass package paths on the command line or add [[package]] entries to depsync.toml",
            ));
        }

        let mut ctx = SyncContext::new();
        let roots = self.register_roots(&mut ctx)?;

        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            ..SyncReport::default()
        };

        emit_section!(format!(
            "Synchronizing {} package(s) to {} versions",
            roots.len(),
            self.options.dependency_type
        ));

        let mut to_visit: VecDeque<PathBuf> = VecDeque::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for root in roots {
            if seen.insert(root.clone()) {
                to_visit.push_back(root);
            }
        }

        while let Some(folder) = to_visit.pop_front() {
            let manifest = self.process_folder(&mut ctx, &folder, &mut report).await?;

            if self.options.recursive {
                for name in manifest.dependency_names() {
                    let Some(package) = ctx.get(&name) else {
                        continue;
                    };
                    if !package.updated && seen.insert(package.path.clone()) {
                        debug!(package = %name, path = %package.path.display(), "Queueing local clone");
                        to_visit.push_back(package.path.clone());
                    }
                }
            }
        }

        self.run_installs(&report.installs).await?;
        report.extra_files = self.patch_extra_files(&ctx)?;

        info!(
            processed = report.processed.len(),
            edits = report.edits.len(),
            installs = report.installs.len(),
            extra_files = report.extra_files.len(),
            "Sync finished"
        );
        Ok(report)
    }

    /// Finds every requested package before anything is modified.
    fn register_roots(&self, ctx: &mut SyncContext) -> Result<Vec<PathBuf>> {
        let mut roots = Vec::with_capacity(self.packages.len());

        for config in &self.packages {
            if !config.path.exists() {
                emit_error!("No package.json found", config.path.display());
                return Err(Error::ManifestNotFound {
                    path: config.path.clone(),
                });
            }
            let Some(manifest_path) = find_nearest_manifest(&normalize(&config.path))? else {
                emit_error!("No package.json found", config.path.display());
                return Err(Error::ManifestNotFound {
                    path: config.path.clone(),
                });
            };

            let manifest = PackageManifest::read(&manifest_path)?;
            let name = package_name(&manifest)?;
            let folder = normalize(manifest.folder());

            ctx.register(name, ClonedPackage::requested(folder.clone(), config));
            roots.push(folder);
        }

        Ok(roots)
    }

    /// Rewrites one folder's manifest and schedules its install.
    async fn process_folder(
        &self,
        ctx: &mut SyncContext,
        folder: &Path,
        report: &mut SyncReport,
    ) -> Result<PackageManifest> {
        let mut manifest = PackageManifest::read(folder).inspect_err(|e| {
            emit_error!(e.to_string(), folder.display());
        })?;
        let name = package_name(&manifest)?.to_string();

        if ctx.get(&name).is_none() {
            // A folder reached through the queue is always registered; a
            // name mismatch means the manifest changed under us.
            ctx.register(&name, ClonedPackage::discovered(folder));
        }
        let (ignored, installs_enabled) = match ctx.get_mut(&name) {
            Some(package) => {
                package.updated = true;
                (package.dependencies_to_ignore.clone(), package.installs_enabled())
            }
            None => (Default::default(), true),
        };

        let resolver = VersionResolver::new(self.registry.as_ref());
        let mut changed: Vec<String> = Vec::new();

        for kind in DependencyKind::ALL {
            for (dependency, _) in manifest.dependencies(kind) {
                if ignored.contains(&dependency) {
                    continue;
                }
                let Some(target) = resolver
                    .resolve_target_version(ctx, &dependency, folder, self.options.dependency_type)
                    .await?
                else {
                    continue;
                };
                if let Some(previous) = manifest.set_dependency(kind, &dependency, &target) {
                    emit_dependency_changed!(name, dependency, previous, target);
                    report.edits.push(DependencyEdit {
                        package: name.clone(),
                        dependency: dependency.clone(),
                        kind,
                        old_version: previous,
                        new_version: target,
                    });
                    if !changed.contains(&dependency) {
                        changed.push(dependency);
                    }
                }
            }
        }

        if changed.is_empty() {
            if self.options.force_install && installs_enabled {
                report.installs.push(folder.to_path_buf());
            }
        } else {
            if !self.options.dry_run {
                manifest.write()?;
                Self::strip_lock_file(folder, &changed)?;
            }
            if installs_enabled {
                report.installs.push(folder.to_path_buf());
            }
        }

        emit_package_processed!(name, folder.display(), changed.len());
        report.processed.push(folder.to_path_buf());
        Ok(manifest)
    }

    fn strip_lock_file(folder: &Path, changed: &[String]) -> Result<()> {
        let Some(path) = LockFile::find(folder) else {
            return Ok(());
        };
        let mut lock = LockFile::read(&path)?;
        let removed = lock.remove_resolved_entries(changed);
        debug!(path = %path.display(), removed, "Stripped lock file entries");
        lock.write()?;
        Ok(())
    }

    /// Runs scheduled installs in order, stopping at the first failure.
    async fn run_installs(&self, folders: &[PathBuf]) -> Result<()> {
        if folders.is_empty() {
            return Ok(());
        }
        emit_section!("Installing dependencies");

        for folder in folders {
            if self.options.dry_run {
                emit_info!(format!("[dry-run] Would install in {}", folder.display()));
                continue;
            }

            emit_install_started!(folder.display());
            let exit_code = self.installer.install(folder).await?;
            emit_install_completed!(folder.display(), exit_code);

            if exit_code != 0 {
                emit_error!(
                    format!("{} install exited with code {exit_code}", self.installer.name()),
                    folder.display()
                );
                return Err(Error::InstallFailed {
                    folder: folder.clone(),
                    exit_code,
                });
            }
        }
        Ok(())
    }

    /// Rewrites registered versions in the configured extra files.
    fn patch_extra_files(&self, ctx: &SyncContext) -> Result<Vec<ExtraFileUpdate>> {
        if self.options.extra_files.is_empty() {
            return Ok(Vec::new());
        }
        emit_section!("Updating extra files");

        for path in &self.options.extra_files {
            if !path.is_file() {
                emit_error!("Extra file not found", path.display());
                return Err(Error::ExtraFileNotFound { path: path.clone() });
            }
        }

        let targets = ctx.resolved_targets();
        let mut updates = Vec::new();

        for path in &self.options.extra_files {
            let content =
                fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading extra file"))?;
            let (patched, patches) = patch_versions(&content, &targets)?;

            if patched == content {
                debug!(path = %path.display(), "Extra file already up to date");
                continue;
            }
            if !self.options.dry_run {
                write_atomic(path, patched.as_bytes())?;
            }
            for patch in patches {
                emit_extra_file_updated!(path.display(), patch.package, patch.from, patch.to);
                updates.push(ExtraFileUpdate {
                    path: path.clone(),
                    package: patch.package,
                    from: patch.from,
                    to: patch.to,
                });
            }
        }

        Ok(updates)
    }
}

fn package_name(manifest: &PackageManifest) -> Result<&str> {
    manifest.name().ok_or_else(|| {
        depsync_workspaces::Error::InvalidManifest {
            path: manifest.path().to_path_buf(),
            message: "missing \"name\" field".to_string(),
        }
        .into()
    })
}
