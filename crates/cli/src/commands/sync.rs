//! `depsync sync`: merges the config file with the flags and runs the engine.

use crate::cli::{CliError, SyncArgs};
use depsync_events::emit_info;
use depsync_sync::{
    CONFIG_FILE_NAME, NpmInstaller, NpmRegistry, PackageFolderConfig, SyncConfigFile,
    SyncOptions, SyncOrchestrator, SyncReport,
};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Fully merged inputs of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub packages: Vec<PackageFolderConfig>,
    pub options: SyncOptions,
    pub registry: Option<String>,
    pub install_args: Vec<String>,
}

/// Picks the config file: the explicit one, else `depsync.toml` in `cwd`.
fn config_path(args: &SyncArgs, cwd: &Path) -> Option<PathBuf> {
    args.config.clone().or_else(|| {
        let default = cwd.join(CONFIG_FILE_NAME);
        default.is_file().then_some(default)
    })
}

/// Builds the run inputs. Flags win over file values; positional paths are
/// appended after the file's packages.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub fn plan(args: SyncArgs, cwd: &Path) -> Result<SyncPlan, CliError> {
    let file = match config_path(&args, cwd) {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::config_with_help(
                    format!("config file not found: {}", path.display()),
                    "Check the --config path",
                ));
            }
            SyncConfigFile::load(&path)?
        }
        None => SyncConfigFile::default(),
    };

    let dependency_type = args
        .dependency_type
        .map(Into::into)
        .or(file.dependency_type)
        .unwrap_or_default();

    let mut extra_files = file.extra_files;
    extra_files.extend(args.extra_files);

    let options = SyncOptions::new(dependency_type)
        .with_recursive(args.recursive || file.recursive.unwrap_or(false))
        .with_force_install(args.force_install || file.force_install.unwrap_or(false))
        .with_extra_files(extra_files)
        .with_dry_run(args.dry_run);

    let mut packages = file.packages;
    packages.extend(args.paths.into_iter().map(PackageFolderConfig::new));

    Ok(SyncPlan {
        packages,
        options,
        registry: args.registry.or(file.registry),
        install_args: args.install_args,
    })
}

/// Runs a sync with the npm registry and installer.
///
/// # Errors
///
/// Returns the planning error or the engine's error unchanged.
#[instrument(name = "depsync_sync_command", skip(args))]
pub async fn execute(args: SyncArgs) -> Result<SyncReport, CliError> {
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::other(format!("cannot read current directory: {e}")))?;
    let plan = plan(args, &cwd)?;
    debug!(packages = plan.packages.len(), options = ?plan.options, "Sync plan ready");

    let mut registry = NpmRegistry::new();
    if let Some(url) = plan.registry {
        registry = registry.with_registry(url);
    }

    let orchestrator = SyncOrchestrator::new(
        plan.packages,
        plan.options,
        Box::new(registry),
        Box::new(NpmInstaller::new().with_args(plan.install_args)),
    );
    let report = orchestrator.run().await?;

    if !report.has_changes() {
        emit_info!("Everything is already in sync");
    } else if report.dry_run {
        emit_info!(format!(
            "Dry run: {} dependency edit(s), {} install(s) not applied",
            report.edits.len(),
            report.installs.len()
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TypeArg;
    use depsync_sync::DependencyType;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_plan_from_flags_only() {
        let temp = TempDir::new().unwrap();
        let args = SyncArgs {
            paths: vec![PathBuf::from("app")],
            dependency_type: Some(TypeArg::Latest),
            recursive: true,
            ..SyncArgs::default()
        };

        let plan = plan(args, temp.path()).unwrap();

        assert_eq!(plan.packages, vec![PackageFolderConfig::new("app")]);
        assert_eq!(plan.options.dependency_type, DependencyType::Latest);
        assert!(plan.options.recursive);
        assert!(!plan.options.force_install);
        assert!(plan.registry.is_none());
    }

    #[test]
    fn test_plan_picks_up_default_config_file() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            r#"
dependency_type = "latest"
recursive = true
registry = "https://registry.example.com"

[[package]]
path = "core"
default_version = "^2.0.0"
"#,
        );

        let plan = plan(SyncArgs::default(), temp.path()).unwrap();

        assert_eq!(plan.options.dependency_type, DependencyType::Latest);
        assert!(plan.options.recursive);
        assert_eq!(plan.packages.len(), 1);
        assert_eq!(plan.packages[0].path, temp.path().join("core"));
        assert_eq!(plan.packages[0].default_version.as_deref(), Some("^2.0.0"));
        assert_eq!(plan.registry.as_deref(), Some("https://registry.example.com"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let config = write_config(
            temp.path(),
            r#"
dependency_type = "latest"
extra_files = ["versions.ts"]
registry = "https://file.example.com"

[[package]]
path = "core"
"#,
        );
        let args = SyncArgs {
            paths: vec![PathBuf::from("/ws/ui")],
            dependency_type: Some(TypeArg::Local),
            extra_files: vec![PathBuf::from("/ws/README.md")],
            config: Some(config),
            dry_run: true,
            registry: Some("https://flag.example.com".to_string()),
            ..SyncArgs::default()
        };

        let plan = plan(args, Path::new("/elsewhere")).unwrap();

        assert_eq!(plan.options.dependency_type, DependencyType::Local);
        assert!(plan.options.dry_run);
        assert_eq!(
            plan.options.extra_files,
            vec![temp.path().join("versions.ts"), PathBuf::from("/ws/README.md")]
        );
        let core = temp.path().join("core");
        let paths: Vec<&Path> = plan.packages.iter().map(|p| p.path.as_path()).collect();
        assert_eq!(paths, vec![core.as_path(), Path::new("/ws/ui")]);
        assert_eq!(plan.registry.as_deref(), Some("https://flag.example.com"));
    }

    #[test]
    fn test_boolean_flags_cannot_be_disabled_by_config() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "recursive = false\nforce_install = false\n");
        let args = SyncArgs {
            recursive: true,
            force_install: true,
            ..SyncArgs::default()
        };

        let plan = plan(args, temp.path()).unwrap();

        assert!(plan.options.recursive);
        assert!(plan.options.force_install);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let args = SyncArgs {
            config: Some(temp.path().join("nope.toml")),
            ..SyncArgs::default()
        };

        let err = plan(args, temp.path()).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_invalid_config_surfaces_sync_error() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "colour = \"blue\"\n");

        let err = plan(SyncArgs::default(), temp.path()).unwrap_err();
        assert!(matches!(err, CliError::Sync(_)));
    }
}
