//! npm-backed collaborators.

use super::{BoxFuture, Installer, PackageRegistry};
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const NPM: &str = "npm";

/// Queries `latest` through `npm view <name> dist-tags --json`.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    program: String,
    registry: Option<String>,
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NpmRegistry {
    /// Uses `npm` from `PATH` and its configured registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: NPM.to_string(),
            registry: None,
        }
    }

    /// Queries the given registry URL instead of npm's configured one.
    #[must_use]
    pub fn with_registry(mut self, url: impl Into<String>) -> Self {
        self.registry = Some(url.into());
        self
    }

    /// Uses a different executable in place of `npm`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn view_args(&self, package: &str) -> Vec<String> {
        let mut args = vec![
            "view".to_string(),
            package.to_string(),
            "dist-tags".to_string(),
            "--json".to_string(),
        ];
        if let Some(registry) = &self.registry {
            args.push("--registry".to_string());
            args.push(registry.clone());
        }
        args
    }

    async fn query(&self, package: &str) -> Result<Option<String>> {
        let args = self.view_args(package);
        debug!(program = %self.program, ?args, "Querying registry");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::registry(package, format!("failed to execute {}: {e}", self.program)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_not_published(&stderr) || is_not_published(&stdout) {
                debug!(package, "Package is not published");
                return Ok(None);
            }
            return Err(Error::registry(
                package,
                format!("{} view failed: {}", self.program, stderr.trim()),
            ));
        }

        parse_latest_tag(package, &stdout)
    }
}

impl PackageRegistry for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn latest_version<'a>(&'a self, package: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(self.query(package))
    }
}

/// npm reports unpublished packages with an `E404` error code.
fn is_not_published(output: &str) -> bool {
    output.contains("E404")
}

/// Extracts `latest` from the `dist-tags` JSON object.
///
/// Empty output (npm prints nothing for some unpublished scoped packages)
/// counts as "no tag".
fn parse_latest_tag(package: &str, stdout: &str) -> Result<Option<String>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let tags: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| Error::registry(package, format!("unexpected dist-tags output: {e}")))?;

    Ok(tags
        .get("latest")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string))
}

/// Runs `npm install` in the package folder.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: String,
    args: Vec<String>,
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl NpmInstaller {
    /// Uses `npm` from `PATH` with no extra arguments.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: NPM.to_string(),
            args: Vec::new(),
        }
    }

    /// Appends arguments after `install`.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Uses a different executable in place of `npm`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn run(&self, folder: &Path) -> Result<i32> {
        debug!(program = %self.program, folder = %folder.display(), "Running install");

        let status = Command::new(&self.program)
            .arg("install")
            .args(&self.args)
            .current_dir(folder)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::io(e, folder, format!("running {} install", self.program)))?;

        // Killed by a signal: no code, report a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

impl Installer for NpmInstaller {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn install<'a>(&'a self, folder: &'a Path) -> BoxFuture<'a, Result<i32>> {
        Box::pin(self.run(folder))
    }
}
