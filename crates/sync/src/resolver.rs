//! Target version resolution.

use crate::backends::PackageRegistry;
use crate::config::DependencyType;
use crate::context::SyncContext;
use crate::error::Result;
use crate::locator::find_package;
use std::path::Path;
use tracing::debug;

/// Computes the version string a dependency should be rewritten to.
pub struct VersionResolver<'a> {
    registry: &'a dyn PackageRegistry,
}

impl<'a> VersionResolver<'a> {
    /// Creates a resolver backed by the given registry.
    #[must_use]
    pub fn new(registry: &'a dyn PackageRegistry) -> Self {
        Self { registry }
    }

    /// Resolves the target version of `dependency` as seen from `requesting_folder`.
    ///
    /// Returns `None` when the dependency has no local clone, or when `latest`
    /// finds neither a published tag nor a default version. The first
    /// successful resolution of a name is cached and returned on every later
    /// call, whatever `dependency_type` those calls pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder search or the registry query fails.
    pub async fn resolve_target_version(
        &self,
        ctx: &mut SyncContext,
        dependency: &str,
        requesting_folder: &Path,
        dependency_type: DependencyType,
    ) -> Result<Option<String>> {
        let Some(package) = find_package(ctx, dependency, requesting_folder)? else {
            return Ok(None);
        };
        if let Some(target) = &package.target_version {
            return Ok(Some(target.clone()));
        }

        let path = package.path.clone();
        let default_version = package.default_version.clone();

        let target = match dependency_type {
            DependencyType::Local => Some(local_reference(&path)),
            DependencyType::Latest => match self.registry.latest_version(dependency).await? {
                Some(tag) => Some(format!("^{tag}")),
                None => {
                    debug!(
                        package = dependency,
                        registry = self.registry.name(),
                        "No latest tag, using default version"
                    );
                    default_version
                }
            },
        };

        if let (Some(target), Some(package)) = (&target, ctx.get_mut(dependency)) {
            package.target_version = Some(target.clone());
        }
        Ok(target)
    }
}

/// `file:` reference to a folder, with `/` separators on every platform.
#[must_use]
pub fn local_reference(folder: &Path) -> String {
    format!("file:{}", folder.to_string_lossy().replace('\\', "/"))
}
