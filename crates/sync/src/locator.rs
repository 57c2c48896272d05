//! Finding package clones on disk.
//!
//! A package is looked for by name, starting at the folder of the package
//! that depends on it. The search climbs to the parent folder and fans out to
//! the parent's child folders, breadth first, so nearby siblings are found
//! before anything further away. Results are cached in the [`SyncContext`],
//! misses included.

use crate::context::{ClonedPackage, SyncContext};
use crate::error::{Error, Result};
use depsync_workspaces::{Error as WorkspaceError, MANIFEST_FILE_NAME, PackageManifest};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Breadth-first search over an implicit graph.
///
/// Nodes are expanded in the order `neighbours` yields them. Each node is
/// tested and expanded at most once. Returns the first node satisfying
/// `is_goal`, or `None` once the frontier is exhausted.
///
/// # Errors
///
/// Propagates the first error returned by `neighbours` or `is_goal`.
pub fn frontier_search<N, I, E, F, G>(
    start: N,
    mut neighbours: F,
    mut is_goal: G,
) -> std::result::Result<Option<N>, E>
where
    N: Clone + Eq + Hash,
    I: IntoIterator<Item = N>,
    F: FnMut(&N) -> std::result::Result<I, E>,
    G: FnMut(&N) -> std::result::Result<bool, E>,
{
    let mut seen: HashSet<N> = HashSet::from([start.clone()]);
    let mut frontier: VecDeque<N> = VecDeque::from([start]);

    while let Some(node) = frontier.pop_front() {
        if is_goal(&node)? {
            return Ok(Some(node));
        }
        for next in neighbours(&node)? {
            if seen.insert(next.clone()) {
                frontier.push_back(next);
            }
        }
    }

    Ok(None)
}

/// Canonical form of a path, or the path itself when it cannot be resolved.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Finds the clone of `name`, searching from `start_path`.
///
/// `start_path` may be a folder or a file; for a file the search starts in
/// its parent. The outcome is cached under `name`.
///
/// # Errors
///
/// Returns an error when a folder cannot be listed or a manifest cannot be
/// read. A folder that vanished and a malformed manifest are not errors.
pub fn find_package<'a>(
    ctx: &'a mut SyncContext,
    name: &str,
    start_path: &Path,
) -> Result<Option<&'a ClonedPackage>> {
    if ctx.lookup(name).is_none() {
        let start = if start_path.is_dir() {
            normalize(start_path)
        } else {
            start_path.parent().map_or_else(|| normalize(start_path), normalize)
        };

        match frontier_search(start, folder_edges(child_folders), |folder| {
            declares_package(folder, name)
        })? {
            Some(folder) => {
                debug!(package = name, path = %folder.display(), "Found local clone");
                ctx.register(name, ClonedPackage::discovered(folder));
            }
            None => {
                debug!(package = name, "No local clone");
                ctx.record_miss(name);
            }
        }
    }

    Ok(ctx.get(name))
}

/// Edge function of the folder graph: the parent, then every child folder of
/// the parent in name order.
///
/// Each parent is listed once per search. Siblings share a parent, and the
/// first listing already queued all of its children.
fn folder_edges<L>(mut list_children: L) -> impl FnMut(&PathBuf) -> Result<Vec<PathBuf>>
where
    L: FnMut(&Path) -> Result<Vec<PathBuf>>,
{
    let mut listed: HashSet<PathBuf> = HashSet::new();
    move |folder| {
        let Some(parent) = folder.parent() else {
            return Ok(Vec::new());
        };

        let mut next = vec![parent.to_path_buf()];
        if listed.insert(parent.to_path_buf()) {
            next.extend(list_children(parent)?);
        }
        Ok(next)
    }
}

fn child_folders(parent: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            trace!(path = %parent.display(), "Folder vanished during search");
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::io(e, parent, "listing folder")),
    };

    let mut children = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::io(e, parent, "reading folder entry"))?
            .path();
        if path.is_dir() {
            children.push(path);
        }
    }
    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(children.iter().map(|child| normalize(child)).collect())
}

fn declares_package(folder: &Path, name: &str) -> Result<bool> {
    let manifest_path = folder.join(MANIFEST_FILE_NAME);
    if !manifest_path.is_file() {
        return Ok(false);
    }
    match PackageManifest::read(&manifest_path) {
        Ok(manifest) => Ok(manifest.name() == Some(name)),
        Err(
            e @ (WorkspaceError::Json { .. }
            | WorkspaceError::InvalidManifest { .. }
            | WorkspaceError::ManifestNotFound { .. }),
        ) => {
            debug!(path = %manifest_path.display(), error = %e, "Ignoring malformed manifest");
            Ok(false)
        }
        Err(WorkspaceError::Io { source, .. })
            if source.kind() == std::io::ErrorKind::InvalidData =>
        {
            debug!(path = %manifest_path.display(), error = %source, "Ignoring non UTF-8 manifest");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_package(folder: &Path, name: &str) {
        fs::create_dir_all(folder).unwrap();
        fs::write(
            folder.join(MANIFEST_FILE_NAME),
            format!(r#"{{"name": "{name}", "version": "1.0.0"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_frontier_search_visits_breadth_first_once() {
        let graph: HashMap<u32, Vec<u32>> =
            HashMap::from([(1, vec![2, 3]), (2, vec![1, 4]), (3, vec![4, 1]), (4, vec![2])]);
        let mut order = Vec::new();

        let found = frontier_search(
            1,
            |n| Ok::<_, ()>(graph[n].clone()),
            |n| {
                order.push(*n);
                Ok(false)
            },
        )
        .unwrap();

        assert_eq!(found, None);
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_frontier_search_stops_at_goal() {
        let found = frontier_search(0u32, |n| Ok::<_, ()>(vec![n + 1]), |n| Ok(*n == 5)).unwrap();
        assert_eq!(found, Some(5));
    }

    #[test]
    fn test_frontier_search_propagates_errors() {
        let result = frontier_search(0u32, |_| Err::<Vec<u32>, _>("boom"), |_| Ok(false));
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_finds_sibling() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        write_package(&ws.join("lib"), "lib");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "lib", &ws.join("app")).unwrap().cloned();

        assert_eq!(found.unwrap().path, normalize(&ws.join("lib")));
    }

    #[test]
    fn test_finds_sibling_of_ancestor() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("group/app"), "app");
        write_package(&ws.join("shared"), "shared");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "shared", &ws.join("group/app/package.json"))
            .unwrap()
            .map(|p| p.path.clone());

        assert_eq!(found, Some(normalize(&ws.join("shared"))));
    }

    #[test]
    fn test_starting_folder_matches_itself() {
        let temp = TempDir::new().unwrap();
        write_package(&temp.path().join("app"), "app");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "app", &temp.path().join("app"))
            .unwrap()
            .map(|p| p.path.clone());
        assert_eq!(found, Some(normalize(&temp.path().join("app"))));
    }

    #[test]
    fn test_sibling_tie_break_is_lexicographic() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        write_package(&ws.join("b-copy"), "dup");
        write_package(&ws.join("a-copy"), "dup");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "dup", &ws.join("app"))
            .unwrap()
            .map(|p| p.path.clone());
        assert_eq!(found, Some(normalize(&ws.join("a-copy"))));
    }

    #[test]
    fn test_miss_is_cached() {
        let temp = TempDir::new().unwrap();
        write_package(&temp.path().join("app"), "app");

        let mut ctx = SyncContext::new();
        assert!(
            find_package(&mut ctx, "ghost-package-xyz", &temp.path().join("app"))
                .unwrap()
                .is_none()
        );
        assert_eq!(ctx.lookup("ghost-package-xyz"), Some(None));

        // Creating the package afterwards does not change the cached answer.
        write_package(&temp.path().join("ghost"), "ghost-package-xyz");
        assert!(
            find_package(&mut ctx, "ghost-package-xyz", &temp.path().join("app"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_hit_is_cached() {
        let temp = TempDir::new().unwrap();
        write_package(&temp.path().join("app"), "app");
        write_package(&temp.path().join("lib"), "lib");

        let mut ctx = SyncContext::new();
        find_package(&mut ctx, "lib", &temp.path().join("app")).unwrap();
        fs::remove_dir_all(temp.path().join("lib")).unwrap();

        let again = find_package(&mut ctx, "lib", &temp.path().join("app"))
            .unwrap()
            .map(|p| p.path.clone());
        assert_eq!(again, Some(normalize(&temp.path().join("lib"))));
    }

    #[test]
    fn test_malformed_manifest_is_not_a_match() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        fs::create_dir_all(ws.join("broken")).unwrap();
        fs::write(ws.join("broken/package.json"), "{ nope").unwrap();
        write_package(&ws.join("lib"), "lib");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "lib", &ws.join("app")).unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_does_not_descend_into_start_children() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        write_package(&ws.join("app/nested/deep"), "deep-only-xyz");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "deep-only-xyz", &ws.join("app")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_each_parent_is_listed_once() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        for i in 0..25 {
            fs::create_dir_all(ws.join(format!("sibling-{i:02}"))).unwrap();
        }

        let mut listings: HashMap<PathBuf, usize> = HashMap::new();
        let edges = folder_edges(|parent: &Path| {
            *listings.entry(parent.to_path_buf()).or_default() += 1;
            child_folders(parent)
        });
        let found = frontier_search(normalize(&ws.join("app")), edges, |_| {
            Ok::<_, Error>(false)
        })
        .unwrap();

        assert_eq!(found, None);
        assert_eq!(listings.get(&normalize(ws)), Some(&1));
        assert!(listings.values().all(|count| *count == 1), "{listings:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_manifest_aborts_search() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        write_package(&ws.join("a-locked"), "locked");
        write_package(&ws.join("lib"), "lib");
        let locked = ws.join("a-locked").join(MANIFEST_FILE_NAME);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // Running with privileges that ignore file modes.
            return;
        }

        let mut ctx = SyncContext::new();
        let result = find_package(&mut ctx, "lib", &ws.join("app")).map(|p| p.cloned());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(matches!(
            result,
            Err(Error::Workspace(WorkspaceError::Io { .. }))
        ));
        assert_eq!(ctx.lookup("lib"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        let ws = temp.path();
        write_package(&ws.join("app"), "app");
        std::os::unix::fs::symlink(ws, ws.join("loop")).unwrap();
        write_package(&ws.join("lib"), "lib");

        let mut ctx = SyncContext::new();
        let found = find_package(&mut ctx, "lib", &ws.join("app"))
            .unwrap()
            .map(|p| p.path.clone());
        assert_eq!(found, Some(normalize(&ws.join("lib"))));
    }
}
