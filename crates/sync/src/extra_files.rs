//! Version patching in arbitrary text files.
//!
//! Some projects keep a table of package versions in source, for example
//! `export const versions = { "@scope/lib": "1.2.3" }` or
//! `register('@scope/lib', '^1.2.3')`. After a sync those embedded versions
//! are rewritten to the packages' new targets.
//!
//! A registration is a quoted package name, optional whitespace, `:` or `,`,
//! optional whitespace, and a quoted version. The version keeps its quote
//! style.

use crate::error::Result;
use regex::{Captures, Regex};
use serde::Serialize;

/// One rewritten registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionPatch {
    /// Package whose registration changed.
    pub package: String,
    /// Version found in the file.
    pub from: String,
    /// Version written.
    pub to: String,
}

/// Builds the registration pattern for one package name.
///
/// # Errors
///
/// Returns an error if the pattern cannot be compiled.
pub fn registration_pattern(package: &str) -> Result<Regex> {
    let pattern = format!(
        r#"(?P<prefix>["']{}["']\s*[:,]\s*)(?:"(?P<dq>[^"\r\n]*)"|'(?P<sq>[^'\r\n]*)')"#,
        regex::escape(package)
    );
    Ok(Regex::new(&pattern)?)
}

/// Rewrites every registration of the given packages in `content`.
///
/// `targets` pairs package names with their new versions. Returns the new
/// content and the patches applied; registrations already at the target are
/// left alone and not reported.
///
/// # Errors
///
/// Returns an error if a registration pattern cannot be compiled.
pub fn patch_versions<S: AsRef<str>>(
    content: &str,
    targets: &[(S, S)],
) -> Result<(String, Vec<VersionPatch>)> {
    let mut patched = content.to_string();
    let mut patches = Vec::new();

    for (package, target) in targets {
        let (package, target) = (package.as_ref(), target.as_ref());
        let pattern = registration_pattern(package)?;

        let replaced = pattern.replace_all(&patched, |caps: &Captures<'_>| {
            let prefix = &caps["prefix"];
            let (quote, current) = match (caps.name("dq"), caps.name("sq")) {
                (Some(dq), _) => ('"', dq.as_str()),
                (None, Some(sq)) => ('\'', sq.as_str()),
                (None, None) => return caps[0].to_string(),
            };
            if current == target {
                return caps[0].to_string();
            }
            patches.push(VersionPatch {
                package: package.to_string(),
                from: current.to_string(),
                to: target.to_string(),
            });
            format!("{prefix}{quote}{target}{quote}")
        });
        patched = replaced.into_owned();
    }

    Ok((patched, patches))
}
