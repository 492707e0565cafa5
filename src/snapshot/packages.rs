//! Package-manager collaborator: dump installed state, diff sets, and
//! reinstall a captured manifest through the [`Executor`] seam.
//!
//! Only explicitly-installed packages are captured (`pacman -Qqe`);
//! dependency-installed packages follow the explicit set.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::exec::Executor;

/// Whether the package manager is available on this system.
#[must_use]
pub fn available(executor: &dyn Executor) -> bool {
    executor.which("pacman")
}

/// Names of explicitly-installed packages, sorted.
///
/// # Errors
///
/// Returns an error if the query command fails.
pub fn installed_explicit(executor: &dyn Executor) -> Result<BTreeSet<String>> {
    let result = executor.run("pacman", &["-Qqe"])?;
    Ok(result
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse a captured manifest (one package name per line).
#[must_use]
pub fn parse_manifest(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Packages present in `installed` but absent from `manifest`: the set a
/// restore would remove.
#[must_use]
pub fn extras(installed: &BTreeSet<String>, manifest: &BTreeSet<String>) -> Vec<String> {
    installed.difference(manifest).cloned().collect()
}

/// Remove packages (with their unneeded dependencies).
///
/// # Errors
///
/// Returns an error if the removal command fails.
pub fn remove(executor: &dyn Executor, packages: &[String]) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    let mut args = vec!["pacman", "-Rns", "--noconfirm"];
    args.extend(packages.iter().map(String::as_str));
    executor.run("sudo", &args)?;
    Ok(())
}

/// Install the full manifest set. Idempotent: `--needed` skips packages
/// already at their current version.
///
/// # Errors
///
/// Returns an error if the install command fails.
pub fn install(executor: &dyn Executor, packages: &BTreeSet<String>) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    let mut args = vec!["pacman", "-S", "--needed", "--noconfirm"];
    let names: Vec<&str> = packages.iter().map(String::as_str).collect();
    args.extend(names);
    executor.run("sudo", &args)?;
    Ok(())
}
