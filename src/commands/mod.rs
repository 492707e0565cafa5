pub mod edit;
pub mod install;
pub mod list;
pub mod rollback;
pub mod snapshot;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::logging::{Log as _, Logger};
use crate::registry::{BundleRegistry, DESCRIPTOR_FILE};
use crate::selection::SELECTION_FILE;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the bundle root and loads the registry so that each command
/// does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    pub root: PathBuf,
    pub registry: BundleRegistry,
}

impl CommandSetup {
    /// Resolve the bundle root and scan it.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be determined or the registry
    /// fails to load.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let root = resolve_root(global)?;
        log.debug(&format!("bundle root: {}", root.display()));

        let registry = BundleRegistry::discover(&root)?;
        log.debug(&format!("{} bundle(s) discovered", registry.len()));

        Ok(Self { root, registry })
    }
}

/// Determine the bundle root: `--root`, then `BUNDLES_ROOT`, then the
/// current directory when it looks like a bundle root.
///
/// # Errors
///
/// Returns an error if no candidate can be determined.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Ok(root) = std::env::var("BUNDLES_ROOT") {
        return Ok(PathBuf::from(root));
    }

    let cwd = std::env::current_dir()?;
    if looks_like_root(&cwd) {
        return Ok(cwd);
    }

    anyhow::bail!("cannot determine bundle root. Use --root or set BUNDLES_ROOT env var");
}

/// A directory is a plausible bundle root when it carries a selection file
/// or at least one subdirectory with a descriptor.
fn looks_like_root(dir: &Path) -> bool {
    if dir.join(SELECTION_FILE).exists() {
        return true;
    }
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .flatten()
            .any(|e| e.path().join(DESCRIPTOR_FILE).exists())
    })
}

/// Print the summary and bail if any recorded step failed.
///
/// # Errors
///
/// Returns an error if one or more steps recorded a failure.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} step(s) failed");
    }
    Ok(())
}
