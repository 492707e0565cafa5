//! Declarative configuration bundle installer.
//!
//! Bundles are named units of installable configuration living in
//! subdirectories of a bundle root, each with an optional `bundle.conf`
//! descriptor declaring display metadata, an execution `order` and
//! dependencies on other bundles. The engine expands a requested bundle set
//! into a safe execution order, checkpoints version-controlled state before
//! mutating it, and can roll the working tree (and optionally the installed
//! package set) back to any checkpoint.
//!
//! The public API is organised into layers, leaves first:
//!
//! - **[`registry`]** — discover and parse bundle descriptors
//! - **[`resolver`]** — expand a request into a cycle-free execution order
//! - **[`selection`]** — persist the currently-installed bundle set
//! - **[`snapshot`]** — create, list and restore checkpoints
//! - **[`transaction`]** — orchestrate select → resolve → snapshot → apply
//! - **[`commands`]** — top-level subcommand orchestration

pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod lock;
pub mod logging;
pub mod prompt;
pub mod registry;
pub mod resolver;
pub mod selection;
pub mod snapshot;
pub mod transaction;
