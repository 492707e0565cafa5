use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::commands::CommandSetup;
use crate::logging::{Log as _, Logger};
use crate::selection::SelectionStore;

/// Run the list command: show visible bundles with their selection state,
/// order and dependencies.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved or the registry fails
/// to load.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let selection = SelectionStore::new(&setup.root)
        .load()?
        .unwrap_or_default();

    let mut shown = 0;
    for descriptor in setup.registry.visible() {
        let marker = if selection.contains(&descriptor.id) {
            '*'
        } else {
            ' '
        };
        let requires = if descriptor.requires.is_empty() {
            String::new()
        } else {
            format!("  requires: {}", descriptor.requires.join(", "))
        };
        let description = if descriptor.description.is_empty() {
            String::new()
        } else {
            format!("  {}", descriptor.description)
        };
        println!(
            "{marker} {:<20} order={:<4} {}{requires}{description}",
            descriptor.id, descriptor.order, descriptor.display_name
        );
        shown += 1;
    }

    if shown == 0 {
        log.info("no bundles found");
    }
    log.info(&format!("{} of {shown} selected", selection.len()));
    Ok(())
}
