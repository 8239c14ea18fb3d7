use clap::Subcommand;

use super::{open_tracker, resolve_owner};

#[derive(Subcommand)]
pub enum EntryAction {
    /// Set or clear the notes on one entry
    Notes {
        /// Entry id
        id: String,
        /// New notes text; omit to clear
        text: Option<String>,
    },
}

pub fn run(action: EntryAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let owner = resolve_owner();

    match action {
        EntryAction::Notes { id, text } => {
            tracker.set_entry_notes(&owner, &id, text.as_deref())?;
            println!("updated {id}");
        }
    }
    Ok(())
}
