use clap::Subcommand;
use timekeep_core::{ListFilter, ListSort, TimerStore};

use super::{open_tracker, resolve_owner};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume recording
    Start {
        /// Existing timer id to resume
        #[arg(long)]
        id: Option<String>,
        /// Name for a newly created timer
        #[arg(long)]
        name: Option<String>,
    },
    /// Pause recording, closing the open entry
    Pause {
        /// Timer id
        id: String,
    },
    /// End a timer for good
    End {
        /// Timer id
        id: String,
    },
    /// Delete a timer and all of its entries
    Remove {
        /// Timer id
        id: String,
    },
    /// Rename a timer
    Rename {
        /// Timer id
        id: String,
        /// New name
        name: String,
    },
    /// Edit a timer's tags
    Tag {
        /// Timer id
        id: String,
        /// Replace the whole tag set (comma-separated)
        #[arg(long)]
        set: Option<String>,
        /// Add one tag
        #[arg(long)]
        add: Option<String>,
        /// Remove one tag
        #[arg(long)]
        remove: Option<String>,
    },
    /// List timers as JSON rows
    List {
        /// Status filter: all, active, paused, ended
        #[arg(long, default_value = "all")]
        status: String,
        /// Sort order: recent, name, duration
        #[arg(long, default_value = "recent")]
        sort: String,
        /// Only timers carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let owner = resolve_owner();

    match action {
        TimerAction::Start { id, name } => {
            match tracker.create_or_resume(&owner, name.as_deref(), id.as_deref())? {
                Some(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
                None => println!("{{\"type\": \"timer_already_ended\"}}"),
            }
        }
        TimerAction::Pause { id } => match tracker.pause(&owner, &id)? {
            Some(outcome) => println!("{}", serde_json::to_string_pretty(&outcome)?),
            None => println!("{{\"type\": \"nothing_to_pause\"}}"),
        },
        TimerAction::End { id } => {
            let outcome = tracker.end(&owner, &id)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        TimerAction::Remove { id } => {
            tracker.remove(&owner, &id)?;
            println!("removed {id}");
        }
        TimerAction::Rename { id, name } => {
            tracker.rename(&owner, &id, &name)?;
            println!("renamed {id}");
        }
        TimerAction::Tag {
            id,
            set,
            add,
            remove,
        } => {
            if let Some(tags) = set {
                tracker.set_tags(&owner, &id, tags.split(','))?;
            }
            if let Some(tag) = add {
                tracker.add_tag(&owner, &id, &tag)?;
            }
            if let Some(tag) = remove {
                tracker.remove_tag(&owner, &id, &tag)?;
            }
            let timer = tracker
                .store()
                .get_timer(&owner, &id)?
                .ok_or_else(|| format!("timer not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&timer.tags)?);
        }
        TimerAction::List { status, sort, tag } => {
            let rows = tracker.list_view(
                &owner,
                parse_filter(&status)?,
                parse_sort(&sort)?,
                tag.as_deref(),
            )?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

fn parse_filter(value: &str) -> Result<ListFilter, Box<dyn std::error::Error>> {
    match value {
        "all" => Ok(ListFilter::All),
        "active" => Ok(ListFilter::Active),
        "paused" => Ok(ListFilter::Paused),
        "ended" => Ok(ListFilter::Ended),
        other => Err(format!("unknown status filter: {other}").into()),
    }
}

fn parse_sort(value: &str) -> Result<ListSort, Box<dyn std::error::Error>> {
    match value {
        "recent" => Ok(ListSort::Recent),
        "name" => Ok(ListSort::Name),
        "duration" => Ok(ListSort::Duration),
        other => Err(format!("unknown sort order: {other}").into()),
    }
}
