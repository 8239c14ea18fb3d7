use clap::Subcommand;
use timekeep_core::{BreakdownMode, RangeFilter};

use super::{open_tracker, resolve_owner};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Duration breakdown by tag or project
    Breakdown {
        /// Window: all, today, week
        #[arg(long, default_value = "all")]
        range: String,
        /// Dimension: tag, project
        #[arg(long, default_value = "project")]
        by: String,
        /// Only entries whose timer carries this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Stacked weekly chart, Monday to Sunday
    Weekly {
        /// Only entries whose timer carries this tag
        #[arg(long)]
        tag: Option<String>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = open_tracker()?;
    let owner = resolve_owner();

    match action {
        StatsAction::Breakdown { range, by, tag } => {
            let report = tracker.analytics(
                &owner,
                parse_range(&range)?,
                tag.as_deref(),
                parse_mode(&by)?,
            )?;
            println!("{}", serde_json::to_string_pretty(&report.breakdown)?);
        }
        StatsAction::Weekly { tag } => {
            let report = tracker.analytics(
                &owner,
                RangeFilter::Week,
                tag.as_deref(),
                BreakdownMode::Project,
            )?;
            println!("{}", serde_json::to_string_pretty(&report.weekly)?);
        }
    }
    Ok(())
}

fn parse_range(value: &str) -> Result<RangeFilter, Box<dyn std::error::Error>> {
    match value {
        "all" => Ok(RangeFilter::All),
        "today" => Ok(RangeFilter::Today),
        "week" => Ok(RangeFilter::Week),
        other => Err(format!("unknown range: {other}").into()),
    }
}

fn parse_mode(value: &str) -> Result<BreakdownMode, Box<dyn std::error::Error>> {
    match value {
        "tag" => Ok(BreakdownMode::Tag),
        "project" => Ok(BreakdownMode::Project),
        other => Err(format!("unknown breakdown dimension: {other}").into()),
    }
}
