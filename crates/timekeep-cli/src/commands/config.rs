use clap::Subcommand;
use timekeep_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set the owner identity new calls are scoped to
    SetOwner {
        /// Owner id
        owner: String,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::SetOwner { owner } => {
            let mut config = Config::load_or_default();
            config.identity.owner = owner;
            config.save()?;
            println!("owner set to {}", config.identity.owner);
        }
    }
    Ok(())
}
