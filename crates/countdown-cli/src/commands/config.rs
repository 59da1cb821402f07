//! `countdown config`: inspect and edit `config.toml` in the data dir.

use clap::Subcommand;
use countdown_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dotted key, e.g. `alarm.auto_stop_secs`
    Get { key: String },
    /// Change one value and write the file
    Set { key: String, value: String },
    /// Print the whole file
    List {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Overwrite the file with defaults
    Reset,
    /// Print the config file location
    Path,
}

fn lookup(config: &Config, key: &str) -> Result<String, String> {
    config
        .get(key)
        .ok_or_else(|| format!("unknown config key '{key}'"))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = Config::path()?;
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Get { key } => {
            let config = Config::load_from(&path)?;
            println!("{}", lookup(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(&path)?;
            config.set(&key, &value)?;
            println!("{key} = {}", lookup(&config, &key)?);
        }
        ConfigAction::List { json } => {
            let config = Config::load_from(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            Config::default().save_to(&path)?;
            println!("defaults written to {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reads_nested_keys() {
        let config = Config::default();
        assert_eq!(lookup(&config, "alarm.auto_stop_secs").unwrap(), "60");
        let err = lookup(&config, "alarm.colour").unwrap_err();
        assert!(err.contains("alarm.colour"));
    }
}
