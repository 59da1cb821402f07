use clap::Subcommand;
use countdown_core::timer::format_hms;
use countdown_core::{Database, Preset, PresetLibrary};
use uuid::Uuid;

use super::{parse_step, print_steps, sequence_from};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List saved presets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the steps of a preset
    Show {
        /// Preset name or id
        preset: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a step sequence as a preset
    Save {
        /// Preset name
        name: String,
        /// Step as NAME=DURATION, repeatable, in run order
        #[arg(long = "step", value_parser = parse_step, required = true)]
        steps: Vec<(String, u64)>,
    },
    /// Delete a preset
    Delete {
        /// Preset name or id
        preset: String,
    },
}

/// Look a preset up by id first, then by name.
pub fn resolve<'a>(library: &'a PresetLibrary<Database>, key: &str) -> Option<&'a Preset> {
    if let Ok(id) = Uuid::parse_str(key.trim()) {
        if let Some(preset) = library.get(id) {
            return Some(preset);
        }
    }
    library.find_by_name(key)
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut library = PresetLibrary::open(Database::open()?);

    match action {
        PresetAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(library.list())?);
            } else if library.is_empty() {
                println!("no presets");
            } else {
                for preset in library.list() {
                    println!(
                        "{}  {}  {} steps  {}",
                        preset.id,
                        preset.name,
                        preset.steps.len(),
                        format_hms(preset.total_duration())
                    );
                }
            }
        }
        PresetAction::Show { preset, json } => {
            let found = resolve(&library, &preset).ok_or_else(|| format!("no preset named '{preset}'"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(found)?);
            } else {
                println!("{}  ({})", found.name, format_hms(found.total_duration()));
                print_steps(&found.steps);
            }
        }
        PresetAction::Save { name, steps } => {
            let sequence = sequence_from(&steps);
            let saved = library
                .save_current(&name, &sequence)
                .ok_or("a preset needs at least one step")?;
            println!("Preset saved: {} ({})", saved.name, saved.id);
        }
        PresetAction::Delete { preset } => {
            let id = resolve(&library, &preset)
                .map(|p| p.id)
                .ok_or_else(|| format!("no preset named '{preset}'"))?;
            if let Some(removed) = library.delete(id) {
                println!("Preset deleted: {}", removed.name);
            }
        }
    }
    Ok(())
}
