use clap::{Parser, Subcommand};
use countdown_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "countdown", version, about = "Countdown timer with step sequences and presets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a countdown in the foreground
    Run(commands::run::RunArgs),
    /// Saved step sequences
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so the read-out on stdout stays clean. `RUST_LOG` wins
/// over the configured level.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_logging(&config);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, config),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
