//! Foreground countdown with single-key control on stdin.

use clap::Args;
use countdown_core::alarm::{sink_for, AlarmController, AlarmSound};
use countdown_core::timer::format_hms;
use countdown_core::{
    Command, Config, CountdownEngine, Database, Event, PresetLibrary, PresetStore, TimeEntry,
    TimerRuntime, TimerSession, TimerStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use super::{parse_entry, parse_step, sequence_from};

#[derive(Args)]
pub struct RunArgs {
    /// Simple countdown length (HH:MM:SS, MM:SS or SS)
    #[arg(long, value_parser = parse_entry, conflicts_with_all = ["steps", "preset"])]
    duration: Option<TimeEntry>,
    /// Step as NAME=DURATION, repeatable, in run order
    #[arg(long = "step", value_parser = parse_step, conflicts_with = "preset")]
    steps: Vec<(String, u64)>,
    /// Run the steps of a saved preset (name or id)
    #[arg(long)]
    preset: Option<String>,
    /// Alarm sound, overriding the config
    #[arg(long, value_parser = parse_sound)]
    sound: Option<AlarmSound>,
    /// Exit as soon as the timer completes
    #[arg(long)]
    once: bool,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

fn parse_sound(s: &str) -> Result<AlarmSound, String> {
    match s.to_ascii_lowercase().as_str() {
        "silent" => Ok(AlarmSound::Silent),
        "bell" => Ok(AlarmSound::Bell),
        "tone" => Ok(AlarmSound::Tone),
        other => Err(format!("unknown sound '{other}' (silent, bell, tone)")),
    }
}

/// What a line typed on stdin asks for.
#[derive(Debug, PartialEq, Eq)]
enum Key {
    Send(KeyCommand),
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum KeyCommand {
    Start,
    Pause,
    Resume,
    Reset,
    Silence,
}

impl KeyCommand {
    fn into_command(self) -> Command {
        match self {
            KeyCommand::Start => Command::Start,
            KeyCommand::Pause => Command::Pause,
            KeyCommand::Resume => Command::Resume,
            KeyCommand::Reset => Command::Reset,
            KeyCommand::Silence => Command::StopAlarm,
        }
    }
}

fn parse_key(line: &str) -> Option<Key> {
    let key = match line.trim().chars().next()?.to_ascii_lowercase() {
        's' => Key::Send(KeyCommand::Start),
        'p' => Key::Send(KeyCommand::Pause),
        'r' => Key::Send(KeyCommand::Resume),
        'x' => Key::Send(KeyCommand::Reset),
        'a' => Key::Send(KeyCommand::Silence),
        'q' => Key::Quit,
        _ => return None,
    };
    Some(key)
}

pub fn run(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_session(args, config));
    // A pending stdin read lives on the blocking pool; don't wait for it.
    runtime.shutdown_background();
    result
}

fn build_engine(
    args: &RunArgs,
    config: &Config,
    presets: &PresetLibrary,
) -> Result<CountdownEngine, Box<dyn std::error::Error>> {
    if let Some(key) = &args.preset {
        let preset = presets
            .find_by_name(key)
            .or_else(|| {
                uuid::Uuid::parse_str(key.trim())
                    .ok()
                    .and_then(|id| presets.get(id))
            })
            .ok_or_else(|| format!("no preset named '{key}'"))?;
        let mut engine = CountdownEngine::new();
        engine.replace_sequence(preset.steps.clone());
        return Ok(engine);
    }
    if !args.steps.is_empty() {
        return Ok(CountdownEngine::with_setup(
            TimeEntry::default(),
            sequence_from(&args.steps),
        ));
    }
    let entry = match args.duration {
        Some(entry) => entry,
        None => config.default_entry()?,
    };
    if entry.to_duration_secs() == 0 {
        return Err("duration must be greater than zero".into());
    }
    Ok(CountdownEngine::with_setup(entry, Default::default()))
}

async fn run_session(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store: Box<dyn PresetStore> = match Database::open() {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!("Failed to open database, presets unavailable: {}", e);
            Box::new(countdown_core::presets::MemoryPresetStore::new())
        }
    };
    let presets = PresetLibrary::open(store);
    let engine = build_engine(&args, &config, &presets)?;

    let sound = args.sound.unwrap_or(config.alarm.sound);
    let alarm = AlarmController::with_auto_stop(sink_for(sound, config.alarm.volume), config.auto_stop());
    let session = TimerSession::new(engine, alarm, presets);

    let runtime = TimerRuntime::new(session, config.tick_period());
    let events = runtime.subscribe();
    let (tx, rx) = mpsc::channel(32);
    tx.send(Command::Start).await?;

    if !args.json {
        println!("keys: s start  p pause  r resume  x reset  a silence alarm  q quit");
    }
    let (session, ui) = tokio::join!(runtime.run(rx), control(tx, events, args.once, args.json));
    info!(
        status = ?session.engine().status(),
        alarms = session.alarm().trigger_count(),
        "countdown finished"
    );
    ui
}

/// Forward stdin keys to the runtime and print its events, until the user
/// quits, stdin closes, or (with `once`) the timer completes.
async fn control(
    tx: mpsc::Sender<Command>,
    mut events: broadcast::Receiver<Event>,
    once: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_key(&line) {
                    Some(Key::Quit) => break,
                    Some(Key::Send(key)) => tx.send(key.into_command()).await?,
                    None => eprintln!("unknown key: {}", line.trim()),
                },
                Ok(None) | Err(_) => {
                    stdin_open = false;
                    if !once {
                        break;
                    }
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&event, json)?;
                    if once && matches!(event, Event::TimerCompleted { .. }) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => warn!(skipped = n, "read-out fell behind"),
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
        }
    }

    tx.send(Command::Shutdown).await?;
    Ok(())
}

fn print_event(event: &Event, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::StateSnapshot {
            status,
            remaining_overall_secs,
            remaining_step_secs,
            active_step_index,
            step_name,
            alarm_sounding,
            ..
        } => {
            let state = match status {
                TimerStatus::Idle => "idle",
                TimerStatus::Running => "running",
                TimerStatus::Paused => "paused",
            };
            let bell = if *alarm_sounding { "  [ALARM]" } else { "" };
            match step_name {
                Some(name) => println!(
                    "{state:>7}  {}  step {} {name} {}{bell}",
                    format_hms(*remaining_overall_secs),
                    active_step_index + 1,
                    format_hms(*remaining_step_secs),
                ),
                None => println!("{state:>7}  {}{bell}", format_hms(*remaining_overall_secs)),
            }
        }
        Event::TimerStarted { total_secs, step_count, .. } => {
            println!("started: {} over {step_count} steps", format_hms(*total_secs))
        }
        Event::TimerPaused { remaining_secs, .. } => {
            println!("paused at {}", format_hms(*remaining_secs))
        }
        Event::TimerResumed { remaining_secs, .. } => {
            println!("resumed at {}", format_hms(*remaining_secs))
        }
        Event::TimerReset { .. } => println!("reset"),
        Event::StepAdvanced { to_step, step_name, duration_secs, .. } => println!(
            "next: step {} {step_name} ({})",
            to_step + 1,
            format_hms(*duration_secs)
        ),
        Event::TimerCompleted { .. } => println!("done"),
        Event::AlarmStarted { .. } | Event::AlarmRestarted { .. } => println!("\u{7}alarm! press a to silence"),
        Event::AlarmStopped { .. } => println!("alarm off"),
        Event::PresetSaved { name, .. } => println!("preset saved: {name}"),
        Event::PresetDeleted { preset_id, .. } => println!("preset deleted: {preset_id}"),
        Event::PresetLoaded { name, .. } => println!("preset loaded: {name}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(parse_key("p"), Some(Key::Send(KeyCommand::Pause)));
        assert_eq!(parse_key(" R\n"), Some(Key::Send(KeyCommand::Resume)));
        assert_eq!(parse_key("x"), Some(Key::Send(KeyCommand::Reset)));
        assert_eq!(parse_key("start"), Some(Key::Send(KeyCommand::Start)));
        assert_eq!(parse_key("a"), Some(Key::Send(KeyCommand::Silence)));
        assert_eq!(parse_key("q"), Some(Key::Quit));
        assert_eq!(parse_key("z"), None);
        assert_eq!(parse_key("   "), None);
    }

    #[test]
    fn sound_names_parse() {
        assert_eq!(parse_sound("Silent"), Ok(AlarmSound::Silent));
        assert_eq!(parse_sound("tone"), Ok(AlarmSound::Tone));
        assert!(parse_sound("trumpet").is_err());
    }
}
