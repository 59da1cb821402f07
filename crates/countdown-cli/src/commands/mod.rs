pub mod config;
pub mod preset;
pub mod run;

use countdown_core::timer::{format_hms, StepSequence, TimeEntry};

/// Parse a `--step` argument of the form `name=duration`.
///
/// The duration takes the same forms as `--duration` (`HH:MM:SS`, `MM:SS`
/// or `SS`). An empty name gets the default step name.
pub fn parse_step(spec: &str) -> Result<(String, u64), String> {
    let (name, duration) = spec
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=DURATION, got '{spec}'"))?;
    let secs = parse_entry(duration)?.to_duration_secs();
    if secs == 0 {
        return Err(format!("step '{name}' has zero duration"));
    }
    Ok((name.trim().to_string(), secs))
}

pub fn parse_entry(s: &str) -> Result<TimeEntry, String> {
    s.parse::<TimeEntry>().map_err(|e| e.to_string())
}

pub fn sequence_from(steps: &[(String, u64)]) -> StepSequence {
    let mut seq = StepSequence::new();
    for (name, secs) in steps {
        seq.append(name, *secs);
    }
    seq
}

/// One line per step: `  1. Work  00:25:00`.
pub fn print_steps<'a>(steps: impl IntoIterator<Item = &'a countdown_core::TimerStep>) {
    for (i, step) in steps.into_iter().enumerate() {
        println!("  {}. {}  {}", i + 1, step.name, format_hms(step.duration_secs));
    }
}
