//! # Countdown Core Library
//!
//! Core logic for a countdown timer that runs either a single duration or an
//! ordered sequence of named steps, rings an alarm at every boundary, and
//! keeps reusable step sequences as presets. The `countdown` CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-counting state machine. The caller delivers one
//!   `tick()` per elapsed second; the engine never reads a clock
//! - **Alarm**: Looping alarm output with restart-on-retrigger and auto-stop
//! - **Presets**: Named step-sequence snapshots persisted as one collection
//! - **Runtime**: A single tokio task that serializes commands, ticks and the
//!   alarm deadline
//! - **Storage**: SQLite key-value store and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: Core timer state machine
//! - [`TimerSession`]: Engine, alarm and presets wired together
//! - [`TimerRuntime`]: Async driver for a session
//! - [`Database`]: Preset persistence
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod error;
pub mod events;
pub mod presets;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod timer;

pub use alarm::{AlarmController, AlarmSink, AlarmSound, AlarmState};
pub use error::{AudioError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{AlarmStopReason, Event};
pub use presets::{Preset, PresetId, PresetLibrary, PresetStore};
pub use runtime::{Command, Ticker, TimerRuntime};
pub use session::TimerSession;
pub use storage::{Config, Database};
pub use timer::{
    format_hms, CountdownEngine, EntryField, StepId, StepSequence, TimeEntry, TimerMode,
    TimerRuntimeState, TimerStatus, TimerStep,
};
