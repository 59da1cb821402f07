use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{TimerMode, TimerStatus};

/// Why a sounding alarm went quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmStopReason {
    /// Silenced explicitly by the user.
    Dismissed,
    /// The timer was reset.
    Reset,
    /// The auto-stop deadline elapsed.
    AutoStop,
    /// The runtime shut down.
    Shutdown,
}

/// Every state change in the system produces an Event.
/// The runtime broadcasts them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        total_secs: u64,
        step_count: usize,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A step ran out and the next one began.
    StepAdvanced {
        from_step: usize,
        to_step: usize,
        step_name: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The whole timer ran out.
    TimerCompleted {
        mode: TimerMode,
        steps_completed: usize,
        at: DateTime<Utc>,
    },
    AlarmStarted {
        at: DateTime<Utc>,
    },
    /// A trigger arrived while already sounding; playback restarted.
    AlarmRestarted {
        at: DateTime<Utc>,
    },
    AlarmStopped {
        reason: AlarmStopReason,
        at: DateTime<Utc>,
    },
    PresetSaved {
        preset_id: Uuid,
        name: String,
        step_count: usize,
        at: DateTime<Utc>,
    },
    PresetDeleted {
        preset_id: Uuid,
        at: DateTime<Utc>,
    },
    PresetLoaded {
        preset_id: Uuid,
        name: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        status: TimerStatus,
        remaining_overall_secs: u64,
        remaining_step_secs: u64,
        active_step_index: usize,
        step_name: Option<String>,
        total_secs: u64,
        alarm_sounding: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Step and timer completions are the events that ring the alarm.
    pub fn triggers_alarm(&self) -> bool {
        matches!(
            self,
            Event::StepAdvanced { .. } | Event::TimerCompleted { .. }
        )
    }
}
