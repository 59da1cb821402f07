//! Countdown engine implementation.
//!
//! The engine is a tick-counting state machine. It does not use internal
//! threads or read the clock - the caller is responsible for calling
//! `tick()` once per elapsed second while the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Idle
//! ```
//!
//! `reset()` returns to `Idle` from anywhere; a natural completion returns
//! to `Idle` on its own.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = CountdownEngine::new();
//! engine.set_entry(TimeEntry::new(0, 0, 5)?);
//! engine.start();
//! // Once per second:
//! if let Some(event) = engine.tick() {
//!     // StepAdvanced / TimerCompleted
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::entry::{EntryField, TimeEntry};
use super::sequence::{StepId, StepSequence, TimerStep};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// One fixed duration taken from the time entry.
    Simple,
    /// The step sequence, one step after another.
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Live counters of the engine.
///
/// `plan` is the copy of the steps taken when the run was seeded, so every
/// tick of a run reads the same steps even if the live sequence is edited
/// while paused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRuntimeState {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub remaining_overall: u64,
    pub remaining_step: u64,
    pub active_step_index: usize,
    plan: Vec<TimerStep>,
}

impl TimerRuntimeState {
    fn seeded(entry: &TimeEntry, sequence: &StepSequence) -> Self {
        if sequence.is_empty() {
            Self {
                mode: TimerMode::Simple,
                status: TimerStatus::Idle,
                remaining_overall: entry.to_duration_secs(),
                remaining_step: 0,
                active_step_index: 0,
                plan: Vec::new(),
            }
        } else {
            let plan = sequence.steps().to_vec();
            Self {
                mode: TimerMode::Sequential,
                status: TimerStatus::Idle,
                remaining_overall: sequence.total_duration(),
                remaining_step: plan[0].duration_secs,
                active_step_index: 0,
                plan,
            }
        }
    }

    pub fn plan(&self) -> &[TimerStep] {
        &self.plan
    }

    fn plan_secs(&self) -> u64 {
        self.plan
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.duration_secs))
    }
}

/// Core countdown engine.
///
/// Owns the time entry, the step sequence and the single runtime state.
/// Commands that are not valid in the current status are ignored and return
/// `None`; they never fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    entry: TimeEntry,
    sequence: StepSequence,
    state: TimerRuntimeState,
    /// Duration the current simple run was seeded with.
    #[serde(default)]
    simple_total: u64,
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownEngine {
    /// Create an idle engine with a zero entry and no steps.
    pub fn new() -> Self {
        Self::with_setup(TimeEntry::default(), StepSequence::new())
    }

    pub fn with_setup(entry: TimeEntry, sequence: StepSequence) -> Self {
        let state = TimerRuntimeState::seeded(&entry, &sequence);
        let simple_total = entry.to_duration_secs();
        Self {
            entry,
            sequence,
            state,
            simple_total,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerRuntimeState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_overall(&self) -> u64 {
        self.state.remaining_overall
    }

    pub fn remaining_step(&self) -> u64 {
        self.state.remaining_step
    }

    pub fn active_step_index(&self) -> usize {
        self.state.active_step_index
    }

    pub fn entry(&self) -> &TimeEntry {
        &self.entry
    }

    pub fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    pub fn is_running(&self) -> bool {
        self.state.status == TimerStatus::Running
    }

    /// The step being counted down, in sequential mode.
    pub fn current_step(&self) -> Option<&TimerStep> {
        match self.state.mode {
            TimerMode::Simple => None,
            TimerMode::Sequential => self.state.plan.get(self.state.active_step_index),
        }
    }

    /// Length of the current (or would-be) run in seconds.
    pub fn total_secs(&self) -> u64 {
        match self.state.mode {
            TimerMode::Simple => self.simple_total,
            TimerMode::Sequential => self.state.plan_secs(),
        }
    }

    /// 0.0 .. 1.0 progress across the whole run.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.state.remaining_overall as f64 / total as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.status != TimerStatus::Idle {
            debug!(status = ?self.state.status, "start ignored");
            return None;
        }
        let seeded = TimerRuntimeState::seeded(&self.entry, &self.sequence);
        if seeded.remaining_overall == 0 {
            debug!("start ignored: total duration is zero");
            return None;
        }
        self.simple_total = self.entry.to_duration_secs();
        self.state = TimerRuntimeState {
            status: TimerStatus::Running,
            ..seeded
        };
        let total_secs = self.total_secs();
        info!(mode = ?self.state.mode, total_secs, "timer started");
        Some(Event::TimerStarted {
            mode: self.state.mode,
            total_secs,
            step_count: self.state.plan.len(),
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state.status != TimerStatus::Running {
            debug!(status = ?self.state.status, "pause ignored");
            return None;
        }
        self.state.status = TimerStatus::Paused;
        info!(remaining = self.state.remaining_overall, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.state.remaining_overall,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state.status != TimerStatus::Paused {
            debug!(status = ?self.state.status, "resume ignored");
            return None;
        }
        self.state.status = TimerStatus::Running;
        info!(remaining = self.state.remaining_overall, "timer resumed");
        Some(Event::TimerResumed {
            remaining_secs: self.state.remaining_overall,
            at: Utc::now(),
        })
    }

    /// Back to `Idle` with counters seeded from the current entry/sequence.
    pub fn reset(&mut self) -> Option<Event> {
        self.reseed();
        info!(mode = ?self.state.mode, "timer reset");
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `StepAdvanced` or `TimerCompleted` on the tick where a counter
    /// crosses from 1 to 0; both ring the alarm.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state.status != TimerStatus::Running {
            return None;
        }
        match self.state.mode {
            TimerMode::Simple => self.tick_simple(),
            TimerMode::Sequential => self.tick_sequential(),
        }
    }

    // ── Setup edits ──────────────────────────────────────────────────

    /// Wrap-around adjust of one entry counter. Only while idle.
    pub fn adjust_entry(&mut self, field: EntryField, delta: i8) -> bool {
        if self.state.status != TimerStatus::Idle {
            debug!("entry adjust ignored while a timer is active");
            return false;
        }
        self.entry.adjust(field, delta);
        self.reseed();
        true
    }

    /// Replace the whole entry. Only while idle.
    pub fn set_entry(&mut self, entry: TimeEntry) -> bool {
        if self.state.status != TimerStatus::Idle {
            debug!("entry change ignored while a timer is active");
            return false;
        }
        self.entry = entry;
        self.reseed();
        true
    }

    pub fn append_step(&mut self, name: &str, duration_secs: u64) -> Option<StepId> {
        if self.is_running() {
            debug!("append ignored while running");
            return None;
        }
        let id = self.sequence.append(name, duration_secs)?;
        self.after_structural_change();
        Some(id)
    }

    /// Append the current entry's duration as a new step.
    pub fn append_entry_as_step(&mut self, name: &str) -> Option<StepId> {
        let secs = self.entry.to_duration_secs();
        self.append_step(name, secs)
    }

    pub fn remove_step(&mut self, id: StepId) -> Option<TimerStep> {
        if self.is_running() {
            debug!("remove ignored while running");
            return None;
        }
        let removed = self.sequence.remove(id)?;
        self.after_structural_change();
        Some(removed)
    }

    /// Swap in a new list of steps, e.g. from a preset.
    pub fn replace_sequence(&mut self, steps: Vec<TimerStep>) -> bool {
        if self.is_running() {
            debug!("sequence replace ignored while running");
            return false;
        }
        self.sequence.replace(steps);
        self.after_structural_change();
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reseed(&mut self) {
        self.state = TimerRuntimeState::seeded(&self.entry, &self.sequence);
        self.simple_total = self.entry.to_duration_secs();
    }

    // A paused run keeps its plan and the edit shows up at the next seed,
    // unless the edit flips the mode. Then the paused run is dropped.
    fn after_structural_change(&mut self) {
        let live_mode = if self.sequence.is_empty() {
            TimerMode::Simple
        } else {
            TimerMode::Sequential
        };
        match self.state.status {
            TimerStatus::Idle => self.reseed(),
            TimerStatus::Paused if self.state.mode != live_mode => {
                info!(from = ?self.state.mode, to = ?live_mode, "mode changed, paused run reset");
                self.reseed();
            }
            _ => {}
        }
    }

    fn tick_simple(&mut self) -> Option<Event> {
        self.state.remaining_overall = self.state.remaining_overall.saturating_sub(1);
        if self.state.remaining_overall > 0 {
            return None;
        }
        self.state.status = TimerStatus::Idle;
        info!("timer completed");
        Some(Event::TimerCompleted {
            mode: TimerMode::Simple,
            steps_completed: 0,
            at: Utc::now(),
        })
    }

    fn tick_sequential(&mut self) -> Option<Event> {
        let state = &mut self.state;
        state.remaining_overall = state.remaining_overall.saturating_sub(1);
        state.remaining_step = state.remaining_step.saturating_sub(1);
        if state.remaining_step > 0 {
            return None;
        }

        let from = state.active_step_index;
        let next = from + 1;
        if state.remaining_overall == 0 || next >= state.plan.len() {
            let steps_completed = state.plan.len();
            self.reseed();
            info!(steps_completed, "sequence completed");
            return Some(Event::TimerCompleted {
                mode: TimerMode::Sequential,
                steps_completed,
                at: Utc::now(),
            });
        }

        let step = &state.plan[next];
        state.active_step_index = next;
        state.remaining_step = step.duration_secs;
        info!(from, to = next, step = %step.name, "step advanced");
        Some(Event::StepAdvanced {
            from_step: from,
            to_step: next,
            step_name: step.name.clone(),
            duration_secs: step.duration_secs,
            at: Utc::now(),
        })
    }
}
