//! The engine, its alarm and the preset library, wired together.
//!
//! Every command returns the events it produced, in order. Completion
//! events from the engine ring the alarm here; a reset silences it.

use chrono::Utc;
use tokio::time::Instant;
use tracing::debug;

use crate::alarm::{AlarmController, AlarmSink};
use crate::events::{AlarmStopReason, Event};
use crate::presets::{PresetId, PresetLibrary, PresetStore};
use crate::timer::{CountdownEngine, EntryField, StepId, TimeEntry, TimerStep};

pub struct TimerSession<A = Box<dyn AlarmSink>, P = Box<dyn PresetStore>> {
    engine: CountdownEngine,
    alarm: AlarmController<A>,
    presets: PresetLibrary<P>,
}

impl<A: AlarmSink, P: PresetStore> TimerSession<A, P> {
    pub fn new(
        engine: CountdownEngine,
        alarm: AlarmController<A>,
        presets: PresetLibrary<P>,
    ) -> Self {
        Self {
            engine,
            alarm,
            presets,
        }
    }

    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    pub fn alarm(&self) -> &AlarmController<A> {
        &self.alarm
    }

    pub fn presets(&self) -> &PresetLibrary<P> {
        &self.presets
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        self.engine.start().into_iter().collect()
    }

    pub fn pause(&mut self) -> Vec<Event> {
        self.engine.pause().into_iter().collect()
    }

    pub fn resume(&mut self) -> Vec<Event> {
        self.engine.resume().into_iter().collect()
    }

    /// Reset the engine and silence any sounding alarm.
    pub fn reset(&mut self) -> Vec<Event> {
        let mut events: Vec<Event> = self.engine.reset().into_iter().collect();
        events.extend(self.alarm.stop(AlarmStopReason::Reset));
        events
    }

    /// One elapsed tick. Step and timer completions ring the alarm.
    pub fn tick(&mut self, now: Instant) -> Vec<Event> {
        let Some(event) = self.engine.tick() else {
            return Vec::new();
        };
        let ring = event.triggers_alarm();
        let mut events = vec![event];
        if ring {
            events.push(self.alarm.trigger(now));
        }
        events
    }

    /// Fire the alarm's auto-stop if it is due.
    pub fn poll_alarm(&mut self, now: Instant) -> Vec<Event> {
        self.alarm.poll(now).into_iter().collect()
    }

    pub fn stop_alarm(&mut self) -> Vec<Event> {
        self.alarm.stop(AlarmStopReason::Dismissed).into_iter().collect()
    }

    /// Release the alarm output.
    pub fn shutdown(&mut self) -> Vec<Event> {
        self.alarm.stop(AlarmStopReason::Shutdown).into_iter().collect()
    }

    // ── Setup edits ──────────────────────────────────────────────────

    pub fn adjust_entry(&mut self, field: EntryField, delta: i8) -> bool {
        self.engine.adjust_entry(field, delta)
    }

    pub fn set_entry(&mut self, entry: TimeEntry) -> bool {
        self.engine.set_entry(entry)
    }

    pub fn append_step(&mut self, name: &str, duration_secs: u64) -> Option<StepId> {
        self.engine.append_step(name, duration_secs)
    }

    pub fn append_entry_as_step(&mut self, name: &str) -> Option<StepId> {
        self.engine.append_entry_as_step(name)
    }

    pub fn remove_step(&mut self, id: StepId) -> Option<TimerStep> {
        self.engine.remove_step(id)
    }

    // ── Presets ──────────────────────────────────────────────────────

    /// Save the live sequence under `name`. Empty sequences are rejected.
    pub fn save_preset(&mut self, name: &str) -> Option<Event> {
        let preset = self.presets.save_current(name, self.engine.sequence())?;
        Some(Event::PresetSaved {
            preset_id: preset.id,
            name: preset.name,
            step_count: preset.steps.len(),
            at: Utc::now(),
        })
    }

    pub fn delete_preset(&mut self, id: PresetId) -> Option<Event> {
        let removed = self.presets.delete(id)?;
        Some(Event::PresetDeleted {
            preset_id: removed.id,
            at: Utc::now(),
        })
    }

    /// Replace the live sequence with a copy of the preset's steps.
    /// Not allowed while running.
    pub fn load_preset(&mut self, id: PresetId) -> Option<Event> {
        if self.engine.is_running() {
            debug!("preset load ignored while running");
            return None;
        }
        let preset = self.presets.get(id)?;
        let (name, steps) = (preset.name.clone(), preset.steps.clone());
        if !self.engine.replace_sequence(steps) {
            return None;
        }
        Some(Event::PresetLoaded {
            preset_id: id,
            name,
            at: Utc::now(),
        })
    }

    // ── Read-out ─────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Event {
        let state = self.engine.state();
        Event::StateSnapshot {
            mode: state.mode,
            status: state.status,
            remaining_overall_secs: state.remaining_overall,
            remaining_step_secs: state.remaining_step,
            active_step_index: state.active_step_index,
            step_name: self.engine.current_step().map(|s| s.name.clone()),
            total_secs: self.engine.total_secs(),
            alarm_sounding: self.alarm.is_sounding(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::SilentSink;
    use crate::presets::MemoryPresetStore;
    use crate::timer::{StepSequence, TimerMode, TimerStatus};

    type TestSession = TimerSession<SilentSink, MemoryPresetStore>;

    fn session(engine: CountdownEngine) -> TestSession {
        TimerSession::new(
            engine,
            AlarmController::new(SilentSink),
            PresetLibrary::open(MemoryPresetStore::new()),
        )
    }

    fn run_to_idle(session: &mut TestSession) -> usize {
        let now = Instant::now();
        let mut alarms = 0;
        while session.engine().is_running() {
            alarms += session
                .tick(now)
                .iter()
                .filter(|e| matches!(e, Event::AlarmStarted { .. } | Event::AlarmRestarted { .. }))
                .count();
        }
        alarms
    }

    #[test]
    fn completion_rings_alarm_once() {
        let mut s = session(CountdownEngine::with_setup(
            TimeEntry::new(0, 0, 3).unwrap(),
            StepSequence::new(),
        ));
        s.start();
        assert_eq!(run_to_idle(&mut s), 1);
        assert!(s.alarm().is_sounding());
        assert_eq!(s.alarm().trigger_count(), 1);
    }

    #[test]
    fn every_step_boundary_rings() {
        let mut s = session(CountdownEngine::new());
        s.append_step("A", 2);
        s.append_step("B", 1);
        s.append_step("C", 3);
        s.start();
        assert_eq!(run_to_idle(&mut s), 3);
        assert_eq!(s.engine().remaining_overall(), 6);
    }

    #[test]
    fn reset_silences_alarm() {
        let mut s = session(CountdownEngine::with_setup(
            TimeEntry::new(0, 0, 1).unwrap(),
            StepSequence::new(),
        ));
        s.start();
        s.tick(Instant::now());
        assert!(s.alarm().is_sounding());
        let events = s.reset();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::AlarmStopped {
                reason: AlarmStopReason::Reset,
                ..
            }
        )));
        assert!(!s.alarm().is_sounding());
        assert_eq!(s.engine().remaining_overall(), 1);
    }

    #[test]
    fn load_preset_replaces_sequence() {
        let mut s = session(CountdownEngine::new());
        s.append_step("Work", 20);
        s.append_step("Rest", 10);
        let Some(Event::PresetSaved { preset_id, .. }) = s.save_preset("Intervals") else {
            panic!("preset not saved");
        };
        let first = s.engine().sequence().get(0).unwrap().id;
        s.remove_step(first);
        assert_eq!(s.engine().sequence().len(), 1);

        assert!(s.load_preset(preset_id).is_some());
        assert_eq!(s.engine().sequence().len(), 2);
        assert_eq!(s.engine().mode(), TimerMode::Sequential);
        assert_eq!(s.engine().remaining_overall(), 30);
    }

    #[test]
    fn load_preset_refused_while_running() {
        let mut s = session(CountdownEngine::new());
        s.append_step("Work", 20);
        let Some(Event::PresetSaved { preset_id, .. }) = s.save_preset("One") else {
            panic!("preset not saved");
        };
        s.start();
        assert!(s.load_preset(preset_id).is_none());
        s.pause();
        assert!(s.load_preset(preset_id).is_some());
        assert_eq!(s.engine().status(), TimerStatus::Paused);
    }

    #[test]
    fn load_preset_while_paused_switches_to_sequential() {
        let mut s = session(CountdownEngine::with_setup(
            TimeEntry::new(0, 0, 30).unwrap(),
            StepSequence::new(),
        ));
        let id = s.append_step("Work", 20).unwrap();
        let Some(Event::PresetSaved { preset_id, .. }) = s.save_preset("One") else {
            panic!("preset not saved");
        };
        s.remove_step(id);
        assert_eq!(s.engine().mode(), TimerMode::Simple);

        s.start();
        s.tick(Instant::now());
        s.pause();
        assert!(s.load_preset(preset_id).is_some());
        assert_eq!(s.engine().mode(), TimerMode::Sequential);
        assert_eq!(s.engine().status(), TimerStatus::Idle);
        assert_eq!(s.engine().remaining_overall(), 20);
        assert_eq!(s.engine().remaining_step(), 20);
    }

    #[test]
    fn save_preset_rejects_empty_sequence() {
        let mut s = session(CountdownEngine::new());
        assert!(s.save_preset("Empty").is_none());
        assert!(s.presets().is_empty());
    }

    #[test]
    fn snapshot_reports_current_step() {
        let mut s = session(CountdownEngine::new());
        s.append_step("Warm up", 5);
        match s.snapshot() {
            Event::StateSnapshot {
                mode,
                status,
                remaining_overall_secs,
                step_name,
                alarm_sounding,
                ..
            } => {
                assert_eq!(mode, TimerMode::Sequential);
                assert_eq!(status, TimerStatus::Idle);
                assert_eq!(remaining_overall_secs, 5);
                assert_eq!(step_name.as_deref(), Some("Warm up"));
                assert!(!alarm_sounding);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
