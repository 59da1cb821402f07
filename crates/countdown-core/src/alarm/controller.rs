use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::sink::AlarmSink;
use crate::events::{AlarmStopReason, Event};

/// Time after which a sounding alarm silences itself.
pub const DEFAULT_AUTO_STOP: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Silent,
    Sounding { deadline: Instant },
}

/// Starts, restarts and silences the alarm sink, and owns the auto-stop
/// deadline.
///
/// The controller does not sleep. The caller passes `now` into `trigger`
/// and `poll`, and waits on [`AlarmController::deadline`] itself.
pub struct AlarmController<S = Box<dyn AlarmSink>> {
    sink: S,
    state: AlarmState,
    auto_stop: Duration,
    trigger_count: u64,
}

impl<S: AlarmSink> AlarmController<S> {
    pub fn new(sink: S) -> Self {
        Self::with_auto_stop(sink, DEFAULT_AUTO_STOP)
    }

    pub fn with_auto_stop(sink: S, auto_stop: Duration) -> Self {
        Self {
            sink,
            state: AlarmState::Silent,
            auto_stop,
            trigger_count: 0,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, AlarmState::Sounding { .. })
    }

    /// When the current alarm will stop on its own.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            AlarmState::Silent => None,
            AlarmState::Sounding { deadline } => Some(deadline),
        }
    }

    /// Total triggers since creation.
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    pub fn auto_stop(&self) -> Duration {
        self.auto_stop
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Ring the alarm. A sounding alarm restarts from the top with a fresh
    /// deadline.
    ///
    /// Sink failures are logged; the controller still counts itself as
    /// sounding so the rest of the timer behaves the same.
    pub fn trigger(&mut self, now: Instant) -> Event {
        self.trigger_count += 1;
        let deadline = now + self.auto_stop;
        let restarted = self.is_sounding();
        let played = if restarted {
            self.sink.restart_from_beginning()
        } else {
            self.sink.play_looping()
        };
        if let Err(e) = played {
            warn!("Alarm playback failed: {}", e);
        }
        self.state = AlarmState::Sounding { deadline };

        if restarted {
            info!("alarm restarted");
            Event::AlarmRestarted { at: Utc::now() }
        } else {
            info!(auto_stop_secs = self.auto_stop.as_secs(), "alarm started");
            Event::AlarmStarted { at: Utc::now() }
        }
    }

    /// Silence the alarm. Returns `None` when it was already silent.
    pub fn stop(&mut self, reason: AlarmStopReason) -> Option<Event> {
        if !self.is_sounding() {
            debug!(?reason, "alarm already silent");
            return None;
        }
        self.sink.stop_playing();
        self.state = AlarmState::Silent;
        info!(?reason, "alarm stopped");
        Some(Event::AlarmStopped {
            reason,
            at: Utc::now(),
        })
    }

    /// Fire the auto-stop if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Event> {
        match self.state {
            AlarmState::Sounding { deadline } if now >= deadline => {
                self.stop(AlarmStopReason::AutoStop)
            }
            _ => None,
        }
    }
}
