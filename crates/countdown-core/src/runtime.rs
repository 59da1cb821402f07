//! Single-task driver for a [`TimerSession`].
//!
//! [`TimerRuntime::run`] is one future that selects over user commands, the
//! tick interval and the alarm's auto-stop deadline. Only one branch runs at
//! a time, so commands and ticks never interleave. Run it on a
//! current-thread runtime (or join it with its caller); it does not need to
//! be `Send`.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::alarm::AlarmSink;
use crate::events::Event;
use crate::presets::{PresetId, PresetStore};
use crate::session::TimerSession;
use crate::timer::{EntryField, StepId, TimeEntry};

const EVENT_CAPACITY: usize = 256;

/// User commands, serialized onto the runtime task.
#[derive(Debug)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Reset,
    StopAlarm,
    AdjustEntry { field: EntryField, delta: i8 },
    SetEntry(TimeEntry),
    AppendStep { name: String, duration_secs: u64 },
    AppendEntryAsStep { name: String },
    RemoveStep(StepId),
    SavePreset { name: String },
    DeletePreset(PresetId),
    LoadPreset(PresetId),
    /// Reply with a `StateSnapshot`.
    Snapshot(oneshot::Sender<Event>),
    Shutdown,
}

/// The periodic tick source.
///
/// Arming always replaces the previous interval, so two tick streams can
/// never overlap. A disarmed ticker never completes.
pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Start a fresh interval whose first tick is one period from now.
    pub fn arm(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => std::future::pending().await,
        }
    }
}

async fn alarm_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub struct TimerRuntime<A = Box<dyn AlarmSink>, P = Box<dyn PresetStore>> {
    session: TimerSession<A, P>,
    ticker: Ticker,
    events: broadcast::Sender<Event>,
}

impl<A: AlarmSink, P: PresetStore> TimerRuntime<A, P> {
    pub fn new(session: TimerSession<A, P>, tick_period: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session,
            ticker: Ticker::new(tick_period),
            events,
        }
    }

    /// Receive every event the runtime produces from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &TimerSession<A, P> {
        &self.session
    }

    /// Drive the session until `Shutdown` arrives or every command sender is
    /// dropped. The alarm is released before the session is handed back.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> TimerSession<A, P> {
        info!("timer runtime started");
        loop {
            let deadline = self.session.alarm().deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                now = self.ticker.tick() => {
                    let events = self.session.tick(now);
                    self.publish(events);
                    self.publish([self.session.snapshot()]);
                }
                _ = alarm_deadline(deadline) => {
                    let events = self.session.poll_alarm(Instant::now());
                    self.publish(events);
                }
            }
            self.sync_ticker();
        }

        self.ticker.disarm();
        let events = self.session.shutdown();
        self.publish(events);
        info!("timer runtime stopped");
        self.session
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "command");
        let session = &mut self.session;
        let events = match command {
            Command::Start => session.start(),
            Command::Pause => session.pause(),
            Command::Resume => session.resume(),
            Command::Reset => session.reset(),
            Command::StopAlarm => session.stop_alarm(),
            Command::AdjustEntry { field, delta } => {
                session.adjust_entry(field, delta);
                vec![session.snapshot()]
            }
            Command::SetEntry(entry) => {
                session.set_entry(entry);
                vec![session.snapshot()]
            }
            Command::AppendStep {
                name,
                duration_secs,
            } => {
                session.append_step(&name, duration_secs);
                vec![session.snapshot()]
            }
            Command::AppendEntryAsStep { name } => {
                session.append_entry_as_step(&name);
                vec![session.snapshot()]
            }
            Command::RemoveStep(id) => {
                session.remove_step(id);
                vec![session.snapshot()]
            }
            Command::SavePreset { name } => session.save_preset(&name).into_iter().collect(),
            Command::DeletePreset(id) => session.delete_preset(id).into_iter().collect(),
            Command::LoadPreset(id) => session.load_preset(id).into_iter().collect(),
            Command::Snapshot(reply) => {
                if reply.send(session.snapshot()).is_err() {
                    debug!("snapshot requester went away");
                }
                Vec::new()
            }
            Command::Shutdown => Vec::new(),
        };
        self.publish(events);
    }

    // Ticks flow only while the engine is running.
    fn sync_ticker(&mut self) {
        match (self.session.engine().is_running(), self.ticker.is_armed()) {
            (true, false) => self.ticker.arm(),
            (false, true) => self.ticker.disarm(),
            _ => {}
        }
    }

    fn publish(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            if self.events.send(event).is_err() {
                debug!("no event subscribers");
            }
        }
    }
}
