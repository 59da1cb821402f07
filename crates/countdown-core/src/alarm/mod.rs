//! Audible alert for step and timer completions.

mod controller;
mod sink;

pub use controller::{AlarmController, AlarmState, DEFAULT_AUTO_STOP};
#[cfg(feature = "tone")]
pub use sink::ToneSink;
pub use sink::{sink_for, AlarmSink, AlarmSound, BellSink, SilentSink};
