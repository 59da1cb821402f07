mod engine;
mod entry;
mod sequence;

pub use engine::{CountdownEngine, TimerMode, TimerRuntimeState, TimerStatus};
pub use entry::{format_hms, EntryField, TimeEntry};
pub use sequence::{StepId, StepSequence, TimerStep};
