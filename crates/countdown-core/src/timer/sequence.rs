use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a [`TimerStep`].
pub type StepId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStep {
    pub id: StepId,
    pub name: String,
    /// Duration in seconds, always at least 1.
    pub duration_secs: u64,
}

impl TimerStep {
    fn new(name: String, duration_secs: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            duration_secs,
        }
    }
}

/// Ordered list of named steps; insertion order is execution order.
///
/// An empty sequence means the engine runs in simple mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSequence {
    steps: Vec<TimerStep>,
}

impl StepSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Zero durations, and durations that would push the
    /// total past `u64::MAX` seconds, are ignored.
    ///
    /// A blank name becomes `"Step {n}"`, `n` being the new step's position.
    /// Returns the id of the appended step.
    pub fn append(&mut self, name: &str, duration_secs: u64) -> Option<StepId> {
        if duration_secs == 0 {
            return None;
        }
        self.total_duration().checked_add(duration_secs)?;
        let name = match name.trim() {
            "" => format!("Step {}", self.steps.len() + 1),
            trimmed => trimmed.to_string(),
        };
        let step = TimerStep::new(name, duration_secs);
        let id = step.id;
        self.steps.push(step);
        Some(id)
    }

    /// Remove a step by id. Returns the removed step, if it was present.
    pub fn remove(&mut self, id: StepId) -> Option<TimerStep> {
        let pos = self.steps.iter().position(|s| s.id == id)?;
        Some(self.steps.remove(pos))
    }

    /// Replace every step at once, dropping zero-length entries and any
    /// step that would overflow the total.
    pub fn replace(&mut self, steps: Vec<TimerStep>) {
        let mut total = 0u64;
        self.steps = steps
            .into_iter()
            .filter(|s| {
                if s.duration_secs == 0 {
                    return false;
                }
                match total.checked_add(s.duration_secs) {
                    Some(t) => {
                        total = t;
                        true
                    }
                    None => false,
                }
            })
            .collect();
    }

    /// Sum of all step durations. `append` and `replace` keep it in range.
    pub fn total_duration(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_secs).sum()
    }

    pub fn get(&self, index: usize) -> Option<&TimerStep> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimerStep> {
        self.steps.iter()
    }

    pub fn steps(&self) -> &[TimerStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_default_names() {
        let mut seq = StepSequence::new();
        seq.append("", 30);
        seq.append("Rest", 10);
        seq.append("   ", 5);
        let names: Vec<_> = seq.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Step 1", "Rest", "Step 3"]);
    }

    #[test]
    fn append_ignores_zero_duration() {
        let mut seq = StepSequence::new();
        assert!(seq.append("Nothing", 0).is_none());
        assert!(seq.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut seq = StepSequence::new();
        let a = seq.append("A", 1).unwrap();
        let b = seq.append("A", 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn remove_by_id() {
        let mut seq = StepSequence::new();
        let a = seq.append("A", 3).unwrap();
        seq.append("B", 2);
        assert_eq!(seq.remove(a).map(|s| s.name), Some("A".to_string()));
        assert_eq!(seq.len(), 1);
        assert!(seq.remove(a).is_none());
    }

    #[test]
    fn total_duration() {
        let mut seq = StepSequence::new();
        assert_eq!(seq.total_duration(), 0);
        seq.append("A", 3);
        seq.append("B", 2);
        assert_eq!(seq.total_duration(), 5);
    }

    #[test]
    fn append_refuses_overflowing_total() {
        let mut seq = StepSequence::new();
        seq.append("Long", u64::MAX - 1);
        assert!(seq.append("Tick", 1).is_some());
        assert!(seq.append("Over", 1).is_none());
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.total_duration(), u64::MAX);
    }

    #[test]
    fn replace_drops_zero_and_overflowing_steps() {
        let steps = vec![
            TimerStep::new("A".into(), u64::MAX),
            TimerStep::new("B".into(), 10),
            TimerStep::new("Zero".into(), 0),
        ];

        let mut seq = StepSequence::new();
        seq.replace(steps);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.get(0).unwrap().name, "A");
    }
}
