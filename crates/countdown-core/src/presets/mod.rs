//! Saved step sequences.
//!
//! A [`Preset`] is a deep copy of a [`StepSequence`] taken at save time;
//! editing the live sequence afterwards never touches it.

mod store;

pub use store::{MemoryPresetStore, PresetStore, PRESETS_KEY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::timer::{StepSequence, TimerStep};

pub type PresetId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    pub steps: Vec<TimerStep>,
    pub created_at: DateTime<Utc>,
}

impl Preset {
    /// Copy the current steps of `sequence` into a new preset.
    pub fn snapshot(name: &str, sequence: &StepSequence) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            steps: sequence.steps().to_vec(),
            created_at: Utc::now(),
        }
    }

    pub fn total_duration(&self) -> u64 {
        self.steps
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.duration_secs))
    }
}

/// In-memory preset collection backed by a [`PresetStore`].
///
/// Loaded once on open. Every add or delete rewrites the whole collection.
/// Store failures are logged and the in-memory collection stays
/// authoritative for the rest of the session.
pub struct PresetLibrary<S = Box<dyn PresetStore>> {
    store: S,
    presets: Vec<Preset>,
}

impl<S: PresetStore> PresetLibrary<S> {
    pub fn open(store: S) -> Self {
        let presets = match store.load_all() {
            Ok(presets) => presets,
            Err(e) => {
                warn!("Failed to load presets, starting empty: {}", e);
                Vec::new()
            }
        };
        info!(count = presets.len(), "presets loaded");
        Self { store, presets }
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn get(&self, id: PresetId) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// First preset whose name matches, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save `sequence` as a new preset. Empty sequences are rejected.
    ///
    /// A blank name becomes `"Preset {n}"`.
    pub fn save_current(&mut self, name: &str, sequence: &StepSequence) -> Option<Preset> {
        if sequence.is_empty() {
            warn!("Refusing to save an empty sequence as a preset");
            return None;
        }
        let name = match name.trim() {
            "" => format!("Preset {}", self.presets.len() + 1),
            trimmed => trimmed.to_string(),
        };
        let preset = Preset::snapshot(&name, sequence);
        self.presets.push(preset.clone());
        self.persist();
        info!(id = %preset.id, name = %preset.name, "preset saved");
        Some(preset)
    }

    /// Remove a preset. Unknown ids change nothing and write nothing.
    pub fn delete(&mut self, id: PresetId) -> Option<Preset> {
        let pos = self.presets.iter().position(|p| p.id == id)?;
        let removed = self.presets.remove(pos);
        self.persist();
        info!(id = %removed.id, name = %removed.name, "preset deleted");
        Some(removed)
    }

    fn persist(&self) {
        if let Err(e) = self.store.save_all(&self.presets) {
            warn!("Failed to save presets: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, Result};

    fn two_steps() -> StepSequence {
        let mut seq = StepSequence::new();
        seq.append("A", 3);
        seq.append("B", 2);
        seq
    }

    #[test]
    fn save_rejects_empty_sequence() {
        let mut lib = PresetLibrary::open(MemoryPresetStore::new());
        assert!(lib.save_current("Nothing", &StepSequence::new()).is_none());
        assert!(lib.is_empty());
        assert_eq!(lib.store().save_count(), 0);
    }

    #[test]
    fn save_writes_whole_collection() {
        let mut lib = PresetLibrary::open(MemoryPresetStore::new());
        lib.save_current("One", &two_steps()).unwrap();
        lib.save_current("", &two_steps()).unwrap();
        assert_eq!(lib.list()[1].name, "Preset 2");
        assert_eq!(lib.store().save_count(), 2);
        assert_eq!(lib.store().load_all().unwrap().len(), 2);
    }

    #[test]
    fn snapshot_is_independent_of_live_sequence() {
        let mut lib = PresetLibrary::open(MemoryPresetStore::new());
        let mut seq = two_steps();
        let saved = lib.save_current("Intervals", &seq).unwrap();
        seq.append("C", 10);
        let first = seq.get(0).unwrap().id;
        seq.remove(first);
        let stored = lib.get(saved.id).unwrap();
        assert_eq!(stored.steps.len(), 2);
        assert_eq!(stored.steps[0].name, "A");
        assert_eq!(stored.total_duration(), 5);
    }

    #[test]
    fn delete_unknown_is_noop() {
        let mut lib = PresetLibrary::open(MemoryPresetStore::new());
        lib.save_current("Keep", &two_steps()).unwrap();
        let before = lib.list().to_vec();
        assert!(lib.delete(Uuid::new_v4()).is_none());
        assert_eq!(lib.list(), before.as_slice());
        assert_eq!(lib.store().save_count(), 1);
    }

    #[test]
    fn delete_removes_and_persists() {
        let mut lib = PresetLibrary::open(MemoryPresetStore::new());
        let p = lib.save_current("Gone", &two_steps()).unwrap();
        assert!(lib.delete(p.id).is_some());
        assert!(lib.is_empty());
        assert!(lib.store().load_all().unwrap().is_empty());
    }

    #[test]
    fn find_by_name_ignores_case() {
        let mut lib = PresetLibrary::open(MemoryPresetStore::new());
        lib.save_current("Tabata", &two_steps()).unwrap();
        assert!(lib.find_by_name(" tabata ").is_some());
        assert!(lib.find_by_name("hiit").is_none());
    }

    struct BrokenStore;

    impl PresetStore for BrokenStore {
        fn load_all(&self) -> Result<Vec<Preset>> {
            Err(CoreError::Custom("disk gone".into()))
        }

        fn save_all(&self, _presets: &[Preset]) -> Result<()> {
            Err(CoreError::Custom("disk gone".into()))
        }
    }

    #[test]
    fn store_failures_are_not_fatal() {
        let mut lib = PresetLibrary::open(BrokenStore);
        assert!(lib.is_empty());
        let saved = lib.save_current("Still here", &two_steps()).unwrap();
        assert!(lib.get(saved.id).is_some());
    }
}
