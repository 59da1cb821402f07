//! Preset persistence.
//!
//! The store contract is whole-collection: `load_all` once at startup and
//! `save_all` after every change.

use std::cell::RefCell;

use tracing::warn;

use super::Preset;
use crate::error::Result;
use crate::storage::Database;

/// Key under which the preset collection is stored.
pub const PRESETS_KEY: &str = "presets";

/// Durable home of the preset collection.
pub trait PresetStore {
    fn load_all(&self) -> Result<Vec<Preset>>;

    /// Overwrite the stored collection with `presets`.
    fn save_all(&self, presets: &[Preset]) -> Result<()>;
}

impl PresetStore for Database {
    /// A stored blob that fails to parse is treated as an empty collection.
    fn load_all(&self) -> Result<Vec<Preset>> {
        let Some(json) = self.kv_get(PRESETS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Preset>>(&json) {
            Ok(presets) => Ok(presets),
            Err(e) => {
                warn!("Stored presets are unreadable, starting empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// An empty collection removes the key instead of storing `[]`.
    fn save_all(&self, presets: &[Preset]) -> Result<()> {
        if presets.is_empty() {
            self.kv_delete(PRESETS_KEY)?;
            return Ok(());
        }
        let json = serde_json::to_string(presets)?;
        self.kv_set(PRESETS_KEY, &json)?;
        Ok(())
    }
}

/// Keeps presets in memory only, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryPresetStore {
    presets: RefCell<Vec<Preset>>,
    saves: RefCell<usize>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `save_all` has been called.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl PresetStore for MemoryPresetStore {
    fn load_all(&self) -> Result<Vec<Preset>> {
        Ok(self.presets.borrow().clone())
    }

    fn save_all(&self, presets: &[Preset]) -> Result<()> {
        *self.presets.borrow_mut() = presets.to_vec();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

impl<S: PresetStore + ?Sized> PresetStore for Box<S> {
    fn load_all(&self) -> Result<Vec<Preset>> {
        (**self).load_all()
    }

    fn save_all(&self, presets: &[Preset]) -> Result<()> {
        (**self).save_all(presets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::StepSequence;

    fn sample() -> Preset {
        let mut seq = StepSequence::new();
        seq.append("Work", 1500);
        seq.append("Rest", 300);
        Preset::snapshot("Pomodoro", &seq)
    }

    #[test]
    fn database_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_all().unwrap().is_empty());
        let preset = sample();
        db.save_all(std::slice::from_ref(&preset)).unwrap();
        assert_eq!(db.load_all().unwrap(), vec![preset]);
    }

    #[test]
    fn corrupt_blob_loads_as_empty() {
        let db = Database::open_memory().unwrap();
        db.kv_set(PRESETS_KEY, "{not json").unwrap();
        assert!(db.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_all_overwrites() {
        let db = Database::open_memory().unwrap();
        db.save_all(&[sample(), sample()]).unwrap();
        db.save_all(&[sample()]).unwrap();
        assert_eq!(db.load_all().unwrap().len(), 1);
    }

    #[test]
    fn saving_empty_collection_clears_key() {
        let db = Database::open_memory().unwrap();
        db.save_all(&[sample()]).unwrap();
        assert!(db.kv_get(PRESETS_KEY).unwrap().is_some());
        db.save_all(&[]).unwrap();
        assert!(db.kv_get(PRESETS_KEY).unwrap().is_none());
        assert!(db.load_all().unwrap().is_empty());
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemoryPresetStore::new();
        store.save_all(&[sample()]).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
