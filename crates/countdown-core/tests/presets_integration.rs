//! Integration tests for preset persistence in the SQLite store.

use countdown_core::alarm::{AlarmController, SilentSink};
use countdown_core::presets::PRESETS_KEY;
use countdown_core::{
    CountdownEngine, Database, Event, PresetLibrary, PresetStore, TimerMode, TimerSession,
};

fn open_session(db: Database) -> TimerSession<SilentSink, Database> {
    TimerSession::new(
        CountdownEngine::new(),
        AlarmController::new(SilentSink),
        PresetLibrary::open(db),
    )
}

#[test]
fn test_presets_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("countdown.db");

    let preset_id = {
        let mut session = open_session(Database::open_at(&path).unwrap());
        session.append_step("Warm up", 60);
        session.append_step("Sprint", 30);
        session.append_step("Cool down", 90);
        match session.save_preset("Track") {
            Some(Event::PresetSaved {
                preset_id,
                step_count,
                ..
            }) => {
                assert_eq!(step_count, 3);
                preset_id
            }
            other => panic!("Expected PresetSaved, got {other:?}"),
        }
    };

    let mut session = open_session(Database::open_at(&path).unwrap());
    assert_eq!(session.presets().len(), 1);
    let stored = session.presets().get(preset_id).unwrap();
    let names: Vec<&str> = stored.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Warm up", "Sprint", "Cool down"]);
    assert_eq!(stored.total_duration(), 180);

    assert!(session.load_preset(preset_id).is_some());
    assert_eq!(session.engine().mode(), TimerMode::Sequential);
    assert_eq!(session.engine().remaining_overall(), 180);
}

#[test]
fn test_delete_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("countdown.db");

    {
        let mut session = open_session(Database::open_at(&path).unwrap());
        session.append_step("Only", 5);
        let keep = session.save_preset("Keep");
        let Some(Event::PresetSaved { preset_id, .. }) = session.save_preset("Drop") else {
            panic!("preset not saved");
        };
        assert!(keep.is_some());
        assert!(session.delete_preset(preset_id).is_some());
        assert!(session.delete_preset(preset_id).is_none());
    }

    let db = Database::open_at(&path).unwrap();
    let presets = db.load_all().unwrap();
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, "Keep");
}

#[test]
fn test_corrupt_collection_starts_empty() {
    let db = Database::open_memory().unwrap();
    db.kv_set(PRESETS_KEY, "[{\"id\": 3}]").unwrap();
    let mut session = open_session(db);
    assert!(session.presets().is_empty());

    session.append_step("Fresh", 10);
    assert!(session.save_preset("Fresh start").is_some());
    assert_eq!(session.presets().store().load_all().unwrap().len(), 1);
}
