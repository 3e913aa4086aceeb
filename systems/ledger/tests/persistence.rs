use std::fs;

use stream_siege_core::{Command, Event, GameMode, ViewerId, ViewerLedger};
use stream_siege_ledger::{LedgerError, MemoryLedger};

#[test]
fn save_round_trip_preserves_progress_and_viewers() {
    let directory = tempfile::tempdir().expect("temp dir");
    let mut ledger = MemoryLedger::new();
    let alice = ViewerId::new("alice");
    ledger.record_summon(&alice, "Alice");
    ledger.credit(&alice, 120);
    ledger.update_best_level(&alice, 5, 12);
    ledger.record_grant(&Command::GrantMembership {
        viewer: alice.clone(),
    });
    ledger.observe(&[Event::WaveCleared {
        wave: 2,
        bonus_xp: 30,
    }]);

    let path = ledger
        .save(directory.path(), GameMode::YouTube)
        .expect("save succeeds");
    assert!(path.ends_with("youtube.json"));

    let restored = MemoryLedger::load(directory.path(), GameMode::YouTube).expect("load succeeds");
    assert_eq!(restored, ledger);
    assert_eq!(restored.progress(), (3, 0));
    let entry = restored.entry(&alice).expect("viewer entry");
    assert_eq!(entry.name, "Alice");
    assert!(entry.stats.is_member);
    assert_eq!(entry.stats.best_level, 5);
}

#[test]
fn saves_are_kept_per_mode() {
    let directory = tempfile::tempdir().expect("temp dir");
    let mut ledger = MemoryLedger::new();
    ledger.credit(&ViewerId::new("erin"), 10);
    let _ = ledger
        .save(directory.path(), GameMode::TikTok)
        .expect("save succeeds");

    let other = MemoryLedger::load_or_default(directory.path(), GameMode::YouTube);
    assert_eq!(other, MemoryLedger::new());
    let same = MemoryLedger::load_or_default(directory.path(), GameMode::TikTok);
    assert_eq!(same.score(&ViewerId::new("erin")), 10);
}

#[test]
fn corrupt_save_falls_back_to_defaults() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = MemoryLedger::save_path(directory.path(), GameMode::Offline);
    fs::write(&path, b"{ not json").expect("write corrupt save");

    assert!(matches!(
        MemoryLedger::load(directory.path(), GameMode::Offline),
        Err(LedgerError::Parse { .. })
    ));
    assert_eq!(
        MemoryLedger::load_or_default(directory.path(), GameMode::Offline),
        MemoryLedger::new()
    );
}

#[test]
fn unknown_version_is_rejected() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = MemoryLedger::save_path(directory.path(), GameMode::Offline);
    fs::write(
        &path,
        br#"{"version": 99, "wave_index": 4, "total_kills": 2, "viewers": {}}"#,
    )
    .expect("write save");

    assert!(matches!(
        MemoryLedger::load(directory.path(), GameMode::Offline),
        Err(LedgerError::UnsupportedVersion { found: 99, .. })
    ));
}

#[test]
fn deleting_a_missing_save_succeeds() {
    let directory = tempfile::tempdir().expect("temp dir");
    MemoryLedger::delete_save(directory.path(), GameMode::YouTube).expect("missing save is fine");

    let _ = MemoryLedger::new()
        .save(directory.path(), GameMode::YouTube)
        .expect("save succeeds");
    MemoryLedger::delete_save(directory.path(), GameMode::YouTube).expect("delete succeeds");
    assert!(!MemoryLedger::save_path(directory.path(), GameMode::YouTube).exists());
}
