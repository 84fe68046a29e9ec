use certifact_client::models::result::{AnalysisResult, Verdict};
use certifact_client::services::history::HistoryStore;
use chrono::{TimeZone, Utc};

fn result(id: &str, confidence: f64) -> AnalysisResult {
    AnalysisResult {
        id: id.to_string(),
        label: Verdict::Real,
        confidence,
        filename: Some("clip.mp4".to_string()),
        file_url: Some(format!("/uploads/{id}.mp4")),
        thumbnail_url: None,
        timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn missing_file_initializes_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::load(dir.path().join("history.json"));
    assert!(store.is_empty());
}

/// A malformed persisted payload recovers to an empty history without
/// raising to the caller.
#[test]
fn corrupt_payload_initializes_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "not json {{{").unwrap();

    let store = HistoryStore::load(&path);
    assert!(store.is_empty());
}

#[test]
fn wrong_shape_payload_initializes_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, r#"{"unexpected": "object"}"#).unwrap();

    let store = HistoryStore::load(&path);
    assert!(store.is_empty());
}

#[test]
fn add_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let store = HistoryStore::load(&path);
    assert!(store.add(result("r1", 0.92)));
    drop(store);

    let reloaded = HistoryStore::load(&path);
    let entries = reloaded.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "r1");
    assert_eq!(entries[0].label, Verdict::Real);
}

#[test]
fn most_recent_entry_is_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::load(dir.path().join("history.json"));

    store.add(result("r1", 0.9));
    store.add(result("r2", 0.8));
    store.add(result("r3", 0.7));

    let ids: Vec<String> = store.list().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec!["r3", "r2", "r1"]);
}

#[test]
fn re_adding_an_id_changes_neither_content_nor_position() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::load(dir.path().join("history.json"));

    assert!(store.add(result("r1", 0.92)));
    assert!(store.add(result("r2", 0.50)));
    // Re-add r1 with different content; the original entry must win.
    assert!(!store.add(result("r1", 0.11)));

    let entries = store.list();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "r2");
    assert_eq!(entries[1].id, "r1");
    assert!((entries[1].confidence - 0.92).abs() < 1e-9);
}

#[test]
fn persisted_file_is_most_recent_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let store = HistoryStore::load(&path);

    store.add(result("old", 0.6));
    store.add(result("new", 0.7));

    let payload = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&payload).unwrap();
    assert_eq!(parsed[0]["_id"], "new");
    assert_eq!(parsed[1]["_id"], "old");
}
