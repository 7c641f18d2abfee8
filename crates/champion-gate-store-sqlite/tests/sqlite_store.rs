// crates/champion-gate-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Integrity Tests
// Description: Integration tests for the SQLite run store and completion cache.
// Purpose: Validate path safety, schema versioning, tag queries, integrity
//          checks, and reopen durability.
// ============================================================================

//! ## Overview
//! Integration tests for `SQLite` store invariants:
//! - Path safety checks (empty/component/directory rejection)
//! - Schema version validation
//! - Tag-equality queries honoring scope, status, and limits
//! - Hash verification on load (fail closed)
//! - Completion cache idempotency and persistence across reopen

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use champion_gate_core::BenchmarkContext;
use champion_gate_core::Champion;
use champion_gate_core::CompletionCache;
use champion_gate_core::CompletionLookup;
use champion_gate_core::EntityId;
use champion_gate_core::FingerprintPolicy;
use champion_gate_core::IdempotencyGate;
use champion_gate_core::MetricValue;
use champion_gate_core::NonFiniteMetric;
use champion_gate_core::RunId;
use champion_gate_core::RunStore;
use champion_gate_core::RunStoreAdapter;
use champion_gate_core::SchemaGeneration;
use champion_gate_core::ScopeId;
use champion_gate_core::SharedRunStore;
use champion_gate_core::StoreError;
use champion_gate_core::TagKeys;
use champion_gate_core::TrialRecord;
use champion_gate_core::TrialStatus;
use champion_gate_store_sqlite::SqliteCompletionCache;
use champion_gate_store_sqlite::SqliteRunStore;
use champion_gate_store_sqlite::SqliteStoreConfig;
use champion_gate_store_sqlite::SqliteStoreError;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_for(path: &Path) -> SqliteRunStore {
    SqliteRunStore::new(&SqliteStoreConfig::new(path)).expect("store init")
}

fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect()
}

fn trial(run_id: &str, backbone: &str, score: f64) -> TrialRecord {
    TrialRecord::finished(run_id)
        .with_tag("model.backbone", backbone)
        .with_tag("hpo.group_key", "G1")
        .with_metric("macro_f1", score)
}

fn champion(run_id: &str) -> Champion {
    Champion {
        run_id: RunId::new(run_id),
        winning_group_key: "G1".to_string(),
        schema_generation_used: SchemaGeneration::V2,
        metric_value: 0.9,
        stable_score: 0.88,
        group_valid_trials: 3,
        display_label: None,
    }
}

fn gate() -> IdempotencyGate {
    let context = BenchmarkContext::from_configs(
        &FingerprintPolicy::default(),
        &json!({"name": "reviews"}),
        &json!({"split": "test"}),
        &json!({"suite": "latency"}),
    )
    .unwrap();
    IdempotencyGate::new(context)
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

/// Verifies a directory path is rejected.
#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let Err(err) = SqliteRunStore::new(&SqliteStoreConfig::new(temp.path())) else {
        panic!("expected invalid directory path to fail");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

/// Verifies an empty path is rejected.
#[test]
fn sqlite_store_rejects_empty_path() {
    let Err(err) = SqliteRunStore::new(&SqliteStoreConfig::new(PathBuf::new())) else {
        panic!("expected empty path to fail");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

/// Verifies an overlong component is rejected.
#[test]
fn sqlite_store_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(300));
    let Err(err) = SqliteRunStore::new(&SqliteStoreConfig::new(path)) else {
        panic!("expected overlong component to fail");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Schema Versioning
// ============================================================================

/// Verifies an unknown schema version fails closed.
#[test]
fn sqlite_store_rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE store_meta (version INTEGER NOT NULL);").unwrap();
    conn.execute("INSERT INTO store_meta (version) VALUES (?1)", params![999_i64]).unwrap();
    drop(conn);

    let Err(err) = SqliteRunStore::new(&SqliteStoreConfig::new(&path)) else {
        panic!("expected schema mismatch to fail");
    };
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Verifies tag queries honor scope, status, exact matching, and limits.
#[test]
fn sqlite_store_queries_by_tags() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let hpo = ScopeId::new("hpo");
    store.put_record(&hpo, &trial("a", "bert", 0.8)).unwrap();
    store.put_record(&hpo, &trial("b", "bert", 0.7)).unwrap();
    store.put_record(&hpo, &trial("c", "roberta", 0.9)).unwrap();
    store
        .put_record(&hpo, &trial("d", "bert", 0.6).with_status(TrialStatus::Running))
        .unwrap();
    store.put_record(&ScopeId::new("other"), &trial("e", "bert", 0.5)).unwrap();

    let found = store.query_by_tags(&hpo, &tags(&[("model.backbone", "bert")]), 10).unwrap();
    let ids: Vec<_> = found.iter().map(|record| record.run_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    let limited = store.query_by_tags(&hpo, &tags(&[("model.backbone", "bert")]), 1).unwrap();
    assert_eq!(limited.len(), 1);

    let all = store.query_by_tags(&hpo, &BTreeMap::new(), 10).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(store.count_records(&hpo).unwrap(), 4);
}

/// Verifies rewriting a record replaces its tag index.
#[test]
fn sqlite_store_put_replaces_tags() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let hpo = ScopeId::new("hpo");
    store.put_record(&hpo, &trial("a", "bert", 0.8)).unwrap();
    store.put_record(&hpo, &trial("a", "roberta", 0.8)).unwrap();

    let bert = store.query_by_tags(&hpo, &tags(&[("model.backbone", "bert")]), 10).unwrap();
    assert!(bert.is_empty());
    let roberta =
        store.query_by_tags(&hpo, &tags(&[("model.backbone", "roberta")]), 10).unwrap();
    assert_eq!(roberta.len(), 1);
}

/// Verifies non-finite metrics survive the round trip as markers.
#[test]
fn sqlite_store_persists_non_finite_metrics() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let record = TrialRecord::finished("nan-run").with_metric("macro_f1", f64::NAN);
    store.put_record(&ScopeId::new("hpo"), &record).unwrap();

    let loaded = store.get_record(&RunId::new("nan-run")).unwrap();
    assert_eq!(loaded.metric("macro_f1"), Some(&MetricValue::NonFinite(NonFiniteMetric::Nan)));
}

/// Verifies missing records report not-found.
#[test]
fn sqlite_store_get_missing_record_fails() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let err = store.get_record(&RunId::new("ghost")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

// ============================================================================
// SECTION: Integrity
// ============================================================================

/// Verifies a tampered hash fails the load.
#[test]
fn sqlite_store_detects_hash_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let store = store_for(&path);
    store.put_record(&ScopeId::new("hpo"), &trial("run-1", "bert", 0.8)).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE trial_records SET record_hash = 'bad' WHERE run_id = ?1", params!["run-1"])
        .unwrap();

    let err = store.get_record(&RunId::new("run-1")).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
    let err = store
        .query_by_tags(&ScopeId::new("hpo"), &tags(&[("model.backbone", "bert")]), 10)
        .unwrap_err();
    assert!(format!("{err}").contains("hash mismatch"));
}

/// Verifies a tag index that disagrees with the payload fails closed.
#[test]
fn sqlite_store_detects_tag_index_drift() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let store = store_for(&path);
    store.put_record(&ScopeId::new("hpo"), &trial("run-1", "bert", 0.8)).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE trial_tags SET tag_value = 'roberta' WHERE run_id = ?1 AND tag_key = ?2",
        params!["run-1", "model.backbone"],
    )
    .unwrap();

    let err = store
        .query_by_tags(&ScopeId::new("hpo"), &tags(&[("model.backbone", "roberta")]), 10)
        .unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

// ============================================================================
// SECTION: Completion Cache
// ============================================================================

/// Verifies completions persist across reopen and recording is idempotent.
#[test]
fn completion_cache_persists_and_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let gate = gate();
    let entity = EntityId::new("bert");
    let key = {
        let cache = SqliteCompletionCache::new(&SqliteStoreConfig::new(&path)).unwrap();
        let first = gate.mark_complete(&entity, &champion("run-1"), &cache).unwrap();
        let second = gate.mark_complete(&entity, &champion("run-1"), &cache).unwrap();
        assert_eq!(first, second);
        first
    };

    let cache = SqliteCompletionCache::new(&SqliteStoreConfig::new(&path)).unwrap();
    assert!(cache.contains(&key).unwrap());
    let records = cache.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].champion_run_id.as_str(), "run-1");
}

/// Verifies a corrupt cache entry is an error, never a hit.
#[test]
fn completion_cache_fails_closed_on_corruption() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    let gate = gate();
    let cache = SqliteCompletionCache::new(&SqliteStoreConfig::new(&path)).unwrap();
    let key = gate.mark_complete(&EntityId::new("bert"), &champion("run-1"), &cache).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE completion_records SET record_hash = 'bad'", params![]).unwrap();
    assert!(cache.contains(&key).is_err());
}

/// Verifies benchmark records in the store mark keys complete through the adapter.
#[test]
fn store_backed_completion_lookup() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let gate = gate();
    let key = gate.context().key_for(&RunId::new("run-1")).unwrap();
    let scope = ScopeId::new("benchmarks");
    store
        .put_record(&scope, &TrialRecord::finished("bench-1").with_tag("benchmark.key", key.as_str()))
        .unwrap();
    let adapter = RunStoreAdapter::new(
        SharedRunStore::from_store(store),
        Arc::new(TagKeys::default()),
        scope,
    );
    assert!(adapter.is_complete(&key).unwrap());
    let other = gate.context().key_for(&RunId::new("run-2")).unwrap();
    assert!(!adapter.is_complete(&other).unwrap());
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

/// Verifies concurrent writers and readers share one store safely.
#[test]
fn sqlite_store_concurrent_writes() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.sqlite"));
    let scope = ScopeId::new("hpo");
    thread::scope(|threads| {
        for worker in 0 .. 4 {
            let store = store.clone();
            let scope = scope.clone();
            threads.spawn(move || {
                for index in 0 .. 5 {
                    let run_id = format!("w{worker}-{index}");
                    store.put_record(&scope, &trial(&run_id, "bert", 0.5)).unwrap();
                    store.get_record(&RunId::new(run_id)).unwrap();
                }
            });
        }
    });
    let found = store.query_by_tags(&scope, &tags(&[("model.backbone", "bert")]), 100).unwrap();
    assert_eq!(found.len(), 20);
}
