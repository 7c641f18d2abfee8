// crates/champion-gate-core/tests/store.rs
// ============================================================================
// Module: In-Memory Store Tests
// Description: Tests for the in-memory run store and completion cache.
// Purpose: Validate tag queries, scoping, and concurrent access.
// Dependencies: champion-gate-core
// ============================================================================
//! ## Overview
//! Ensures the in-memory store filters by scope, status, and exact tags, and
//! fails closed on missing entries.
//!
//! Security posture: Store operations are deterministic and isolated.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use champion_gate_core::ChampionSelector;
use champion_gate_core::EntityId;
use champion_gate_core::InMemoryRunStore;
use champion_gate_core::MetricValue;
use champion_gate_core::NonFiniteMetric;
use champion_gate_core::Objective;
use champion_gate_core::ObjectiveDirection;
use champion_gate_core::RunId;
use champion_gate_core::RunStore;
use champion_gate_core::RunStoreAdapter;
use champion_gate_core::ScopeId;
use champion_gate_core::SelectionPolicy;
use champion_gate_core::SharedRunStore;
use champion_gate_core::StoreError;
use champion_gate_core::TagKeys;
use champion_gate_core::TrialRecord;
use champion_gate_core::TrialStatus;

fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect()
}

/// Verifies queries match every tag exactly and only return finished records.
#[test]
fn query_matches_all_tags_and_finished_only() {
    let scope = ScopeId::new("hpo");
    let store = InMemoryRunStore::new();
    store
        .put_record(&scope, TrialRecord::finished("a").with_tag("m", "bert").with_tag("k", "1"))
        .unwrap();
    store.put_record(&scope, TrialRecord::finished("b").with_tag("m", "bert")).unwrap();
    store
        .put_record(
            &scope,
            TrialRecord::finished("c")
                .with_tag("m", "bert")
                .with_tag("k", "1")
                .with_status(TrialStatus::Running),
        )
        .unwrap();
    store
        .put_record(&ScopeId::new("other"), TrialRecord::finished("d").with_tag("m", "bert"))
        .unwrap();

    let found = store.query_by_tags(&scope, &tags(&[("m", "bert"), ("k", "1")]), 10).unwrap();
    assert_eq!(found.iter().map(|record| record.run_id.as_str()).collect::<Vec<_>>(), vec!["a"]);
    let found = store.query_by_tags(&scope, &tags(&[("m", "bert")]), 10).unwrap();
    assert_eq!(found.len(), 2);
    let limited = store.query_by_tags(&scope, &tags(&[("m", "bert")]), 1).unwrap();
    assert_eq!(limited[0].run_id.as_str(), "a");
}

/// Verifies missing records surface as not-found errors.
#[test]
fn get_record_fails_closed_when_missing() {
    let store = InMemoryRunStore::new();
    let err = store.get_record(&RunId::new("ghost")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

/// Verifies stored metrics are normalized for persistence.
#[test]
fn put_record_normalizes_metrics() {
    let scope = ScopeId::new("hpo");
    let store = InMemoryRunStore::new();
    store
        .put_record(
            &scope,
            TrialRecord::finished("a").with_metric("f1", MetricValue::Number(f64::INFINITY)),
        )
        .unwrap();
    let record = store.get_record(&RunId::new("a")).unwrap();
    assert_eq!(
        record.metric("f1"),
        Some(&MetricValue::NonFinite(NonFiniteMetric::PositiveInfinity))
    );
}

/// Verifies tag existence checks honor scope and status.
#[test]
fn record_exists_with_tag_honors_scope() {
    let scope = ScopeId::new("bench");
    let store = InMemoryRunStore::new();
    store.put_record(&scope, TrialRecord::finished("b1").with_tag("benchmark.key", "k1")).unwrap();
    store
        .put_record(
            &scope,
            TrialRecord::finished("b2")
                .with_tag("benchmark.key", "k2")
                .with_status(TrialStatus::Failed),
        )
        .unwrap();
    assert!(store.record_exists_with_tag("benchmark.key", "k1", &scope).unwrap());
    assert!(!store.record_exists_with_tag("benchmark.key", "k2", &scope).unwrap());
    assert!(!store.record_exists_with_tag("benchmark.key", "k1", &ScopeId::new("x")).unwrap());
}

/// Verifies the adapter adds the entity tag and extra required tags.
#[test]
fn adapter_filters_by_entity_and_required_tags() {
    let scope = ScopeId::new("hpo");
    let store = InMemoryRunStore::new();
    store
        .put_record(
            &scope,
            TrialRecord::finished("a").with_tag("model.backbone", "bert").with_tag("stage", "hpo"),
        )
        .unwrap();
    store.put_record(&scope, TrialRecord::finished("b").with_tag("model.backbone", "bert")).unwrap();
    store
        .put_record(&scope, TrialRecord::finished("c").with_tag("model.backbone", "roberta"))
        .unwrap();
    let adapter =
        RunStoreAdapter::new(SharedRunStore::from_store(store), Arc::new(TagKeys::default()), scope);
    assert_eq!(adapter.candidates_for(&EntityId::new("bert")).unwrap().len(), 2);
    let adapter = adapter.with_required_tags(tags(&[("stage", "hpo")])).with_max_results(5);
    let found = adapter.candidates_for(&EntityId::new("bert")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].run_id.as_str(), "a");
}

/// Verifies concurrent selection over a shared store is consistent.
#[test]
fn concurrent_selection_is_consistent() {
    let scope = ScopeId::new("hpo");
    let store = InMemoryRunStore::new();
    for (index, score) in [0.7, 0.9, 0.8, 0.6].into_iter().enumerate() {
        store
            .put_record(
                &scope,
                TrialRecord::finished(format!("run-{index}"))
                    .with_tag("model.backbone", "bert")
                    .with_tag("hpo.group_key", "G1")
                    .with_tag("artifact.available", "true")
                    .with_metric("f1", score),
            )
            .unwrap();
    }
    let tags = Arc::new(TagKeys::default());
    let adapter = RunStoreAdapter::new(SharedRunStore::from_store(store), tags.clone(), scope);
    let selector = ChampionSelector::new(SelectionPolicy::default(), tags).unwrap();
    let objective = Objective::new("f1", ObjectiveDirection::Maximize);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0 .. 4)
            .map(|_| {
                scope.spawn(|| {
                    let candidates = adapter.candidates_for(&EntityId::new("bert")).unwrap();
                    selector.select_champion(&candidates, &objective)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    assert!(results.iter().all(|result| result == &results[0]));
    assert_eq!(results[0].as_ref().unwrap().run_id.as_str(), "run-1");
}
