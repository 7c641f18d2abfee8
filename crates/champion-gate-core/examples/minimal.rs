// crates/champion-gate-core/examples/minimal.rs
// ============================================================================
// Module: Champion Gate Minimal Example
// Description: Minimal selection-and-gating pass using in-memory adapters.
// Purpose: Demonstrate group keys, champion selection, and benchmark gating.
// Dependencies: champion-gate-core
// ============================================================================

//! ## Overview
//! Tags a handful of trials with a generation-2 group key, stores them in
//! memory, plans one pass, and marks the pending benchmark complete so a
//! second pass skips it. Audit events are written to stderr as JSON lines.

use std::sync::Arc;

use champion_gate_core::ChampionPlanner;
use champion_gate_core::ChampionSelector;
use champion_gate_core::EntityId;
use champion_gate_core::FingerprintPolicy;
use champion_gate_core::GroupKeyInputs;
use champion_gate_core::InMemoryCompletionCache;
use champion_gate_core::InMemoryRunStore;
use champion_gate_core::LayeredCompletionLookup;
use champion_gate_core::LookupFailurePolicy;
use champion_gate_core::PlanInputs;
use champion_gate_core::RunStoreAdapter;
use champion_gate_core::SchemaGeneration;
use champion_gate_core::ScopeId;
use champion_gate_core::SelectionPolicy;
use champion_gate_core::SharedCompletionCache;
use champion_gate_core::SharedRunStore;
use champion_gate_core::TagKeyResolver;
use champion_gate_core::TagKeys;
use champion_gate_core::TagName;
use champion_gate_core::TrialRecord;
use champion_gate_core::build_group_key;
use champion_gate_core::fingerprint;
use champion_gate_core::runtime::StderrAuditSink;
use serde_json::json;

/// Error type for example preconditions.
#[derive(Debug)]
struct ExampleError(&'static str);

impl std::fmt::Display for ExampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ExampleError {}

/// Runs two planning passes against an in-memory store.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tags = Arc::new(TagKeys::default());
    let scope = ScopeId::new("hpo-experiment");
    let entity = EntityId::new("distilbert");

    let data_config = json!({"name": "reviews", "version": "3", "local_path": "/data/reviews"});
    let eval_config = json!({"split": "test", "batch_size": 64});
    let benchmark_config = json!({"suite": "latency", "repeats": 5});
    let hpo_config = json!({
        "objective": {"metric": "macro_f1", "direction": "maximize"},
        "search_space": {"learning_rate": [1e-5, 5e-5]},
    });
    let train_config = json!({"max_steps": 2000, "seed": 7});

    let data_fingerprint = fingerprint(&data_config)?;
    let eval_fingerprint = fingerprint(&eval_config)?;
    let group_key = build_group_key(&GroupKeyInputs {
        data_config: &data_config,
        hpo_config: &hpo_config,
        train_config: &train_config,
        model_name: entity.as_str(),
        data_fingerprint: Some(&data_fingerprint),
        eval_fingerprint: Some(&eval_fingerprint),
        schema_generation: SchemaGeneration::V2,
    })?;
    let identity = group_key.identity_tags(tags.as_ref(), &entity);

    let store = InMemoryRunStore::new();
    for (run_id, score) in [("trial-a", 0.80), ("trial-b", 0.83), ("trial-c", 0.82)] {
        let mut trial = TrialRecord::finished(run_id)
            .with_tag(tags.key(TagName::ArtifactAvailable), "true")
            .with_metric("macro_f1", score);
        trial.tags.extend(identity.clone());
        store.put_record(&scope, trial)?;
    }

    let cache = SharedCompletionCache::from_cache(InMemoryCompletionCache::new());
    let adapter = RunStoreAdapter::new(SharedRunStore::from_store(store), tags.clone(), scope);
    let lookup = LayeredCompletionLookup::store_then_cache(adapter.clone(), cache.clone());
    let selector = ChampionSelector::new(SelectionPolicy::default(), tags)?
        .with_audit_sink(Arc::new(StderrAuditSink));
    let inputs = PlanInputs {
        objective: group_key.objective().clone(),
        data_config,
        eval_config,
        benchmark_config,
        fingerprint_policy: FingerprintPolicy::default(),
        lookup_failure: LookupFailurePolicy::Propagate,
    };
    let planner = ChampionPlanner::new(&inputs, adapter, selector, Arc::new(lookup))?
        .with_audit_sink(Arc::new(StderrAuditSink));

    let first = planner.plan(std::slice::from_ref(&entity))?;
    let champion =
        first.pending.get(&entity).ok_or(ExampleError("first pass must leave work pending"))?;
    planner.mark_complete(&entity, champion, &cache)?;

    let second = planner.plan(std::slice::from_ref(&entity))?;
    if !second.pending.is_empty() {
        return Err(Box::new(ExampleError("second pass must skip completed work")));
    }
    Ok(())
}
