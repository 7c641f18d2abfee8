// crates/champion-gate-core/src/runtime/planner.rs
// ============================================================================
// Module: Champion Gate Planner
// Description: One selection-and-gating pass over several entities.
// Purpose: Produce the champion and pending-benchmark mappings for a pass.
// Dependencies: crate::{core, interfaces, runtime}, serde_json
// ============================================================================

//! ## Overview
//! The planner queries candidates per entity through a [`RunStoreAdapter`],
//! selects a champion for each, and gates the champions against completed
//! benchmark work. Store errors halt the pass; an entity without a champion
//! is reported as a `None` entry rather than an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::BenchmarkKey;
use crate::core::Champion;
use crate::core::EntityId;
use crate::core::FingerprintError;
use crate::core::FingerprintPolicy;
use crate::core::Objective;
use crate::core::SelectionReport;
use crate::interfaces::CompletionCache;
use crate::interfaces::CompletionLookup;
use crate::interfaces::StoreError;
use crate::runtime::adapter::RunStoreAdapter;
use crate::runtime::audit::AuditRecord;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::SelectionAuditSink;
use crate::runtime::audit::SelectionEvent;
use crate::runtime::gate::BenchmarkContext;
use crate::runtime::gate::GateError;
use crate::runtime::gate::IdempotencyGate;
use crate::runtime::gate::LookupFailurePolicy;
use crate::runtime::selector::ChampionSelector;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Configuration values a pass is planned against.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanInputs {
    /// Objective metric and direction.
    pub objective: Objective,
    /// Data configuration.
    pub data_config: Value,
    /// Evaluation configuration.
    pub eval_config: Value,
    /// Benchmark configuration.
    pub benchmark_config: Value,
    /// Fingerprint exclusions and identity fields.
    pub fingerprint_policy: FingerprintPolicy,
    /// Lookup failure behavior.
    pub lookup_failure: LookupFailurePolicy,
}

/// Planner errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A configuration could not be fingerprinted.
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
    /// Candidate query failed for an entity.
    #[error("candidate query for {entity} failed: {source}")]
    Store {
        /// Entity being queried.
        entity: EntityId,
        /// Store error.
        #[source]
        source: StoreError,
    },
    /// Gating failed.
    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Output of one planning pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChampionPlan {
    /// Champion per entity, `None` when no group survived.
    pub champions: BTreeMap<EntityId, Option<Champion>>,
    /// Champions that still need benchmarking.
    pub pending: BTreeMap<EntityId, Champion>,
    /// Champions whose benchmark already completed.
    pub skipped: BTreeMap<EntityId, Champion>,
    /// Benchmark key per entity with a champion.
    pub benchmark_keys: BTreeMap<EntityId, BenchmarkKey>,
    /// Selection diagnostics per entity.
    pub reports: BTreeMap<EntityId, SelectionReport>,
    /// Entities whose candidate query hit the result limit.
    pub candidate_limit_reached: BTreeSet<EntityId>,
}

// ============================================================================
// SECTION: Planner
// ============================================================================

/// Runs selection and gating for a set of entities.
pub struct ChampionPlanner {
    /// Objective shared by every entity.
    objective: Objective,
    /// Candidate source.
    adapter: RunStoreAdapter,
    /// Champion selector.
    selector: ChampionSelector,
    /// Idempotency gate.
    gate: IdempotencyGate,
    /// Completion lookup used by the gate.
    lookup: Arc<dyn CompletionLookup + Send + Sync>,
    /// Audit sink for planner events.
    audit: Arc<dyn SelectionAuditSink>,
}

impl ChampionPlanner {
    /// Creates a planner, fingerprinting the pass configurations once.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Fingerprint`] when a configuration cannot be hashed.
    pub fn new(
        inputs: &PlanInputs,
        adapter: RunStoreAdapter,
        selector: ChampionSelector,
        lookup: Arc<dyn CompletionLookup + Send + Sync>,
    ) -> Result<Self, PlanError> {
        let context = BenchmarkContext::from_configs(
            &inputs.fingerprint_policy,
            &inputs.data_config,
            &inputs.eval_config,
            &inputs.benchmark_config,
        )?;
        let gate = IdempotencyGate::new(context).with_failure_policy(inputs.lookup_failure);
        Ok(Self {
            objective: inputs.objective.clone(),
            adapter,
            selector,
            gate,
            lookup,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Returns the planner with planner and gate events routed to `audit`.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn SelectionAuditSink>) -> Self {
        self.gate = self.gate.with_audit_sink(Arc::clone(&audit));
        self.audit = audit;
        self
    }

    /// Returns the benchmark context for this pass.
    #[must_use]
    pub const fn context(&self) -> &BenchmarkContext {
        self.gate.context()
    }

    /// Plans a pass over `entities`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Store`] when a candidate query fails and
    /// [`PlanError::Gate`] when gating fails.
    pub fn plan(&self, entities: &[EntityId]) -> Result<ChampionPlan, PlanError> {
        let mut plan = ChampionPlan::default();
        for entity in entities {
            let candidates =
                self.adapter.candidates_for(entity).map_err(|source| PlanError::Store {
                    entity: entity.clone(),
                    source,
                })?;
            let max_results = self.adapter.max_results();
            if candidates.len() >= max_results {
                self.audit.record(&AuditRecord::new(
                    Some(entity),
                    SelectionEvent::CandidateLimitReached {
                        max_results,
                        returned: candidates.len(),
                    },
                ));
                plan.candidate_limit_reached.insert(entity.clone());
            }
            let report = self.selector.select_report_for(entity, &candidates, &self.objective);
            plan.champions.insert(entity.clone(), report.champion.clone());
            plan.reports.insert(entity.clone(), report);
        }
        let outcome = self.gate.filter_pending(&plan.champions, self.lookup.as_ref())?;
        plan.pending = outcome.pending;
        plan.skipped = outcome.skipped;
        plan.benchmark_keys = outcome.benchmark_keys;
        Ok(plan)
    }

    /// Records that a pending champion's benchmark finished.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Gate`] when the key cannot be built or recorded.
    pub fn mark_complete(
        &self,
        entity: &EntityId,
        champion: &Champion,
        cache: &dyn CompletionCache,
    ) -> Result<BenchmarkKey, PlanError> {
        Ok(self.gate.mark_complete(entity, champion, cache)?)
    }
}
