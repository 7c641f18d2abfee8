// crates/champion-gate-core/src/runtime/gate.rs
// ============================================================================
// Module: Champion Gate Idempotency Gate
// Description: Benchmark-key gating of champions against completed work.
// Purpose: Re-benchmark exactly the champions whose key has not completed.
// Dependencies: crate::{core, interfaces, runtime::audit}, serde
// ============================================================================

//! ## Overview
//! The gate builds each champion's benchmark key and asks an injected
//! [`CompletionLookup`] whether that key is already done. Only keys that are
//! affirmatively complete are skipped. A lookup error fails the pass unless
//! the caller explicitly opts into [`LookupFailurePolicy::TreatAsPending`];
//! an error is never read as "complete".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::BenchmarkKey;
use crate::core::BenchmarkKeyError;
use crate::core::Champion;
use crate::core::ConfigFingerprint;
use crate::core::EntityId;
use crate::core::FingerprintError;
use crate::core::FingerprintPolicy;
use crate::core::RunId;
use crate::core::benchmark_key_from_parts;
use crate::interfaces::CompletionCache;
use crate::interfaces::CompletionLookup;
use crate::interfaces::CompletionRecord;
use crate::interfaces::LookupError;
use crate::runtime::audit::AuditRecord;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::SelectionAuditSink;
use crate::runtime::audit::SelectionEvent;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Behavior when a completion lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Fail the pass with the lookup error.
    #[default]
    Propagate,
    /// Treat the key as pending and benchmark again.
    TreatAsPending,
}

/// Fingerprints shared by every benchmark key in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkContext {
    /// Data configuration fingerprint.
    pub data_fingerprint: ConfigFingerprint,
    /// Evaluation configuration fingerprint.
    pub eval_fingerprint: ConfigFingerprint,
    /// Benchmark configuration fingerprint.
    pub benchmark_fingerprint: ConfigFingerprint,
}

impl BenchmarkContext {
    /// Fingerprints the three configurations with `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] when a configuration cannot be hashed.
    pub fn from_configs<D, E, B>(
        policy: &FingerprintPolicy,
        data_config: &D,
        eval_config: &E,
        benchmark_config: &B,
    ) -> Result<Self, FingerprintError>
    where
        D: Serialize + ?Sized,
        E: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        Ok(Self {
            data_fingerprint: policy.fingerprint(data_config)?,
            eval_fingerprint: policy.fingerprint(eval_config)?,
            benchmark_fingerprint: policy.fingerprint(benchmark_config)?,
        })
    }

    /// Builds the benchmark key for a champion run.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkKeyError`] when the run identifier is unusable.
    pub fn key_for(&self, run_id: &RunId) -> Result<BenchmarkKey, BenchmarkKeyError> {
        benchmark_key_from_parts(
            run_id,
            &self.data_fingerprint,
            &self.eval_fingerprint,
            &self.benchmark_fingerprint,
        )
    }
}

/// Gate errors.
#[derive(Debug, Error)]
pub enum GateError {
    /// Benchmark key could not be built.
    #[error("benchmark key for {entity} failed: {source}")]
    Key {
        /// Entity whose champion was gated.
        entity: EntityId,
        /// Key builder error.
        #[source]
        source: BenchmarkKeyError,
    },
    /// Completion lookup failed under [`LookupFailurePolicy::Propagate`].
    #[error("completion lookup for {entity} ({key}) failed: {source}")]
    Lookup {
        /// Entity whose champion was gated.
        entity: EntityId,
        /// Key being looked up.
        key: BenchmarkKey,
        /// Lookup error.
        #[source]
        source: LookupError,
    },
    /// Completion could not be recorded.
    #[error("recording completion for {key} failed: {source}")]
    Record {
        /// Key being recorded.
        key: BenchmarkKey,
        /// Cache error.
        #[source]
        source: LookupError,
    },
}

/// Result of gating a set of champions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateOutcome {
    /// Champions that still need benchmarking.
    pub pending: BTreeMap<EntityId, Champion>,
    /// Champions whose benchmark already completed.
    pub skipped: BTreeMap<EntityId, Champion>,
    /// Benchmark key for every gated champion.
    pub benchmark_keys: BTreeMap<EntityId, BenchmarkKey>,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Idempotency gate over benchmark keys.
pub struct IdempotencyGate {
    /// Fingerprints for this pass.
    context: BenchmarkContext,
    /// Lookup failure behavior.
    failure_policy: LookupFailurePolicy,
    /// Audit sink for gate events.
    audit: Arc<dyn SelectionAuditSink>,
}

impl IdempotencyGate {
    /// Creates a gate that propagates lookup errors.
    #[must_use]
    pub fn new(context: BenchmarkContext) -> Self {
        Self {
            context,
            failure_policy: LookupFailurePolicy::Propagate,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Returns the gate with a lookup failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, failure_policy: LookupFailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Returns the gate with an audit sink attached.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn SelectionAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the pass fingerprints.
    #[must_use]
    pub const fn context(&self) -> &BenchmarkContext {
        &self.context
    }

    /// Splits champions into pending and already-benchmarked sets.
    ///
    /// Entities without a champion are skipped entirely.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Key`] for unusable run identifiers and
    /// [`GateError::Lookup`] when a lookup fails under the propagate policy.
    pub fn filter_pending(
        &self,
        champions: &BTreeMap<EntityId, Option<Champion>>,
        lookup: &dyn CompletionLookup,
    ) -> Result<GateOutcome, GateError> {
        let mut outcome = GateOutcome::default();
        for (entity, champion) in champions {
            let Some(champion) = champion else {
                continue;
            };
            let key = self.context.key_for(&champion.run_id).map_err(|source| GateError::Key {
                entity: entity.clone(),
                source,
            })?;
            let complete = match lookup.is_complete(&key) {
                Ok(complete) => complete,
                Err(source) => {
                    let treated_as_pending =
                        self.failure_policy == LookupFailurePolicy::TreatAsPending;
                    self.emit(
                        entity,
                        SelectionEvent::LookupFailure {
                            benchmark_key: key.clone(),
                            error: source.to_string(),
                            treated_as_pending,
                        },
                    );
                    if !treated_as_pending {
                        return Err(GateError::Lookup {
                            entity: entity.clone(),
                            key,
                            source,
                        });
                    }
                    false
                }
            };
            if complete {
                self.emit(
                    entity,
                    SelectionEvent::BenchmarkSkipped {
                        run_id: champion.run_id.clone(),
                        benchmark_key: key.clone(),
                    },
                );
                outcome.skipped.insert(entity.clone(), champion.clone());
            } else {
                self.emit(
                    entity,
                    SelectionEvent::BenchmarkPending {
                        run_id: champion.run_id.clone(),
                        benchmark_key: key.clone(),
                    },
                );
                outcome.pending.insert(entity.clone(), champion.clone());
            }
            outcome.benchmark_keys.insert(entity.clone(), key);
        }
        Ok(outcome)
    }

    /// Records a finished benchmark in the completion cache.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Key`] for unusable run identifiers and
    /// [`GateError::Record`] when the cache write fails.
    pub fn mark_complete(
        &self,
        entity: &EntityId,
        champion: &Champion,
        cache: &dyn CompletionCache,
    ) -> Result<BenchmarkKey, GateError> {
        let key = self.context.key_for(&champion.run_id).map_err(|source| GateError::Key {
            entity: entity.clone(),
            source,
        })?;
        let record = CompletionRecord {
            benchmark_key: key.clone(),
            entity_id: entity.clone(),
            champion_run_id: champion.run_id.clone(),
            recorded_at_ms: unix_millis(),
        };
        cache.record(&record).map_err(|source| GateError::Record {
            key: key.clone(),
            source,
        })?;
        Ok(key)
    }

    /// Emits an audit event for an entity.
    fn emit(&self, entity: &EntityId, event: SelectionEvent) {
        self.audit.record(&AuditRecord::new(Some(entity), event));
    }
}

/// Returns the current unix timestamp in milliseconds.
fn unix_millis() -> i64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}
