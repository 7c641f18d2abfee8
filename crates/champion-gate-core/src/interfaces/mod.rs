// crates/champion-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Champion Gate Interfaces
// Description: Backend-agnostic interfaces for tracking stores and caches.
// Purpose: Define the contract surfaces consumed by selection and gating.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how champion selection integrates with the tracking
//! store, the benchmark completion cache, and artifact checks without
//! embedding backend details. Implementations must be deterministic for a
//! fixed store state and must fail closed: an error is never reported as
//! "benchmark already done".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::BenchmarkKey;
use crate::core::EntityId;
use crate::core::RunId;
use crate::core::ScopeId;
use crate::core::TrialRecord;

// ============================================================================
// SECTION: Run Store
// ============================================================================

/// Tracking store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("run store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("run store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("run store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data or request is invalid.
    #[error("run store invalid data: {0}")]
    Invalid(String),
    /// Requested record does not exist.
    #[error("run store record not found: {0}")]
    NotFound(String),
    /// Store reported an error.
    #[error("run store error: {0}")]
    Store(String),
}

/// Read interface to the experiment-tracking store.
pub trait RunStore {
    /// Returns finished records in `scope` whose tags match every required
    /// key/value pair exactly, ordered by run identifier, at most
    /// `max_results` of them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query_by_tags(
        &self,
        scope: &ScopeId,
        required_tags: &BTreeMap<String, String>,
        max_results: usize,
    ) -> Result<Vec<TrialRecord>, StoreError>;

    /// Fetches one record by its stable identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist.
    fn get_record(&self, run_id: &RunId) -> Result<TrialRecord, StoreError>;

    /// Returns true when a finished record in `scope` carries the tag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn record_exists_with_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        scope: &ScopeId,
    ) -> Result<bool, StoreError>;
}

// ============================================================================
// SECTION: Completion Lookup
// ============================================================================

/// Benchmark completion lookup errors.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Authoritative store lookup failed.
    #[error("completion lookup store error: {0}")]
    Store(#[from] StoreError),
    /// Completion cache lookup failed.
    #[error("completion lookup cache error: {0}")]
    Cache(String),
}

/// Answers whether benchmark work for a key has already completed.
pub trait CompletionLookup {
    /// Returns true when the keyed benchmark is already complete.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the answer cannot be determined. Callers
    /// must never read an error as "complete".
    fn is_complete(&self, key: &BenchmarkKey) -> Result<bool, LookupError>;
}

// ============================================================================
// SECTION: Completion Cache
// ============================================================================

/// Completion cache entry written after a benchmark finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Benchmark idempotency key.
    pub benchmark_key: BenchmarkKey,
    /// Entity the champion was selected for.
    pub entity_id: EntityId,
    /// Champion run identifier.
    pub champion_run_id: RunId,
    /// Recording time, unix milliseconds.
    pub recorded_at_ms: i64,
}

/// Secondary cache of completed benchmark keys.
pub trait CompletionCache {
    /// Returns true when the key has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Cache`] when the cache cannot be read.
    fn contains(&self, key: &BenchmarkKey) -> Result<bool, LookupError>;

    /// Records a completed benchmark. Recording an existing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Cache`] when the cache cannot be written.
    fn record(&self, record: &CompletionRecord) -> Result<(), LookupError>;
}

// ============================================================================
// SECTION: Artifact Probe
// ============================================================================

/// Result of checking one trial's checkpoint artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// Artifact is affirmatively available.
    Available,
    /// Artifact is affirmatively unavailable.
    Unavailable,
    /// This probe cannot tell.
    Unknown,
}

/// One named strategy for confirming artifact availability.
pub trait ArtifactProbe {
    /// Returns the stable strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Checks a trial's artifact.
    fn check(&self, trial: &TrialRecord) -> ArtifactStatus;
}
