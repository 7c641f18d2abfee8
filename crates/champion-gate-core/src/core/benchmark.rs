// crates/champion-gate-core/src/core/benchmark.rs
// ============================================================================
// Module: Champion Gate Benchmark Keys
// Description: Idempotency keys for downstream benchmark work.
// Purpose: Identify one (champion, data, eval, benchmark config) combination.
// Dependencies: crate::core::{fingerprint, identifiers}, serde
// ============================================================================

//! ## Overview
//! A benchmark key is `run_id:data_fp:eval_fp:benchmark_fp`. Fingerprints are
//! lowercase hex and can never contain the `:` delimiter; run identifiers
//! that contain it are rejected so every key splits back into exactly four
//! components. The key is the sole idempotency criterion: wall-clock time and
//! run order never participate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::fingerprint::ConfigFingerprint;
use crate::core::fingerprint::FingerprintError;
use crate::core::fingerprint::FingerprintPolicy;
use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delimiter between benchmark key components.
pub const BENCHMARK_KEY_DELIMITER: char = ':';

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when building a benchmark key.
#[derive(Debug, Error)]
pub enum BenchmarkKeyError {
    /// Benchmark config could not be fingerprinted.
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
    /// A component is empty or contains the delimiter.
    #[error("invalid benchmark key component {component}: {reason}")]
    InvalidComponent {
        /// Component name.
        component: &'static str,
        /// Rejection reason.
        reason: &'static str,
    },
}

// ============================================================================
// SECTION: Benchmark Key
// ============================================================================

/// Deterministic idempotency key for benchmark work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkKey(String);

impl BenchmarkKey {
    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the champion run identifier component.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.0.split(BENCHMARK_KEY_DELIMITER).next().unwrap_or_default()
    }
}

impl fmt::Display for BenchmarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Builds a benchmark key from already computed fingerprints.
///
/// # Errors
///
/// Returns [`BenchmarkKeyError::InvalidComponent`] when the run identifier is
/// empty or contains the delimiter.
pub fn benchmark_key_from_parts(
    champion_run_id: &RunId,
    data_fingerprint: &ConfigFingerprint,
    eval_fingerprint: &ConfigFingerprint,
    benchmark_fingerprint: &ConfigFingerprint,
) -> Result<BenchmarkKey, BenchmarkKeyError> {
    let run_id = champion_run_id.as_str();
    if run_id.is_empty() {
        return Err(BenchmarkKeyError::InvalidComponent {
            component: "champion_run_id",
            reason: "must be non-empty",
        });
    }
    if run_id.contains(BENCHMARK_KEY_DELIMITER) {
        return Err(BenchmarkKeyError::InvalidComponent {
            component: "champion_run_id",
            reason: "must not contain ':'",
        });
    }
    Ok(BenchmarkKey(format!(
        "{run_id}{BENCHMARK_KEY_DELIMITER}{data_fingerprint}{BENCHMARK_KEY_DELIMITER}\
         {eval_fingerprint}{BENCHMARK_KEY_DELIMITER}{benchmark_fingerprint}"
    )))
}

/// Builds the benchmark idempotency key for a champion.
///
/// The benchmark config is fingerprinted with the default policy. Callers
/// with a configured [`FingerprintPolicy`] must use
/// [`build_benchmark_key_with_policy`] so their keys match the gate's.
///
/// # Errors
///
/// Returns [`BenchmarkKeyError`] when the benchmark config cannot be
/// fingerprinted or the run identifier is unusable.
pub fn build_benchmark_key<T: Serialize + ?Sized>(
    champion_run_id: &RunId,
    data_fingerprint: &ConfigFingerprint,
    eval_fingerprint: &ConfigFingerprint,
    benchmark_config: &T,
) -> Result<BenchmarkKey, BenchmarkKeyError> {
    build_benchmark_key_with_policy(
        champion_run_id,
        data_fingerprint,
        eval_fingerprint,
        benchmark_config,
        &FingerprintPolicy::default(),
    )
}

/// Builds the benchmark idempotency key, fingerprinting the benchmark config
/// under `policy`.
///
/// # Errors
///
/// Returns [`BenchmarkKeyError`] when the benchmark config cannot be
/// fingerprinted or the run identifier is unusable.
pub fn build_benchmark_key_with_policy<T: Serialize + ?Sized>(
    champion_run_id: &RunId,
    data_fingerprint: &ConfigFingerprint,
    eval_fingerprint: &ConfigFingerprint,
    benchmark_config: &T,
    policy: &FingerprintPolicy,
) -> Result<BenchmarkKey, BenchmarkKeyError> {
    let benchmark_fingerprint = policy.fingerprint(benchmark_config)?;
    benchmark_key_from_parts(
        champion_run_id,
        data_fingerprint,
        eval_fingerprint,
        &benchmark_fingerprint,
    )
}
