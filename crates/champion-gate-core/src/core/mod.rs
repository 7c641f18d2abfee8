// crates/champion-gate-core/src/core/mod.rs
// ============================================================================
// Module: Champion Gate Core Types
// Description: Identity, record, and result types for champion selection.
// Purpose: Provide stable, serializable types shared by every stage.
// Dependencies: serde, serde_json, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Core types define fingerprints, group keys, trial records, selection
//! policy, champions, and benchmark keys. Every stage (training tags,
//! selection, benchmarking) consumes the same builders through explicit
//! parameters; nothing here reads ambient global state.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod benchmark;
pub mod champion;
pub mod fingerprint;
pub mod group_key;
pub mod identifiers;
pub mod objective;
pub mod policy;
pub mod tags;
pub mod trial;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use benchmark::BENCHMARK_KEY_DELIMITER;
pub use benchmark::BenchmarkKey;
pub use benchmark::BenchmarkKeyError;
pub use benchmark::benchmark_key_from_parts;
pub use benchmark::build_benchmark_key;
pub use benchmark::build_benchmark_key_with_policy;
pub use champion::Champion;
pub use champion::ExclusionReason;
pub use champion::GroupSummary;
pub use champion::GroupVerdict;
pub use champion::SelectionReport;
pub use champion::TrialExclusion;
pub use fingerprint::ConfigFingerprint;
pub use fingerprint::FINGERPRINT_HEX_LEN;
pub use fingerprint::FingerprintError;
pub use fingerprint::FingerprintPolicy;
pub use fingerprint::canonical_json_bytes;
pub use fingerprint::fingerprint;
pub use fingerprint::hash_canonical_json;
pub use fingerprint::sha256_hex;
pub use group_key::GroupKey;
pub use group_key::GroupKeyError;
pub use group_key::GroupKeyInputs;
pub use group_key::SchemaGeneration;
pub use group_key::build_group_key;
pub use identifiers::EntityId;
pub use identifiers::RunId;
pub use identifiers::ScopeId;
pub use objective::Objective;
pub use objective::ObjectiveDirection;
pub use objective::ObjectiveError;
pub use policy::ArtifactCheckSource;
pub use policy::DEFAULT_MIN_TRIALS_PER_GROUP;
pub use policy::DEFAULT_TOP_K_FOR_STABLE_SCORE;
pub use policy::PolicyError;
pub use policy::SchemaPreference;
pub use policy::SelectionPolicy;
pub use tags::TagKeyResolver;
pub use tags::TagKeys;
pub use tags::TagName;
pub use trial::MetricValue;
pub use trial::NonFiniteMetric;
pub use trial::TrialRecord;
pub use trial::TrialStatus;
