// crates/champion-gate-core/src/lib.rs
// ============================================================================
// Module: Champion Gate Core Library
// Description: Public API surface for the Champion Gate core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Champion Gate selects one winning HPO trial per entity from a tracking
//! store and decides whether that champion still needs benchmarking. Group
//! identity is a versioned canonical key, selection refuses groups with too
//! few trials, and benchmark work is keyed by deterministic fingerprints so
//! repeated passes never redo completed work. The core is backend-agnostic
//! and integrates through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ArtifactProbe;
pub use interfaces::ArtifactStatus;
pub use interfaces::CompletionCache;
pub use interfaces::CompletionLookup;
pub use interfaces::CompletionRecord;
pub use interfaces::LookupError;
pub use interfaces::RunStore;
pub use interfaces::StoreError;
pub use runtime::BenchmarkContext;
pub use runtime::ChampionPlan;
pub use runtime::ChampionPlanner;
pub use runtime::ChampionSelector;
pub use runtime::GateError;
pub use runtime::GateOutcome;
pub use runtime::IdempotencyGate;
pub use runtime::InMemoryCompletionCache;
pub use runtime::InMemoryRunStore;
pub use runtime::LayeredCompletionLookup;
pub use runtime::LookupFailurePolicy;
pub use runtime::PlanError;
pub use runtime::PlanInputs;
pub use runtime::RunStoreAdapter;
pub use runtime::SharedCompletionCache;
pub use runtime::SharedRunStore;
