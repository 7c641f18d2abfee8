// crates/champion-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Champion Gate Runtime
// Description: Selector, idempotency gate, planner, stores, and audit sinks.
// Purpose: Execute champion selection and benchmark gating passes.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement champion selection, benchmark gating, and the
//! planner that ties them to a run store. Every caller goes through the same
//! selector and gate so training, selection, and benchmarking agree.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod adapter;
pub mod artifact;
pub mod audit;
pub mod gate;
pub mod planner;
pub mod selector;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adapter::CacheCompletionLookup;
pub use adapter::DEFAULT_MAX_RESULTS;
pub use adapter::LayeredCompletionLookup;
pub use adapter::RunStoreAdapter;
pub use artifact::ArtifactDecision;
pub use artifact::ArtifactProbeChain;
pub use artifact::DiskArtifactProbe;
pub use artifact::TagArtifactProbe;
pub use audit::AuditRecord;
pub use audit::AuditSeverity;
pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::SelectionAuditSink;
pub use audit::SelectionEvent;
pub use audit::StderrAuditSink;
pub use audit::TracingAuditSink;
pub use gate::BenchmarkContext;
pub use gate::GateError;
pub use gate::GateOutcome;
pub use gate::IdempotencyGate;
pub use gate::LookupFailurePolicy;
pub use planner::ChampionPlan;
pub use planner::ChampionPlanner;
pub use planner::PlanError;
pub use planner::PlanInputs;
pub use selector::ChampionSelector;
pub use store::InMemoryCompletionCache;
pub use store::InMemoryRunStore;
pub use store::SharedCompletionCache;
pub use store::SharedRunStore;
