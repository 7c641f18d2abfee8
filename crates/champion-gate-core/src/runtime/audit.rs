// crates/champion-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Champion Gate Audit Logging
// Description: Structured selection and gating events plus their sinks.
// Purpose: Record exclusions, strategy choices, and gate outcomes as JSON lines.
// Dependencies: crate::core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Every data-quality decision made during selection (excluded trials,
//! discarded groups, the generation strategy actually used) and every gate
//! outcome is emitted as an [`AuditRecord`]. Sinks decide where records go:
//! stderr, an append-only file, the `tracing` pipeline, memory, or nowhere.
//! Sinks never fail the caller; a record that cannot be written is dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ArtifactCheckSource;
use crate::core::BenchmarkKey;
use crate::core::EntityId;
use crate::core::ExclusionReason;
use crate::core::RunId;
use crate::core::SchemaGeneration;
use crate::core::SchemaPreference;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Severity attached to an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Routine decision.
    Info,
    /// Decision an operator should look at.
    Warn,
}

/// Selection and gating events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SelectionEvent {
    /// Configured top-K exceeded the minimum trial count and was clamped.
    TopKClamped {
        /// Configured top-K.
        configured: usize,
        /// Minimum trials per group.
        min_trials_per_group: usize,
        /// Top-K actually applied.
        effective: usize,
    },
    /// Summary of the finished-status and artifact filter.
    ArtifactFilter {
        /// Whether artifact availability was required.
        required: bool,
        /// Configured availability source.
        source: ArtifactCheckSource,
        /// Trials kept.
        kept: usize,
        /// Trials dropped for non-finished status.
        not_finished: usize,
        /// Trials dropped for missing artifacts.
        artifact_unavailable: usize,
        /// Checked trials per deciding probe; `none` when every probe was inconclusive.
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        decided_by: BTreeMap<&'static str, usize>,
    },
    /// A candidate query returned as many trials as the result limit allows.
    CandidateLimitReached {
        /// Configured result limit.
        max_results: usize,
        /// Trials returned.
        returned: usize,
    },
    /// Generation bucket chosen by the ordered strategy list.
    GenerationStrategy {
        /// Configured preference.
        preference: SchemaPreference,
        /// Generation bucket used.
        generation: SchemaGeneration,
        /// Trials in the chosen bucket.
        candidates: usize,
    },
    /// Generation buckets were merged on explicit opt-in.
    MixedSchemaGroups {
        /// Trials across all buckets.
        candidates: usize,
    },
    /// One trial was excluded.
    TrialExcluded {
        /// Run identifier.
        run_id: RunId,
        /// Exclusion reason.
        reason: ExclusionReason,
        /// Artifact probe that made the decision, when one did.
        #[serde(skip_serializing_if = "Option::is_none")]
        probe: Option<&'static str>,
    },
    /// Group failed the minimum-trials guardrail.
    GroupDiscarded {
        /// Group key tag value.
        group_key: String,
        /// Schema generation.
        schema_generation: SchemaGeneration,
        /// Valid trials in the group.
        valid_trials: usize,
        /// Trials excluded for metric problems.
        excluded_trials: usize,
        /// Required minimum.
        min_trials_per_group: usize,
    },
    /// Group passed the guardrail and was scored.
    GroupScored {
        /// Group key tag value.
        group_key: String,
        /// Schema generation.
        schema_generation: SchemaGeneration,
        /// Valid trials in the group.
        valid_trials: usize,
        /// Trials excluded for metric problems.
        excluded_trials: usize,
        /// Best valid metric.
        best_metric: f64,
        /// Median of the top-K valid metrics.
        stable_score: f64,
    },
    /// A champion was selected.
    ChampionSelected {
        /// Winning run identifier.
        run_id: RunId,
        /// Winning group key tag value.
        group_key: String,
        /// Winning metric.
        metric_value: f64,
        /// Winning group's stable score.
        stable_score: f64,
    },
    /// No group survived; the entity has no champion.
    NoChampion {
        /// Trials passed to selection.
        candidates: usize,
        /// Groups considered.
        groups: usize,
    },
    /// Benchmark work is still needed.
    BenchmarkPending {
        /// Champion run identifier.
        run_id: RunId,
        /// Benchmark key.
        benchmark_key: BenchmarkKey,
    },
    /// Benchmark work is already complete.
    BenchmarkSkipped {
        /// Champion run identifier.
        run_id: RunId,
        /// Benchmark key.
        benchmark_key: BenchmarkKey,
    },
    /// Completion lookup failed.
    LookupFailure {
        /// Benchmark key.
        benchmark_key: BenchmarkKey,
        /// Error message.
        error: String,
        /// Whether the key was treated as pending instead of failing.
        treated_as_pending: bool,
    },
}

impl SelectionEvent {
    /// Returns the stable event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TopKClamped { .. } => "top_k_clamped",
            Self::ArtifactFilter { .. } => "artifact_filter",
            Self::CandidateLimitReached { .. } => "candidate_limit_reached",
            Self::GenerationStrategy { .. } => "generation_strategy",
            Self::MixedSchemaGroups { .. } => "mixed_schema_groups",
            Self::TrialExcluded { .. } => "trial_excluded",
            Self::GroupDiscarded { .. } => "group_discarded",
            Self::GroupScored { .. } => "group_scored",
            Self::ChampionSelected { .. } => "champion_selected",
            Self::NoChampion { .. } => "no_champion",
            Self::BenchmarkPending { .. } => "benchmark_pending",
            Self::BenchmarkSkipped { .. } => "benchmark_skipped",
            Self::LookupFailure { .. } => "lookup_failure",
        }
    }

    /// Returns the severity for the event.
    #[must_use]
    pub const fn severity(&self) -> AuditSeverity {
        match self {
            Self::TopKClamped { .. }
            | Self::MixedSchemaGroups { .. }
            | Self::TrialExcluded { .. }
            | Self::GroupDiscarded { .. }
            | Self::NoChampion { .. }
            | Self::CandidateLimitReached { .. }
            | Self::LookupFailure { .. } => AuditSeverity::Warn,
            Self::ArtifactFilter { .. }
            | Self::GenerationStrategy { .. }
            | Self::GroupScored { .. }
            | Self::ChampionSelected { .. }
            | Self::BenchmarkPending { .. }
            | Self::BenchmarkSkipped { .. } => AuditSeverity::Info,
        }
    }
}

/// Audit record written by sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub severity: AuditSeverity,
    /// Entity the event belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityId>,
    /// Event payload.
    #[serde(flatten)]
    pub event: SelectionEvent,
}

impl AuditRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(entity: Option<&EntityId>, event: SelectionEvent) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            severity: event.severity(),
            entity: entity.cloned(),
            event,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for selection and gating events.
pub trait SelectionAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, record: &AuditRecord);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl SelectionAuditSink for StderrAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(payload) = serde_json::to_string(record) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SelectionAuditSink for FileAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(payload) = serde_json::to_string(record)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
        }
    }
}

/// Audit sink that forwards records to `tracing`.
pub struct TracingAuditSink;

impl SelectionAuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        let payload = serde_json::to_string(record).unwrap_or_default();
        let entity = record.entity.as_ref().map_or("", EntityId::as_str);
        match record.severity {
            AuditSeverity::Info => tracing::info!(
                target: "champion_gate",
                event = record.event.name(),
                entity,
                %payload,
            ),
            AuditSeverity::Warn => tracing::warn!(
                target: "champion_gate",
                event = record.event.name(),
                entity,
                %payload,
            ),
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl SelectionAuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

/// Audit sink that keeps records in memory, for tests and dry runs.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Captured records in emission order.
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured records.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns captured event names in emission order.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|record| record.event.name())
            .collect()
    }
}

impl SelectionAuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record.clone());
    }
}
