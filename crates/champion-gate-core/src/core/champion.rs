// crates/champion-gate-core/src/core/champion.rs
// ============================================================================
// Module: Champion Gate Selection Results
// Description: Champion records and per-group selection diagnostics.
// Purpose: Describe selection outcomes without persisting them.
// Dependencies: crate::core::{identifiers, group_key}, serde
// ============================================================================

//! ## Overview
//! A [`Champion`] is computed on demand and never stored by this crate. The
//! surrounding [`SelectionReport`] records how every group fared so callers
//! can explain a `None` result without re-running selection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::group_key::SchemaGeneration;
use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Champion
// ============================================================================

/// Selected winning trial for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    /// Run identifier of the winning trial.
    pub run_id: RunId,
    /// Group key tag value of the winning group.
    pub winning_group_key: String,
    /// Schema generation of the winning group.
    pub schema_generation_used: SchemaGeneration,
    /// Objective metric of the winning trial.
    pub metric_value: f64,
    /// Stable score of the winning group.
    pub stable_score: f64,
    /// Valid trials in the winning group.
    pub group_valid_trials: usize,
    /// Display-only trial label. Never used for equality or lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Why a trial did not contribute to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Trial status is not finished.
    NotFinished,
    /// Artifact was not confirmed available.
    ArtifactUnavailable,
    /// Schema generation tag could not be parsed.
    UnknownSchemaGeneration,
    /// Schema generation bucket was not selected.
    GenerationNotSelected,
    /// Objective direction tag disagrees with the requested direction.
    DirectionMismatch,
    /// Group key tag is absent.
    MissingGroupKey,
    /// Objective metric is absent.
    MissingMetric,
    /// Objective metric is not numeric.
    NonNumericMetric,
    /// Objective metric is NaN or infinite.
    NonFiniteMetric,
}

impl ExclusionReason {
    /// Returns the stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFinished => "not_finished",
            Self::ArtifactUnavailable => "artifact_unavailable",
            Self::UnknownSchemaGeneration => "unknown_schema_generation",
            Self::GenerationNotSelected => "generation_not_selected",
            Self::DirectionMismatch => "direction_mismatch",
            Self::MissingGroupKey => "missing_group_key",
            Self::MissingMetric => "missing_metric",
            Self::NonNumericMetric => "non_numeric_metric",
            Self::NonFiniteMetric => "non_finite_metric",
        }
    }
}

/// Outcome of one group in the guardrail and scoring phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupVerdict {
    /// Group passed the guardrail and was scored.
    Eligible,
    /// Group had too few valid trials.
    BelowMinTrials,
}

/// Per-group diagnostics from one selection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group key tag value.
    pub group_key: String,
    /// Schema generation of the group.
    pub schema_generation: SchemaGeneration,
    /// Trials with a valid objective metric.
    pub valid_trials: usize,
    /// Trials excluded for metric problems.
    pub excluded_trials: usize,
    /// Guardrail verdict.
    pub verdict: GroupVerdict,
    /// Best valid metric (eligible groups only).
    pub best_metric: Option<f64>,
    /// Median of the top-K valid metrics (eligible groups only).
    pub stable_score: Option<f64>,
}

/// Trial dropped before or during grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialExclusion {
    /// Run identifier.
    pub run_id: RunId,
    /// Exclusion reason.
    pub reason: ExclusionReason,
}

/// Full result of a selection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Winning trial, if any group survived the guardrail.
    pub champion: Option<Champion>,
    /// Generation bucket used, `None` in mixed mode or when no candidates remained.
    pub generation_used: Option<SchemaGeneration>,
    /// Whether generation buckets were merged.
    pub mixed_schema_groups: bool,
    /// Top-K actually applied after clamping.
    pub effective_top_k: usize,
    /// Per-group diagnostics sorted by group key.
    pub groups: Vec<GroupSummary>,
    /// Excluded trials in encounter order.
    pub exclusions: Vec<TrialExclusion>,
}
