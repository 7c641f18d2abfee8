// crates/champion-gate-core/src/core/policy.rs
// ============================================================================
// Module: Champion Gate Selection Policy
// Description: Tunables for champion selection and their defaults.
// Purpose: Validate guardrail parameters once, before any selection runs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`SelectionPolicy`] mirrors the `champion_selection` configuration block.
//! Construction rejects zero trial counts. A `top_k_for_stable_score` larger
//! than `min_trials_per_group` is accepted here and clamped (with a logged
//! warning) by the selector, so configuration drift never blocks a pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::group_key::SchemaGeneration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default minimum number of valid trials a group needs to be eligible.
pub const DEFAULT_MIN_TRIALS_PER_GROUP: usize = 3;

/// Default number of top trials used for the stable score.
pub const DEFAULT_TOP_K_FOR_STABLE_SCORE: usize = 3;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Schema generation preference when buckets are not mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaPreference {
    /// Use generation 2 when any generation-2 candidates exist.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Use generation 1 only.
    #[serde(rename = "1")]
    V1,
    /// Prefer generation 2.
    #[serde(rename = "2")]
    V2,
}

impl SchemaPreference {
    /// Returns the ordered generation strategies tried for this preference.
    ///
    /// Preferring generation 1 never falls back to generation 2.
    #[must_use]
    pub const fn strategy_order(self) -> &'static [SchemaGeneration] {
        match self {
            Self::Auto | Self::V2 => &[SchemaGeneration::V2, SchemaGeneration::V1],
            Self::V1 => &[SchemaGeneration::V1],
        }
    }

    /// Returns the configuration label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }
}

impl fmt::Display for SchemaPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source used to confirm that a trial's checkpoint artifact exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCheckSource {
    /// Trust the artifact-availability tag.
    #[default]
    Tag,
    /// Check the artifact path on disk.
    Disk,
    /// Tag first, disk when the tag is inconclusive.
    TagThenDisk,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when a selection policy is invalid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A count that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroCount(&'static str),
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Champion selection tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Minimum valid trials per group (winner's-curse guardrail).
    pub min_trials_per_group: usize,
    /// Top-K trials used for the median stable score.
    pub top_k_for_stable_score: usize,
    /// Drop trials whose artifact is not affirmatively available.
    pub require_artifact_available: bool,
    /// Source used for artifact availability.
    pub artifact_check_source: ArtifactCheckSource,
    /// Schema generation preference.
    pub prefer_schema_generation: SchemaPreference,
    /// Merge generation buckets (unsafe, explicit opt-in).
    pub allow_mixed_schema_groups: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            min_trials_per_group: DEFAULT_MIN_TRIALS_PER_GROUP,
            top_k_for_stable_score: DEFAULT_TOP_K_FOR_STABLE_SCORE,
            require_artifact_available: true,
            artifact_check_source: ArtifactCheckSource::Tag,
            prefer_schema_generation: SchemaPreference::Auto,
            allow_mixed_schema_groups: false,
        }
    }
}

impl SelectionPolicy {
    /// Validates the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ZeroCount`] when a trial count is zero.
    pub const fn validate(&self) -> Result<(), PolicyError> {
        if self.min_trials_per_group == 0 {
            return Err(PolicyError::ZeroCount("min_trials_per_group"));
        }
        if self.top_k_for_stable_score == 0 {
            return Err(PolicyError::ZeroCount("top_k_for_stable_score"));
        }
        Ok(())
    }

    /// Returns the top-K value after clamping to `min_trials_per_group`.
    #[must_use]
    pub fn effective_top_k(&self) -> usize {
        self.top_k_for_stable_score.min(self.min_trials_per_group)
    }

    /// Returns true when `top_k_for_stable_score` must be clamped.
    #[must_use]
    pub const fn top_k_exceeds_min_trials(&self) -> bool {
        self.top_k_for_stable_score > self.min_trials_per_group
    }
}
