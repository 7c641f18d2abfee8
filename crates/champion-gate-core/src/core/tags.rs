// crates/champion-gate-core/src/core/tags.rs
// ============================================================================
// Module: Champion Gate Tag Keys
// Description: Logical tag names and the injected resolver mapping them to keys.
// Purpose: Keep tracking-store tag spellings out of selection logic.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Selection reads a handful of tags from every trial. Their concrete key
//! strings belong to the deployment, so they are resolved through a
//! [`TagKeyResolver`] passed in explicitly rather than looked up in a global
//! registry. [`TagKeys`] is the fixed-mapping implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Tag Names
// ============================================================================

/// Logical tags consumed or produced by champion selection and gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagName {
    /// Group key identity of the trial's configuration cohort.
    GroupKey,
    /// Group key schema generation marker.
    SchemaGeneration,
    /// Objective direction the trial was optimized toward.
    ObjectiveDirection,
    /// Artifact-availability flag.
    ArtifactAvailable,
    /// Artifact location relative to the artifact root.
    ArtifactPath,
    /// Entity (model backbone) name.
    Entity,
    /// Display-only trial label.
    TrialLabel,
    /// Benchmark idempotency key on benchmark records.
    BenchmarkKey,
}

/// Resolves logical tag names to tracking-store tag keys.
pub trait TagKeyResolver {
    /// Returns the tag key for the logical tag.
    fn key(&self, tag: TagName) -> &str;
}

// ============================================================================
// SECTION: Fixed Mapping
// ============================================================================

/// Fixed tag-key mapping, typically built from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagKeys {
    /// Group key tag.
    pub group_key: String,
    /// Schema generation tag.
    pub schema_generation: String,
    /// Objective direction tag.
    pub objective_direction: String,
    /// Artifact availability tag.
    pub artifact_available: String,
    /// Artifact path tag.
    pub artifact_path: String,
    /// Entity tag.
    pub entity: String,
    /// Trial label tag.
    pub trial_label: String,
    /// Benchmark key tag.
    pub benchmark_key: String,
}

impl Default for TagKeys {
    fn default() -> Self {
        Self {
            group_key: "hpo.group_key".to_string(),
            schema_generation: "hpo.group_key_schema".to_string(),
            objective_direction: "hpo.objective_direction".to_string(),
            artifact_available: "artifact.available".to_string(),
            artifact_path: "artifact.path".to_string(),
            entity: "model.backbone".to_string(),
            trial_label: "hpo.trial_label".to_string(),
            benchmark_key: "benchmark.key".to_string(),
        }
    }
}

impl TagKeyResolver for TagKeys {
    fn key(&self, tag: TagName) -> &str {
        match tag {
            TagName::GroupKey => &self.group_key,
            TagName::SchemaGeneration => &self.schema_generation,
            TagName::ObjectiveDirection => &self.objective_direction,
            TagName::ArtifactAvailable => &self.artifact_available,
            TagName::ArtifactPath => &self.artifact_path,
            TagName::Entity => &self.entity,
            TagName::TrialLabel => &self.trial_label,
            TagName::BenchmarkKey => &self.benchmark_key,
        }
    }
}
