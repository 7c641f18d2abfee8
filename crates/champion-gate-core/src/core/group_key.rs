// crates/champion-gate-core/src/core/group_key.rs
// ============================================================================
// Module: Champion Gate Group Keys
// Description: Versioned identity of a comparable HPO configuration cohort.
// Purpose: Bind search space, objective, budget, and fingerprints into one key.
// Dependencies: crate::core::{fingerprint, objective, tags, identifiers}, serde_json
// ============================================================================

//! ## Overview
//! A group key is the RFC 8785 canonical serialization of the fields that
//! make two HPO trials comparable. Two schema generations exist:
//!
//! - Generation 2 binds the literal data and eval fingerprints, the explicit
//!   objective direction, and a training-budget descriptor. Benchmark
//!   settings never enter the payload.
//! - Generation 1 is the legacy layout. It carries a data name/version
//!   identity instead of bound fingerprints and has no budget descriptor.
//!
//! The generation is part of the payload, so keys from different
//! generations can never collide. Trials carry the compact
//! [`GroupKey::tag_value`] rather than the full payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::core::fingerprint::ConfigFingerprint;
use crate::core::fingerprint::FingerprintError;
use crate::core::fingerprint::canonical_json_bytes;
use crate::core::fingerprint::sha256_hex;
use crate::core::identifiers::EntityId;
use crate::core::objective::Objective;
use crate::core::objective::ObjectiveError;
use crate::core::tags::TagKeyResolver;
use crate::core::tags::TagName;

// ============================================================================
// SECTION: Schema Generation
// ============================================================================

/// Group key schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SchemaGeneration {
    /// Legacy layout without bound fingerprints.
    V1,
    /// Layout binding data/eval fingerprints and the training budget.
    V2,
}

impl SchemaGeneration {
    /// Returns the numeric generation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Returns the tag spelling (`"1"` or `"2"`).
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }

    /// Parses a schema-generation tag value. Accepts `2` and `v2` forms.
    #[must_use]
    pub fn parse_tag(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        match digits {
            "1" => Some(Self::V1),
            "2" => Some(Self::V2),
            _ => None,
        }
    }
}

impl From<SchemaGeneration> for u8 {
    fn from(value: SchemaGeneration) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for SchemaGeneration {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(format!("unsupported schema generation: {other}")),
        }
    }
}

impl fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when building a group key.
#[derive(Debug, Error)]
pub enum GroupKeyError {
    /// Objective direction is absent from the HPO config.
    #[error("missing objective direction: {0}")]
    MissingDirection(String),
    /// Objective block is otherwise malformed.
    #[error("invalid objective: {0}")]
    InvalidObjective(String),
    /// Generation 2 requires both bound fingerprints.
    #[error("schema generation 2 requires {0}")]
    MissingFingerprint(&'static str),
    /// Inputs could not be serialized or are malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<ObjectiveError> for GroupKeyError {
    fn from(error: ObjectiveError) -> Self {
        match error {
            ObjectiveError::MissingDirection(field) => Self::MissingDirection(field),
            other => Self::InvalidObjective(other.to_string()),
        }
    }
}

impl From<FingerprintError> for GroupKeyError {
    fn from(error: FingerprintError) -> Self {
        Self::InvalidConfig(error.to_string())
    }
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Inputs for [`build_group_key`]. Configs are already-parsed mappings.
#[derive(Debug, Clone, Copy)]
pub struct GroupKeyInputs<'a> {
    /// Data configuration.
    pub data_config: &'a Value,
    /// HPO configuration (search space and objective block).
    pub hpo_config: &'a Value,
    /// Training configuration (budget and seed policy).
    pub train_config: &'a Value,
    /// Model / backbone name.
    pub model_name: &'a str,
    /// Data fingerprint, required for generation 2.
    pub data_fingerprint: Option<&'a ConfigFingerprint>,
    /// Evaluation fingerprint, required for generation 2.
    pub eval_fingerprint: Option<&'a ConfigFingerprint>,
    /// Schema generation to emit.
    pub schema_generation: SchemaGeneration,
}

// ============================================================================
// SECTION: Group Key
// ============================================================================

/// Versioned, canonical group key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    /// Schema generation of the payload.
    generation: SchemaGeneration,
    /// Objective captured in the payload.
    objective: Objective,
    /// Canonical JSON payload.
    payload: String,
    /// SHA-256 of the payload, lowercase hex.
    digest: String,
}

impl GroupKey {
    /// Returns the schema generation.
    #[must_use]
    pub const fn generation(&self) -> SchemaGeneration {
        self.generation
    }

    /// Returns the objective bound into the key.
    #[must_use]
    pub const fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Returns the canonical payload (sorted keys, compact separators).
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the compact identity stored in trial tags.
    #[must_use]
    pub fn tag_value(&self) -> String {
        format!("g{}:{}", self.generation.as_u8(), self.digest)
    }

    /// Returns the identity tags a training stage writes on each trial.
    #[must_use]
    pub fn identity_tags(
        &self,
        resolver: &dyn TagKeyResolver,
        entity: &EntityId,
    ) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert(resolver.key(TagName::GroupKey).to_string(), self.tag_value());
        tags.insert(
            resolver.key(TagName::SchemaGeneration).to_string(),
            self.generation.as_tag().to_string(),
        );
        tags.insert(
            resolver.key(TagName::ObjectiveDirection).to_string(),
            self.objective.direction.as_str().to_string(),
        );
        tags.insert(resolver.key(TagName::Entity).to_string(), entity.to_string());
        tags
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag_value())
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds the group key for a configuration cohort.
///
/// # Errors
///
/// Returns [`GroupKeyError::MissingDirection`] when the HPO objective has no
/// direction, [`GroupKeyError::MissingFingerprint`] when generation 2 lacks a
/// fingerprint, and [`GroupKeyError::InvalidConfig`] for malformed inputs.
pub fn build_group_key(inputs: &GroupKeyInputs<'_>) -> Result<GroupKey, GroupKeyError> {
    let objective_block = inputs.hpo_config.get("objective").unwrap_or(&Value::Null);
    let objective = Objective::from_block(objective_block)?;
    let model_name = inputs.model_name.trim();
    if model_name.is_empty() {
        return Err(GroupKeyError::InvalidConfig("model_name must be non-empty".to_string()));
    }
    let search_space = inputs.hpo_config.get("search_space").cloned().unwrap_or(Value::Null);
    let objective_payload = json!({
        "metric": objective.metric,
        "direction": objective.direction.as_str(),
    });

    let payload = match inputs.schema_generation {
        SchemaGeneration::V2 => {
            let data_fingerprint = inputs
                .data_fingerprint
                .ok_or(GroupKeyError::MissingFingerprint("data_fingerprint"))?;
            let eval_fingerprint = inputs
                .eval_fingerprint
                .ok_or(GroupKeyError::MissingFingerprint("eval_fingerprint"))?;
            json!({
                "schema_generation": SchemaGeneration::V2.as_u8(),
                "model": model_name,
                "search_space": search_space,
                "objective": objective_payload,
                "training_budget": training_budget(inputs.train_config),
                "data_fingerprint": data_fingerprint.as_str(),
                "eval_fingerprint": eval_fingerprint.as_str(),
            })
        }
        SchemaGeneration::V1 => json!({
            "schema_generation": SchemaGeneration::V1.as_u8(),
            "model": model_name,
            "search_space": search_space,
            "objective": objective_payload,
            "data": {
                "name": inputs.data_config.get("name").cloned().unwrap_or(Value::Null),
                "version": inputs.data_config.get("version").cloned().unwrap_or(Value::Null),
            },
        }),
    };

    let bytes = canonical_json_bytes(&payload)?;
    let digest = sha256_hex(&bytes);
    let payload = String::from_utf8(bytes)
        .map_err(|_| GroupKeyError::InvalidConfig("canonical payload is not utf-8".to_string()))?;
    Ok(GroupKey {
        generation: inputs.schema_generation,
        objective,
        payload,
        digest,
    })
}

/// Extracts the training-budget descriptor from the training config.
fn training_budget(train_config: &Value) -> Value {
    let max_steps = train_config.get("max_steps").cloned().unwrap_or(Value::Null);
    let max_epochs = train_config
        .get("max_epochs")
        .or_else(|| train_config.get("epochs"))
        .cloned()
        .unwrap_or(Value::Null);
    let seed_policy = match train_config.get("seed_policy").and_then(Value::as_str) {
        Some(policy) => policy.to_string(),
        None if train_config.get("seed").is_some_and(|seed| !seed.is_null()) => {
            "fixed".to_string()
        }
        None => "unspecified".to_string(),
    };
    json!({
        "max_steps": max_steps,
        "max_epochs": max_epochs,
        "seed_policy": seed_policy,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::SchemaGeneration;
    use super::training_budget;

    #[test]
    fn schema_generation_tag_parsing_accepts_prefixed_forms() {
        assert_eq!(SchemaGeneration::parse_tag("2"), Some(SchemaGeneration::V2));
        assert_eq!(SchemaGeneration::parse_tag(" v1 "), Some(SchemaGeneration::V1));
        assert_eq!(SchemaGeneration::parse_tag("3"), None);
        assert_eq!(SchemaGeneration::parse_tag(""), None);
    }

    #[test]
    fn training_budget_prefers_max_epochs_over_epochs() {
        let budget = training_budget(&json!({"max_epochs": 5, "epochs": 9}));
        assert_eq!(budget["max_epochs"], json!(5));
        let budget = training_budget(&json!({"epochs": 9}));
        assert_eq!(budget["max_epochs"], json!(9));
    }

    #[test]
    fn training_budget_derives_seed_policy() {
        assert_eq!(training_budget(&json!({"seed": 7}))["seed_policy"], json!("fixed"));
        assert_eq!(training_budget(&json!({}))["seed_policy"], json!("unspecified"));
        assert_eq!(
            training_budget(&json!({"seed": 7, "seed_policy": "per_trial"}))["seed_policy"],
            json!("per_trial")
        );
    }
}
