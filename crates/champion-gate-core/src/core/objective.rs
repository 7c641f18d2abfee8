// crates/champion-gate-core/src/core/objective.rs
// ============================================================================
// Module: Champion Gate Objective
// Description: Objective metric and explicit optimization direction.
// Purpose: Make direction-aware comparisons impossible without a direction.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The objective names the metric being optimized and whether larger or
//! smaller values are better. Direction is never defaulted: parsing an
//! objective block without a direction is a [`ObjectiveError::MissingDirection`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when reading an objective block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectiveError {
    /// Objective direction is absent.
    #[error("objective direction is missing: {0}")]
    MissingDirection(String),
    /// Objective direction is not `maximize` or `minimize`.
    #[error("unsupported objective direction: {0}")]
    InvalidDirection(String),
    /// Objective metric name is absent or empty.
    #[error("objective metric is missing: {0}")]
    MissingMetric(String),
}

// ============================================================================
// SECTION: Direction
// ============================================================================

/// Optimization direction for the objective metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveDirection {
    /// Larger values are better.
    Maximize,
    /// Smaller values are better.
    Minimize,
}

impl ObjectiveDirection {
    /// Parses a direction label.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectiveError::InvalidDirection`] for unknown labels.
    pub fn parse(label: &str) -> Result<Self, ObjectiveError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "maximize" | "max" => Ok(Self::Maximize),
            "minimize" | "min" => Ok(Self::Minimize),
            other => Err(ObjectiveError::InvalidDirection(other.to_string())),
        }
    }

    /// Returns the canonical label embedded in group keys and tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Maximize => "maximize",
            Self::Minimize => "minimize",
        }
    }

    /// Orders two values so that `Ordering::Less` means `a` is better.
    #[must_use]
    pub fn rank(self, a: f64, b: f64) -> Ordering {
        match self {
            Self::Maximize => b.total_cmp(&a),
            Self::Minimize => a.total_cmp(&b),
        }
    }

    /// Returns true when `candidate` is strictly better than `incumbent`.
    #[must_use]
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        self.rank(candidate, incumbent) == Ordering::Less
    }
}

impl fmt::Display for ObjectiveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Objective
// ============================================================================

/// Objective metric plus explicit direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Metric name read from each trial record.
    pub metric: String,
    /// Optimization direction.
    pub direction: ObjectiveDirection,
}

impl Objective {
    /// Creates an objective.
    #[must_use]
    pub fn new(metric: impl Into<String>, direction: ObjectiveDirection) -> Self {
        Self {
            metric: metric.into(),
            direction,
        }
    }

    /// Reads an `{metric, direction}` block from an already-parsed mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectiveError`] when the direction or metric is absent, or
    /// when the direction label is unsupported. Direction is checked first,
    /// so a missing block reports a missing direction.
    pub fn from_block(block: &Value) -> Result<Self, ObjectiveError> {
        let direction = match block.get("direction") {
            None | Some(Value::Null) => {
                return Err(ObjectiveError::MissingDirection("objective.direction".to_string()));
            }
            Some(Value::String(label)) => ObjectiveDirection::parse(label)?,
            Some(other) => return Err(ObjectiveError::InvalidDirection(other.to_string())),
        };
        let metric = block
            .get("metric")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|metric| !metric.is_empty())
            .ok_or_else(|| ObjectiveError::MissingMetric("objective.metric".to_string()))?;
        Ok(Self::new(metric, direction))
    }
}
