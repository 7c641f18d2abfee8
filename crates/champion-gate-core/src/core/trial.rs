// crates/champion-gate-core/src/core/trial.rs
// ============================================================================
// Module: Champion Gate Trial Records
// Description: Completed HPO trial records as returned by the tracking store.
// Purpose: Carry run identity, tags, metrics, and status into selection.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A [`TrialRecord`] is created by the training process when a trial ends and
//! is immutable from this crate's point of view. Metrics may be missing,
//! non-numeric, or non-finite; [`MetricValue`] keeps those cases distinct so
//! they survive JSON persistence and are still excluded from scoring.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Lifecycle status of a trial run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    /// Trial completed; eligible for selection.
    Finished,
    /// Trial still executing.
    Running,
    /// Trial terminated with an error.
    Failed,
}

impl TrialStatus {
    /// Returns the stable label used by stores.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }

    /// Parses a stable status label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "finished" => Some(Self::Finished),
            "running" => Some(Self::Running),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Metric Values
// ============================================================================

/// Non-finite float markers, serialized with their JSON-safe spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonFiniteMetric {
    /// Not a number.
    #[serde(rename = "NaN")]
    Nan,
    /// Positive infinity.
    #[serde(rename = "Infinity")]
    PositiveInfinity,
    /// Negative infinity.
    #[serde(rename = "-Infinity")]
    NegativeInfinity,
}

/// Recorded value of one metric on one trial.
///
/// # Invariants
/// - [`MetricValue::from_f64`] never produces a non-finite `Number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric metric value.
    Number(f64),
    /// NaN or infinite metric value.
    NonFinite(NonFiniteMetric),
    /// Non-numeric metric value.
    Text(String),
}

impl MetricValue {
    /// Wraps a float, routing NaN and infinities to [`MetricValue::NonFinite`].
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Self::NonFinite(NonFiniteMetric::Nan)
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                Self::NonFinite(NonFiniteMetric::PositiveInfinity)
            } else {
                Self::NonFinite(NonFiniteMetric::NegativeInfinity)
            }
        } else {
            Self::Number(value)
        }
    }

    /// Returns the value when it is a finite number.
    #[must_use]
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Returns a copy with non-finite numbers moved to [`MetricValue::NonFinite`].
    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Self::Number(value) => Self::from_f64(*value),
            other => other.clone(),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

// ============================================================================
// SECTION: Trial Record
// ============================================================================

/// One optimization trial as stored in the tracking store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Stable run identifier.
    pub run_id: RunId,
    /// Tag map (group key, schema generation, direction, artifact flag, backbone).
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Metric map keyed by metric name.
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
    /// Trial status.
    pub status: TrialStatus,
}

impl TrialRecord {
    /// Creates a finished trial with no tags or metrics.
    #[must_use]
    pub fn finished(run_id: impl Into<RunId>) -> Self {
        Self {
            run_id: run_id.into(),
            tags: BTreeMap::new(),
            metrics: BTreeMap::new(),
            status: TrialStatus::Finished,
        }
    }

    /// Returns the record with a tag set.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Returns the record with a metric set.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }

    /// Returns the record with a status set.
    #[must_use]
    pub fn with_status(mut self, status: TrialStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns a tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns the metric value when present.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.get(name)
    }

    /// Returns true when every required tag matches exactly.
    #[must_use]
    pub fn matches_tags(&self, required: &BTreeMap<String, String>) -> bool {
        required.iter().all(|(key, value)| self.tag(key) == Some(value.as_str()))
    }

    /// Returns a copy whose metrics are JSON-safe.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            run_id: self.run_id.clone(),
            tags: self.tags.clone(),
            metrics: self
                .metrics
                .iter()
                .map(|(name, value)| (name.clone(), value.normalized()))
                .collect(),
            status: self.status,
        }
    }
}
