// crates/champion-gate-core/src/runtime/selector.rs
// ============================================================================
// Module: Champion Gate Selector
// Description: Group-aware champion selection with a winner's-curse guardrail.
// Purpose: Pick one winning trial per entity deterministically.
// Dependencies: crate::{core, interfaces, runtime::{artifact, audit}}
// ============================================================================

//! ## Overview
//! Selection is a pure function of the candidate trials, the objective, and
//! the policy. Trials are filtered (status, artifact), partitioned by schema
//! generation, reduced to one generation bucket, grouped by group key, and
//! scored. Only groups with at least `min_trials_per_group` valid trials can
//! win; the winner is the group with the best median of its top-K metrics,
//! and within it the trial with the best metric.
//!
//! Security posture: trial tags and metrics are untrusted. Malformed values
//! exclude the trial and are logged; they never raise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::Champion;
use crate::core::EntityId;
use crate::core::ExclusionReason;
use crate::core::GroupSummary;
use crate::core::GroupVerdict;
use crate::core::MetricValue;
use crate::core::Objective;
use crate::core::ObjectiveDirection;
use crate::core::PolicyError;
use crate::core::SchemaGeneration;
use crate::core::SelectionPolicy;
use crate::core::SelectionReport;
use crate::core::TagKeyResolver;
use crate::core::TagName;
use crate::core::TrialExclusion;
use crate::core::TrialRecord;
use crate::core::TrialStatus;
use crate::runtime::artifact::ArtifactProbeChain;
use crate::runtime::audit::AuditRecord;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::SelectionAuditSink;
use crate::runtime::audit::SelectionEvent;

// ============================================================================
// SECTION: Selector
// ============================================================================

/// Champion selector configured with a policy and injected capabilities.
pub struct ChampionSelector {
    /// Validated selection policy.
    policy: SelectionPolicy,
    /// Tag key resolver.
    tags: Arc<dyn TagKeyResolver + Send + Sync>,
    /// Artifact availability probes.
    artifacts: ArtifactProbeChain,
    /// Audit sink for selection events.
    audit: Arc<dyn SelectionAuditSink>,
}

impl ChampionSelector {
    /// Creates a selector with a tag-driven artifact chain and no audit output.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the policy is invalid.
    pub fn new(
        policy: SelectionPolicy,
        tags: Arc<dyn TagKeyResolver + Send + Sync>,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;
        let artifacts = ArtifactProbeChain::for_source(
            policy.artifact_check_source,
            tags.as_ref(),
            &PathBuf::new(),
        );
        Ok(Self {
            policy,
            tags,
            artifacts,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Returns the selector with an audit sink attached.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn SelectionAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the selector with relative artifact paths resolved under `root`.
    #[must_use]
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifacts = ArtifactProbeChain::for_source(
            self.policy.artifact_check_source,
            self.tags.as_ref(),
            &root.into(),
        );
        self
    }

    /// Returns the selector with an explicit artifact probe chain.
    #[must_use]
    pub fn with_artifact_probes(mut self, artifacts: ArtifactProbeChain) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Returns the selection policy.
    #[must_use]
    pub const fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Selects the champion, or `None` when no group survives.
    #[must_use]
    pub fn select_champion(
        &self,
        candidates: &[TrialRecord],
        objective: &Objective,
    ) -> Option<Champion> {
        self.run(None, candidates, objective).champion
    }

    /// Selects the champion and returns full per-group diagnostics.
    #[must_use]
    pub fn select_report(&self, candidates: &[TrialRecord], objective: &Objective) -> SelectionReport {
        self.run(None, candidates, objective)
    }

    /// Same as [`Self::select_report`], tagging audit records with `entity`.
    #[must_use]
    pub fn select_report_for(
        &self,
        entity: &EntityId,
        candidates: &[TrialRecord],
        objective: &Objective,
    ) -> SelectionReport {
        self.run(Some(entity), candidates, objective)
    }

    /// Runs the full selection pipeline.
    fn run(
        &self,
        entity: Option<&EntityId>,
        candidates: &[TrialRecord],
        objective: &Objective,
    ) -> SelectionReport {
        let mut pass = SelectionPass {
            entity,
            audit: self.audit.as_ref(),
            exclusions: Vec::new(),
        };

        let effective_top_k = self.policy.effective_top_k();
        if self.policy.top_k_exceeds_min_trials() {
            pass.emit(SelectionEvent::TopKClamped {
                configured: self.policy.top_k_for_stable_score,
                min_trials_per_group: self.policy.min_trials_per_group,
                effective: effective_top_k,
            });
        }

        let eligible = self.filter_artifacts(&mut pass, candidates);
        let buckets = self.partition_by_generation(&mut pass, eligible);
        let (selected, generation_used) = self.select_generation(&mut pass, buckets);
        let groups = self.group_trials(&mut pass, selected, objective);

        let mut summaries = Vec::with_capacity(groups.len());
        let mut best: Option<ScoredGroup<'_>> = None;
        for ((group_key, generation), mut group) in groups {
            group.valid.sort_by(|a, b| {
                objective.direction.rank(a.0, b.0).then_with(|| a.1.run_id.cmp(&b.1.run_id))
            });
            if group.valid.len() < self.policy.min_trials_per_group {
                pass.emit(SelectionEvent::GroupDiscarded {
                    group_key: group_key.clone(),
                    schema_generation: generation,
                    valid_trials: group.valid.len(),
                    excluded_trials: group.excluded,
                    min_trials_per_group: self.policy.min_trials_per_group,
                });
                summaries.push(GroupSummary {
                    group_key,
                    schema_generation: generation,
                    valid_trials: group.valid.len(),
                    excluded_trials: group.excluded,
                    verdict: GroupVerdict::BelowMinTrials,
                    best_metric: None,
                    stable_score: None,
                });
                continue;
            }
            let Some(&(best_metric, best_trial)) = group.valid.first() else {
                continue;
            };
            let k = effective_top_k.min(group.valid.len());
            let top: Vec<f64> = group.valid.iter().take(k).map(|(value, _)| *value).collect();
            let stable_score = median(&top);
            pass.emit(SelectionEvent::GroupScored {
                group_key: group_key.clone(),
                schema_generation: generation,
                valid_trials: group.valid.len(),
                excluded_trials: group.excluded,
                best_metric,
                stable_score,
            });
            summaries.push(GroupSummary {
                group_key: group_key.clone(),
                schema_generation: generation,
                valid_trials: group.valid.len(),
                excluded_trials: group.excluded,
                verdict: GroupVerdict::Eligible,
                best_metric: Some(best_metric),
                stable_score: Some(stable_score),
            });
            let scored = ScoredGroup {
                group_key,
                generation,
                stable_score,
                best_metric,
                best_trial,
                valid_trials: group.valid.len(),
            };
            best = match best {
                Some(incumbent)
                    if compare_groups(objective.direction, &incumbent, &scored)
                        != Ordering::Greater =>
                {
                    Some(incumbent)
                }
                _ => Some(scored),
            };
        }

        let champion = best.map(|group| Champion {
            run_id: group.best_trial.run_id.clone(),
            winning_group_key: group.group_key,
            schema_generation_used: group.generation,
            metric_value: group.best_metric,
            stable_score: group.stable_score,
            group_valid_trials: group.valid_trials,
            display_label: group
                .best_trial
                .tag(self.tags.key(TagName::TrialLabel))
                .map(ToString::to_string),
        });
        match &champion {
            Some(champion) => pass.emit(SelectionEvent::ChampionSelected {
                run_id: champion.run_id.clone(),
                group_key: champion.winning_group_key.clone(),
                metric_value: champion.metric_value,
                stable_score: champion.stable_score,
            }),
            None => pass.emit(SelectionEvent::NoChampion {
                candidates: candidates.len(),
                groups: summaries.len(),
            }),
        }

        SelectionReport {
            champion,
            generation_used,
            mixed_schema_groups: self.policy.allow_mixed_schema_groups,
            effective_top_k,
            groups: summaries,
            exclusions: pass.exclusions,
        }
    }

    /// Drops non-finished trials and, when required, trials without artifacts.
    fn filter_artifacts<'t>(
        &self,
        pass: &mut SelectionPass<'_>,
        candidates: &'t [TrialRecord],
    ) -> Vec<&'t TrialRecord> {
        let mut kept = Vec::with_capacity(candidates.len());
        let mut not_finished = 0;
        let mut artifact_unavailable = 0;
        let mut decided_by: BTreeMap<&'static str, usize> = BTreeMap::new();
        for trial in candidates {
            if trial.status != TrialStatus::Finished {
                not_finished += 1;
                pass.exclude(trial, ExclusionReason::NotFinished, None);
                continue;
            }
            if self.policy.require_artifact_available {
                let decision = self.artifacts.check(trial);
                *decided_by.entry(decision.probe.unwrap_or("none")).or_default() += 1;
                if !decision.is_available() {
                    artifact_unavailable += 1;
                    pass.exclude(trial, ExclusionReason::ArtifactUnavailable, decision.probe);
                    continue;
                }
            }
            kept.push(trial);
        }
        pass.emit(SelectionEvent::ArtifactFilter {
            required: self.policy.require_artifact_available,
            source: self.policy.artifact_check_source,
            kept: kept.len(),
            not_finished,
            artifact_unavailable,
            decided_by,
        });
        kept
    }

    /// Partitions trials by schema generation tag. Absent tags mean generation 1.
    fn partition_by_generation<'t>(
        &self,
        pass: &mut SelectionPass<'_>,
        trials: Vec<&'t TrialRecord>,
    ) -> BTreeMap<SchemaGeneration, Vec<&'t TrialRecord>> {
        let schema_key = self.tags.key(TagName::SchemaGeneration);
        let mut buckets: BTreeMap<SchemaGeneration, Vec<&TrialRecord>> = BTreeMap::new();
        for trial in trials {
            let generation = match trial.tag(schema_key) {
                None => SchemaGeneration::V1,
                Some(raw) => {
                    if let Some(generation) = SchemaGeneration::parse_tag(raw) {
                        generation
                    } else {
                        pass.exclude(trial, ExclusionReason::UnknownSchemaGeneration, None);
                        continue;
                    }
                }
            };
            buckets.entry(generation).or_default().push(trial);
        }
        buckets
    }

    /// Picks one generation bucket, or merges them in mixed mode.
    fn select_generation<'t>(
        &self,
        pass: &mut SelectionPass<'_>,
        mut buckets: BTreeMap<SchemaGeneration, Vec<&'t TrialRecord>>,
    ) -> (Vec<(SchemaGeneration, &'t TrialRecord)>, Option<SchemaGeneration>) {
        if self.policy.allow_mixed_schema_groups {
            let merged: Vec<(SchemaGeneration, &TrialRecord)> = buckets
                .into_iter()
                .flat_map(|(generation, trials)| {
                    trials.into_iter().map(move |trial| (generation, trial))
                })
                .collect();
            pass.emit(SelectionEvent::MixedSchemaGroups {
                candidates: merged.len(),
            });
            return (merged, None);
        }

        let preference = self.policy.prefer_schema_generation;
        let chosen = preference
            .strategy_order()
            .iter()
            .copied()
            .find(|generation| buckets.get(generation).is_some_and(|trials| !trials.is_empty()));
        let Some(generation) = chosen else {
            for trial in buckets.into_values().flatten() {
                pass.exclude(trial, ExclusionReason::GenerationNotSelected, None);
            }
            return (Vec::new(), None);
        };
        let selected = buckets.remove(&generation).unwrap_or_default();
        for trial in buckets.into_values().flatten() {
            pass.exclude(trial, ExclusionReason::GenerationNotSelected, None);
        }
        pass.emit(SelectionEvent::GenerationStrategy {
            preference,
            generation,
            candidates: selected.len(),
        });
        (selected.into_iter().map(|trial| (generation, trial)).collect(), Some(generation))
    }

    /// Groups trials by (group key, generation) and extracts objective metrics.
    fn group_trials<'t>(
        &self,
        pass: &mut SelectionPass<'_>,
        trials: Vec<(SchemaGeneration, &'t TrialRecord)>,
        objective: &Objective,
    ) -> BTreeMap<(String, SchemaGeneration), GroupAccumulator<'t>> {
        let group_tag = self.tags.key(TagName::GroupKey);
        let direction_tag = self.tags.key(TagName::ObjectiveDirection);
        let mut groups: BTreeMap<(String, SchemaGeneration), GroupAccumulator<'t>> =
            BTreeMap::new();
        for (generation, trial) in trials {
            if let Some(raw) = trial.tag(direction_tag)
                && ObjectiveDirection::parse(raw).ok() != Some(objective.direction)
            {
                pass.exclude(trial, ExclusionReason::DirectionMismatch, None);
                continue;
            }
            let Some(group_key) = trial.tag(group_tag).filter(|key| !key.is_empty()) else {
                pass.exclude(trial, ExclusionReason::MissingGroupKey, None);
                continue;
            };
            let group = groups.entry((group_key.to_string(), generation)).or_default();
            match metric_value(trial, &objective.metric) {
                Ok(value) => group.valid.push((value, trial)),
                Err(reason) => {
                    group.excluded += 1;
                    pass.exclude(trial, reason, None);
                }
            }
        }
        groups
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Mutable state for one selection call.
struct SelectionPass<'a> {
    /// Entity being selected for.
    entity: Option<&'a EntityId>,
    /// Audit sink.
    audit: &'a dyn SelectionAuditSink,
    /// Exclusions in encounter order.
    exclusions: Vec<TrialExclusion>,
}

impl SelectionPass<'_> {
    /// Emits an audit event.
    fn emit(&self, event: SelectionEvent) {
        self.audit.record(&AuditRecord::new(self.entity, event));
    }

    /// Records and logs a trial exclusion.
    fn exclude(
        &mut self,
        trial: &TrialRecord,
        reason: ExclusionReason,
        probe: Option<&'static str>,
    ) {
        self.exclusions.push(TrialExclusion {
            run_id: trial.run_id.clone(),
            reason,
        });
        self.emit(SelectionEvent::TrialExcluded {
            run_id: trial.run_id.clone(),
            reason,
            probe,
        });
    }
}

/// Trials collected for one group.
#[derive(Default)]
struct GroupAccumulator<'t> {
    /// Valid (metric, trial) pairs.
    valid: Vec<(f64, &'t TrialRecord)>,
    /// Trials excluded for metric problems.
    excluded: usize,
}

/// Eligible group with its scores.
struct ScoredGroup<'t> {
    /// Group key tag value.
    group_key: String,
    /// Schema generation.
    generation: SchemaGeneration,
    /// Median of the top-K metrics.
    stable_score: f64,
    /// Best metric in the group.
    best_metric: f64,
    /// Trial holding the best metric.
    best_trial: &'t TrialRecord,
    /// Valid trials in the group.
    valid_trials: usize,
}

/// Orders groups so that `Less` means `a` wins.
fn compare_groups(direction: ObjectiveDirection, a: &ScoredGroup<'_>, b: &ScoredGroup<'_>) -> Ordering {
    direction
        .rank(a.stable_score, b.stable_score)
        .then_with(|| direction.rank(a.best_metric, b.best_metric))
        .then_with(|| a.group_key.cmp(&b.group_key))
        .then_with(|| a.generation.cmp(&b.generation))
}

/// Extracts a finite objective metric or the reason it is unusable.
fn metric_value(trial: &TrialRecord, metric: &str) -> Result<f64, ExclusionReason> {
    match trial.metric(metric) {
        None => Err(ExclusionReason::MissingMetric),
        Some(MetricValue::Text(_)) => Err(ExclusionReason::NonNumericMetric),
        Some(MetricValue::NonFinite(_)) => Err(ExclusionReason::NonFiniteMetric),
        Some(value @ MetricValue::Number(_)) => {
            value.as_finite().ok_or(ExclusionReason::NonFiniteMetric)
        }
    }
}

/// Median of a non-empty slice; mean of the two middle values for even sizes.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.is_empty() {
        f64::NAN
    } else if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        f64::midpoint(sorted[mid - 1], sorted[mid])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
