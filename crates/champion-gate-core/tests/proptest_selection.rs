// crates/champion-gate-core/tests/proptest_selection.rs
// ============================================================================
// Module: Selection Property-Based Tests
// Description: Property tests for selection and fingerprint determinism.
// Purpose: Detect order dependence and guardrail violations across inputs.
// ============================================================================

//! Property-based tests for selection invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;

use champion_gate_core::ChampionSelector;
use champion_gate_core::Objective;
use champion_gate_core::ObjectiveDirection;
use champion_gate_core::SelectionPolicy;
use champion_gate_core::TagKeys;
use champion_gate_core::TrialRecord;
use champion_gate_core::fingerprint;
use proptest::prelude::*;
use serde::Serialize;
use serde::Serializer;

/// Map entries serialized in exactly the order given.
struct OrderedEntries(Vec<(String, i32)>);

impl Serialize for OrderedEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
    }
}

fn trial_strategy() -> impl Strategy<Value = (u8, u8, f64)> {
    (0_u8 .. 4, 1_u8 ..= 2, -1.0e3_f64 .. 1.0e3)
}

fn build_trials(raw: &[(u8, u8, f64)]) -> Vec<TrialRecord> {
    raw.iter()
        .enumerate()
        .map(|(index, (group, generation, value))| {
            TrialRecord::finished(format!("run-{index:03}"))
                .with_tag("hpo.group_key", format!("G{group}"))
                .with_tag("hpo.group_key_schema", generation.to_string())
                .with_tag("artifact.available", "true")
                .with_metric("score", *value)
        })
        .collect()
}

fn selector() -> ChampionSelector {
    ChampionSelector::new(SelectionPolicy::default(), Arc::new(TagKeys::default())).unwrap()
}

proptest! {
    #[test]
    fn selection_ignores_candidate_order(
        raw in prop::collection::vec(trial_strategy(), 0 .. 24),
        maximize in any::<bool>(),
    ) {
        let direction =
            if maximize { ObjectiveDirection::Maximize } else { ObjectiveDirection::Minimize };
        let objective = Objective::new("score", direction);
        let trials = build_trials(&raw);
        let mut reversed = trials.clone();
        reversed.reverse();
        let selector = selector();
        prop_assert_eq!(
            selector.select_champion(&trials, &objective),
            selector.select_champion(&reversed, &objective)
        );
    }

    #[test]
    fn champion_group_always_meets_guardrail(
        raw in prop::collection::vec(trial_strategy(), 0 .. 24),
    ) {
        let objective = Objective::new("score", ObjectiveDirection::Maximize);
        let trials = build_trials(&raw);
        let report = selector().select_report(&trials, &objective);
        if let Some(champion) = report.champion {
            prop_assert!(champion.group_valid_trials >= 3);
            let generation = champion.schema_generation_used;
            let champion_is_group_max = trials.iter().all(|trial| {
                trial.tag("hpo.group_key") != Some(champion.winning_group_key.as_str())
                    || trial.tag("hpo.group_key_schema") != Some(generation.as_tag())
                    || trial.metric("score").and_then(|value| value.as_finite())
                        <= Some(champion.metric_value)
            });
            prop_assert!(champion_is_group_max);
        }
    }

    #[test]
    fn fingerprint_ignores_insertion_order(
        entries in prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0 .. 8),
    ) {
        let forward = OrderedEntries(entries.iter().map(|(key, value)| (key.clone(), *value)).collect());
        let backward =
            OrderedEntries(entries.iter().rev().map(|(key, value)| (key.clone(), *value)).collect());
        if entries.len() > 1 {
            prop_assert_ne!(
                serde_json::to_string(&forward).unwrap(),
                serde_json::to_string(&backward).unwrap()
            );
        }
        prop_assert_eq!(fingerprint(&forward).unwrap(), fingerprint(&backward).unwrap());
    }
}
