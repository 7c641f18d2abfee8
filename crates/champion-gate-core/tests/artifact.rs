// crates/champion-gate-core/tests/artifact.rs
// ============================================================================
// Module: Artifact Probe Tests
// Description: Tests for tag and disk artifact availability probes.
// Purpose: Validate probe answers and chain ordering.
// Dependencies: champion-gate-core, tempfile
// ============================================================================
//! ## Overview
//! Ensures artifact probes only report availability affirmatively and that
//! the chain reports which probe decided.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use champion_gate_core::ArtifactCheckSource;
use champion_gate_core::ArtifactProbe;
use champion_gate_core::ArtifactStatus;
use champion_gate_core::ChampionSelector;
use champion_gate_core::Objective;
use champion_gate_core::ObjectiveDirection;
use champion_gate_core::SelectionPolicy;
use champion_gate_core::TagKeys;
use champion_gate_core::TrialRecord;
use champion_gate_core::runtime::ArtifactProbeChain;
use champion_gate_core::runtime::DiskArtifactProbe;
use champion_gate_core::runtime::MemoryAuditSink;
use champion_gate_core::runtime::SelectionEvent;
use champion_gate_core::runtime::TagArtifactProbe;

/// Verifies tag spellings map to definite answers.
#[test]
fn tag_probe_parses_boolean_spellings() {
    let probe = TagArtifactProbe::new("artifact.available");
    for (value, expected) in [
        ("true", ArtifactStatus::Available),
        ("YES", ArtifactStatus::Available),
        ("1", ArtifactStatus::Available),
        ("false", ArtifactStatus::Unavailable),
        ("no", ArtifactStatus::Unavailable),
        ("0", ArtifactStatus::Unavailable),
        ("maybe", ArtifactStatus::Unknown),
    ] {
        let trial = TrialRecord::finished("a").with_tag("artifact.available", value);
        assert_eq!(probe.check(&trial), expected, "value {value}");
    }
    assert_eq!(probe.check(&TrialRecord::finished("a")), ArtifactStatus::Unknown);
}

/// Verifies the disk probe resolves relative paths under the root.
#[test]
fn disk_probe_checks_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ckpt.bin"), b"weights").unwrap();
    let probe = DiskArtifactProbe::new(dir.path(), "artifact.path");
    let present = TrialRecord::finished("a").with_tag("artifact.path", "ckpt.bin");
    let missing = TrialRecord::finished("b").with_tag("artifact.path", "gone.bin");
    assert_eq!(probe.check(&present), ArtifactStatus::Available);
    assert_eq!(probe.check(&missing), ArtifactStatus::Unavailable);
    assert_eq!(probe.check(&TrialRecord::finished("c")), ArtifactStatus::Unknown);
}

/// Verifies the tag-then-disk chain falls through inconclusive tags.
#[test]
fn chain_falls_through_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ckpt.bin"), b"weights").unwrap();
    let chain =
        ArtifactProbeChain::for_source(ArtifactCheckSource::TagThenDisk, &TagKeys::default(), dir.path());
    assert_eq!(chain.probe_names(), vec!["tag", "disk"]);

    let tagged = TrialRecord::finished("a").with_tag("artifact.available", "false");
    let decision = chain.check(&tagged);
    assert_eq!(decision.status, ArtifactStatus::Unavailable);
    assert_eq!(decision.probe, Some("tag"));

    let on_disk = TrialRecord::finished("b").with_tag("artifact.path", "ckpt.bin");
    let decision = chain.check(&on_disk);
    assert!(decision.is_available());
    assert_eq!(decision.probe, Some("disk"));

    let unknown = chain.check(&TrialRecord::finished("c"));
    assert_eq!(unknown.probe, None);
    assert!(!unknown.is_available());
}

/// Verifies the selector resolves artifact paths under its configured root.
#[test]
fn selector_uses_artifact_root() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        std::fs::write(dir.path().join(name), b"weights").unwrap();
    }
    let policy = SelectionPolicy {
        artifact_check_source: ArtifactCheckSource::Disk,
        ..SelectionPolicy::default()
    };
    let candidates: Vec<_> = [("a", 0.7), ("b", 0.8), ("c", 0.9)]
        .into_iter()
        .map(|(run_id, score)| {
            TrialRecord::finished(run_id)
                .with_tag("hpo.group_key", "G1")
                .with_tag("artifact.path", format!("{run_id}.bin"))
                .with_metric("f1", score)
        })
        .collect();
    let objective = Objective::new("f1", ObjectiveDirection::Maximize);
    let selector = ChampionSelector::new(policy, Arc::new(TagKeys::default()))
        .unwrap()
        .with_artifact_root(dir.path());
    assert_eq!(selector.select_champion(&candidates, &objective).unwrap().run_id.as_str(), "c");
}

/// Verifies the audit trail names the probe that admitted each trial.
#[test]
fn artifact_filter_records_deciding_probe() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        std::fs::write(dir.path().join(name), b"weights").unwrap();
    }
    let policy = SelectionPolicy {
        artifact_check_source: ArtifactCheckSource::TagThenDisk,
        ..SelectionPolicy::default()
    };
    let mut candidates: Vec<_> = [("a", 0.9), ("b", 0.8), ("c", 0.7)]
        .into_iter()
        .map(|(run_id, score)| {
            TrialRecord::finished(run_id)
                .with_tag("hpo.group_key", "G1")
                .with_tag("artifact.path", format!("{run_id}.bin"))
                .with_metric("f1", score)
        })
        .collect();
    candidates.push(
        TrialRecord::finished("d")
            .with_tag("hpo.group_key", "G1")
            .with_tag("artifact.available", "true")
            .with_metric("f1", 0.6),
    );
    let audit = Arc::new(MemoryAuditSink::new());
    let selector = ChampionSelector::new(policy, Arc::new(TagKeys::default()))
        .unwrap()
        .with_artifact_root(dir.path())
        .with_audit_sink(audit.clone());
    let objective = Objective::new("f1", ObjectiveDirection::Maximize);
    assert_eq!(selector.select_champion(&candidates, &objective).unwrap().run_id.as_str(), "a");

    let records = audit.records();
    let decided_by = records
        .iter()
        .find_map(|record| match &record.event {
            SelectionEvent::ArtifactFilter {
                kept,
                decided_by,
                ..
            } => {
                assert_eq!(*kept, 4);
                Some(decided_by.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(decided_by.get("disk"), Some(&3));
    assert_eq!(decided_by.get("tag"), Some(&1));

    let filter = records.iter().find(|record| record.event.name() == "artifact_filter").unwrap();
    let line = serde_json::to_string(filter).unwrap();
    assert!(line.contains("\"decided_by\":{\"disk\":3,\"tag\":1}"), "{line}");
}
