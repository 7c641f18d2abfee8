//! Config load validation tests for champion-gate-config.
// crates/champion-gate-config/tests/config_load.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section semantics.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use champion_gate_config::AuditSinkKind;
use champion_gate_config::ChampionGateConfig;
use champion_gate_config::ConfigError;
use champion_gate_config::StoreType;
use champion_gate_core::ArtifactCheckSource;
use champion_gate_core::LookupFailurePolicy;
use champion_gate_core::ObjectiveDirection;
use champion_gate_core::SchemaPreference;
use champion_gate_core::TrialRecord;
use tempfile::NamedTempFile;
use tempfile::TempDir;

type TestResult = Result<(), String>;

const MINIMAL: &str = r#"
[objective]
metric = "macro_f1"
direction = "maximize"
"#;

fn assert_invalid(result: Result<ChampionGateConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(ChampionGateConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(ChampionGateConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(ChampionGateConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(ChampionGateConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reads_minimal_file_with_defaults() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(MINIMAL.as_bytes()).map_err(|err| err.to_string())?;
    let config = ChampionGateConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let objective = config.objective().map_err(|err| err.to_string())?;
    if objective.direction != ObjectiveDirection::Maximize || objective.metric != "macro_f1" {
        return Err(format!("unexpected objective {objective:?}"));
    }
    let policy = config.selection_policy();
    if policy.min_trials_per_group != 3 || !policy.require_artifact_available {
        return Err(format!("unexpected default policy {policy:?}"));
    }
    if config.run_store.store_type != StoreType::Memory || config.audit.sink != AuditSinkKind::Stderr
    {
        return Err("unexpected backend defaults".to_string());
    }
    if config.idempotency.lookup_failure != LookupFailurePolicy::Propagate {
        return Err("lookup failures must propagate by default".to_string());
    }
    Ok(())
}

#[test]
fn missing_direction_is_rejected() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
"#,
    );
    match result {
        Err(ConfigError::MissingDirection(field)) if field == "objective.direction" => Ok(()),
        other => Err(format!("expected missing direction, got {other:?}")),
    }
}

#[test]
fn unknown_direction_is_rejected() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "sideways"
"#,
    );
    assert_invalid(result, "unsupported objective direction")
}

#[test]
fn hpo_objective_must_agree() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "maximize"

[hpo.objective]
metric = "macro_f1"
direction = "minimize"
"#,
    );
    assert_invalid(result, "hpo.objective must match")
}

#[test]
fn selection_section_maps_to_policy() -> TestResult {
    let config = ChampionGateConfig::from_toml_str(
        r#"
entities = ["bert", "roberta"]

[objective]
metric = "loss"
direction = "minimize"

[champion_selection]
min_trials_per_group = 5
top_k_for_stable_score = 2
artifact_check_source = "tag_then_disk"
artifact_root = "outputs"
prefer_schema_generation = "1"
allow_mixed_schema_groups = true

[idempotency]
lookup_failure = "treat_as_pending"

[tags.keys]
entity = "model.name"

[tags.required]
stage = "hpo"
"#,
    )
    .map_err(|err| err.to_string())?;
    let policy = config.selection_policy();
    if policy.min_trials_per_group != 5
        || policy.top_k_for_stable_score != 2
        || policy.artifact_check_source != ArtifactCheckSource::TagThenDisk
        || policy.prefer_schema_generation != SchemaPreference::V1
        || !policy.allow_mixed_schema_groups
    {
        return Err(format!("unexpected policy {policy:?}"));
    }
    if config.tag_keys().entity != "model.name" {
        return Err("entity tag override not applied".to_string());
    }
    if config.entity_ids().len() != 2 {
        return Err("entities not parsed".to_string());
    }
    let inputs = config.plan_inputs().map_err(|err| err.to_string())?;
    if inputs.lookup_failure != LookupFailurePolicy::TreatAsPending {
        return Err("lookup failure policy not applied".to_string());
    }
    Ok(())
}

#[test]
fn zero_min_trials_is_rejected() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "maximize"

[champion_selection]
min_trials_per_group = 0
"#,
    );
    assert_invalid(result, "min_trials_per_group must be greater than zero")
}

#[test]
fn disk_artifacts_require_root() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "maximize"

[champion_selection]
artifact_check_source = "disk"
"#,
    );
    assert_invalid(result, "artifact_root is required")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "maximize"

[run_store]
type = "sqlite"
"#,
    );
    assert_invalid(result, "sqlite run_store requires path")
}

#[test]
fn file_audit_sink_requires_path() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "maximize"

[audit]
sink = "file"
"#,
    );
    assert_invalid(result, "file audit sink requires path")
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    let result = ChampionGateConfig::from_toml_str(
        r#"
[objective]
metric = "macro_f1"
direction = "maximize"

[champion_selection]
min_trails_per_group = 3
"#,
    );
    match result {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn build_runtime_plans_against_sqlite_store() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let db = dir.path().join("state").join("runs.sqlite");
    let audit = dir.path().join("audit.jsonl");
    let text = format!(
        r#"
entities = ["bert"]

[objective]
metric = "macro_f1"
direction = "maximize"

[data]
name = "reviews"
version = "3"

[evaluation]
split = "test"

[benchmark]
suite = "latency"

[run_store]
type = "sqlite"
path = "{db}"

[completion_cache]
type = "sqlite"

[audit]
sink = "file"
path = "{audit}"
"#,
        db = db.display(),
        audit = audit.display(),
    );
    let config = ChampionGateConfig::from_toml_str(&text).map_err(|err| err.to_string())?;

    let store = champion_gate_store_sqlite::SqliteRunStore::new(
        &champion_gate_store_sqlite::SqliteStoreConfig::new(&db),
    )
    .map_err(|err| err.to_string())?;
    let scope = champion_gate_core::ScopeId::new("hpo");
    for (run_id, score) in [("bert-1", 0.80), ("bert-2", 0.84), ("bert-3", 0.82)] {
        let record = TrialRecord::finished(run_id)
            .with_tag("model.backbone", "bert")
            .with_tag("hpo.group_key", "g2:bert")
            .with_tag("hpo.group_key_schema", "2")
            .with_tag("artifact.available", "true")
            .with_metric("macro_f1", score);
        store.put_record(&scope, &record).map_err(|err| err.to_string())?;
    }

    let runtime = config.build_runtime().map_err(|err| err.to_string())?;
    let plan = runtime.planner.plan(&runtime.entities).map_err(|err| err.to_string())?;
    let Some(champion) = plan.pending.values().next() else {
        return Err("expected one pending champion".to_string());
    };
    if champion.run_id.as_str() != "bert-2" {
        return Err(format!("unexpected champion {}", champion.run_id));
    }
    let entity = runtime.entities[0].clone();
    let champion = champion.clone();
    runtime
        .planner
        .mark_complete(&entity, &champion, &runtime.completion_cache)
        .map_err(|err| err.to_string())?;
    let second = runtime.planner.plan(&runtime.entities).map_err(|err| err.to_string())?;
    if !second.pending.is_empty() {
        return Err("second pass should skip completed benchmark".to_string());
    }
    let log = std::fs::read_to_string(&audit).map_err(|err| err.to_string())?;
    if !log.contains("\"event\":\"champion_selected\"") {
        return Err("audit file missing champion_selected".to_string());
    }
    Ok(())
}
