// crates/champion-gate-core/tests/fingerprint.rs
// ============================================================================
// Module: Config Fingerprint Tests
// Description: Tests for canonical configuration fingerprints.
// Purpose: Validate determinism, environment exclusion, and content identity.
// Dependencies: champion-gate-core
// ============================================================================
//! ## Overview
//! Ensures fingerprints depend only on semantic configuration content and
//! fail closed on values that cannot form a canonical JSON tree.

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

use std::collections::BTreeMap;
use std::collections::HashMap;

use champion_gate_core::ConfigFingerprint;
use champion_gate_core::FINGERPRINT_HEX_LEN;
use champion_gate_core::FingerprintError;
use champion_gate_core::FingerprintPolicy;
use champion_gate_core::fingerprint;
use serde_json::json;

/// Verifies key insertion order does not change the fingerprint.
#[test]
fn fingerprint_ignores_key_order() {
    let a = json!({"name": "reviews", "version": 3, "splits": {"train": 0.8, "test": 0.2}});
    let b = json!({"splits": {"test": 0.2, "train": 0.8}, "version": 3, "name": "reviews"});
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
}

/// Verifies fingerprints are fixed-length lowercase hex.
#[test]
fn fingerprint_is_lowercase_hex() {
    let value = fingerprint(&json!({"name": "reviews"})).unwrap();
    assert_eq!(value.as_str().len(), FINGERPRINT_HEX_LEN);
    assert!(value.as_str().chars().all(|c| c.is_ascii_digit() || ('a' ..= 'f').contains(&c)));
    assert_eq!(value.short().len(), 12);
}

/// Verifies semantic changes change the fingerprint.
#[test]
fn fingerprint_changes_with_semantic_content() {
    let a = fingerprint(&json!({"name": "reviews", "version": 3})).unwrap();
    let b = fingerprint(&json!({"name": "reviews", "version": 4})).unwrap();
    assert_ne!(a, b);
}

/// Verifies environment-specific keys are stripped at any depth.
#[test]
fn fingerprint_excludes_paths_and_roots() {
    let local = json!({
        "name": "reviews",
        "local_path": "/home/alice/data",
        "cache_dir": "/tmp/cache",
        "nested": {"root": "/mnt/a", "files": {"train_paths": ["/a", "/b"]}, "size": 10},
    });
    let cluster = json!({
        "name": "reviews",
        "local_path": "/scratch/job-17/data",
        "cache_dir": "/var/cache",
        "nested": {"root": "/mnt/b", "files": {"train_paths": ["/c"]}, "size": 10},
    });
    assert_eq!(fingerprint(&local).unwrap(), fingerprint(&cluster).unwrap());

    let resized = json!({"name": "reviews", "nested": {"size": 11}});
    assert_ne!(fingerprint(&local).unwrap(), fingerprint(&resized).unwrap());
}

/// Verifies exclusion matching is case-insensitive.
#[test]
fn fingerprint_exclusion_ignores_key_case() {
    let a = json!({"name": "reviews", "Data_Dir": "/x"});
    let b = json!({"name": "reviews"});
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
}

/// Verifies a content hash replaces the rest of the configuration.
#[test]
fn fingerprint_prefers_content_identity() {
    let a = json!({"content_hash": "abc123", "name": "reviews", "version": 1});
    let b = json!({"content_hash": "abc123", "name": "renamed", "version": 9});
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());

    let c = json!({"content_hash": "def456", "name": "reviews", "version": 1});
    assert_ne!(fingerprint(&a).unwrap(), fingerprint(&c).unwrap());
}

/// Verifies identity fields are checked in priority order and must be non-empty.
#[test]
fn fingerprint_identity_fields_follow_priority() {
    let policy = FingerprintPolicy::default();
    let payload = policy.identity_payload(&json!({"dataset_hash": "d1", "data_hash": "x"}));
    assert_eq!(payload, json!({"content_identity": {"dataset_hash": "d1"}}));

    let blank = policy.identity_payload(&json!({"content_hash": "  ", "name": "reviews"}));
    assert_eq!(blank, json!({"name": "reviews"}));
}

/// Verifies different identity field names with equal values stay distinct.
#[test]
fn fingerprint_identity_binds_field_name() {
    let a = fingerprint(&json!({"content_hash": "same"})).unwrap();
    let b = fingerprint(&json!({"data_hash": "same"})).unwrap();
    assert_ne!(a, b);
}

/// Verifies a custom policy can disable exclusions.
#[test]
fn fingerprint_policy_is_configurable() {
    let policy = FingerprintPolicy {
        excluded_keys: Vec::new(),
        excluded_suffixes: Vec::new(),
        identity_fields: Vec::new(),
    };
    let a = policy.fingerprint(&json!({"root": "/a"})).unwrap();
    let b = policy.fingerprint(&json!({"root": "/b"})).unwrap();
    assert_ne!(a, b);
}

/// Verifies typed structs and equivalent JSON fingerprint identically.
#[test]
fn fingerprint_accepts_typed_maps() {
    let mut typed = BTreeMap::new();
    typed.insert("version", 3);
    typed.insert("shards", 8);
    let untyped = json!({"shards": 8, "version": 3});
    assert_eq!(fingerprint(&typed).unwrap(), fingerprint(&untyped).unwrap());
}

/// Verifies non-string map keys are rejected as invalid configuration.
#[test]
fn fingerprint_rejects_non_string_keys() {
    let mut config = HashMap::new();
    config.insert(vec![1_u8, 2], "value");
    let err = fingerprint(&config).unwrap_err();
    assert!(matches!(err, FingerprintError::InvalidConfig(_)));
}

/// Verifies parsed fingerprints validate their shape.
#[test]
fn fingerprint_from_hex_validates_shape() {
    let valid = fingerprint(&json!({"a": 1})).unwrap();
    assert_eq!(ConfigFingerprint::from_hex(valid.as_str()).unwrap(), valid);
    assert!(ConfigFingerprint::from_hex("ABC").is_err());
    assert!(ConfigFingerprint::from_hex(valid.as_str().to_uppercase()).is_err());
}
