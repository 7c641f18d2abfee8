// crates/champion-gate-core/src/core/fingerprint.rs
// ============================================================================
// Module: Champion Gate Config Fingerprints
// Description: RFC 8785 canonical hashing of configuration subtrees.
// Purpose: Provide content-addressed identities for data, eval, and benchmark configs.
// Dependencies: serde, serde_json, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! A fingerprint is the SHA-256 digest of the RFC 8785 (JCS) canonical form
//! of a configuration mapping, encoded as 64 lowercase hex characters. JCS
//! sorts object keys and uses compact separators, so two mappings that differ
//! only in key insertion order fingerprint identically.
//!
//! Environment-specific fields (local paths, directories) are stripped before
//! hashing. When a mapping carries a precomputed content identity (for
//! example `content_hash`) only that identity is hashed, so relocating or
//! re-describing the same dataset does not change its fingerprint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Number of hex characters shown by [`ConfigFingerprint::short`].
const SHORT_FINGERPRINT_LEN: usize = 12;

/// Keys dropped from the hashed payload regardless of nesting depth.
const DEFAULT_EXCLUDED_KEYS: &[&str] = &["path", "paths", "dir", "root"];

/// Key suffixes dropped from the hashed payload regardless of nesting depth.
const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &["_path", "_paths", "_dir", "_root"];

/// Top-level content-identity fields, in order of preference.
const DEFAULT_IDENTITY_FIELDS: &[&str] = &["content_hash", "dataset_hash", "data_hash"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing or parsing fingerprints.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The configuration could not be serialized into a canonical JSON tree.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// A fingerprint string is not 64 lowercase hex characters.
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

// ============================================================================
// SECTION: Fingerprint Value
// ============================================================================

/// Content-addressed identity of a configuration subtree.
///
/// # Invariants
/// - Always [`FINGERPRINT_HEX_LEN`] lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigFingerprint(String);

impl ConfigFingerprint {
    /// Parses a previously computed fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::InvalidFingerprint`] when the value is not
    /// 64 lowercase hex characters.
    pub fn from_hex(value: impl Into<String>) -> Result<Self, FingerprintError> {
        let value = value.into();
        let well_formed = value.len() == FINGERPRINT_HEX_LEN
            && value.bytes().all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(FingerprintError::InvalidFingerprint(format!(
                "expected {FINGERPRINT_HEX_LEN} lowercase hex characters"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the full hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short prefix for logs and display. Never use it for lookup.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[.. SHORT_FINGERPRINT_LEN]
    }
}

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for ConfigFingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(value)
    }
}

impl From<ConfigFingerprint> for String {
    fn from(value: ConfigFingerprint) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Fingerprint Policy
// ============================================================================

/// Controls which fields participate in a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintPolicy {
    /// Exact key names removed at any depth.
    pub excluded_keys: Vec<String>,
    /// Key suffixes removed at any depth.
    pub excluded_suffixes: Vec<String>,
    /// Top-level content-identity fields, checked in order.
    pub identity_fields: Vec<String>,
}

impl Default for FingerprintPolicy {
    fn default() -> Self {
        Self {
            excluded_keys: DEFAULT_EXCLUDED_KEYS.iter().map(ToString::to_string).collect(),
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES.iter().map(ToString::to_string).collect(),
            identity_fields: DEFAULT_IDENTITY_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl FingerprintPolicy {
    /// Fingerprints a configuration value under this policy.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::InvalidConfig`] when the value cannot be
    /// represented as a JSON tree.
    pub fn fingerprint<T: Serialize + ?Sized>(
        &self,
        config: &T,
    ) -> Result<ConfigFingerprint, FingerprintError> {
        let value = to_json_tree(config)?;
        let payload = self.identity_payload(&value);
        Ok(ConfigFingerprint(hash_canonical_json(&payload)?))
    }

    /// Returns the payload that is actually hashed for `value`.
    #[must_use]
    pub fn identity_payload(&self, value: &Value) -> Value {
        if let Value::Object(map) = value {
            for field in &self.identity_fields {
                if let Some(Value::String(identity)) = map.get(field)
                    && !identity.trim().is_empty()
                {
                    let mut content = Map::new();
                    content.insert(field.clone(), Value::String(identity.clone()));
                    let mut payload = Map::new();
                    payload.insert("content_identity".to_string(), Value::Object(content));
                    return Value::Object(payload);
                }
            }
        }
        self.strip_environment(value)
    }

    /// Recursively removes environment-specific keys.
    fn strip_environment(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !self.is_excluded(key))
                    .map(|(key, inner)| (key.clone(), self.strip_environment(inner)))
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.strip_environment(item)).collect())
            }
            other => other.clone(),
        }
    }

    /// Returns true when a key names an environment-specific field.
    fn is_excluded(&self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        self.excluded_keys.iter().any(|excluded| *excluded == key)
            || self.excluded_suffixes.iter().any(|suffix| key.ends_with(suffix.as_str()))
    }
}

/// Fingerprints a configuration value with the default policy.
///
/// # Errors
///
/// Returns [`FingerprintError::InvalidConfig`] when the value cannot be
/// represented as a JSON tree.
pub fn fingerprint<T: Serialize + ?Sized>(config: &T) -> Result<ConfigFingerprint, FingerprintError> {
    FingerprintPolicy::default().fingerprint(config)
}

// ============================================================================
// SECTION: Canonical Hashing
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`FingerprintError::InvalidConfig`] when canonicalization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, FingerprintError> {
    serde_jcs::to_vec(value).map_err(|err| FingerprintError::InvalidConfig(err.to_string()))
}

/// Hashes the canonical JSON form of a value and returns lowercase hex.
///
/// # Errors
///
/// Returns [`FingerprintError::InvalidConfig`] when canonicalization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FingerprintError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// Hashes raw bytes with SHA-256 and returns lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Converts a serializable value into a JSON tree.
fn to_json_tree<T: Serialize + ?Sized>(config: &T) -> Result<Value, FingerprintError> {
    serde_json::to_value(config).map_err(|err| FingerprintError::InvalidConfig(err.to_string()))
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
