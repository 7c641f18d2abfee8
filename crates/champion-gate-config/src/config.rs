// crates/champion-gate-config/src/config.rs
// ============================================================================
// Module: Champion Gate Configuration
// Description: Configuration loading and validation for Champion Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: champion-gate-core, champion-gate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; in particular the objective
//! direction is never defaulted. A validated config builds the run store,
//! completion cache, audit sink, selector, and planner.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use champion_gate_core::ArtifactCheckSource;
use champion_gate_core::ChampionPlanner;
use champion_gate_core::ChampionSelector;
use champion_gate_core::EntityId;
use champion_gate_core::FingerprintPolicy;
use champion_gate_core::InMemoryCompletionCache;
use champion_gate_core::InMemoryRunStore;
use champion_gate_core::LayeredCompletionLookup;
use champion_gate_core::LookupFailurePolicy;
use champion_gate_core::Objective;
use champion_gate_core::ObjectiveDirection;
use champion_gate_core::PlanInputs;
use champion_gate_core::RunStoreAdapter;
use champion_gate_core::SchemaPreference;
use champion_gate_core::ScopeId;
use champion_gate_core::SelectionPolicy;
use champion_gate_core::SharedCompletionCache;
use champion_gate_core::SharedRunStore;
use champion_gate_core::TagKeys;
use champion_gate_core::runtime::DEFAULT_MAX_RESULTS;
use champion_gate_core::runtime::FileAuditSink;
use champion_gate_core::runtime::NoopAuditSink;
use champion_gate_core::runtime::SelectionAuditSink;
use champion_gate_core::runtime::StderrAuditSink;
use champion_gate_core::runtime::TracingAuditSink;
use champion_gate_store_sqlite::SqliteCompletionCache;
use champion_gate_store_sqlite::SqliteRunStore;
use champion_gate_store_sqlite::SqliteStoreConfig;
use champion_gate_store_sqlite::SqliteStoreMode;
use champion_gate_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "champion-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "CHAMPION_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of entities planned in one pass.
pub(crate) const MAX_ENTITIES: usize = 1024;
/// Default run store scope.
const DEFAULT_SCOPE: &str = "hpo";
/// Default busy timeout for `SQLite` stores in milliseconds.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Champion Gate configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChampionGateConfig {
    /// Entities (model backbones) planned by default.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Objective metric and direction.
    pub objective: ObjectiveConfig,
    /// Champion selection tunables.
    #[serde(default)]
    pub champion_selection: ChampionSelectionConfig,
    /// Fingerprint exclusions and identity fields.
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    /// Data configuration (free-form).
    #[serde(default = "empty_table")]
    pub data: Value,
    /// Evaluation configuration (free-form).
    #[serde(default = "empty_table")]
    pub evaluation: Value,
    /// Benchmark configuration (free-form).
    #[serde(default = "empty_table")]
    pub benchmark: Value,
    /// HPO configuration (free-form).
    #[serde(default = "empty_table")]
    pub hpo: Value,
    /// Training configuration (free-form).
    #[serde(default = "empty_table")]
    pub training: Value,
    /// Run store configuration.
    #[serde(default)]
    pub run_store: RunStoreConfig,
    /// Completion cache configuration.
    #[serde(default)]
    pub completion_cache: CompletionCacheConfig,
    /// Idempotency gate configuration.
    #[serde(default)]
    pub idempotency: IdempotencyConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Tag key configuration.
    #[serde(default)]
    pub tags: TagsConfig,
}

impl ChampionGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let objective = self.objective.to_objective()?;
        self.validate_hpo_objective(&objective)?;
        self.champion_selection.validate()?;
        self.run_store.validate()?;
        self.completion_cache.validate()?;
        self.audit.validate()?;
        self.tags.validate()?;
        validate_entities(&self.entities)?;
        for (field, value) in [
            ("data", &self.data),
            ("evaluation", &self.evaluation),
            ("benchmark", &self.benchmark),
            ("hpo", &self.hpo),
            ("training", &self.training),
        ] {
            if !value.is_object() {
                return Err(ConfigError::Invalid(format!("{field} must be a table")));
            }
        }
        Ok(())
    }

    /// Rejects an `[hpo.objective]` block that disagrees with `[objective]`.
    fn validate_hpo_objective(&self, objective: &Objective) -> Result<(), ConfigError> {
        let Some(block) = self.hpo.get("objective") else {
            return Ok(());
        };
        let hpo_objective = Objective::from_block(block).map_err(|err| match err {
            champion_gate_core::ObjectiveError::MissingDirection(field) => {
                ConfigError::MissingDirection(format!("hpo.{field}"))
            }
            other => ConfigError::Invalid(other.to_string()),
        })?;
        if hpo_objective != *objective {
            return Err(ConfigError::Invalid(
                "hpo.objective must match [objective] metric and direction".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the validated objective.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDirection`] when the direction is absent.
    pub fn objective(&self) -> Result<Objective, ConfigError> {
        self.objective.to_objective()
    }

    /// Returns the core selection policy.
    #[must_use]
    pub fn selection_policy(&self) -> SelectionPolicy {
        self.champion_selection.to_policy()
    }

    /// Returns the tag-key mapping.
    #[must_use]
    pub fn tag_keys(&self) -> TagKeys {
        self.tags.keys.clone()
    }

    /// Returns the fingerprint policy.
    #[must_use]
    pub fn fingerprint_policy(&self) -> FingerprintPolicy {
        self.fingerprint.to_policy()
    }

    /// Returns the configured entities.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| EntityId::new(entity.trim())).collect()
    }

    /// Returns the planner inputs derived from this config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the objective is invalid.
    pub fn plan_inputs(&self) -> Result<PlanInputs, ConfigError> {
        Ok(PlanInputs {
            objective: self.objective()?,
            data_config: self.data.clone(),
            eval_config: self.evaluation.clone(),
            benchmark_config: self.benchmark.clone(),
            fingerprint_policy: self.fingerprint_policy(),
            lookup_failure: self.idempotency.lookup_failure,
        })
    }

    /// Opens the configured run store backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the backing store cannot be opened.
    pub fn open_run_store(&self) -> Result<SharedRunStore, ConfigError> {
        match self.run_store.store_type {
            StoreType::Memory => Ok(SharedRunStore::from_store(InMemoryRunStore::new())),
            StoreType::Sqlite => {
                let config = self.run_store.sqlite_config()?;
                let store =
                    SqliteRunStore::new(&config).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(SharedRunStore::from_store(store))
            }
        }
    }

    /// Opens the configured completion cache backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the backing cache cannot be opened.
    pub fn open_completion_cache(&self) -> Result<SharedCompletionCache, ConfigError> {
        match self.completion_cache.store_type {
            StoreType::Memory => Ok(SharedCompletionCache::from_cache(InMemoryCompletionCache::new())),
            StoreType::Sqlite => {
                let config = self.completion_cache.sqlite_config(&self.run_store)?;
                let cache = SqliteCompletionCache::new(&config)
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(SharedCompletionCache::from_cache(cache))
            }
        }
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when a file sink cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn SelectionAuditSink>, ConfigError> {
        self.audit.build_sink()
    }

    /// Builds a run store adapter over `store`.
    #[must_use]
    pub fn run_store_adapter(&self, store: SharedRunStore) -> RunStoreAdapter {
        RunStoreAdapter::new(
            store,
            Arc::new(self.tag_keys()),
            ScopeId::new(self.run_store.scope.trim()),
        )
        .with_max_results(self.run_store.max_results)
        .with_required_tags(self.tags.required.clone())
    }

    /// Builds a fully wired runtime from this config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a backend cannot be opened or the planner
    /// cannot fingerprint its configuration.
    pub fn build_runtime(&self) -> Result<ChampionGateRuntime, ConfigError> {
        let audit = self.audit_sink()?;
        let store = self.open_run_store()?;
        let cache = self.open_completion_cache()?;
        let adapter = self.run_store_adapter(store);
        let tags: Arc<TagKeys> = Arc::new(self.tag_keys());
        let mut selector = ChampionSelector::new(self.selection_policy(), tags)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?
            .with_audit_sink(Arc::clone(&audit));
        if let Some(root) = &self.champion_selection.artifact_root {
            selector = selector.with_artifact_root(root.clone());
        }
        let lookup = LayeredCompletionLookup::store_then_cache(adapter.clone(), cache.clone());
        let planner = ChampionPlanner::new(&self.plan_inputs()?, adapter, selector, Arc::new(lookup))
            .map_err(|err| ConfigError::Invalid(err.to_string()))?
            .with_audit_sink(audit);
        Ok(ChampionGateRuntime {
            planner,
            completion_cache: cache,
            entities: self.entity_ids(),
        })
    }
}

/// Runtime components built from a validated config.
pub struct ChampionGateRuntime {
    /// Planner wired to the configured stores and audit sink.
    pub planner: ChampionPlanner,
    /// Completion cache written after benchmarks finish.
    pub completion_cache: SharedCompletionCache,
    /// Entities planned by default.
    pub entities: Vec<EntityId>,
}

/// Objective configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveConfig {
    /// Metric name read from each trial.
    pub metric: String,
    /// Optimization direction; required.
    #[serde(default)]
    pub direction: Option<String>,
}

impl ObjectiveConfig {
    /// Converts to the core objective without defaulting the direction.
    fn to_objective(&self) -> Result<Objective, ConfigError> {
        let Some(direction) = &self.direction else {
            return Err(ConfigError::MissingDirection("objective.direction".to_string()));
        };
        let direction = ObjectiveDirection::parse(direction)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        let metric = self.metric.trim();
        if metric.is_empty() {
            return Err(ConfigError::Invalid("objective.metric must be non-empty".to_string()));
        }
        Ok(Objective::new(metric, direction))
    }
}

/// Champion selection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChampionSelectionConfig {
    /// Minimum valid trials per group.
    #[serde(default = "default_min_trials_per_group")]
    pub min_trials_per_group: usize,
    /// Top-K trials used for the stable score.
    #[serde(default = "default_top_k_for_stable_score")]
    pub top_k_for_stable_score: usize,
    /// Drop trials whose artifact is not affirmatively available.
    #[serde(default = "default_true")]
    pub require_artifact_available: bool,
    /// Artifact availability source.
    #[serde(default)]
    pub artifact_check_source: ArtifactCheckSource,
    /// Root directory for disk artifact checks.
    #[serde(default)]
    pub artifact_root: Option<PathBuf>,
    /// Schema generation preference.
    #[serde(default)]
    pub prefer_schema_generation: SchemaPreference,
    /// Merge generation buckets (unsafe).
    #[serde(default)]
    pub allow_mixed_schema_groups: bool,
}

impl Default for ChampionSelectionConfig {
    fn default() -> Self {
        Self {
            min_trials_per_group: default_min_trials_per_group(),
            top_k_for_stable_score: default_top_k_for_stable_score(),
            require_artifact_available: true,
            artifact_check_source: ArtifactCheckSource::default(),
            artifact_root: None,
            prefer_schema_generation: SchemaPreference::default(),
            allow_mixed_schema_groups: false,
        }
    }
}

impl ChampionSelectionConfig {
    /// Converts to the core policy.
    fn to_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            min_trials_per_group: self.min_trials_per_group,
            top_k_for_stable_score: self.top_k_for_stable_score,
            require_artifact_available: self.require_artifact_available,
            artifact_check_source: self.artifact_check_source,
            prefer_schema_generation: self.prefer_schema_generation,
            allow_mixed_schema_groups: self.allow_mixed_schema_groups,
        }
    }

    /// Validates selection tunables.
    fn validate(&self) -> Result<(), ConfigError> {
        self.to_policy()
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("champion_selection: {err}")))?;
        let needs_root = matches!(
            self.artifact_check_source,
            ArtifactCheckSource::Disk | ArtifactCheckSource::TagThenDisk
        );
        if needs_root && self.require_artifact_available && self.artifact_root.is_none() {
            return Err(ConfigError::Invalid(
                "champion_selection.artifact_root is required for disk artifact checks"
                    .to_string(),
            ));
        }
        if let Some(root) = &self.artifact_root {
            validate_path_string("champion_selection.artifact_root", &root.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Fingerprint policy overrides; absent lists keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FingerprintConfig {
    /// Exact key names removed at any depth.
    #[serde(default)]
    pub excluded_keys: Option<Vec<String>>,
    /// Key suffixes removed at any depth.
    #[serde(default)]
    pub excluded_suffixes: Option<Vec<String>>,
    /// Top-level content-identity fields, checked in order.
    #[serde(default)]
    pub identity_fields: Option<Vec<String>>,
}

impl FingerprintConfig {
    /// Applies overrides on top of the default policy.
    fn to_policy(&self) -> FingerprintPolicy {
        let mut policy = FingerprintPolicy::default();
        if let Some(keys) = &self.excluded_keys {
            policy.excluded_keys.clone_from(keys);
        }
        if let Some(suffixes) = &self.excluded_suffixes {
            policy.excluded_suffixes.clone_from(suffixes);
        }
        if let Some(fields) = &self.identity_fields {
            policy.identity_fields.clone_from(fields);
        }
        policy
    }
}

/// Store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory backend.
    #[default]
    Memory,
    /// Use the `SQLite` backend.
    Sqlite,
}

/// Run store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Experiment scope queried for candidates.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Maximum records returned per candidate query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for RunStoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            scope: default_scope(),
            max_results: default_max_results(),
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl RunStoreConfig {
    /// Validates run store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.scope.trim().is_empty() {
            return Err(ConfigError::Invalid("run_store.scope must be non-empty".to_string()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::Invalid(
                "run_store.max_results must be greater than zero".to_string(),
            ));
        }
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory run_store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite run_store requires path".to_string())
                })?;
                validate_store_path("run_store", path)
            }
        }
    }

    /// Builds the `SQLite` config for the run store.
    fn sqlite_config(&self) -> Result<SqliteStoreConfig, ConfigError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("sqlite run_store requires path".to_string()))?;
        Ok(SqliteStoreConfig {
            path: path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        })
    }
}

/// Completion cache configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionCacheConfig {
    /// Cache backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path; defaults to the run store path.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CompletionCacheConfig {
    /// Validates completion cache configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.store_type, &self.path) {
            (StoreType::Memory, Some(_)) => Err(ConfigError::Invalid(
                "memory completion_cache must not set path".to_string(),
            )),
            (StoreType::Sqlite, Some(path)) => validate_store_path("completion_cache", path),
            _ => Ok(()),
        }
    }

    /// Builds the `SQLite` config, sharing pragmas with the run store.
    fn sqlite_config(&self, run_store: &RunStoreConfig) -> Result<SqliteStoreConfig, ConfigError> {
        let path = self.path.as_ref().or(run_store.path.as_ref()).ok_or_else(|| {
            ConfigError::Invalid(
                "sqlite completion_cache requires path or a sqlite run_store path".to_string(),
            )
        })?;
        Ok(SqliteStoreConfig {
            path: path.clone(),
            busy_timeout_ms: run_store.busy_timeout_ms,
            journal_mode: run_store.journal_mode,
            sync_mode: run_store.sync_mode,
        })
    }
}

/// Idempotency gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdempotencyConfig {
    /// Behavior when a completion lookup fails.
    #[serde(default)]
    pub lookup_failure: LookupFailurePolicy,
}

/// Audit sink kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events forwarded to `tracing`.
    Tracing,
    /// Discard events.
    None,
}

/// Audit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// File path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires path".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Builds the configured sink.
    fn build_sink(&self) -> Result<Arc<dyn SelectionAuditSink>, ConfigError> {
        match self.sink {
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::Tracing => Ok(Arc::new(TracingAuditSink)),
            AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("file audit sink requires path".to_string())
                })?;
                let sink =
                    FileAuditSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

/// Tag configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagsConfig {
    /// Tag-key overrides.
    #[serde(default)]
    pub keys: TagKeys,
    /// Extra tags every candidate must carry.
    #[serde(default)]
    pub required: BTreeMap<String, String>,
}

impl TagsConfig {
    /// Validates tag configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let keys = [
            ("group_key", &self.keys.group_key),
            ("schema_generation", &self.keys.schema_generation),
            ("objective_direction", &self.keys.objective_direction),
            ("artifact_available", &self.keys.artifact_available),
            ("artifact_path", &self.keys.artifact_path),
            ("entity", &self.keys.entity),
            ("trial_label", &self.keys.trial_label),
            ("benchmark_key", &self.keys.benchmark_key),
        ];
        for (name, value) in keys {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("tags.keys.{name} must be non-empty")));
            }
        }
        if self.required.contains_key(&self.keys.entity) {
            return Err(ConfigError::Invalid(
                "tags.required must not set the entity tag".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Objective direction is absent.
    #[error("config missing objective direction: {0}")]
    MissingDirection(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns an empty TOML table.
fn empty_table() -> Value {
    Value::Object(Map::new())
}

/// Returns the default minimum trials per group.
const fn default_min_trials_per_group() -> usize {
    champion_gate_core::DEFAULT_MIN_TRIALS_PER_GROUP
}

/// Returns the default stable-score top-K.
const fn default_top_k_for_stable_score() -> usize {
    champion_gate_core::DEFAULT_TOP_K_FOR_STABLE_SCORE
}

/// Returns true.
const fn default_true() -> bool {
    true
}

/// Returns the default run store scope.
fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

/// Returns the default max results per query.
const fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// Returns the default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates store paths against security limits.
fn validate_store_path(section: &str, path: &Path) -> Result<(), ConfigError> {
    validate_path_string(&format!("{section}.path"), &path.to_string_lossy())
}

/// Validates the entity list.
fn validate_entities(entities: &[String]) -> Result<(), ConfigError> {
    if entities.len() > MAX_ENTITIES {
        return Err(ConfigError::Invalid(format!("entities exceeds {MAX_ENTITIES} entries")));
    }
    let mut seen = std::collections::BTreeSet::new();
    for entity in entities {
        let trimmed = entity.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("entities must be non-empty strings".to_string()));
        }
        if !seen.insert(trimmed) {
            return Err(ConfigError::Invalid(format!("duplicate entity: {trimmed}")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
