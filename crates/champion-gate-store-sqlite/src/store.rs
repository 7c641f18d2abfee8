// crates/champion-gate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Run Store
// Description: Durable RunStore and CompletionCache backed by SQLite WAL.
// Purpose: Persist trial records with deterministic serialization.
// Dependencies: champion-gate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`RunStore`] using `SQLite`. Each write
//! produces a canonical JSON snapshot of the trial record together with a
//! SHA-256 hash, and every tag is mirrored into an index table so tag-equality
//! queries run in SQL. Loads verify integrity via stored hashes and fail
//! closed on corruption. [`SqliteCompletionCache`] stores benchmark
//! completion records in the same schema.
//! Security posture: database contents are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use champion_gate_core::BenchmarkKey;
use champion_gate_core::CompletionCache;
use champion_gate_core::CompletionRecord;
use champion_gate_core::LookupError;
use champion_gate_core::RunId;
use champion_gate_core::RunStore;
use champion_gate_core::ScopeId;
use champion_gate_core::StoreError;
use champion_gate_core::TrialRecord;
use champion_gate_core::TrialStatus;
use champion_gate_core::canonical_json_bytes;
use champion_gate_core::sha256_hex;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum serialized record size accepted by the store.
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;
/// Hash algorithm label written next to each payload.
const HASH_ALGORITHM: &str = "sha256";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` run store and completion cache.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw record payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Record payload exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "record_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

impl From<SqliteStoreError> for LookupError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Cache(error.to_string())
    }
}

// ============================================================================
// SECTION: Run Store
// ============================================================================

/// `SQLite`-backed run store with WAL support.
///
/// # Invariants
/// - Record loads verify stored hashes before deserialization.
/// - `SQLite` connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteRunStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRunStore {
    /// Opens (or creates) a run store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or the schema version is unsupported.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_store(config)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Inserts or replaces a trial record in `scope`, rewriting its tag index.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when serialization or the write fails.
    pub fn put_record(&self, scope: &ScopeId, record: &TrialRecord) -> Result<(), SqliteStoreError> {
        let record = record.normalized();
        let payload = encode_payload(&record)?;
        let run_id = record.run_id.as_str();
        let mut guard = lock(&self.connection)?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute(
            "INSERT INTO trial_records (run_id, scope_id, status, record_json, record_hash, \
             hash_algorithm, saved_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(run_id) DO UPDATE SET scope_id = excluded.scope_id, status = \
             excluded.status, record_json = excluded.record_json, record_hash = \
             excluded.record_hash, hash_algorithm = excluded.hash_algorithm, saved_at = \
             excluded.saved_at",
            params![
                run_id,
                scope.as_str(),
                record.status.as_str(),
                payload.bytes,
                payload.hash,
                HASH_ALGORITHM,
                unix_millis()
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.execute("DELETE FROM trial_tags WHERE run_id = ?1", params![run_id])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        for (key, value) in &record.tags {
            tx.execute(
                "INSERT INTO trial_tags (run_id, tag_key, tag_value) VALUES (?1, ?2, ?3)",
                params![run_id, key, value],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Returns the number of stored records in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn count_records(&self, scope: &ScopeId) -> Result<u64, SqliteStoreError> {
        let guard = lock(&self.connection)?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(1) FROM trial_records WHERE scope_id = ?1",
                params![scope.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        u64::try_from(count).map_err(|_| SqliteStoreError::Corrupt("negative row count".to_string()))
    }

    /// Runs the tag query and verifies each returned payload.
    fn query_records(
        &self,
        scope: &ScopeId,
        required_tags: &BTreeMap<String, String>,
        max_results: usize,
    ) -> Result<Vec<TrialRecord>, SqliteStoreError> {
        let mut sql = String::from(
            "SELECT r.run_id, r.record_json, r.record_hash, r.hash_algorithm FROM trial_records r \
             WHERE r.scope_id = ?1 AND r.status = ?2",
        );
        let mut values = vec![
            SqlValue::Text(scope.to_string()),
            SqlValue::Text(TrialStatus::Finished.as_str().to_string()),
        ];
        for (key, value) in required_tags {
            let key_index = values.len() + 1;
            let value_index = key_index + 1;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM trial_tags t WHERE t.run_id = r.run_id AND t.tag_key \
                 = ?{key_index} AND t.tag_value = ?{value_index})"
            ));
            values.push(SqlValue::Text(key.clone()));
            values.push(SqlValue::Text(value.clone()));
        }
        sql.push_str(&format!(" ORDER BY r.run_id LIMIT ?{}", values.len() + 1));
        values.push(SqlValue::Integer(i64::try_from(max_results).unwrap_or(i64::MAX)));

        let guard = lock(&self.connection)?;
        let mut statement =
            guard.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(StoredPayload {
                    key: row.get(0)?,
                    bytes: row.get(1)?,
                    hash: row.get(2)?,
                    algorithm: row.get(3)?,
                })
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let payload = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let record = decode_record(&payload)?;
            if !record.matches_tags(required_tags) {
                return Err(SqliteStoreError::Corrupt(format!(
                    "tag index out of sync for run {}",
                    payload.key
                )));
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Loads and verifies one record.
    fn load_record(&self, run_id: &RunId) -> Result<Option<TrialRecord>, SqliteStoreError> {
        let guard = lock(&self.connection)?;
        let payload = guard
            .query_row(
                "SELECT run_id, record_json, record_hash, hash_algorithm FROM trial_records \
                 WHERE run_id = ?1",
                params![run_id.as_str()],
                |row| {
                    Ok(StoredPayload {
                        key: row.get(0)?,
                        bytes: row.get(1)?,
                        hash: row.get(2)?,
                        algorithm: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        payload.map(|payload| decode_record(&payload)).transpose()
    }

    /// Checks the tag index for a finished record in `scope`.
    fn tag_exists(
        &self,
        tag_key: &str,
        tag_value: &str,
        scope: &ScopeId,
    ) -> Result<bool, SqliteStoreError> {
        let guard = lock(&self.connection)?;
        guard
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM trial_tags t JOIN trial_records r ON r.run_id = \
                 t.run_id WHERE t.tag_key = ?1 AND t.tag_value = ?2 AND r.scope_id = ?3 AND \
                 r.status = ?4)",
                params![tag_key, tag_value, scope.as_str(), TrialStatus::Finished.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))
    }
}

impl RunStore for SqliteRunStore {
    fn query_by_tags(
        &self,
        scope: &ScopeId,
        required_tags: &BTreeMap<String, String>,
        max_results: usize,
    ) -> Result<Vec<TrialRecord>, StoreError> {
        self.query_records(scope, required_tags, max_results).map_err(StoreError::from)
    }

    fn get_record(&self, run_id: &RunId) -> Result<TrialRecord, StoreError> {
        self.load_record(run_id)?.ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    fn record_exists_with_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        scope: &ScopeId,
    ) -> Result<bool, StoreError> {
        self.tag_exists(tag_key, tag_value, scope).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Completion Cache
// ============================================================================

/// `SQLite`-backed completion cache.
///
/// # Invariants
/// - The first record written for a key is kept.
/// - Lookups verify stored hashes; a corrupt entry is an error, never a hit.
#[derive(Clone)]
pub struct SqliteCompletionCache {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCompletionCache {
    /// Opens (or creates) a completion cache at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or the schema version is unsupported.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_store(config)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns every stored completion record ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a row is corrupt.
    pub fn records(&self) -> Result<Vec<CompletionRecord>, SqliteStoreError> {
        let guard = lock(&self.connection)?;
        let mut statement = guard
            .prepare(
                "SELECT benchmark_key, record_json, record_hash, hash_algorithm FROM \
                 completion_records ORDER BY benchmark_key",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![], |row| {
                Ok(StoredPayload {
                    key: row.get(0)?,
                    bytes: row.get(1)?,
                    hash: row.get(2)?,
                    algorithm: row.get(3)?,
                })
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let payload = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            records.push(decode_completion(&payload)?);
        }
        Ok(records)
    }

    /// Loads and verifies the record for `key`.
    fn load(&self, key: &BenchmarkKey) -> Result<Option<CompletionRecord>, SqliteStoreError> {
        let guard = lock(&self.connection)?;
        let payload = guard
            .query_row(
                "SELECT benchmark_key, record_json, record_hash, hash_algorithm FROM \
                 completion_records WHERE benchmark_key = ?1",
                params![key.as_str()],
                |row| {
                    Ok(StoredPayload {
                        key: row.get(0)?,
                        bytes: row.get(1)?,
                        hash: row.get(2)?,
                        algorithm: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        payload.map(|payload| decode_completion(&payload)).transpose()
    }

    /// Writes a record unless the key is already present.
    fn insert(&self, record: &CompletionRecord) -> Result<(), SqliteStoreError> {
        let payload = encode_payload(record)?;
        let guard = lock(&self.connection)?;
        guard
            .execute(
                "INSERT OR IGNORE INTO completion_records (benchmark_key, entity_id, \
                 champion_run_id, record_json, record_hash, hash_algorithm, recorded_at) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.benchmark_key.as_str(),
                    record.entity_id.as_str(),
                    record.champion_run_id.as_str(),
                    payload.bytes,
                    payload.hash,
                    HASH_ALGORITHM,
                    record.recorded_at_ms
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }
}

impl CompletionCache for SqliteCompletionCache {
    fn contains(&self, key: &BenchmarkKey) -> Result<bool, LookupError> {
        Ok(self.load(key)?.is_some())
    }

    fn record(&self, record: &CompletionRecord) -> Result<(), LookupError> {
        self.insert(record).map_err(LookupError::from)
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Canonical payload ready to be written.
struct EncodedPayload {
    /// Canonical JSON bytes.
    bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    hash: String,
}

/// Raw row read back from a payload table.
struct StoredPayload {
    /// Primary key the row was stored under.
    key: String,
    /// Stored JSON bytes.
    bytes: Vec<u8>,
    /// Stored hash.
    hash: String,
    /// Stored hash algorithm label.
    algorithm: String,
}

/// Serializes a value to canonical JSON and hashes it.
fn encode_payload<T: serde::Serialize>(value: &T) -> Result<EncodedPayload, SqliteStoreError> {
    let bytes =
        canonical_json_bytes(value).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if bytes.len() > MAX_RECORD_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_RECORD_BYTES,
            actual_bytes: bytes.len(),
        });
    }
    let hash = sha256_hex(&bytes);
    Ok(EncodedPayload {
        bytes,
        hash,
    })
}

/// Checks size, algorithm, and hash of a stored payload.
fn verify_payload(payload: &StoredPayload) -> Result<(), SqliteStoreError> {
    if payload.bytes.len() > MAX_RECORD_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_RECORD_BYTES,
            actual_bytes: payload.bytes.len(),
        });
    }
    if payload.algorithm != HASH_ALGORITHM {
        return Err(SqliteStoreError::Corrupt(format!(
            "unsupported hash algorithm: {}",
            payload.algorithm
        )));
    }
    if sha256_hex(&payload.bytes) != payload.hash {
        return Err(SqliteStoreError::Corrupt(format!("hash mismatch for {}", payload.key)));
    }
    Ok(())
}

/// Verifies and decodes a trial record row.
fn decode_record(payload: &StoredPayload) -> Result<TrialRecord, SqliteStoreError> {
    verify_payload(payload)?;
    let record: TrialRecord = serde_json::from_slice(&payload.bytes)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if record.run_id.as_str() != payload.key {
        return Err(SqliteStoreError::Invalid(
            "run_id mismatch between key and payload".to_string(),
        ));
    }
    Ok(record)
}

/// Verifies and decodes a completion record row.
fn decode_completion(payload: &StoredPayload) -> Result<CompletionRecord, SqliteStoreError> {
    verify_payload(payload)?;
    let record: CompletionRecord = serde_json::from_slice(&payload.bytes)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if record.benchmark_key.as_str() != payload.key {
        return Err(SqliteStoreError::Invalid(
            "benchmark_key mismatch between key and payload".to_string(),
        ));
    }
    Ok(record)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Locks the shared connection.
fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
    connection.lock().map_err(|_| SqliteStoreError::Db("sqlite mutex poisoned".to_string()))
}

/// Validates the path, opens a connection, and prepares the schema.
fn open_store(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    validate_store_path(&config.path)?;
    ensure_parent_dir(&config.path)?;
    let mut connection = open_connection(config)?;
    initialize_schema(&mut connection)?;
    Ok(connection)
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS trial_records (
                    run_id TEXT NOT NULL PRIMARY KEY,
                    scope_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    saved_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_trial_records_scope
                    ON trial_records (scope_id, status, run_id);
                CREATE TABLE IF NOT EXISTS trial_tags (
                    run_id TEXT NOT NULL,
                    tag_key TEXT NOT NULL,
                    tag_value TEXT NOT NULL,
                    PRIMARY KEY (run_id, tag_key),
                    FOREIGN KEY (run_id) REFERENCES trial_records(run_id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_trial_tags_lookup
                    ON trial_tags (tag_key, tag_value, run_id);
                CREATE TABLE IF NOT EXISTS completion_records (
                    benchmark_key TEXT NOT NULL PRIMARY KEY,
                    entity_id TEXT NOT NULL,
                    champion_run_id TEXT NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    recorded_at INTEGER NOT NULL
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
