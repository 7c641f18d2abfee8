// crates/champion-gate-core/src/runtime/store.rs
// ============================================================================
// Module: Champion Gate In-Memory Stores
// Description: In-memory run store and completion cache plus shared wrappers.
// Purpose: Provide deterministic store implementations without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`RunStore`] and
//! [`CompletionCache`] for tests, dry runs, and local demos. Records are
//! kept in run-identifier order so query results are deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::BenchmarkKey;
use crate::core::RunId;
use crate::core::ScopeId;
use crate::core::TrialRecord;
use crate::core::TrialStatus;
use crate::interfaces::CompletionCache;
use crate::interfaces::CompletionRecord;
use crate::interfaces::LookupError;
use crate::interfaces::RunStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Run Store
// ============================================================================

/// Stored record together with its scope.
#[derive(Debug, Clone)]
struct ScopedRecord {
    /// Experiment scope.
    scope: ScopeId,
    /// Trial record.
    record: TrialRecord,
}

/// In-memory run store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunStore {
    /// Records keyed by run identifier, protected by a mutex.
    records: Arc<Mutex<BTreeMap<RunId, ScopedRecord>>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Inserts or replaces a record in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Store`] when the store mutex is poisoned.
    pub fn put_record(&self, scope: &ScopeId, record: TrialRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Store("run store mutex poisoned".to_string()))?
            .insert(
                record.run_id.clone(),
                ScopedRecord {
                    scope: scope.clone(),
                    record: record.normalized(),
                },
            );
        Ok(())
    }
}

impl RunStore for InMemoryRunStore {
    fn query_by_tags(
        &self,
        scope: &ScopeId,
        required_tags: &BTreeMap<String, String>,
        max_results: usize,
    ) -> Result<Vec<TrialRecord>, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("run store mutex poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|stored| {
                stored.scope == *scope
                    && stored.record.status == TrialStatus::Finished
                    && stored.record.matches_tags(required_tags)
            })
            .take(max_results)
            .map(|stored| stored.record.clone())
            .collect())
    }

    fn get_record(&self, run_id: &RunId) -> Result<TrialRecord, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("run store mutex poisoned".to_string()))?;
        guard
            .get(run_id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    fn record_exists_with_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        scope: &ScopeId,
    ) -> Result<bool, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("run store mutex poisoned".to_string()))?;
        Ok(guard.values().any(|stored| {
            stored.scope == *scope
                && stored.record.status == TrialStatus::Finished
                && stored.record.tag(tag_key) == Some(tag_value)
        }))
    }
}

// ============================================================================
// SECTION: In-Memory Completion Cache
// ============================================================================

/// In-memory completion cache for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCompletionCache {
    /// Completion records keyed by benchmark key.
    records: Arc<Mutex<BTreeMap<BenchmarkKey, CompletionRecord>>>,
}

impl InMemoryCompletionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded completions in key order.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Cache`] when the cache mutex is poisoned.
    pub fn records(&self) -> Result<Vec<CompletionRecord>, LookupError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| LookupError::Cache("completion cache mutex poisoned".to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

impl CompletionCache for InMemoryCompletionCache {
    fn contains(&self, key: &BenchmarkKey) -> Result<bool, LookupError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| LookupError::Cache("completion cache mutex poisoned".to_string()))?;
        Ok(guard.contains_key(key))
    }

    fn record(&self, record: &CompletionRecord) -> Result<(), LookupError> {
        self.records
            .lock()
            .map_err(|_| LookupError::Cache("completion cache mutex poisoned".to_string()))?
            .entry(record.benchmark_key.clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Shared Wrappers
// ============================================================================

/// Shared run store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRunStore {
    /// Inner store implementation.
    inner: Arc<dyn RunStore + Send + Sync>,
}

impl SharedRunStore {
    /// Wraps a run store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RunStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RunStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl RunStore for SharedRunStore {
    fn query_by_tags(
        &self,
        scope: &ScopeId,
        required_tags: &BTreeMap<String, String>,
        max_results: usize,
    ) -> Result<Vec<TrialRecord>, StoreError> {
        self.inner.query_by_tags(scope, required_tags, max_results)
    }

    fn get_record(&self, run_id: &RunId) -> Result<TrialRecord, StoreError> {
        self.inner.get_record(run_id)
    }

    fn record_exists_with_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        scope: &ScopeId,
    ) -> Result<bool, StoreError> {
        self.inner.record_exists_with_tag(tag_key, tag_value, scope)
    }
}

/// Shared completion cache backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedCompletionCache {
    /// Inner cache implementation.
    inner: Arc<dyn CompletionCache + Send + Sync>,
}

impl SharedCompletionCache {
    /// Wraps a completion cache in a shared, clonable wrapper.
    #[must_use]
    pub fn from_cache(cache: impl CompletionCache + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    /// Wraps an existing shared cache.
    #[must_use]
    pub const fn new(cache: Arc<dyn CompletionCache + Send + Sync>) -> Self {
        Self {
            inner: cache,
        }
    }
}

impl CompletionCache for SharedCompletionCache {
    fn contains(&self, key: &BenchmarkKey) -> Result<bool, LookupError> {
        self.inner.contains(key)
    }

    fn record(&self, record: &CompletionRecord) -> Result<(), LookupError> {
        self.inner.record(record)
    }
}
