// crates/champion-gate-core/src/runtime/adapter.rs
// ============================================================================
// Module: Champion Gate Store Adapters
// Description: Candidate queries and completion lookups over stores and caches.
// Purpose: Translate logical tags into store queries for one scope.
// Dependencies: crate::{core, interfaces, runtime::store}
// ============================================================================

//! ## Overview
//! [`RunStoreAdapter`] binds a run store to a scope, a tag resolver, and a
//! result limit. It answers two questions: which finished trials belong to an
//! entity, and whether a benchmark record with a given key already exists.
//! Completion lookups compose: the store is authoritative, the cache is a
//! secondary source, and [`LayeredCompletionLookup`] asks both in order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::BenchmarkKey;
use crate::core::EntityId;
use crate::core::ScopeId;
use crate::core::TagKeyResolver;
use crate::core::TagName;
use crate::core::TrialRecord;
use crate::interfaces::CompletionCache;
use crate::interfaces::CompletionLookup;
use crate::interfaces::LookupError;
use crate::interfaces::RunStore;
use crate::interfaces::StoreError;
use crate::runtime::store::SharedCompletionCache;
use crate::runtime::store::SharedRunStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default cap on candidate trials returned per entity.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

// ============================================================================
// SECTION: Run Store Adapter
// ============================================================================

/// Scope-bound view of a run store.
#[derive(Clone)]
pub struct RunStoreAdapter {
    /// Backing store.
    store: SharedRunStore,
    /// Tag key resolver.
    tags: Arc<dyn TagKeyResolver + Send + Sync>,
    /// Experiment scope.
    scope: ScopeId,
    /// Result limit per query.
    max_results: usize,
    /// Extra tags every candidate must carry.
    required_tags: BTreeMap<String, String>,
}

impl RunStoreAdapter {
    /// Creates an adapter with the default result limit.
    #[must_use]
    pub fn new(
        store: SharedRunStore,
        tags: Arc<dyn TagKeyResolver + Send + Sync>,
        scope: ScopeId,
    ) -> Self {
        Self {
            store,
            tags,
            scope,
            max_results: DEFAULT_MAX_RESULTS,
            required_tags: BTreeMap::new(),
        }
    }

    /// Returns the adapter with a result limit.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Returns the adapter with extra required tags.
    #[must_use]
    pub fn with_required_tags(mut self, required_tags: BTreeMap<String, String>) -> Self {
        self.required_tags = required_tags;
        self
    }

    /// Returns the result limit per query.
    #[must_use]
    pub const fn max_results(&self) -> usize {
        self.max_results
    }

    /// Returns the bound scope.
    #[must_use]
    pub const fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// Returns finished trials tagged with `entity`, at most `max_results`.
    ///
    /// A full page means more trials may exist; the planner reports it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store query fails.
    pub fn candidates_for(&self, entity: &EntityId) -> Result<Vec<TrialRecord>, StoreError> {
        let mut required = self.required_tags.clone();
        required.insert(self.tags.key(TagName::Entity).to_string(), entity.to_string());
        self.store.query_by_tags(&self.scope, &required, self.max_results)
    }
}

impl CompletionLookup for RunStoreAdapter {
    fn is_complete(&self, key: &BenchmarkKey) -> Result<bool, LookupError> {
        Ok(self.store.record_exists_with_tag(
            self.tags.key(TagName::BenchmarkKey),
            key.as_str(),
            &self.scope,
        )?)
    }
}

// ============================================================================
// SECTION: Cache Lookup
// ============================================================================

/// Completion lookup answered by a completion cache.
#[derive(Clone)]
pub struct CacheCompletionLookup {
    /// Backing cache.
    cache: SharedCompletionCache,
}

impl CacheCompletionLookup {
    /// Creates a cache-backed lookup.
    #[must_use]
    pub const fn new(cache: SharedCompletionCache) -> Self {
        Self {
            cache,
        }
    }
}

impl CompletionLookup for CacheCompletionLookup {
    fn is_complete(&self, key: &BenchmarkKey) -> Result<bool, LookupError> {
        self.cache.contains(key)
    }
}

// ============================================================================
// SECTION: Layered Lookup
// ============================================================================

/// Ordered chain of lookups; the first positive answer wins.
///
/// Errors are never skipped: a failing layer fails the lookup even when a
/// later layer might have answered.
#[derive(Clone)]
pub struct LayeredCompletionLookup {
    /// Lookups in evaluation order.
    layers: Vec<Arc<dyn CompletionLookup + Send + Sync>>,
}

impl LayeredCompletionLookup {
    /// Creates a layered lookup from ordered layers.
    #[must_use]
    pub fn new(layers: Vec<Arc<dyn CompletionLookup + Send + Sync>>) -> Self {
        Self {
            layers,
        }
    }

    /// Store first, cache second.
    #[must_use]
    pub fn store_then_cache(store: RunStoreAdapter, cache: SharedCompletionCache) -> Self {
        Self::new(vec![Arc::new(store), Arc::new(CacheCompletionLookup::new(cache))])
    }
}

impl CompletionLookup for LayeredCompletionLookup {
    fn is_complete(&self, key: &BenchmarkKey) -> Result<bool, LookupError> {
        for layer in &self.layers {
            if layer.is_complete(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
