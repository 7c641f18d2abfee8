// crates/champion-gate-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Run Store
// Description: Durable RunStore and completion cache backend using SQLite WAL.
// Purpose: Persist trial records and benchmark completions for Champion Gate.
// Dependencies: champion-gate-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`champion_gate_core::RunStore`] that
//! persists canonical trial record snapshots with a tag index for exact tag
//! queries, plus a [`champion_gate_core::CompletionCache`] sharing the same
//! schema. Stored payloads are hashed on write and verified on read.
//! Security posture: database contents are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_RECORD_BYTES;
pub use store::SqliteCompletionCache;
pub use store::SqliteRunStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
