// crates/champion-gate-config/src/lib.rs
// ============================================================================
// Module: Champion Gate Config Library
// Description: Canonical config model, validation, and runtime wiring.
// Purpose: Single source of truth for champion-gate.toml semantics.
// Dependencies: champion-gate-core, champion-gate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `champion-gate-config` defines the configuration model for Champion Gate.
//! It provides strict, fail-closed validation and builds the selector, gate,
//! stores, and planner from one validated file.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
