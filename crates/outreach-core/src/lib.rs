//! Core types and shared contracts for the cold outreach drafter.
//!
//! This crate holds everything the other crates agree on:
//!
//! - [`Settings`] - Process-wide defaults, built once and passed by reference
//! - [`Channel`] and [`AgentSettings`] - Campaign channel and per-owner agent overrides
//! - [`knowledge`] - Static outreach rule tables and keyword search
//! - [`memory`] - Outreach memory patterns and the [`MemoryStore`] trait
//! - [`hash`] - Stable SHA-256 fingerprints
//!
//! Nothing in this crate performs network I/O.

mod error;
pub mod hash;
pub mod knowledge;
pub mod memory;
mod settings;
mod text;
mod types;

pub use error::CoreError;
pub use hash::sha256_hex;
pub use knowledge::{build_context, search, KnowledgeContext, KnowledgeHit};
pub use memory::{
    build_memory_seed, format_memory_for_prompt, MemoryCandidate, MemoryEntry, MemoryError,
    MemoryQuery, MemoryStore, SeedContext,
};
pub use settings::Settings;
pub use text::{collapse_whitespace, truncate_chars};
pub use types::{AgentSettings, Channel};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
