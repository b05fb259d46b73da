//! # CWM-RS
//!
//! Context window manager for on-device LLM decision support.
//!
//! CWM-RS budgets a bounded amount of context (telemetry, events, mission
//! state, conversation turns) for a downstream text-generation engine. The
//! core is [`ContextBuffer`]: a bounded, heterogeneous,
//! priority-and-recency-aware buffer with automatic eviction, TTL expiry,
//! and relevance-ranked retrieval.
//!
//! ## Features
//!
//! - **Typed insertion**: one `add_*` operation per semantic category, with
//!   per-category priority/TTL/pinning defaults
//! - **Relevance scoring**: priority-weighted exponential age decay drives
//!   eviction order and retrieval ranking
//! - **Capacity budget**: threshold-triggered eviction of low-relevance,
//!   non-pinned entries; pinned entries are never auto-removed
//! - **Deterministic time**: an injectable [`Clock`] makes scoring and
//!   expiry reproducible under test
//!
//! Size costs are a serialized-length estimate, not tokenizer output; the
//! buffer never interprets payload contents.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod clock;
pub mod compress;
pub mod core;
pub mod error;

// Re-export commonly used types at crate root
pub use error::{CompressionError, Error, Result};

// Re-export core domain types
pub use crate::core::{Category, ContextEntry, Payload, Priority};

// Re-export buffer types
pub use buffer::{
    BufferConfig, BufferStats, ContextBuffer, ContextFilter, EntryOptions, EntrySnapshot,
};

// Re-export clock types
pub use clock::{Clock, ManualClock, SystemClock};
