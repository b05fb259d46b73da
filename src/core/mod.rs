//! Core domain models for the context window manager.
//!
//! This module contains the fundamental data structures: entries, priorities,
//! categories, and the payload sum type. These are pure domain models with no
//! I/O dependencies; relevance scoring lives here because it is a pure
//! function of entry metadata and a supplied instant.

pub mod entry;
pub mod payload;

pub use entry::{Category, ContextEntry, Priority};
pub use payload::Payload;
