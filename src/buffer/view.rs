//! Retrieval filtering and view rendering.
//!
//! The formatted view is the string handed to the text-generation engine:
//! relevance-sorted, grouped under per-category headers. The structured view
//! is a plain map for programmatic consumers, in insertion order.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::core::{Category, ContextEntry, Priority};

/// Optional filters for the formatted view.
///
/// # Examples
///
/// ```
/// use cwm_rs::buffer::ContextFilter;
/// use cwm_rs::core::{Category, Priority};
///
/// let filter = ContextFilter::new()
///     .category(Category::SensorData)
///     .min_priority(Priority::Medium);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextFilter {
    /// Keep only entries of this category.
    pub category: Option<Category>,
    /// Keep only entries at or above this priority.
    pub min_priority: Option<Priority>,
    /// Keep only entries no older than this.
    pub max_age: Option<Duration>,
}

impl ContextFilter {
    /// Creates an empty filter (keeps everything).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            category: None,
            min_priority: None,
            max_age: None,
        }
    }

    /// Filters to a single category.
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Filters to entries at or above the given priority.
    #[must_use]
    pub const fn min_priority(mut self, priority: Priority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    /// Filters to entries no older than the given age.
    #[must_use]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Checks whether an entry passes the filter at the given instant.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn matches(&self, entry: &ContextEntry, now_ms: i64) -> bool {
        if self.category.is_some_and(|c| c != entry.category()) {
            return false;
        }
        if self.min_priority.is_some_and(|p| entry.priority < p) {
            return false;
        }
        if self
            .max_age
            .is_some_and(|age| entry.age_ms(now_ms) as f64 > age.as_secs_f64() * 1000.0)
        {
            return false;
        }
        true
    }
}

/// One entry record in the structured view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    /// Payload content as plain JSON.
    pub content: Value,
    /// Priority label.
    pub priority: Priority,
    /// Entry age in seconds at snapshot time.
    pub age_seconds: f64,
    /// Unix timestamp (milliseconds) at insertion.
    pub created_at_ms: i64,
}

impl EntrySnapshot {
    /// Builds a snapshot record from an entry at the given instant.
    #[must_use]
    pub(crate) fn from_entry(entry: &ContextEntry, now_ms: i64) -> Self {
        Self {
            content: entry.payload.to_value(),
            priority: entry.priority,
            age_seconds: entry.age_seconds(now_ms),
            created_at_ms: entry.created_at_ms,
        }
    }
}

/// Renders relevance-sorted entries as the formatted context block.
///
/// Entries must already be sorted descending by relevance; grouping preserves
/// that relative order within each category.
#[must_use]
pub(crate) fn format_context(sorted: &[&ContextEntry], now_ms: i64) -> String {
    let mut groups: Vec<(Category, Vec<&ContextEntry>)> = Vec::new();
    for &entry in sorted {
        let category = entry.category();
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, members)) => members.push(entry),
            None => groups.push((category, vec![entry])),
        }
    }

    let mut parts = Vec::new();
    for (category, members) in groups {
        parts.push(format!("\n=== {} ===", category.label().to_uppercase()));
        for entry in members {
            parts.push(format_entry(entry, now_ms));
        }
    }

    parts.join("\n")
}

/// Builds the structured view: category label to snapshot records, insertion
/// order preserved within each category.
#[must_use]
pub(crate) fn snapshot_map(
    entries: &[ContextEntry],
    now_ms: i64,
) -> BTreeMap<Category, Vec<EntrySnapshot>> {
    let mut map: BTreeMap<Category, Vec<EntrySnapshot>> = BTreeMap::new();
    for entry in entries {
        map.entry(entry.category())
            .or_default()
            .push(EntrySnapshot::from_entry(entry, now_ms));
    }
    map
}

/// Formats one entry line: priority label, whole-second age, pretty payload.
fn format_entry(entry: &ContextEntry, now_ms: i64) -> String {
    let age_secs = entry.age_ms(now_ms) / 1000;
    let value = entry.payload.to_value();
    let content = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    format!("[{}] ({age_secs}s ago) {content}", entry.priority.label())
}
