//! Buffer statistics snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Category, Priority};

/// Point-in-time statistics for a
/// [`ContextBuffer`](crate::buffer::ContextBuffer).
///
/// A plain structured snapshot suitable for periodic telemetry export; it
/// holds no references into the buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    /// Number of resident entries.
    pub entry_count: usize,

    /// Current aggregate size cost (estimated tokens).
    pub current_size: usize,

    /// Configured capacity (estimated tokens).
    pub capacity: usize,

    /// `current_size / capacity`. Capacity is guaranteed non-zero at
    /// construction, so this never divides by zero.
    pub utilization: f64,

    /// True when the aggregate size exceeds capacity and eviction cannot
    /// free space because every resident entry is pinned.
    pub degraded: bool,

    /// Number of resident pinned entries.
    pub pinned_count: usize,

    /// Resident entry counts per category.
    pub entries_by_category: BTreeMap<Category, usize>,

    /// Resident entry counts per priority.
    pub entries_by_priority: BTreeMap<Priority, usize>,

    /// Lifetime count of inserted entries.
    pub total_inserted: u64,

    /// Lifetime count of entries removed under capacity pressure.
    pub total_evicted: u64,

    /// Lifetime count of entries removed by TTL expiry.
    pub total_expired: u64,

    /// Lifetime count of sensor payload compression passes.
    pub total_compressions: u64,
}
