//! The context buffer: a bounded, priority-and-recency-aware store.
//!
//! [`ContextBuffer`] owns an ordered collection of entries, tracks their
//! aggregate size cost, and enforces a capacity budget by evicting
//! low-relevance, non-pinned entries. Producers feed it through typed `add_*`
//! operations; consumers pull a formatted or structured view.
//!
//! The buffer is a synchronous in-memory structure. Every operation that can
//! remove entries (including retrieval, which expires lazily) takes
//! `&mut self`, so the size counter and the entry collection always change
//! together; callers sharing the buffer across threads wrap it in their own
//! mutex.

pub mod config;
pub mod stats;
pub mod view;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub use config::{
    BufferConfig, DEFAULT_CAPACITY, DEFAULT_CHARS_PER_TOKEN, DEFAULT_EVICTION_THRESHOLD,
};
pub use stats::BufferStats;
pub use view::{ContextFilter, EntrySnapshot};

use crate::clock::{Clock, SystemClock};
use crate::compress::{compress_readings, estimate_size_cost, truncate_graphemes};
use crate::core::{Category, ContextEntry, Payload, Priority};
use crate::error::Result;

/// Length bound for the string fallback stored when compression rejects a
/// payload shape.
const FALLBACK_TRUNCATE_LEN: usize = 120;

/// Per-entry overrides for the typed `add_*` operations.
///
/// The all-default value means "use the category's defaults" for priority,
/// TTL, and pinning.
///
/// # Examples
///
/// ```
/// use cwm_rs::buffer::EntryOptions;
/// use cwm_rs::core::Priority;
/// use std::time::Duration;
///
/// let opts = EntryOptions::new()
///     .priority(Priority::Critical)
///     .ttl(Duration::from_secs(30))
///     .pinned(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryOptions {
    priority: Option<Priority>,
    // Outer None: category default. Inner None: explicitly no TTL.
    ttl: Option<Option<Duration>>,
    pinned: Option<bool>,
    tags: BTreeMap<String, String>,
}

impl EntryOptions {
    /// Creates options that keep every category default.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            priority: None,
            ttl: None,
            pinned: None,
            tags: BTreeMap::new(),
        }
    }

    /// Overrides the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Overrides the TTL.
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(Some(ttl));
        self
    }

    /// Disables TTL expiry, overriding any category default.
    #[must_use]
    pub const fn no_ttl(mut self) -> Self {
        self.ttl = Some(None);
        self
    }

    /// Overrides the pinned flag.
    #[must_use]
    pub const fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    /// Attaches an informational tag. Tags are never read by core logic.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Default priority, TTL, and pinning for a category.
const fn category_defaults(category: Category) -> (Priority, Option<Duration>, bool) {
    match category {
        Category::SensorData => (Priority::Medium, Some(Duration::from_secs(300)), false),
        Category::Event => (Priority::High, None, false),
        Category::MissionUpdate => (Priority::High, None, true),
        Category::Conversation => (Priority::Medium, Some(Duration::from_secs(600)), false),
        Category::SystemState => (Priority::High, None, true),
        Category::Environmental => (Priority::Medium, Some(Duration::from_secs(600)), false),
    }
}

/// Bounded context buffer with automatic eviction and TTL expiry.
///
/// # Examples
///
/// ```
/// use cwm_rs::buffer::{BufferConfig, ContextBuffer, ContextFilter};
/// use serde_json::{Map, json};
///
/// let mut buffer = ContextBuffer::new(BufferConfig::with_capacity(2048)).unwrap();
///
/// let mut readings = Map::new();
/// readings.insert("battery".to_string(), json!(75));
/// buffer.add_sensor_data(readings);
///
/// let context = buffer.context(&ContextFilter::new());
/// assert!(context.contains("=== SENSOR ==="));
/// ```
#[derive(Debug)]
pub struct ContextBuffer {
    config: BufferConfig,
    clock: Arc<dyn Clock>,
    entries: Vec<ContextEntry>,
    current_size: usize,
    next_seq: u64,
    total_inserted: u64,
    total_evicted: u64,
    total_expired: u64,
    total_compressions: u64,
}

impl ContextBuffer {
    /// Creates a buffer with the given configuration and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn new(config: BufferConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a buffer with an explicit clock.
    ///
    /// Tests inject a [`crate::clock::ManualClock`] here so scoring and
    /// expiry are deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn with_clock(config: BufferConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        info!(
            capacity = config.capacity,
            threshold = config.eviction_threshold,
            "context buffer initialized"
        );
        Ok(Self {
            config,
            clock,
            entries: Vec::new(),
            current_size: 0,
            next_seq: 0,
            total_inserted: 0,
            total_evicted: 0,
            total_expired: 0,
            total_compressions: 0,
        })
    }

    // --- typed add operations ---------------------------------------------

    /// Adds sensor readings with category defaults
    /// (Medium priority, 300 s TTL).
    pub fn add_sensor_data(&mut self, readings: Map<String, Value>) {
        self.add_sensor_data_with(readings, EntryOptions::new());
    }

    /// Adds sensor readings with explicit overrides.
    ///
    /// Readings are compressed before cost estimation when compression is
    /// enabled; a payload shape the compressor rejects is stored as a
    /// truncated string form instead; the insertion itself never fails.
    pub fn add_sensor_data_with(&mut self, readings: Map<String, Value>, opts: EntryOptions) {
        let mut opts = opts;
        let raw_keys = readings.keys().cloned().collect::<Vec<_>>().join(",");
        opts.tags.insert("raw_keys".to_string(), raw_keys);

        let payload = if self.config.compression_enabled {
            match compress_readings(&readings) {
                Ok(compressed) => {
                    self.total_compressions += 1;
                    Payload::Sensor(compressed)
                }
                Err(err) => {
                    warn!(error = %err, "sensor compression failed, storing truncated form");
                    let mut fallback = Map::new();
                    fallback.insert(
                        "raw".to_string(),
                        Value::String(truncate_graphemes(
                            &Value::Object(readings).to_string(),
                            FALLBACK_TRUNCATE_LEN,
                        )),
                    );
                    Payload::Sensor(fallback)
                }
            }
        } else {
            Payload::Sensor(readings)
        };

        self.insert(payload, opts);
    }

    /// Adds a named event with category defaults (High priority, no TTL).
    pub fn add_event(&mut self, name: impl Into<String>, data: Map<String, Value>) {
        self.add_event_with(name, data, EntryOptions::new());
    }

    /// Adds a named event with explicit overrides.
    pub fn add_event_with(
        &mut self,
        name: impl Into<String>,
        data: Map<String, Value>,
        opts: EntryOptions,
    ) {
        let name = name.into();
        debug!(event = %name, "event added");
        self.insert(Payload::Event { name, data }, opts);
    }

    /// Adds a mission status update with category defaults
    /// (High priority, pinned).
    pub fn add_mission_update(&mut self, update: Map<String, Value>) {
        self.add_mission_update_with(update, EntryOptions::new());
    }

    /// Adds a mission status update with explicit overrides.
    pub fn add_mission_update_with(&mut self, update: Map<String, Value>, opts: EntryOptions) {
        self.insert(Payload::Mission(update), opts);
    }

    /// Adds a conversation turn with category defaults
    /// (Medium priority, 600 s TTL).
    pub fn add_conversation(&mut self, role: impl Into<String>, message: impl Into<String>) {
        self.add_conversation_with(role, message, EntryOptions::new());
    }

    /// Adds a conversation turn with explicit overrides.
    pub fn add_conversation_with(
        &mut self,
        role: impl Into<String>,
        message: impl Into<String>,
        opts: EntryOptions,
    ) {
        self.insert(
            Payload::Conversation {
                role: role.into(),
                message: message.into(),
            },
            opts,
        );
    }

    /// Adds a platform state snapshot with category defaults
    /// (High priority, pinned).
    pub fn add_system_state(&mut self, state: Map<String, Value>) {
        self.add_system_state_with(state, EntryOptions::new());
    }

    /// Adds a platform state snapshot with explicit overrides.
    pub fn add_system_state_with(&mut self, state: Map<String, Value>, opts: EntryOptions) {
        self.insert(Payload::System(state), opts);
    }

    /// Adds environmental data with category defaults
    /// (Medium priority, 600 s TTL).
    pub fn add_environmental(&mut self, env: Map<String, Value>) {
        self.add_environmental_with(env, EntryOptions::new());
    }

    /// Adds environmental data with explicit overrides.
    pub fn add_environmental_with(&mut self, env: Map<String, Value>, opts: EntryOptions) {
        self.insert(Payload::Environmental(env), opts);
    }

    // --- retrieval --------------------------------------------------------

    /// Returns the formatted context block for the generation engine.
    ///
    /// Runs the lazy expiry pass, applies the filter, sorts the survivors
    /// descending by relevance, and renders them grouped under per-category
    /// headers.
    pub fn context(&mut self, filter: &ContextFilter) -> String {
        self.purge_expired();
        let now_ms = self.clock.now_ms();

        let mut scored: Vec<(f64, &ContextEntry)> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry, now_ms))
            .map(|entry| (entry.relevance_score(now_ms), entry))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let sorted: Vec<&ContextEntry> = scored.into_iter().map(|(_, entry)| entry).collect();
        view::format_context(&sorted, now_ms)
    }

    /// Returns the structured view: every surviving entry grouped by
    /// category, insertion order preserved within each group.
    pub fn context_map(&mut self) -> BTreeMap<Category, Vec<EntrySnapshot>> {
        self.purge_expired();
        view::snapshot_map(&self.entries, self.clock.now_ms())
    }

    // --- maintenance ------------------------------------------------------

    /// Removes every non-pinned entry whose TTL has elapsed.
    ///
    /// Called automatically at the start of every retrieval; exposed for
    /// explicit maintenance. Returns the number of entries removed. Expired
    /// removals increment the expiry counter, never the eviction counter.
    pub fn purge_expired(&mut self) -> usize {
        let now_ms = self.clock.now_ms();
        let mut removed = 0usize;
        let mut removed_cost = 0usize;

        self.entries.retain(|entry| {
            if entry.is_expired(now_ms) {
                removed += 1;
                removed_cost += entry.size_cost;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.current_size -= removed_cost;
            self.total_expired += removed as u64;
            debug!(removed, "expired entries removed");
        }
        removed
    }

    /// Removes all entries and zeroes the running size.
    ///
    /// Lifetime counters are preserved.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
        info!("context cleared");
    }

    /// Removes all entries of one category, deducting their sizes.
    ///
    /// Returns the number of entries removed. Pinned entries are removed
    /// too: explicit clears override pinning.
    pub fn clear_category(&mut self, category: Category) -> usize {
        let mut removed = 0usize;
        let mut removed_cost = 0usize;

        self.entries.retain(|entry| {
            if entry.category() == category {
                removed += 1;
                removed_cost += entry.size_cost;
                false
            } else {
                true
            }
        });

        self.current_size -= removed_cost;
        info!(category = category.label(), removed, "category cleared");
        removed
    }

    /// Returns a statistics snapshot.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> BufferStats {
        let mut entries_by_category: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        let mut entries_by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut pinned_count = 0usize;

        for entry in &self.entries {
            if let Some(count) = entries_by_category.get_mut(&entry.category()) {
                *count += 1;
            }
            if let Some(count) = entries_by_priority.get_mut(&entry.priority) {
                *count += 1;
            }
            if entry.pinned {
                pinned_count += 1;
            }
        }

        BufferStats {
            entry_count: self.entries.len(),
            current_size: self.current_size,
            capacity: self.config.capacity,
            utilization: self.current_size as f64 / self.config.capacity as f64,
            degraded: self.current_size > self.config.capacity,
            pinned_count,
            entries_by_category,
            entries_by_priority,
            total_inserted: self.total_inserted,
            total_evicted: self.total_evicted,
            total_expired: self.total_expired,
            total_compressions: self.total_compressions,
        }
    }

    /// Returns the number of resident entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the buffer holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the current aggregate size cost.
    #[must_use]
    pub const fn current_size(&self) -> usize {
        self.current_size
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.config.capacity
    }

    // --- internals --------------------------------------------------------

    /// Constructs and appends an entry, then evicts if over threshold.
    fn insert(&mut self, payload: Payload, opts: EntryOptions) {
        let (default_priority, default_ttl, default_pinned) =
            category_defaults(payload.category());

        let value = payload.to_value();
        let size_cost = estimate_size_cost(&value, self.config.chars_per_token)
            .unwrap_or_else(|err| {
                warn!(error = %err, "size estimation failed, using raw length");
                value.to_string().len() / self.config.chars_per_token.max(1)
            });

        let entry = ContextEntry {
            payload,
            priority: opts.priority.unwrap_or(default_priority),
            created_at_ms: self.clock.now_ms(),
            size_cost,
            ttl: opts.ttl.unwrap_or(default_ttl),
            pinned: opts.pinned.unwrap_or(default_pinned),
            tags: opts.tags,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.current_size += entry.size_cost;
        self.total_inserted += 1;
        debug!(
            category = entry.category().label(),
            priority = entry.priority.label(),
            size_cost = entry.size_cost,
            current_size = self.current_size,
            "entry added"
        );
        self.entries.push(entry);

        if self.current_size > self.config.threshold_size() {
            self.evict();
        }
    }

    /// Evicts low-relevance, non-pinned entries under capacity pressure.
    ///
    /// Candidates are sorted ascending by relevance with a FIFO tie-break
    /// (earliest inserted of equal score goes first) and removed until the
    /// running size is at most `capacity` (the hard ceiling, not the
    /// threshold, so the next insertion has headroom). If every remaining
    /// entry is pinned and the size still exceeds capacity, the buffer stays
    /// in the degraded state reported by [`Self::stats`].
    fn evict(&mut self) {
        let now_ms = self.clock.now_ms();
        debug!(
            current_size = self.current_size,
            capacity = self.config.capacity,
            "eviction pass"
        );

        let mut candidates: Vec<(f64, u64)> = self
            .entries
            .iter()
            .filter(|entry| !entry.pinned)
            .map(|entry| (entry.relevance_score(now_ms), entry.seq))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut removed = 0usize;
        for (_, seq) in candidates {
            if self.current_size <= self.config.capacity {
                break;
            }
            if let Some(pos) = self.entries.iter().position(|entry| entry.seq == seq) {
                let entry = self.entries.remove(pos);
                self.current_size -= entry.size_cost;
                self.total_evicted += 1;
                removed += 1;
            }
        }

        if self.current_size > self.config.capacity {
            warn!(
                current_size = self.current_size,
                capacity = self.config.capacity,
                "degraded capacity: remaining entries are pinned"
            );
        } else if removed > 0 {
            info!(
                removed,
                current_size = self.current_size,
                capacity = self.config.capacity,
                "evicted entries"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn readings(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn test_buffer(capacity: usize) -> (ContextBuffer, Arc<ManualClock>) {
        let clock = ManualClock::shared(0);
        let buffer = ContextBuffer::with_clock(
            BufferConfig::with_capacity(capacity),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();
        (buffer, clock)
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ContextBuffer::new(BufferConfig::with_capacity(0)).is_err());
        assert!(
            ContextBuffer::new(BufferConfig::with_capacity(100).eviction_threshold(2.0)).is_err()
        );
    }

    #[test]
    fn test_add_tracks_size() {
        let (mut buffer, _clock) = test_buffer(2048);
        assert!(buffer.is_empty());

        buffer.add_sensor_data(readings(&[("battery", json!(75))]));
        assert_eq!(buffer.len(), 1);
        assert!(buffer.current_size() > 0);

        let expected: usize = buffer.entries.iter().map(|e| e.size_cost).sum();
        assert_eq!(buffer.current_size(), expected);
    }

    #[test]
    fn test_category_defaults_applied() {
        let (mut buffer, _clock) = test_buffer(2048);

        buffer.add_sensor_data(readings(&[("battery", json!(75))]));
        buffer.add_event("obstacle_detected", Map::new());
        buffer.add_mission_update(readings(&[("waypoint", json!(3))]));
        buffer.add_conversation("operator", "status?");
        buffer.add_system_state(readings(&[("mode", json!("loiter"))]));
        buffer.add_environmental(readings(&[("wind", json!(12))]));

        let by_cat = |c: Category| {
            buffer
                .entries
                .iter()
                .find(|e| e.category() == c)
                .unwrap()
                .clone()
        };

        let sensor = by_cat(Category::SensorData);
        assert_eq!(sensor.priority, Priority::Medium);
        assert_eq!(sensor.ttl, Some(Duration::from_secs(300)));
        assert!(!sensor.pinned);

        let event = by_cat(Category::Event);
        assert_eq!(event.priority, Priority::High);
        assert_eq!(event.ttl, None);
        assert!(!event.pinned);

        let mission = by_cat(Category::MissionUpdate);
        assert!(mission.pinned);
        assert_eq!(mission.ttl, None);

        let conversation = by_cat(Category::Conversation);
        assert_eq!(conversation.ttl, Some(Duration::from_secs(600)));

        let system = by_cat(Category::SystemState);
        assert!(system.pinned);

        let env = by_cat(Category::Environmental);
        assert_eq!(env.priority, Priority::Medium);
        assert_eq!(env.ttl, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_entry_options_override_defaults() {
        let (mut buffer, _clock) = test_buffer(2048);

        buffer.add_sensor_data_with(
            readings(&[("battery", json!(10))]),
            EntryOptions::new()
                .priority(Priority::Critical)
                .no_ttl()
                .pinned(true)
                .tag("source", "bms"),
        );

        let entry = &buffer.entries[0];
        assert_eq!(entry.priority, Priority::Critical);
        assert_eq!(entry.ttl, None);
        assert!(entry.pinned);
        assert_eq!(entry.tags.get("source").map(String::as_str), Some("bms"));
    }

    #[test]
    fn test_sensor_tags_record_raw_keys() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_sensor_data(readings(&[
            ("battery", json!(75)),
            ("gps", json!({"lat": 1.0, "lon": 2.0})),
        ]));

        let tags = &buffer.entries[0].tags;
        assert_eq!(tags.get("raw_keys").map(String::as_str), Some("battery,gps"));
    }

    #[test]
    fn test_compression_counter() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_sensor_data(readings(&[("altitude", json!(103.4567))]));
        buffer.add_sensor_data(readings(&[("altitude", json!(104.1))]));
        assert_eq!(buffer.stats().total_compressions, 2);
    }

    #[test]
    fn test_compression_disabled() {
        let clock = ManualClock::shared(0);
        let mut buffer = ContextBuffer::with_clock(
            BufferConfig::with_capacity(2048).compression(false),
            clock as Arc<dyn Clock>,
        )
        .unwrap();

        buffer.add_sensor_data(readings(&[("altitude", json!(103.4567))]));
        assert_eq!(buffer.stats().total_compressions, 0);

        // Uncompressed: the float keeps its full precision.
        let Payload::Sensor(map) = &buffer.entries[0].payload else {
            unreachable!("sensor payload expected");
        };
        assert_eq!(map["altitude"], json!(103.4567));
    }

    #[test]
    fn test_eviction_fires_over_threshold() {
        // Capacity 100, threshold 80. Flood with low-priority entries.
        let (mut buffer, clock) = test_buffer(100);

        for _ in 0..20 {
            clock.advance_secs(1);
            buffer.add_conversation_with(
                "operator",
                "x".repeat(60),
                EntryOptions::new().priority(Priority::Low),
            );
        }

        assert!(buffer.current_size() <= buffer.capacity());
        assert!(buffer.stats().total_evicted > 0);
    }

    #[test]
    fn test_pinned_never_evicted() {
        let (mut buffer, clock) = test_buffer(100);

        buffer.add_mission_update(readings(&[("status", json!("x".repeat(100)))]));
        let mission_seq = buffer.entries[0].seq;

        for _ in 0..10 {
            clock.advance_secs(1);
            buffer.add_conversation("operator", "y".repeat(80));
        }

        assert!(buffer.entries.iter().any(|e| e.seq == mission_seq));
    }

    #[test]
    fn test_degraded_when_all_pinned() {
        let (mut buffer, _clock) = test_buffer(100);

        buffer.add_system_state(readings(&[("dump", json!("z".repeat(900)))]));

        let stats = buffer.stats();
        assert!(stats.current_size > stats.capacity);
        assert!(stats.degraded);
        assert_eq!(stats.total_evicted, 0);
    }

    #[test]
    fn test_clear_preserves_counters() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_conversation("operator", "hello");
        buffer.add_conversation("assistant", "hello back");

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.current_size(), 0);
        assert_eq!(buffer.stats().total_inserted, 2);
    }

    #[test]
    fn test_clear_category() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_conversation("operator", "hello");
        buffer.add_event("takeoff", Map::new());
        buffer.add_mission_update(readings(&[("waypoint", json!(1))]));

        let before = buffer.current_size();
        let removed = buffer.clear_category(Category::Conversation);

        assert_eq!(removed, 1);
        assert_eq!(buffer.len(), 2);
        assert!(buffer.current_size() < before);

        let expected: usize = buffer.entries.iter().map(|e| e.size_cost).sum();
        assert_eq!(buffer.current_size(), expected);
    }

    #[test]
    fn test_clear_category_removes_pinned() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_mission_update(readings(&[("waypoint", json!(1))]));

        assert_eq!(buffer.clear_category(Category::MissionUpdate), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_stats_include_zero_counts() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_event("takeoff", Map::new());

        let stats = buffer.stats();
        assert_eq!(stats.entries_by_category.len(), 6);
        assert_eq!(stats.entries_by_category[&Category::Event], 1);
        assert_eq!(stats.entries_by_category[&Category::SensorData], 0);
        assert_eq!(stats.entries_by_priority[&Priority::High], 1);
        assert_eq!(stats.entries_by_priority[&Priority::Low], 0);
    }

    #[test]
    fn test_expiry_counter_separate_from_eviction() {
        let (mut buffer, clock) = test_buffer(2048);
        buffer.add_sensor_data(readings(&[("battery", json!(75))]));

        clock.advance_secs(301);
        let removed = buffer.purge_expired();

        assert_eq!(removed, 1);
        let stats = buffer.stats();
        assert_eq!(stats.total_expired, 1);
        assert_eq!(stats.total_evicted, 0);
        assert_eq!(stats.current_size, 0);
    }

    #[test]
    fn test_fifo_tie_break() {
        // Same priority, same creation instant, same cost: the earlier
        // insertion is evicted first.
        let (mut buffer, _clock) = test_buffer(100);

        for _ in 0..3 {
            buffer.add_conversation_with(
                "operator",
                "a".repeat(200),
                EntryOptions::new().priority(Priority::Low),
            );
        }

        // Only the last insertion survives; earlier entries of equal score
        // were removed in insertion order.
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.entries[0].seq, 2);
    }

    #[test]
    fn test_context_renders_filtered() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_event("takeoff", Map::new());
        buffer.add_conversation("operator", "climb to 100m");

        let all = buffer.context(&ContextFilter::new());
        assert!(all.contains("=== EVENT ==="));
        assert!(all.contains("=== CONVERSATION ==="));

        let events_only = buffer.context(&ContextFilter::new().category(Category::Event));
        assert!(events_only.contains("=== EVENT ==="));
        assert!(!events_only.contains("=== CONVERSATION ==="));
    }

    #[test]
    fn test_context_map_groups() {
        let (mut buffer, _clock) = test_buffer(2048);
        buffer.add_conversation("operator", "first");
        buffer.add_conversation("assistant", "second");

        let map = buffer.context_map();
        let turns = &map[&Category::Conversation];
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content["message"], json!("first"));
        assert_eq!(turns[1].content["message"], json!("second"));
    }
}
