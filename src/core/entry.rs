//! Context entry model and relevance scoring.
//!
//! A [`ContextEntry`] is one timestamped, typed, prioritized unit of content
//! with optional expiry and a pinned flag. Relevance scoring is a pure
//! function of the entry's metadata and an externally supplied "now", so the
//! eviction order is reproducible under an injected clock.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::payload::Payload;

/// Base score contribution per priority step (Low scores 100, Critical 400).
pub const PRIORITY_BASE_WEIGHT: f64 = 100.0;

/// Flat score bonus for pinned entries.
pub const PINNED_BONUS: f64 = 200.0;

/// Half-life of the age decay, in minutes.
pub const DECAY_HALF_LIFE_MINUTES: f64 = 5.0;

/// Post-decay multiplier for critical entries (halves their effective decay).
pub const CRITICAL_DECAY_MULTIPLIER: f64 = 2.0;

/// Priority level of a context entry.
///
/// Ordering follows the numeric value, so `min_priority` filters can use
/// ordinary comparisons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Priority {
    /// Background information.
    Low = 1,
    /// Regular updates.
    Medium = 2,
    /// Important mission data.
    High = 3,
    /// Emergency, safety-critical.
    Critical = 4,
}

impl Priority {
    /// All priority levels, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the ordinal value (1 for Low through 4 for Critical).
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns the upper-case label used in formatted views.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Semantic category of a context entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    /// Sensor readings.
    #[serde(rename = "sensor")]
    SensorData,
    /// Discrete events.
    #[serde(rename = "event")]
    Event,
    /// Mission status updates.
    #[serde(rename = "mission")]
    MissionUpdate,
    /// Conversation turns.
    #[serde(rename = "conversation")]
    Conversation,
    /// Platform state snapshots.
    #[serde(rename = "system")]
    SystemState,
    /// Environmental data.
    #[serde(rename = "environmental")]
    Environmental,
}

impl Category {
    /// All categories, in stable display order.
    pub const ALL: [Self; 6] = [
        Self::SensorData,
        Self::Event,
        Self::MissionUpdate,
        Self::Conversation,
        Self::SystemState,
        Self::Environmental,
    ];

    /// Returns the stable string label used in views and stats.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SensorData => "sensor",
            Self::Event => "event",
            Self::MissionUpdate => "mission",
            Self::Conversation => "conversation",
            Self::SystemState => "system",
            Self::Environmental => "environmental",
        }
    }
}

/// Single context entry with metadata.
///
/// Entries are constructed by the buffer's `add_*` operations; `created_at`
/// and the category (implied by the payload variant) are immutable after
/// insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Entry content; never interpreted by the buffer.
    pub payload: Payload,

    /// Priority level.
    pub priority: Priority,

    /// Unix timestamp (milliseconds) at insertion.
    pub created_at_ms: i64,

    /// Estimated token cost, computed at insertion.
    pub size_cost: usize,

    /// Time to live; `None` means no TTL expiry.
    pub ttl: Option<Duration>,

    /// Pinned entries are exempt from eviction and TTL expiry.
    pub pinned: bool,

    /// Informational metadata; never read by core logic.
    pub tags: BTreeMap<String, String>,

    /// Insertion sequence number, used only for FIFO tie-breaking.
    pub(crate) seq: u64,
}

impl ContextEntry {
    /// Returns the category implied by the payload shape.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.payload.category()
    }

    /// Returns the entry age in milliseconds at the given instant.
    ///
    /// Clamped at zero if the clock reads before the creation instant.
    #[must_use]
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.created_at_ms).max(0)
    }

    /// Returns the entry age in seconds at the given instant.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn age_seconds(&self, now_ms: i64) -> f64 {
        self.age_ms(now_ms) as f64 / 1000.0
    }

    /// Checks whether the entry has outlived its TTL at the given instant.
    ///
    /// Pinned entries never expire, regardless of the `ttl` field.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        if self.pinned {
            return false;
        }
        self.ttl
            .is_some_and(|ttl| self.age_ms(now_ms) as f64 > ttl.as_secs_f64() * 1000.0)
    }

    /// Computes the relevance score at the given instant.
    ///
    /// Higher is more relevant. The score combines the priority base weight,
    /// a pinned bonus, and an exponential age decay with a five-minute
    /// half-life; critical entries decay at half the effective rate. Used
    /// only as an eviction/ranking key, never returned to callers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn relevance_score(&self, now_ms: i64) -> f64 {
        let mut score = f64::from(self.priority.value()) * PRIORITY_BASE_WEIGHT;

        if self.pinned {
            score += PINNED_BONUS;
        }

        let age_minutes = self.age_ms(now_ms) as f64 / 60_000.0;
        let decay = 0.5_f64.powf(age_minutes / DECAY_HALF_LIFE_MINUTES);
        score *= decay;

        if self.priority == Priority::Critical {
            score *= CRITICAL_DECAY_MULTIPLIER;
        }

        score
    }
}
