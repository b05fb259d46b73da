//! Buffer configuration.

use crate::error::{Error, Result};

/// Default capacity in estimated tokens.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Default fraction of capacity at which eviction triggers.
pub const DEFAULT_EVICTION_THRESHOLD: f64 = 0.8;

/// Default serialized-length divisor for size-cost estimation
/// (~4 characters per token).
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Configuration for a [`ContextBuffer`](crate::buffer::ContextBuffer).
///
/// Validated once at construction; invalid configurations are the only fatal
/// error in the crate.
///
/// # Examples
///
/// ```
/// use cwm_rs::buffer::BufferConfig;
///
/// let config = BufferConfig::with_capacity(1000).eviction_threshold(0.8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BufferConfig {
    /// Maximum aggregate size cost (estimated tokens).
    pub capacity: usize,
    /// Fraction of capacity, in (0, 1], at which eviction triggers.
    pub eviction_threshold: f64,
    /// Whether sensor payloads are compressed before cost estimation.
    pub compression_enabled: bool,
    /// Serialized-length divisor for size-cost estimation.
    pub chars_per_token: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
            compression_enabled: true,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }

    /// Creates a configuration with a custom capacity and default settings.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
            compression_enabled: true,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }

    /// Sets the eviction threshold ratio.
    #[must_use]
    pub const fn eviction_threshold(mut self, ratio: f64) -> Self {
        self.eviction_threshold = ratio;
        self
    }

    /// Enables or disables sensor payload compression.
    #[must_use]
    pub const fn compression(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    /// Sets the serialized-length divisor for size-cost estimation.
    #[must_use]
    pub const fn chars_per_token(mut self, divisor: usize) -> Self {
        self.chars_per_token = divisor;
        self
    }

    /// Returns the size at which an insertion triggers eviction.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn threshold_size(&self) -> usize {
        (self.capacity as f64 * self.eviction_threshold) as usize
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero, the eviction
    /// threshold is outside `(0, 1]`, or `chars_per_token` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config {
                message: "capacity must be greater than zero".to_string(),
            });
        }
        if self.eviction_threshold <= 0.0 || self.eviction_threshold > 1.0 {
            return Err(Error::Config {
                message: format!(
                    "eviction threshold must be in (0, 1], got {}",
                    self.eviction_threshold
                ),
            });
        }
        if self.chars_per_token == 0 {
            return Err(Error::Config {
                message: "chars_per_token must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
