use core::num::NonZeroU32;

use crate::error::ConfigError;

/// Environment variable read by [`GeneratorConfig::from_env`] for the batch
/// size.
pub const BATCH_SIZE_ENV: &str = "BATCHID_BATCH_SIZE";
/// Environment variable read by [`GeneratorConfig::from_env`] for the retry
/// ceiling.
pub const MAX_WRITE_ATTEMPTS_ENV: &str = "BATCHID_MAX_WRITE_ATTEMPTS";

/// Tuning knobs of a [`BatchIdGenerator`].
///
/// - `batch_size`: ids reserved per store round trip (default `100`). Larger
///   batches mean fewer writes and less contention, at the cost of bigger gaps
///   when a process exits with unissued ids.
/// - `max_write_attempts`: how many lost races a single refill tolerates
///   before giving up with [`Error::Contention`] (default `25`).
///
/// Both values are positive by construction; the setters reject zero.
///
/// [`BatchIdGenerator`]: crate::BatchIdGenerator
/// [`Error::Contention`]: crate::Error::Contention
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneratorConfig {
    batch_size: NonZeroU32,
    max_write_attempts: NonZeroU32,
}

impl GeneratorConfig {
    /// Default number of ids reserved per refill.
    pub const DEFAULT_BATCH_SIZE: NonZeroU32 = NonZeroU32::new(100).unwrap();
    /// Default number of reservation attempts per refill.
    pub const DEFAULT_MAX_WRITE_ATTEMPTS: NonZeroU32 = NonZeroU32::new(25).unwrap();

    /// Creates a configuration with the default values.
    pub const fn new() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            max_write_attempts: Self::DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Sets the number of ids reserved per refill.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroBatchSize`] if `batch_size` is zero.
    pub const fn with_batch_size(mut self, batch_size: u32) -> Result<Self, ConfigError> {
        match NonZeroU32::new(batch_size) {
            Some(batch_size) => {
                self.batch_size = batch_size;
                Ok(self)
            }
            None => Err(ConfigError::ZeroBatchSize),
        }
    }

    /// Sets how many reservation attempts a refill may make.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroMaxWriteAttempts`] if `attempts` is zero.
    pub const fn with_max_write_attempts(mut self, attempts: u32) -> Result<Self, ConfigError> {
        match NonZeroU32::new(attempts) {
            Some(attempts) => {
                self.max_write_attempts = attempts;
                Ok(self)
            }
            None => Err(ConfigError::ZeroMaxWriteAttempts),
        }
    }

    /// Ids reserved per refill.
    pub const fn batch_size(&self) -> NonZeroU32 {
        self.batch_size
    }

    /// Reservation attempts per refill.
    pub const fn max_write_attempts(&self) -> NonZeroU32 {
        self.max_write_attempts
    }

    /// Builds a configuration from [`BATCH_SIZE_ENV`] and
    /// [`MAX_WRITE_ATTEMPTS_ENV`]. Unset variables keep their default.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is set to something other than
    /// a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a value is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        if let Some(value) = lookup(BATCH_SIZE_ENV) {
            config = config.with_batch_size(parse_u32(BATCH_SIZE_ENV, &value)?)?;
        }
        if let Some(value) = lookup(MAX_WRITE_ATTEMPTS_ENV) {
            config = config.with_max_write_attempts(parse_u32(MAX_WRITE_ATTEMPTS_ENV, &value)?)?;
        }
        Ok(config)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        })
}
