//! Runtime settings, validated once at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::ports::FeedError;
use crate::source::{DEFAULT_FETCH_TIMEOUT, SourceConfig};

/// Default time between scheduled refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Longest accepted time between scheduled refreshes.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Everything needed to wire up a refresh coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where the feed comes from.
    pub source: SourceConfig,
    /// Time between scheduled refreshes.
    pub refresh_interval: Duration,
    /// Limit for a single remote fetch.
    pub fetch_timeout: Duration,
    /// Directory local feed paths are resolved against.
    pub base_dir: PathBuf,
}

impl Settings {
    /// Settings with default cadence and timeout, resolving paths from the working directory.
    #[must_use]
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            base_dir: PathBuf::from("."),
        }
    }

    /// Check the settings before anything is scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NoSource`] for a blank source and [`FeedError::InvalidSetting`]
    /// for a zero timeout or an interval that is zero or longer than [`MAX_REFRESH_INTERVAL`].
    pub fn validated(self) -> Result<Self, FeedError> {
        if self.refresh_interval.is_zero() {
            return Err(FeedError::InvalidSetting(
                "refresh interval must be positive".to_owned(),
            ));
        }
        if self.refresh_interval > MAX_REFRESH_INTERVAL {
            return Err(FeedError::InvalidSetting(format!(
                "refresh interval must not exceed {} hours",
                MAX_REFRESH_INTERVAL.as_secs() / 3600
            )));
        }
        if self.fetch_timeout.is_zero() {
            return Err(FeedError::InvalidSetting(
                "fetch timeout must be positive".to_owned(),
            ));
        }

        Ok(Self {
            source: self.source.validated()?,
            ..self
        })
    }
}
