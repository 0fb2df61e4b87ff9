//! Source configuration and the loader that turns it into raw feed text.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::ports::{FeedError, FeedPort};

/// Default limit for a single remote fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const UPLOAD_IDENTIFIER: &str = "upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Where the feed comes from.
pub enum SourceKind {
    /// Remote URL or local file path.
    Url,
    /// CSV text supplied up front.
    Upload,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            SourceKind::Url => "url",
            SourceKind::Upload => "upload",
        };
        write!(formatter, "{slug}")
    }
}

impl FromStr for SourceKind {
    type Err = FeedError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "url" => Ok(SourceKind::Url),
            "upload" => Ok(SourceKind::Upload),
            other => Err(FeedError::UnsupportedSourceKind(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
/// Validated description of a feed source.
pub enum SourceConfig {
    /// `http`/`https` URL, or a path relative to the base directory.
    Url {
        /// Location of the feed.
        source_url: String,
    },
    /// Literal CSV text.
    Upload {
        /// The feed itself.
        csv_content: String,
    },
}

impl SourceConfig {
    /// Start building a configuration for the given kind.
    #[must_use]
    pub fn builder(kind: SourceKind) -> SourceConfigBuilder {
        SourceConfigBuilder { kind }
    }

    /// Kind of the configured source.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceConfig::Url { .. } => SourceKind::Url,
            SourceConfig::Upload { .. } => SourceKind::Upload,
        }
    }

    /// Identifier recorded on snapshots: the URL or path, or `upload` for inline text.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            SourceConfig::Url { source_url } => source_url,
            SourceConfig::Upload { .. } => UPLOAD_IDENTIFIER,
        }
    }

    /// Re-run builder validation, e.g. on a deserialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NoSource`] when the URL or CSV text is blank.
    pub fn validated(self) -> Result<Self, FeedError> {
        match self {
            SourceConfig::Url { source_url } => Self::builder(SourceKind::Url).parameter(source_url),
            SourceConfig::Upload { csv_content } => {
                Self::builder(SourceKind::Upload).parameter(csv_content)
            }
        }
    }
}

/// Second step of configuration: the kind is known, the parameter is not.
#[derive(Debug, Clone, Copy)]
pub struct SourceConfigBuilder {
    kind: SourceKind,
}

impl SourceConfigBuilder {
    /// Supply the URL/path or CSV text, depending on the kind.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NoSource`] when the value is blank.
    pub fn parameter<S: Into<String>>(self, value: S) -> Result<SourceConfig, FeedError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FeedError::NoSource);
        }

        Ok(match self.kind {
            SourceKind::Url => SourceConfig::Url {
                source_url: trimmed.to_owned(),
            },
            SourceKind::Upload => SourceConfig::Upload {
                csv_content: trimmed.to_owned(),
            },
        })
    }
}

/// Resolved origin of a `url` source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Fetched over HTTP(S).
    Remote(Url),
    /// Read from disk; the path is already resolved against the base directory.
    Local(PathBuf),
}

/// Obtains feed text for a [`SourceConfig`].
pub struct SourceLoader {
    port: Arc<dyn FeedPort>,
    base_dir: PathBuf,
    fetch_timeout: Duration,
}

impl SourceLoader {
    /// Create a loader reading local paths relative to `base_dir`.
    ///
    /// An existing base directory is canonicalized so symlinks and relative bases compare
    /// against its real location.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(port: Arc<dyn FeedPort>, base_dir: P) -> Self {
        let base_dir = base_dir.into();
        Self {
            port,
            base_dir: std::fs::canonicalize(&base_dir).unwrap_or(base_dir),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the remote fetch timeout.
    #[must_use]
    pub fn with_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Directory local paths are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Decide whether a `url` source is fetched remotely or read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NoSource`] for a blank location and
    /// [`FeedError::OutsideBaseDir`] for paths escaping the base directory.
    pub fn locate(&self, source_url: &str) -> Result<Location, FeedError> {
        let location = source_url.trim();
        if location.is_empty() {
            return Err(FeedError::NoSource);
        }

        if let Ok(url) = Url::parse(location)
            && matches!(url.scheme(), "http" | "https")
        {
            return Ok(Location::Remote(url));
        }

        self.resolve(Path::new(location)).map(Location::Local)
    }

    /// Load the raw feed text.
    ///
    /// # Errors
    ///
    /// Returns configuration errors for blank or escaping sources and fetch errors from the
    /// underlying [`FeedPort`]; remote fetches exceeding the timeout yield [`FeedError::Timeout`].
    pub async fn load(&self, config: &SourceConfig) -> Result<String, FeedError> {
        match config {
            SourceConfig::Upload { csv_content } => {
                if csv_content.trim().is_empty() {
                    return Err(FeedError::NoSource);
                }
                debug!("loading pickup data from uploaded CSV");
                Ok(csv_content.clone())
            }
            SourceConfig::Url { source_url } => match self.locate(source_url)? {
                Location::Remote(url) => {
                    debug!(%url, "fetching pickup data");
                    tokio::time::timeout(self.fetch_timeout, self.port.fetch_url(&url))
                        .await
                        .map_err(|_elapsed| FeedError::Timeout(self.fetch_timeout))?
                }
                Location::Local(path) => {
                    debug!(path = %path.display(), "reading pickup data");
                    self.port.read_file(&path).await
                }
            },
        }
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, FeedError> {
        if path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(FeedError::OutsideBaseDir(path.to_path_buf()));
        }

        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        if !candidate.starts_with(&self.base_dir) {
            return Err(FeedError::OutsideBaseDir(path.to_path_buf()));
        }

        // Existing files may still be symlinks pointing elsewhere.
        if let Ok(target) = std::fs::canonicalize(&candidate)
            && !target.starts_with(&self.base_dir)
        {
            return Err(FeedError::OutsideBaseDir(path.to_path_buf()));
        }

        Ok(candidate)
    }
}
