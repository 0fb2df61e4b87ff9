use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use limburg_core::{Settings, SourceConfig, SourceKind};

const SECONDS_PER_HOUR: u64 = 3600;

/// Show upcoming Limburg.net waste pickups from a CSV export.
#[derive(Debug, Parser)]
#[command(name = "limburg-tui", version, about)]
pub(crate) struct Cli {
    /// Source type: `url` (URL or local path) or `upload` (CSV file read once at startup).
    #[arg(long, default_value = "url")]
    pub source_type: String,

    /// HTTP(S) URL, or a path relative to the base directory.
    #[arg(long)]
    pub source_url: Option<String>,

    /// CSV file whose contents are used as an upload source.
    #[arg(long)]
    pub csv_file: Option<PathBuf>,

    /// JSON source configuration, e.g. `{"type": "url", "source_url": "..."}`.
    #[arg(long, conflicts_with_all = ["source_url", "csv_file"])]
    pub config: Option<PathBuf>,

    /// Directory local paths are resolved against (defaults to the working directory).
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Hours between scheduled refreshes.
    #[arg(long, default_value_t = 12)]
    pub interval_hours: u64,

    /// Seconds before a download is abandoned.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Refresh once, print the result as JSON and exit.
    #[arg(long)]
    pub once: bool,

    /// Write logs to this file (dashboard mode logs nothing otherwise).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Collect and validate the runtime settings.
    pub(crate) fn settings(&self) -> Result<Settings> {
        let source = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str::<SourceConfig>(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => self.source_from_flags()?,
        };

        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("resolving working directory")?,
        };

        let settings = Settings {
            source,
            refresh_interval: Duration::from_secs(
                self.interval_hours.saturating_mul(SECONDS_PER_HOUR),
            ),
            fetch_timeout: Duration::from_secs(self.timeout_secs),
            base_dir,
        };
        Ok(settings.validated()?)
    }

    fn source_from_flags(&self) -> Result<SourceConfig> {
        let kind = self.source_type.parse::<SourceKind>()?;
        let builder = SourceConfig::builder(kind);

        let config = match kind {
            SourceKind::Url => builder.parameter(self.source_url.clone().unwrap_or_default())?,
            SourceKind::Upload => {
                let path = self
                    .csv_file
                    .as_ref()
                    .context("--csv-file is required for upload sources")?;
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading CSV upload {}", path.display()))?;
                builder
                    .parameter(text)
                    .with_context(|| format!("CSV upload {} is empty", path.display()))?
            }
        };
        Ok(config)
    }
}
