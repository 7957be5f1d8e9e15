use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use ingest_engine::{ExtractionSettings, IngestSettings, ThumbnailSettings};
use ingest_logging::ingest_info;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "ingest.ron";

/// On-disk settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub max_file_bytes: u64,
    pub max_workers: usize,
    /// Replaces the built-in skip list when present.
    pub skip_extensions: Option<Vec<String>>,
    /// Added on top of whichever skip list is active.
    pub extra_skip_extensions: Vec<String>,
    pub thumbnail_max_dimension: u32,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let extraction = ExtractionSettings::default();
        Self {
            max_file_bytes: extraction.max_file_bytes,
            max_workers: extraction.max_workers,
            skip_extensions: None,
            extra_skip_extensions: Vec::new(),
            thumbnail_max_dimension: ThumbnailSettings::default().max_dimension,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {:?}", path))
            }
        };
        let config =
            Self::parse(&content).with_context(|| format!("failed to parse config {:?}", path))?;
        ingest_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = ron::from_str(content)?;
        anyhow::ensure!(config.max_workers > 0, "max_workers must be at least 1");
        anyhow::ensure!(
            config.thumbnail_max_dimension > 0,
            "thumbnail_max_dimension must be at least 1"
        );
        config.level_filter()?;
        Ok(config)
    }

    pub fn level_filter(&self) -> anyhow::Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown log level {:?}", self.log_level))
    }

    pub fn to_settings(&self) -> IngestSettings {
        let mut extraction = ExtractionSettings {
            max_file_bytes: self.max_file_bytes,
            max_workers: self.max_workers,
            ..ExtractionSettings::default()
        };
        if let Some(skip) = &self.skip_extensions {
            extraction.skip_extensions = skip.clone();
        }
        extraction
            .skip_extensions
            .extend(self.extra_skip_extensions.iter().cloned());

        IngestSettings {
            extraction,
            thumbnails: ThumbnailSettings {
                max_dimension: self.thumbnail_max_dimension,
            },
        }
    }
}
