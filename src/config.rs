//! Configuration management and validation.
//!
//! Provides the configuration sections for corpus paths, classification,
//! LLM extraction and catalog resolution, layered from defaults, an optional
//! JSON config file, `ATEL_PROCESSOR_*` environment variables and CLI flags.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILENAME, DEFAULT_API_KEY_ENV, DEFAULT_BULLETIN_CSV,
    DEFAULT_CATALOG_BATCH_SIZE, DEFAULT_CATALOG_CONCURRENCY, DEFAULT_EXTRACTION_ENDPOINT,
    DEFAULT_EXTRACTION_MODEL, DEFAULT_PARALLEL_WORKERS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SIMBAD_TAP_ENDPOINT, DEFAULT_SOURCES_CSV, ENV_PREFIX, EXTRACTION_FILE_PATTERN,
    fields,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Bulletin corpus CSV (`atelno`, `body`)
    pub bulletin_csv: PathBuf,
    /// Directory holding one extraction document per bulletin
    pub extraction_dir: PathBuf,
    /// Directory for partition, summary and catalog files
    pub output_dir: PathBuf,
    /// Reference source list CSV (`ATELNO`, `Sources`)
    pub sources_csv: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            bulletin_csv: PathBuf::from("data").join(DEFAULT_BULLETIN_CSV),
            extraction_dir: PathBuf::from("output").join("gpt_output"),
            output_dir: PathBuf::from("output"),
            sources_csv: PathBuf::from("data").join(DEFAULT_SOURCES_CSV),
        }
    }
}

/// Classification run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Glob matched against file names in the extraction directory
    pub file_pattern: String,
    /// Key of the object list in extraction documents
    pub objects_key: String,
    /// Number of blocking workers for chunked classification
    pub parallel_workers: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            file_pattern: EXTRACTION_FILE_PATTERN.to_string(),
            objects_key: fields::CELESTIAL_OBJECTS.to_string(),
            parallel_workers: DEFAULT_PARALLEL_WORKERS,
        }
    }
}

/// LLM extraction endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Chat-completions URL
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EXTRACTION_ENDPOINT.to_string(),
            model: DEFAULT_EXTRACTION_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Reference catalog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Synchronous TAP endpoint
    pub tap_endpoint: String,
    /// Names per ADQL query
    pub batch_size: usize,
    /// Queries in flight at once
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tap_endpoint: DEFAULT_SIMBAD_TAP_ENDPOINT.to_string(),
            batch_size: DEFAULT_CATALOG_BATCH_SIZE,
            concurrency: DEFAULT_CATALOG_CONCURRENCY,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Crate log level used when neither -v nor -q is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Global configuration for ATEL processing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub classification: ClassificationConfig,
    pub extraction: ExtractionConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file location (`<config dir>/atel-processor/config.json`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILENAME))
            .ok_or_else(|| Error::configuration("Could not determine the user config directory"))
    }

    /// Read a JSON config file; missing sections keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read config file {}", path.display()), e))?;
        serde_json::from_str(&text).map_err(|e| {
            Error::configuration(format!(
                "Invalid config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Defaults, then the config file if given, then environment variables
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `ATEL_PROCESSOR_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `ATEL_PROCESSOR_*` overrides using `lookup` to read variables
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("BULLETIN_CSV") {
            self.paths.bulletin_csv = PathBuf::from(value);
        }
        if let Some(value) = var("EXTRACTION_DIR") {
            self.paths.extraction_dir = PathBuf::from(value);
        }
        if let Some(value) = var("OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(value);
        }
        if let Some(value) = var("SOURCES_CSV") {
            self.paths.sources_csv = PathBuf::from(value);
        }
        if let Some(value) = var("WORKERS") {
            self.classification.parallel_workers = parse_env_number("WORKERS", &value)?;
        }
        if let Some(value) = var("EXTRACTION_ENDPOINT") {
            self.extraction.endpoint = value;
        }
        if let Some(value) = var("MODEL") {
            self.extraction.model = value;
        }
        if let Some(value) = var("TAP_ENDPOINT") {
            self.catalog.tap_endpoint = value;
        }
        if let Some(value) = var("CATALOG_BATCH_SIZE") {
            self.catalog.batch_size = parse_env_number("CATALOG_BATCH_SIZE", &value)?;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = value;
        }
        Ok(())
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.classification.parallel_workers == 0 {
            return Err(Error::configuration("parallel_workers must be greater than 0"));
        }
        if self.classification.objects_key.trim().is_empty() {
            return Err(Error::configuration("objects_key must not be empty"));
        }
        glob::Pattern::new(&self.classification.file_pattern).map_err(|e| {
            Error::configuration(format!(
                "Invalid file_pattern '{}': {}",
                self.classification.file_pattern, e
            ))
        })?;
        self.logging
            .level
            .parse::<tracing::level_filters::LevelFilter>()
            .map_err(|_| {
                Error::configuration(format!(
                    "Invalid logging level '{}', expected one of off, error, warn, info, debug, trace",
                    self.logging.level
                ))
            })?;
        if self.catalog.batch_size == 0 {
            return Err(Error::configuration("catalog batch_size must be greater than 0"));
        }
        if self.catalog.concurrency == 0 {
            return Err(Error::configuration("catalog concurrency must be greater than 0"));
        }
        if self.extraction.timeout_secs == 0 || self.catalog.timeout_secs == 0 {
            return Err(Error::configuration("timeout_secs must be greater than 0"));
        }
        for (name, url) in [
            ("extraction endpoint", &self.extraction.endpoint),
            ("catalog tap_endpoint", &self.catalog.tap_endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::configuration(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        Ok(())
    }

    /// Create the output directory if it does not exist
    pub fn ensure_output_directory(&self) -> Result<()> {
        if !self.paths.output_dir.exists() {
            std::fs::create_dir_all(&self.paths.output_dir).map_err(|e| {
                Error::configuration(format!(
                    "Failed to create output directory '{}': {}",
                    self.paths.output_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Set the bulletin corpus CSV
    pub fn with_bulletin_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.bulletin_csv = path.into();
        self
    }

    /// Set the extraction document directory
    pub fn with_extraction_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.extraction_dir = path.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.output_dir = path.into();
        self
    }

    /// Set the reference source list CSV
    pub fn with_sources_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.sources_csv = path.into();
        self
    }

    /// Set the number of classification workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.classification.parallel_workers = workers;
        self
    }

    /// Set the extraction model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.extraction.model = model.into();
        self
    }

    /// Set the catalog batch size
    pub fn with_catalog_batch_size(mut self, batch_size: usize) -> Self {
        self.catalog.batch_size = batch_size;
        self
    }
}

fn parse_env_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::configuration(format!(
            "{}{} must be a positive integer, got '{}'",
            ENV_PREFIX, name, value
        ))
    })
}
