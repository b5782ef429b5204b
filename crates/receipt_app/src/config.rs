//! Application configuration: a RON file, then environment / CLI overrides.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use engine_logging::{engine_info, engine_warn};
use receipt_core::normalize_domain;
use receipt_engine::{AtomicFileWriter, EngineConfig, FetchSettings};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "receipt.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the backend functions, e.g. `https://<project>.supabase.co/functions/v1`.
    pub functions_base_url: String,
    /// Domain receipt links point at.
    pub receipt_domain: String,
    pub anon_key: Option<String>,
    /// Logo composed into branded QR codes.
    pub logo_url: Option<String>,
    pub request_timeout_secs: u64,
    pub module_px: usize,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            functions_base_url: "http://localhost:54321/functions/v1".to_string(),
            receipt_domain: "receipt-less.com".to_string(),
            anon_key: None,
            logo_url: None,
            request_timeout_secs: 15,
            module_px: 8,
            log_to_file: false,
        }
    }
}

/// Values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub functions_base_url: Option<String>,
    pub receipt_domain: Option<String>,
    pub anon_key: Option<String>,
    pub logo_url: Option<String>,
}

impl AppConfig {
    /// Loads `path`. A missing file is an error only when it was asked for
    /// explicitly.
    pub fn load(path: &Path, explicit: bool) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        let config: AppConfig = ron::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        engine_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.functions_base_url {
            self.functions_base_url = url;
        }
        if let Some(domain) = overrides.receipt_domain {
            self.receipt_domain = domain;
        }
        if overrides.anon_key.is_some() {
            self.anon_key = overrides.anon_key;
        }
        if overrides.logo_url.is_some() {
            self.logo_url = overrides.logo_url;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if normalize_domain(&self.receipt_domain).is_empty() {
            bail!("receipt_domain must not be empty");
        }
        if self.functions_base_url.trim().is_empty() {
            bail!("functions_base_url must not be empty");
        }
        if self.request_timeout_secs == 0 {
            engine_warn!("request_timeout_secs is 0; requests will fail immediately");
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::new(self.functions_base_url.clone());
        config.api_key = self.anon_key.clone();
        config.logo_url = self.logo_url.clone();
        config.module_px = self.module_px;
        config.fetch = FetchSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        };
        config
    }

    /// Writes the default configuration to `path`, refusing to overwrite.
    pub fn write_default(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&AppConfig::default(), pretty)
            .context("serializing default config")?;
        let (writer, filename) = AtomicFileWriter::for_path(path)
            .with_context(|| format!("invalid config path {}", path.display()))?;
        writer
            .write(&filename, content)
            .with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}
