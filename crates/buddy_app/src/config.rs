use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use buddy_core::{normalize_scan, ScanConfig};
use buddy_engine::GrocySettings;
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

/// Settings read from the RON configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub grocy_url: String,
    pub grocy_api_key: String,
    pub catalog_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub state_file: PathBuf,
    /// JSON lines file that receives every processed event.
    pub event_log: Option<PathBuf>,
    /// Send live notifications for processed events.
    pub broadcast: bool,
    pub log: LogDestination,
    pub log_file: PathBuf,
    pub scanner: ScanConfig,
    /// Chore barcode to Grocy chore id.
    pub chore_barcodes: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let grocy = GrocySettings::default();
        Self {
            grocy_url: grocy.api_url,
            grocy_api_key: grocy.api_key,
            catalog_url: grocy.catalog_url,
            connect_timeout_secs: grocy.connect_timeout.as_secs(),
            request_timeout_secs: grocy.request_timeout.as_secs(),
            state_file: PathBuf::from("buddy_state.ron"),
            event_log: None,
            broadcast: true,
            log: LogDestination::default(),
            log_file: PathBuf::from("buddy.log"),
            scanner: ScanConfig::default(),
            chore_barcodes: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn grocy_settings(&self) -> GrocySettings {
        GrocySettings {
            api_url: self.grocy_url.clone(),
            api_key: self.grocy_api_key.clone(),
            catalog_url: self.catalog_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Chore mappings keyed the way scans are compared.
    pub fn chore_mappings(&self) -> BTreeMap<String, String> {
        self.chore_barcodes
            .iter()
            .map(|(code, id)| (normalize_scan(code), id.trim().to_string()))
            .filter(|(code, _)| !code.is_empty())
            .collect()
    }
}
