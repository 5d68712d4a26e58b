use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ObserverError, ObserverResult};
use crate::interfaces::GatewayHost;

const DEFAULT_GATEWAY_CONCURRENCY: usize = 10;
const DEFAULT_NAME_CONCURRENCY: usize = 5;

/// Observer runtime configuration, stored as TOML.
///
/// The epoch bounds, name lists, and gateway hosts configured here feed the
/// static source implementations; deployments with network-backed sources
/// wire those in programmatically instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub observer_address: String,
    pub reference_gateway_host: String,
    pub gateway_assessment_concurrency: usize,
    pub name_assessment_concurrency: usize,
    pub epoch_start_height: u64,
    pub epoch_end_height: u64,
    pub prescribed_names: Vec<String>,
    pub chosen_names: Vec<String>,
    pub gateway_hosts: Vec<GatewayHost>,
    pub report_dir: PathBuf,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            observer_address: String::new(),
            reference_gateway_host: "arweave.dev".to_string(),
            gateway_assessment_concurrency: DEFAULT_GATEWAY_CONCURRENCY,
            name_assessment_concurrency: DEFAULT_NAME_CONCURRENCY,
            epoch_start_height: 0,
            epoch_end_height: 0,
            prescribed_names: Vec::new(),
            chosen_names: Vec::new(),
            gateway_hosts: Vec::new(),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl ObserverConfig {
    pub fn load(path: &Path) -> ObserverResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| ObserverError::Config(format!("unable to parse config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ObserverResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| ObserverError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    /// Rejects values the assessment engine cannot run with.
    pub fn validate(&self) -> ObserverResult<()> {
        if self.observer_address.is_empty() {
            return Err(ObserverError::Config(
                "observer_address must be set".to_string(),
            ));
        }
        if self.reference_gateway_host.is_empty() {
            return Err(ObserverError::Config(
                "reference_gateway_host must be set".to_string(),
            ));
        }
        if self.gateway_assessment_concurrency == 0 {
            return Err(ObserverError::Config(
                "gateway_assessment_concurrency must be at least 1".to_string(),
            ));
        }
        if self.name_assessment_concurrency == 0 {
            return Err(ObserverError::Config(
                "name_assessment_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
