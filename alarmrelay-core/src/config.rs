use crate::error::ConfigError;
use crate::models::EndpointFilter;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

/// Inbound channel id reserved for inter-app messages on the destination.
pub const DEFAULT_CHANNEL_ID: i32 = 9_000_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    pub mqtt: MqttConf,
    pub topic_prefix: String,
    pub destination: EndpointFilter,
    pub channel_id: i32,
    pub run_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
    /// chrono formats tried in order after RFC 3339.
    pub timestamp_formats: Vec<String>,
    /// chrono format of the `time` field in outgoing messages.
    pub time_format: String,
    /// Prepended to the protocol version when querying protocol metadata.
    pub protocol_version_prefix: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
}

impl Default for MqttConf {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "alarmrelay-agent".into(),
            keep_alive_secs: 15,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConf::default(),
            topic_prefix: "dataminer".into(),
            destination: EndpointFilter {
                name: "WhatsApp".into(),
                protocol_name: "Generic WhatsApp".into(),
                protocol_version: "Production".into(),
            },
            channel_id: DEFAULT_CHANNEL_ID,
            run_timeout_secs: 15 * 60,
            lookup_timeout_secs: 10,
            timestamp_formats: vec![
                "%Y-%m-%dT%H:%M:%S".into(),
                "%Y-%m-%d %H:%M:%S".into(),
                "%d/%m/%Y %H:%M:%S".into(),
                "%m/%d/%Y %H:%M:%S".into(),
                "%d/%m/%Y %H:%M".into(),
            ],
            time_format: "%Y-%m-%d %H:%M:%S".into(),
            protocol_version_prefix: "Protocol_Default:".into(),
        }
    }
}

impl RelayConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

/// Loads the YAML config. A missing or empty file gives the defaults;
/// a present but invalid file is an error.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<RelayConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "no config file, using defaults");
        return Ok(RelayConfig::default());
    }

    let txt = fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(RelayConfig::default());
    }
    let cfg: RelayConfig = serde_yaml::from_str(&txt).map_err(|source| ConfigError::Invalid {
        path: path.display().to_string(),
        source,
    })?;
    check_formats(&cfg, path)?;
    info!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Rejects strftime formats chrono cannot handle, before any event hits them.
fn check_formats(cfg: &RelayConfig, path: &Path) -> Result<(), ConfigError> {
    let formats = std::iter::once(("time_format", &cfg.time_format))
        .chain(cfg.timestamp_formats.iter().map(|f| ("timestamp_formats", f)));
    for (field, format) in formats {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidFormat {
                path: path.display().to_string(),
                field,
                format: format.clone(),
            });
        }
    }
    Ok(())
}
