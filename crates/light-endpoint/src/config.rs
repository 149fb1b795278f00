//! Light configuration loaded from a JSON file

use crate::error::EndpointError;
use level_control::{LevelAttributes, MAX_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Endpoint ids hosted when no configuration file exists
pub const DEFAULT_ENDPOINTS: [u8; 2] = [8, 9];

/// Highest application endpoint id
const MAX_ENDPOINT_ID: u8 = 240;

/// Startup state and attributes of one light endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Endpoint ID (1-240)
    pub id: u8,
    /// Level at power-up
    #[serde(default = "default_level")]
    pub current_level: u8,
    /// On/off state at power-up
    #[serde(default)]
    pub on: bool,
    /// Level Control attributes
    #[serde(default)]
    pub attributes: LevelAttributes,
}

impl EndpointConfig {
    /// An endpoint with factory default state
    #[must_use]
    pub fn new(id: u8) -> Self {
        Self {
            id,
            current_level: default_level(),
            on: false,
            attributes: LevelAttributes::default(),
        }
    }
}

fn default_level() -> u8 {
    MAX_LEVEL
}

/// Configuration of every light endpoint on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,
}

fn default_endpoints() -> Vec<EndpointConfig> {
    DEFAULT_ENDPOINTS.iter().map(|&id| EndpointConfig::new(id)).collect()
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
        }
    }
}

impl LightConfig {
    /// Config file path from `LIGHT_CONFIG`, else `$DATA_DIR/light.json`
    #[must_use]
    pub fn path_from_env() -> PathBuf {
        Self::resolve_path(
            std::env::var("LIGHT_CONFIG").ok(),
            std::env::var("DATA_DIR").ok(),
        )
    }

    /// Config file path from an explicit file, else a data directory
    #[must_use]
    pub fn resolve_path(config_file: Option<String>, data_dir: Option<String>) -> PathBuf {
        if let Some(path) = config_file {
            return PathBuf::from(path);
        }
        let data_dir = data_dir.unwrap_or_else(|| "./data".to_string());
        PathBuf::from(data_dir).join("light.json")
    }

    /// Load and validate configuration; a missing file gives the defaults
    pub async fn load(path: &Path) -> Result<Self, EndpointError> {
        let config = match fs::read_to_string(path).await {
            Ok(contents) => {
                let config = Self::parse(&contents)?;
                tracing::info!(
                    "Loaded {} endpoint(s) from {:?}",
                    config.endpoints.len(),
                    path
                );
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(config)
    }

    /// Parse and validate configuration from JSON text
    pub fn parse(contents: &str) -> Result<Self, EndpointError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validated()
    }

    /// Check endpoint ids and normalize levels and attributes
    pub fn validated(mut self) -> Result<Self, EndpointError> {
        if self.endpoints.is_empty() {
            return Err(EndpointError::InvalidConfig(
                "at least one endpoint is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for endpoint in &mut self.endpoints {
            if endpoint.id == 0 || endpoint.id > MAX_ENDPOINT_ID {
                return Err(EndpointError::InvalidConfig(format!(
                    "endpoint id {} outside 1-{}",
                    endpoint.id, MAX_ENDPOINT_ID
                )));
            }
            if !seen.insert(endpoint.id) {
                return Err(EndpointError::InvalidConfig(format!(
                    "duplicate endpoint id {}",
                    endpoint.id
                )));
            }

            endpoint.current_level = level_control::cluster::clamp_level(endpoint.current_level);
            endpoint.attributes = endpoint.attributes.normalized();
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use level_control::MIN_LEVEL;

    #[test]
    fn test_default_has_two_endpoints() {
        let config = LightConfig::default();
        let ids: Vec<u8> = config.endpoints.iter().map(|e| e.id).collect();
        assert_eq!(ids, DEFAULT_ENDPOINTS.to_vec());
        assert!(config.endpoints.iter().all(|e| !e.on && e.current_level == MAX_LEVEL));
    }

    #[test]
    fn test_parse_fills_defaults_and_clamps() {
        let config = LightConfig::parse(
            r#"{"endpoints": [
                {"id": 8, "current_level": 0, "on": true},
                {"id": 9, "attributes": {"on_level": 255, "off_transition_time": 65535}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(config.endpoints[0].current_level, MIN_LEVEL);
        assert!(config.endpoints[0].on);
        assert_eq!(config.endpoints[1].current_level, MAX_LEVEL);
        assert_eq!(config.endpoints[1].attributes.on_level, None);
        assert_eq!(config.endpoints[1].attributes.off_transition_time, None);
    }

    #[test]
    fn test_empty_object_uses_default_endpoints() {
        let config = LightConfig::parse("{}").unwrap();
        assert_eq!(config, LightConfig::default());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = LightConfig::parse(r#"{"endpoints": [{"id": 8}, {"id": 8}]}"#);
        assert!(matches!(result, Err(EndpointError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_reserved_ids() {
        let result = LightConfig::parse(r#"{"endpoints": [{"id": 0}]}"#);
        assert!(matches!(result, Err(EndpointError::InvalidConfig(_))));
        let result = LightConfig::parse(r#"{"endpoints": [{"id": 241}]}"#);
        assert!(matches!(result, Err(EndpointError::InvalidConfig(_))));
        let result = LightConfig::parse(r#"{"endpoints": []}"#);
        assert!(matches!(result, Err(EndpointError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = LightConfig::parse("{\"endpoints\": [");
        assert!(matches!(result, Err(EndpointError::Json(_))));
    }

    #[test]
    fn test_resolve_path_order() {
        assert_eq!(
            LightConfig::resolve_path(Some("/etc/light.json".into()), Some("/var/lib".into())),
            PathBuf::from("/etc/light.json")
        );
        assert_eq!(
            LightConfig::resolve_path(None, Some("/var/lib".into())),
            PathBuf::from("/var/lib/light.json")
        );
        assert_eq!(
            LightConfig::resolve_path(None, None),
            PathBuf::from("./data/light.json")
        );
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!("light-missing-{}.json", std::process::id()));
        let config = LightConfig::load(&path).await.unwrap();
        assert_eq!(config, LightConfig::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("light-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"endpoints": [{"id": 12, "current_level": 77}]}"#)
            .await
            .unwrap();

        let config = LightConfig::load(&path).await.unwrap();
        let _ = fs::remove_file(&path).await;

        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].id, 12);
        assert_eq!(config.endpoints[0].current_level, 77);
    }
}
