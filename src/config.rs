use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_resource_dir")]
    pub resource_dir: PathBuf,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub brave_api_key: Option<String>,
}

fn default_port() -> u16 {
    5000
}

fn default_resource_dir() -> PathBuf {
    PathBuf::from("resources")
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            resource_dir: default_resource_dir(),
            model: default_model(),
            request_timeout_secs: default_timeout_secs(),
            gemini_api_key: None,
            brave_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().merged_with_env()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from an optional TOML file, then let environment variables
    /// override individual fields.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(base.merged_with_env())
    }

    fn merged_with_env(mut self) -> Self {
        if let Ok(port) = std::env::var("SWITCHBOARD_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        if let Ok(dir) = std::env::var("SWITCHBOARD_RESOURCE_DIR") {
            self.resource_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var("SWITCHBOARD_MODEL") {
            self.model = model;
        }
        if let Ok(secs) = std::env::var("SWITCHBOARD_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.request_timeout_secs = secs;
            }
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("BRAVE_API_KEY") {
            self.brave_api_key = Some(key);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_from_toml() {
        let raw = r#"
            port = 8080
            model = "gemini-1.5-pro"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.request_timeout_secs, 30);
    }
}
