//! Configuration management

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// When set, the card reader and motion sensor are replaced by the
    /// simulator and its debug endpoints are mounted.
    pub simulator: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3080)),
            data_dir: PathBuf::from("data"),
            simulator: false,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables and an optional TOML file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("LBK_LISTEN_ADDR") {
            config.listen_addr = addr
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("Invalid listen_addr: {}", e)))?;
        }

        if let Ok(dir) = std::env::var("LBK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(sim) = std::env::var("LBK_SIMULATOR") {
            config.simulator = matches!(sim.as_str(), "1" | "true" | "yes");
        }

        if let Ok(config_path) = std::env::var("LBK_CONFIG") {
            config.load_from_toml(&config_path)?;
        }

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".to_string()));
        }
        Ok(())
    }

    fn load_from_toml(&mut self, path: &str) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let toml_config: toml::Value = toml::from_str(&content)?;

        if let Some(addr) = toml_config.get("listen_addr").and_then(|v| v.as_str()) {
            self.listen_addr = addr
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("Invalid listen_addr in TOML: {}", e)))?;
        }

        if let Some(dir) = toml_config.get("data_dir").and_then(|v| v.as_str()) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(sim) = toml_config.get("simulator").and_then(|v| v.as_bool()) {
            self.simulator = sim;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr.port(), 3080);
    }

    #[test]
    fn toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lbk.toml");
        std::fs::write(
            &path,
            "listen_addr = \"127.0.0.1:9090\"\ndata_dir = \"/var/lib/lbk\"\nsimulator = true\n",
        )
        .unwrap();

        let mut config = ConsoleConfig::default();
        config.load_from_toml(path.to_str().unwrap()).unwrap();
        assert_eq!(config.listen_addr.port(), 9090);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/lbk"));
        assert!(config.simulator);
    }

    #[test]
    fn bad_addr_in_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lbk.toml");
        std::fs::write(&path, "listen_addr = \"not-an-addr\"\n").unwrap();

        let mut config = ConsoleConfig::default();
        let err = config.load_from_toml(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
