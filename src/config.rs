use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Host name or address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (0 picks an ephemeral port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds allowed for a client to deliver its request head
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamConfig {
    /// Refresh tick interval in microseconds
    #[serde(default = "default_refresh_interval_us")]
    pub refresh_interval_us: u64,
}

impl RelayConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("mjpeg-relay.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("server.timeout_seconds", default_timeout_seconds())?
            .set_default(
                "stream.refresh_interval_us",
                default_refresh_interval_us() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with RELAY_ prefix
            .add_source(Environment::with_prefix("RELAY").separator("_"))
            .build()?;

        let config: RelayConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Message(
                "Server host must not be empty".to_string(),
            ));
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.stream.refresh_interval_us == 0 {
            return Err(ConfigError::Message(
                "Refresh interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Request head timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_seconds)
    }

    /// Refresh tick interval as a Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(self.stream.refresh_interval_us)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                timeout_seconds: default_timeout_seconds(),
            },
            stream: StreamConfig {
                refresh_interval_us: default_refresh_interval_us(),
            },
        }
    }
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout_seconds() -> u64 {
    10
}
fn default_refresh_interval_us() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.timeout_seconds, 10);
        assert_eq!(config.stream.refresh_interval_us, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_helpers() {
        let config = RelayConfig::default();

        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.refresh_interval(), Duration::from_millis(30));
    }

    #[test]
    fn test_config_validation() {
        let mut config = RelayConfig::default();

        config.server.timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.server.timeout_seconds = 10;

        config.stream.refresh_interval_us = 0;
        assert!(config.validate().is_err());
        config.stream.refresh_interval_us = 30_000;

        config.server.host.clear();
        assert!(config.validate().is_err());
        config.server.host = "localhost".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[server]\nhost = \"0.0.0.0\"\nport = 9090\n\n[stream]\nrefresh_interval_us = 10000"
        )
        .unwrap();

        let config = RelayConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        // Unset keys fall back to defaults
        assert_eq!(config.server.timeout_seconds, 10);
        assert_eq!(config.stream.refresh_interval_us, 10_000);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = RelayConfig::load_from_file("does-not-exist.toml").unwrap();

        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_environment_variable_override() {
        env::set_var("RELAY_SERVER_PORT", "9091");

        // This test would need a serialized environment to exercise the full
        // load path; just verify the variable is visible
        assert_eq!(env::var("RELAY_SERVER_PORT").unwrap(), "9091");

        env::remove_var("RELAY_SERVER_PORT");
    }
}
