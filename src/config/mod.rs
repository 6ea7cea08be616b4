//! Configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,

    /// CoAP client timing and block-transfer configuration.
    #[serde(default)]
    pub client: ClientConfig,

    /// Device-specific resource URIs.
    #[serde(default)]
    pub resources: ResourceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.client.max_attempts == 0 {
            return Err(Error::Config("client.max_attempts must be at least 1".into()));
        }
        if !self.client.block_size.is_power_of_two()
            || !(16..=1024).contains(&self.client.block_size)
        {
            return Err(Error::Config(format!(
                "client.block_size must be a power of two in 16..=1024, got {}",
                self.client.block_size
            )));
        }
        if self.client.max_frame_payload == 0 {
            return Err(Error::Config("client.max_frame_payload must be non-zero".into()));
        }
        Ok(())
    }

    /// Get default config path.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "microchip", "velocitysp").map_or_else(
            || PathBuf::from("velocitysp.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Serial port device (e.g. `/dev/ttyACM0`).
    #[serde(default)]
    pub port: Option<String>,

    /// Serial baud rate.
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Connect timeout (TCP bridge).
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_baud() -> u32 {
    crate::DEFAULT_BAUD
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

/// CoAP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Retransmission interval for CON requests. Fixed, not backed off.
    #[serde(default = "default_ack_timeout", with = "humantime_serde")]
    pub ack_timeout: Duration,

    /// Total transmissions of a CON request before the exchange fails.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Block size for Block1/Block2 transfers. Power of two, 16..=1024.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// MUP1 ping reply deadline.
    #[serde(default = "default_ping_timeout", with = "humantime_serde")]
    pub ping_timeout: Duration,

    /// MUP1 payload limit before the parser abandons a frame.
    #[serde(default = "default_max_frame_payload")]
    pub max_frame_payload: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ack_timeout: default_ack_timeout(),
            max_attempts: default_max_attempts(),
            block_size: default_block_size(),
            ping_timeout: default_ping_timeout(),
            max_frame_payload: default_max_frame_payload(),
        }
    }
}

fn default_ack_timeout() -> Duration {
    Duration::from_secs(3)
}
fn default_max_attempts() -> u32 {
    5
}
fn default_block_size() -> usize {
    256
}
fn default_ping_timeout() -> Duration {
    Duration::from_secs(2)
}
fn default_max_frame_payload() -> usize {
    crate::MAX_FRAME_PAYLOAD
}

/// Vendor resource URIs. These vary across firmware lines, so they are
/// configuration rather than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Firmware upgrade resource (Block1 PUT target).
    #[serde(default = "default_firmware_resource")]
    pub firmware: String,

    /// Persist-running-config resource (POST target).
    #[serde(default = "default_save_config_resource")]
    pub save_config: String,

    /// Device reset resource (POST target).
    #[serde(default = "default_reset_resource")]
    pub reset: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            firmware: default_firmware_resource(),
            save_config: default_save_config_resource(),
            reset: default_reset_resource(),
        }
    }
}

fn default_firmware_resource() -> String {
    "mchp-velocitysp-firmware:firmware/upgrade".into()
}
fn default_save_config_resource() -> String {
    "mchp-velocitysp-system:save-config".into()
}
fn default_reset_resource() -> String {
    "mchp-velocitysp-system:reset".into()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// ANSI colors in text output.
    #[serde(default = "default_log_color")]
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_log_color(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_color() -> bool {
    true
}

/// Initialize the tracing subscriber from a [`LoggingConfig`].
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    } else {
        subscriber
            .with(fmt::layer().with_ansi(config.color))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_block_size() {
        let mut config = Config::default();
        config.client.block_size = 100;
        assert!(config.validate().is_err());
        config.client.block_size = 2048;
        assert!(config.validate().is_err());
        config.client.block_size = 1024;
        config.validate().unwrap();
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.client.block_size, config.client.block_size);
        assert_eq!(back.resources.firmware, config.resources.firmware);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = toml::from_str("[client]\nack_timeout = \"1s\"\n").unwrap();
        assert_eq!(config.client.ack_timeout, Duration::from_secs(1));
        assert_eq!(config.client.max_attempts, 5);
        assert_eq!(config.transport.baud, 115_200);
    }
}
