//! Configuration loading traits and types.
//!
//! The emulator reads a single TOML file. Every section has defaults, so an
//! empty file (or no file at all) yields a usable configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use huber_common::config::{ConfigError, ConfigLoader, EmulatorConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = EmulatorConfig::load(Path::new("huber.toml"))?;
//!     config.validate()?;
//!     println!("Serving on port {}", config.server.port);
//!     Ok(())
//! }
//! ```
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "huber-01"
//!
//! [server]
//! port = 9999
//! backdoor_port = 10000
//!
//! [simulation]
//! cycle_time_us = 10000
//!
//! [axis]
//! positive_limit = 1000.0
//! negative_limit = -1000.0
//! ```

use crate::consts::{
    DEFAULT_ACCELERATION, DEFAULT_BACKDOOR_PORT, DEFAULT_BIND, DEFAULT_CYCLE_TIME_US,
    DEFAULT_HIGH_SPEED, DEFAULT_INITIAL_SPEED, DEFAULT_LIMIT, DEFAULT_NUMBER_AXIS, DEFAULT_PORT,
    SERVICE_NAME,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

/// Common configuration fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier, attached to log output.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backdoor_port() -> u16 {
    DEFAULT_BACKDOOR_PORT
}

/// Listener configuration for the wire protocol and the backdoor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address both listeners bind to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port of the ASCII command protocol.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the JSON backdoor.
    #[serde(default = "default_backdoor_port")]
    pub backdoor_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            backdoor_port: default_backdoor_port(),
        }
    }
}

fn default_cycle_time_us() -> u32 {
    DEFAULT_CYCLE_TIME_US
}

fn default_speed() -> f64 {
    1.0
}

/// Tick loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Tick period in microseconds.
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Multiplier applied to the elapsed time handed to the engine.
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: default_cycle_time_us(),
            speed: default_speed(),
        }
    }
}

fn default_initial_speed() -> f64 {
    DEFAULT_INITIAL_SPEED
}

fn default_high_speed() -> f64 {
    DEFAULT_HIGH_SPEED
}

fn default_acceleration() -> f64 {
    DEFAULT_ACCELERATION
}

fn default_positive_limit() -> f64 {
    DEFAULT_LIMIT
}

fn default_negative_limit() -> f64 {
    -DEFAULT_LIMIT
}

fn default_number_axis() -> u32 {
    DEFAULT_NUMBER_AXIS
}

/// Initial values of the emulated axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisDefaults {
    /// Speed a normal move starts its ramp from.
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,
    /// Speed ceiling, and the constant speed of fast moves.
    #[serde(default = "default_high_speed")]
    pub high_speed: f64,
    /// Speed increment per tick.
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    #[serde(default = "default_positive_limit")]
    pub positive_limit: f64,
    #[serde(default = "default_negative_limit")]
    pub negative_limit: f64,
    /// Position adopted when a reference search completes.
    #[serde(default)]
    pub reference_point: f64,
    #[serde(default = "default_number_axis")]
    pub number_axis: u32,
}

impl Default for AxisDefaults {
    fn default() -> Self {
        Self {
            initial_speed: default_initial_speed(),
            high_speed: default_high_speed(),
            acceleration: default_acceleration(),
            positive_limit: default_positive_limit(),
            negative_limit: default_negative_limit(),
            reference_point: 0.0,
            number_axis: default_number_axis(),
        }
    }
}

/// Complete emulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulatorConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub axis: AxisDefaults,
}

impl EmulatorConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `service_name` is not empty
    /// 2. `cycle_time_us` > 0
    /// 3. `speed` is finite and > 0
    /// 4. `negative_limit` <= `positive_limit`
    /// 5. Protocol and backdoor ports differ (unless one is 0 = ephemeral)
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.simulation.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be greater than 0".to_string(),
            ));
        }

        if !self.simulation.speed.is_finite() || self.simulation.speed <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation speed must be positive, got {}",
                self.simulation.speed
            )));
        }

        if self.axis.negative_limit > self.axis.positive_limit {
            return Err(ConfigError::ValidationError(format!(
                "negative_limit {} exceeds positive_limit {}",
                self.axis.negative_limit, self.axis.positive_limit
            )));
        }

        if self.server.port != 0 && self.server.port == self.server.backdoor_port {
            return Err(ConfigError::ValidationError(format!(
                "port and backdoor_port are both {}",
                self.server.port
            )));
        }

        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
