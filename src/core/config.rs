use crate::core::dispatcher::DispatcherConfig;
use crate::models::hand::{DetectorConfig, ModelComplexity};
use crate::models::notification::PayloadTemplate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the notification endpoint
pub const ENDPOINT_ENV: &str = "API_ENDPOINT";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "HANDWATCH_CONFIG";

/// Load variables from a `.env` file into the process environment
///
/// With no `path`, `.env` is searched for from the working directory upwards. Variables already
/// set in the environment are kept. Returns whether a file was loaded; a missing file is not an
/// error and an unreadable one is logged.
pub fn load_dotenv(path: Option<&Path>) -> bool {
    let result = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };

    match result {
        Ok(()) => true,
        Err(e) if e.not_found() => false,
        Err(e) => {
            log::warn!("Ignoring unreadable .env file: {}", e);
            false
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where notifications are POSTed; `None` disables dispatch
    pub api_endpoint: Option<String>,
    /// Minimum time between two notifications
    pub cooldown_seconds: u64,
    /// Maximum number of hands the detector tracks
    pub max_hands: u32,
    pub model_complexity: ModelComplexity,
    /// Detection confidence threshold (0.0-1.0)
    pub min_detection_confidence: f32,
    /// Tracking confidence threshold (0.0-1.0)
    pub min_tracking_confidence: f32,
    pub static_image_mode: bool,
    pub machine_code: String,
    pub operator_id: i64,
    pub operator_name: String,
    /// Notifications allowed on the wire at once (1-4)
    pub max_in_flight_dispatches: usize,
    /// Notifications allowed to wait for a free slot before new ones are dropped
    pub dispatch_queue_capacity: usize,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        let detector = DetectorConfig::default();
        let template = PayloadTemplate::default();

        Self {
            api_endpoint: None,
            cooldown_seconds: 5,
            max_hands: detector.max_hands,
            model_complexity: detector.model_complexity,
            min_detection_confidence: detector.min_detection_confidence,
            min_tracking_confidence: detector.min_tracking_confidence,
            static_image_mode: detector.static_image_mode,
            machine_code: template.machine_code,
            operator_id: template.operator_id,
            operator_name: template.operator_name,
            max_in_flight_dispatches: 2,
            dispatch_queue_capacity: 8,
            request_timeout_seconds: 10,
        }
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment overrides
    ///
    /// A missing file is not an error; defaults are used. `API_ENDPOINT` may also come from a
    /// `.env` file.
    pub fn load() -> ConfigResult<Self> {
        if load_dotenv(None) {
            log::debug!("Loaded environment from .env");
        }

        let path = Self::get_config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::debug!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_override(std::env::var(ENDPOINT_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Replace the endpoint with the environment value, if one is set
    pub fn apply_env_override(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint {
            self.api_endpoint = Some(endpoint);
        }
        if self
            .api_endpoint
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            self.api_endpoint = None;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cooldown_seconds == 0 || self.cooldown_seconds > 3600 {
            return Err(ConfigError::Invalid(format!(
                "Invalid cooldown: {}. Must be between 1 and 3600 seconds",
                self.cooldown_seconds
            )));
        }

        self.detector_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.max_in_flight_dispatches == 0 || self.max_in_flight_dispatches > 4 {
            return Err(ConfigError::Invalid(format!(
                "Invalid max in-flight dispatches: {}. Must be between 1 and 4",
                self.max_in_flight_dispatches
            )));
        }

        if self.dispatch_queue_capacity == 0 || self.dispatch_queue_capacity > 1024 {
            return Err(ConfigError::Invalid(format!(
                "Invalid dispatch queue capacity: {}. Must be between 1 and 1024",
                self.dispatch_queue_capacity
            )));
        }

        if self.request_timeout_seconds == 0 || self.request_timeout_seconds > 300 {
            return Err(ConfigError::Invalid(format!(
                "Invalid request timeout: {}. Must be between 1 and 300 seconds",
                self.request_timeout_seconds
            )));
        }

        if self.machine_code.is_empty() {
            return Err(ConfigError::Invalid("Machine code cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            static_image_mode: self.static_image_mode,
            max_hands: self.max_hands,
            model_complexity: self.model_complexity,
            min_detection_confidence: self.min_detection_confidence,
            min_tracking_confidence: self.min_tracking_confidence,
        }
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            endpoint: self.api_endpoint.clone(),
            max_in_flight: self.max_in_flight_dispatches,
            queue_capacity: self.dispatch_queue_capacity,
        }
    }

    pub fn payload_template(&self) -> PayloadTemplate {
        PayloadTemplate {
            machine_code: self.machine_code.clone(),
            operator_id: self.operator_id,
            operator_name: self.operator_name.clone(),
        }
    }

    /// Get the configuration file path
    fn get_config_path() -> ConfigResult<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| ConfigError::NoHomeDirectory)?;

        let mut path = PathBuf::from(home);
        path.push(".handwatch");
        path.push("config.json");

        Ok(path)
    }
}
