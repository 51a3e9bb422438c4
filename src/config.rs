//! Configuration management for the `WaterSeeker` agent
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WaterSeekerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `WaterSeeker` agent
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaterSeekerConfig {
    /// Text-generation endpoint and IAM settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Reverse geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Regional water-resource lookups
    #[serde(default)]
    pub water: WaterConfig,
    /// Current weather lookups
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Text-generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key exchanged for a bearer token at start-up
    pub api_key: Option<String>,
    /// IAM token endpoint
    #[serde(default = "default_iam_url")]
    pub iam_url: String,
    /// Text-generation endpoint (including the version query)
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// Generation request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_seconds: u32,
    /// Token request timeout in seconds
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u32,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_min_new_tokens")]
    pub min_new_tokens: u32,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
}

/// Reverse geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// User agent sent to the geocoder, required by its usage policy
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Delay imposed before every reverse geocoding call
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u32,
}

/// Regional water-resource lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterConfig {
    /// USGS site service base URL
    #[serde(default = "default_usgs_base_url")]
    pub usgs_base_url: String,
    /// Environment Canada station search URL
    #[serde(default = "default_canada_base_url")]
    pub canada_base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Half-width of the station search box in degrees
    #[serde(default = "default_bounding_box")]
    pub bounding_box_degrees: f64,
    #[serde(default = "default_canada_radius")]
    pub canada_radius_km: u32,
}

/// Current weather lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API key (lookup is skipped without one)
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

// Default value functions
fn default_iam_url() -> String {
    "https://iam.cloud.ibm.com/identity/token".to_string()
}

fn default_generation_base_url() -> String {
    "https://us-south.ml.cloud.ibm.com/ml/v1/text/generation?version=2023-05-29".to_string()
}

fn default_model_id() -> String {
    "ibm/granite-3-8b-instruct".to_string()
}

fn default_project_id() -> String {
    "d7260761-7525-4bb8-b618-6f0928271382".to_string()
}

fn default_generation_timeout() -> u32 {
    30
}

fn default_auth_timeout() -> u32 {
    10
}

fn default_max_new_tokens() -> u32 {
    1000
}

fn default_min_new_tokens() -> u32 {
    50
}

fn default_repetition_penalty() -> f32 {
    1.0
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "WaterSeekerAgent".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_lookup_timeout() -> u32 {
    10
}

fn default_usgs_base_url() -> String {
    "https://waterservices.usgs.gov/nwis/site/".to_string()
}

fn default_canada_base_url() -> String {
    "https://wateroffice.ec.gc.ca/search/station_e.html".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_bounding_box() -> f64 {
    0.5
}

fn default_canada_radius() -> u32 {
    50
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            iam_url: default_iam_url(),
            base_url: default_generation_base_url(),
            model_id: default_model_id(),
            project_id: default_project_id(),
            timeout_seconds: default_generation_timeout(),
            auth_timeout_seconds: default_auth_timeout(),
            max_new_tokens: default_max_new_tokens(),
            min_new_tokens: default_min_new_tokens(),
            repetition_penalty: default_repetition_penalty(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            request_delay_ms: default_request_delay_ms(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            usgs_base_url: default_usgs_base_url(),
            canada_base_url: default_canada_base_url(),
            timeout_seconds: default_lookup_timeout(),
            max_retries: default_max_retries(),
            bounding_box_degrees: default_bounding_box(),
            canada_radius_km: default_canada_radius(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl WaterSeekerConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WATERSEEKER_GENERATION__API_KEY, WATERSEEKER_LOGGING__LEVEL, ...
        builder = builder.add_source(
            Environment::with_prefix("WATERSEEKER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WaterSeekerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("waterseeker").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.generation.iam_url.is_empty() {
            self.generation.iam_url = default_iam_url();
        }
        if self.generation.base_url.is_empty() {
            self.generation.base_url = default_generation_base_url();
        }
        if self.generation.model_id.is_empty() {
            self.generation.model_id = default_model_id();
        }
        if self.generation.project_id.is_empty() {
            self.generation.project_id = default_project_id();
        }
        if self.generation.timeout_seconds == 0 {
            self.generation.timeout_seconds = default_generation_timeout();
        }
        if self.generation.auth_timeout_seconds == 0 {
            self.generation.auth_timeout_seconds = default_auth_timeout();
        }
        if self.generation.max_new_tokens == 0 {
            self.generation.max_new_tokens = default_max_new_tokens();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_lookup_timeout();
        }
        if self.water.usgs_base_url.is_empty() {
            self.water.usgs_base_url = default_usgs_base_url();
        }
        if self.water.canada_base_url.is_empty() {
            self.water.canada_base_url = default_canada_base_url();
        }
        if self.water.timeout_seconds == 0 {
            self.water.timeout_seconds = default_lookup_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_lookup_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Generation", &self.generation.api_key),
            ("Weather", &self.weather.api_key),
        ];

        for (name, key) in keys {
            if let Some(api_key) = key {
                if api_key.is_empty() {
                    return Err(WaterSeekerError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if api_key.len() < 8 {
                    return Err(WaterSeekerError::config(format!(
                        "{name} API key appears to be invalid (too short). Please check your API key."
                    ))
                    .into());
                }

                if api_key.len() > 200 {
                    return Err(WaterSeekerError::config(format!(
                        "{name} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Return the generation API key or fail; runs cannot start without one.
    pub fn require_generation_key(&self) -> Result<&str> {
        self.generation.api_key.as_deref().ok_or_else(|| {
            WaterSeekerError::config(
                "Generation API key is required. Set WATERSEEKER_GENERATION__API_KEY or generation.api_key.",
            )
            .into()
        })
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Generation", self.generation.timeout_seconds),
            ("Authentication", self.generation.auth_timeout_seconds),
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Water resource", self.water.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds > 300 {
                return Err(WaterSeekerError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.water.max_retries > 10 {
            return Err(WaterSeekerError::config("Water resource max retries cannot exceed 10").into());
        }

        if self.geocoding.request_delay_ms > 10_000 {
            return Err(
                WaterSeekerError::config("Geocoding request delay cannot exceed 10000 ms").into(),
            );
        }

        if !(self.water.bounding_box_degrees > 0.0 && self.water.bounding_box_degrees <= 5.0) {
            return Err(WaterSeekerError::config(
                "Water resource bounding box must be within (0, 5] degrees",
            )
            .into());
        }

        if self.generation.min_new_tokens > self.generation.max_new_tokens {
            return Err(WaterSeekerError::config(
                "Generation min_new_tokens cannot exceed max_new_tokens",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WaterSeekerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WaterSeekerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("IAM", &self.generation.iam_url),
            ("Generation", &self.generation.base_url),
            ("Geocoding", &self.geocoding.base_url),
            ("USGS", &self.water.usgs_base_url),
            ("Environment Canada", &self.water.canada_base_url),
            ("Weather", &self.weather.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WaterSeekerError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
