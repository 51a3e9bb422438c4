//! Error types and handling for the `WaterSeeker` agent

use thiserror::Error;

/// Main error type for the `WaterSeeker` application
#[derive(Error, Debug)]
pub enum WaterSeekerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API communication errors (non-2xx, malformed payloads)
    #[error("API error: {message}")]
    Api { message: String },

    /// Token acquisition or bearer rejection
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Upstream call exceeded its bounded timeout
    #[error("API call timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl WaterSeekerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WaterSeekerError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            WaterSeekerError::Api { message } => {
                format!("The text-generation service returned an error: {message}")
            }
            WaterSeekerError::Authentication { .. } => {
                "Unable to authenticate with the text-generation service. Please check your API key."
                    .to_string()
            }
            WaterSeekerError::Timeout { seconds } => {
                format!("The text-generation service did not answer within {seconds} seconds.")
            }
            WaterSeekerError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WaterSeekerError::General { message } => message.clone(),
        }
    }
}
