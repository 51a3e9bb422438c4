//! `WaterSeeker` - water-reservoir site recommendation
//!
//! Asks a text-generation model for rainfall and capacity estimates at up to
//! five points, reconciles the loosely formatted answer into one record per
//! point, and sanitizes a second answer into a single recommendation,
//! enriched with place and water-resource metadata.

pub mod agent;
pub mod agent_log;
pub mod api;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod parsing;
pub mod water_resources;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use agent::WaterSeekerAgent;
pub use agent_log::AgentLog;
pub use config::WaterSeekerConfig;
pub use error::WaterSeekerError;
pub use generation::{AccessToken, Prompt, TextGenerator, WatsonxClient, WatsonxSession};
pub use location_resolver::{LocationLookup, LocationResolver};
pub use models::{
    AnalysisRecord, Coordinate, LocationQuery, PlaceInfo, Recommendation, RecommendationRecord,
    ResultBundle,
};
pub use parsing::{AnalysisParse, parse_analysis, sanitize_recommendation};
pub use weather::{CurrentConditions, WeatherClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WaterSeekerError>;
