//! Data models for the `WaterSeeker` agent
//!
//! - Location: coordinates and the ordered query of selected points
//! - Analysis: per-location rainfall/capacity records
//! - Recommendation: the sanitized verdict
//! - Place: country/city/water-resource metadata
//! - Bundle: the result handed back to callers

pub mod analysis;
pub mod bundle;
pub mod location;
pub mod place;
pub mod recommendation;

pub use analysis::{AnalysisRecord, RecordSource};
pub use bundle::ResultBundle;
pub use location::{Coordinate, LocationQuery, MAX_LOCATIONS, MIN_LOCATIONS_FOR_RECOMMENDATION};
pub use place::PlaceInfo;
pub use recommendation::{Recommendation, RecommendationRecord};
