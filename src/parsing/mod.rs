//! Turns loosely structured generator output into validated records
//!
//! - `analysis`: one rainfall/capacity record per requested location
//! - `recommendation`: at most one accepted recommendation

pub mod analysis;
mod patterns;
pub mod recommendation;

pub use analysis::{AnalysisParse, parse_analysis};
pub use recommendation::sanitize_recommendation;
