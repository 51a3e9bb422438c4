//! Coordinates and the ordered set of points a user selected

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, WaterSeekerError};

/// Maximum number of points a single run accepts
pub const MAX_LOCATIONS: usize = 5;

/// Minimum number of points before a recommendation is attempted
pub const MIN_LOCATIONS_FOR_RECOMMENDATION: usize = 2;

/// A geographic point. Equality is exact on the (lat, lon) pair.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WaterSeekerError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WaterSeekerError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude as it appears in prompts and record prefixes
    #[must_use]
    pub fn latitude_text(&self) -> String {
        format_degrees(self.latitude)
    }

    /// Longitude as it appears in prompts and record prefixes
    #[must_use]
    pub fn longitude_text(&self) -> String {
        format_degrees(self.longitude)
    }

    /// Short form for map labels, two decimals
    #[must_use]
    pub fn format_short(&self) -> String {
        format!("(lat: {:.2}, lon: {:.2})", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(lat: {}, lon: {})",
            self.latitude_text(),
            self.longitude_text()
        )
    }
}

impl FromStr for Coordinate {
    type Err = WaterSeekerError;

    /// Parse coordinates from a string like "35.5,-78.3" or "35.5 -78.3"
    fn from_str(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(WaterSeekerError::validation(
                "Coordinates must be in format 'lat,lon'",
            ));
        }

        let latitude = parts[0].parse::<f64>().map_err(|_| {
            WaterSeekerError::validation(format!("Invalid latitude: {}", parts[0]))
        })?;
        let longitude = parts[1].parse::<f64>().map_err(|_| {
            WaterSeekerError::validation(format!("Invalid longitude: {}", parts[1]))
        })?;

        Self::new(latitude, longitude)
    }
}

/// Render a degree value the way the generator is shown it: shortest
/// round-trip form, always with a fractional part (`36.0`, `-78.3`).
#[must_use]
pub fn format_degrees(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') && !text.contains('e') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Ordered, duplicate-free sequence of at most [`MAX_LOCATIONS`] points.
/// Display indices are 1-based ("Location 1" is the first point).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct LocationQuery {
    points: Vec<Coordinate>,
}

impl LocationQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point. Returns `false` when the exact point is already present.
    pub fn push(&mut self, coordinate: Coordinate) -> Result<bool> {
        if self.points.contains(&coordinate) {
            return Ok(false);
        }

        if self.points.len() >= MAX_LOCATIONS {
            return Err(WaterSeekerError::validation(format!(
                "Max {MAX_LOCATIONS} locations allowed."
            )));
        }

        self.points.push(coordinate);
        Ok(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether enough points were selected to ask for a recommendation
    #[must_use]
    pub fn can_recommend(&self) -> bool {
        self.points.len() >= MIN_LOCATIONS_FOR_RECOMMENDATION
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.points.iter()
    }

    /// Points paired with their 1-based display index
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &Coordinate)> {
        self.points.iter().enumerate().map(|(i, c)| (i + 1, c))
    }

    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.points
    }

    /// `Location i: (lat: X, lon: Y)` lines handed to the analysis prompt
    #[must_use]
    pub fn prompt_text(&self) -> String {
        self.indexed()
            .map(|(index, coordinate)| format!("Location {index}: {coordinate}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<Coordinate>> for LocationQuery {
    type Error = WaterSeekerError;

    fn try_from(points: Vec<Coordinate>) -> Result<Self> {
        let mut query = Self::new();
        for point in points {
            Coordinate::new(point.latitude, point.longitude)?;
            query.push(point)?;
        }
        Ok(query)
    }
}

impl From<LocationQuery> for Vec<Coordinate> {
    fn from(query: LocationQuery) -> Self {
        query.points
    }
}
