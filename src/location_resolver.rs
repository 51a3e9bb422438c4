//! Location Resolution Module
//!
//! Resolves a coordinate into a country, a city and a nearby water-resource
//! note. Resolution never fails: every error path ends in "Unknown" values
//! and a fallback note, recorded in the agent log.

use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::agent_log::AgentLog;
use crate::config::{GeocodingConfig, WaterSeekerConfig};
use crate::http::lookup_client;
use crate::models::place::UNKNOWN;
use crate::models::{Coordinate, PlaceInfo};
use crate::water_resources::{SiteContext, WaterResourceRegistry};

pub(crate) const LOCATION_UNAVAILABLE_NOTE: &str =
    "Nearby Water Resources: Location data unavailable.";
pub(crate) const LOOKUP_ERROR_NOTE: &str =
    "Nearby Water Resources: Unable to fetch data due to an error.";

/// Country and settlement of a reverse-geocoded point
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub country: String,
    pub city: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    country: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

impl From<ReverseAddress> for Address {
    fn from(address: ReverseAddress) -> Self {
        Self {
            country: address.country.unwrap_or_else(|| UNKNOWN.to_string()),
            city: address
                .city
                .or(address.town)
                .or(address.village)
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Nominatim reverse geocoding, rate limited by a fixed pre-request delay
pub struct ReverseGeocoder {
    http: ClientWithMiddleware,
    base_url: String,
    delay: Duration,
}

impl ReverseGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        // No retries: the upstream usage policy allows one request per second
        let http = lookup_client(&config.user_agent, config.timeout_seconds, 0)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Look up the address of a coordinate; `None` when nothing matched
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn reverse(&self, coordinate: &Coordinate) -> Result<Option<Address>> {
        tokio::time::sleep(self.delay).await;

        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}&accept-language=en&addressdetails=1",
            self.base_url, coordinate.latitude, coordinate.longitude
        );
        debug!("Reverse geocoding request URL: {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Reverse geocoding failed with status {status}");
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.address.map(Address::from))
    }
}

/// Source of country/city/water-note metadata for the orchestrator
#[async_trait]
pub trait LocationLookup: Sync {
    /// Always succeeds; failures become fallback values plus log lines
    async fn resolve(&self, coordinate: Coordinate, log: &mut AgentLog) -> PlaceInfo;
}

/// Reverse geocoding followed by a country-specific water-resource lookup
pub struct LocationResolver {
    geocoder: ReverseGeocoder,
    water: WaterResourceRegistry,
}

impl LocationResolver {
    pub fn new(config: &WaterSeekerConfig) -> Result<Self> {
        Ok(Self::with_parts(
            ReverseGeocoder::new(&config.geocoding)?,
            WaterResourceRegistry::new(&config.water, &config.geocoding.user_agent)?,
        ))
    }

    #[must_use]
    pub fn with_parts(geocoder: ReverseGeocoder, water: WaterResourceRegistry) -> Self {
        Self { geocoder, water }
    }
}

#[async_trait]
impl LocationLookup for LocationResolver {
    async fn resolve(&self, coordinate: Coordinate, log: &mut AgentLog) -> PlaceInfo {
        log.push(format!(
            "📍 Looking up location for coordinates {coordinate}..."
        ));

        match self.geocoder.reverse(&coordinate).await {
            Ok(Some(address)) => {
                log.push(format!(
                    "✅ Found location: Country: {}, City: {}",
                    address.country, address.city
                ));
                let site = SiteContext {
                    coordinate: &coordinate,
                    country: &address.country,
                    city: &address.city,
                };
                let water_note = self.water.lookup(&site, log).await;
                PlaceInfo {
                    country: address.country,
                    city: address.city,
                    water_note,
                }
            }
            Ok(None) => {
                log.push("⚠️ Location not found, using default values.");
                PlaceInfo::unknown(LOCATION_UNAVAILABLE_NOTE)
            }
            Err(e) => {
                log.push(format!("❌ Error looking up location: {e}"));
                PlaceInfo::unknown(LOOKUP_ERROR_NOTE)
            }
        }
    }
}
