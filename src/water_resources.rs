//! Country-specific lookups of nearby water resources
//!
//! Each supported country maps to a [`WaterResourceStrategy`]; anything not
//! in the table uses a generic regional summary. A strategy may fail, in
//! which case the registry records the error and hands back a fixed note.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, instrument};

use crate::agent_log::AgentLog;
use crate::config::WaterConfig;
use crate::http::lookup_client;
use crate::location_resolver::LOOKUP_ERROR_NOTE;
use crate::models::Coordinate;

const USGS_FALLBACK_NOTE: &str = "Nearby Water Resources: Limited data available. The U.S. has extensive water monitoring networks (USGS).";
const CANADA_FOUND_NOTE: &str =
    "Nearby Water Resource: Hydrometric station data available (Environment Canada).";
const CANADA_FALLBACK_NOTE: &str =
    "Nearby Water Resources: Canada has extensive hydrometric monitoring (Environment Canada).";
const BRAZIL_NOTE: &str = "Nearby Water Resources: Brazil’s Cerrado region has significant groundwater reserves, but faces deforestation challenges.";
const ARGENTINA_NOTE: &str = "Nearby Water Resources: Argentina’s Pampas region is known for its aquifers, with annual rainfall around 600-1000mm.";
const DEFAULT_NOTE: &str = "Nearby Water Resources: Limited data available for this region.";

/// The point being described and its resolved address
#[derive(Debug, Clone, Copy)]
pub struct SiteContext<'a> {
    pub coordinate: &'a Coordinate,
    pub country: &'a str,
    pub city: &'a str,
}

#[async_trait]
pub trait WaterResourceStrategy: Send + Sync {
    /// One human-readable note about water resources near the site
    async fn note(&self, site: &SiteContext<'_>, log: &mut AgentLog) -> Result<String>;
}

/// USGS NWIS site service, queried with a bounding box around the point
pub struct UsgsSiteService {
    http: ClientWithMiddleware,
    base_url: String,
    half_box: f64,
}

impl UsgsSiteService {
    #[must_use]
    pub fn new(http: ClientWithMiddleware, base_url: &str, half_box: f64) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            half_box,
        }
    }

    fn url(&self, coordinate: &Coordinate) -> String {
        let Coordinate {
            latitude,
            longitude,
        } = *coordinate;
        format!(
            "{}?format=rdb&bBox={:.6},{:.6},{:.6},{:.6}&siteType=ST,GW&hasDataTypeCd=qw,gw",
            self.base_url,
            longitude - self.half_box,
            latitude - self.half_box,
            longitude + self.half_box,
            latitude + self.half_box,
        )
    }
}

/// First site in an RDB document as `(station name, site type code)`
///
/// RDB is tab separated: `#` comment lines, a header row, a column-format row
/// and then one row per site.
#[must_use]
pub fn first_rdb_site(body: &str) -> Option<(String, String)> {
    let mut rows = body
        .lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty());

    let header: Vec<&str> = rows.next()?.split('\t').collect();
    let column = |name: &str, fallback: usize| {
        header
            .iter()
            .position(|c| c.trim() == name)
            .unwrap_or(fallback)
    };
    let name_col = column("station_nm", 2);
    let type_col = column("site_tp_cd", 3);

    rows.skip(1).find_map(|row| {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() <= 5 {
            return None;
        }
        let name = fields.get(name_col)?.trim();
        let site_type = fields.get(type_col)?.trim();
        (!name.is_empty()).then(|| (name.to_string(), site_type.to_string()))
    })
}

#[async_trait]
impl WaterResourceStrategy for UsgsSiteService {
    #[instrument(skip_all, fields(country = site.country))]
    async fn note(&self, site: &SiteContext<'_>, log: &mut AgentLog) -> Result<String> {
        let url = self.url(site.coordinate);
        debug!("USGS request URL: {}", url);

        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::OK {
            let body = response.text().await?;
            if let Some((name, site_type)) = first_rdb_site(&body) {
                log.push(format!("✅ Found USGS site: {name} ({site_type})"));
                return Ok(format!("Nearby Water Resource: {name} ({site_type})"));
            }
        }

        log.push("⚠️ No USGS data found, falling back to general info.");
        Ok(USGS_FALLBACK_NOTE.to_string())
    }
}

/// Environment Canada hydrometric station search
pub struct CanadaHydrometric {
    http: ClientWithMiddleware,
    base_url: String,
    radius_km: u32,
}

impl CanadaHydrometric {
    #[must_use]
    pub fn new(http: ClientWithMiddleware, base_url: &str, radius_km: u32) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            radius_km,
        }
    }
}

#[async_trait]
impl WaterResourceStrategy for CanadaHydrometric {
    #[instrument(skip_all, fields(country = site.country))]
    async fn note(&self, site: &SiteContext<'_>, log: &mut AgentLog) -> Result<String> {
        let url = format!(
            "{}?lat={}&lon={}&radius={}",
            self.base_url, site.coordinate.latitude, site.coordinate.longitude, self.radius_km
        );
        debug!("Environment Canada request URL: {}", url);

        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::OK {
            log.push("✅ Found Environment Canada hydrometric station.");
            Ok(CANADA_FOUND_NOTE.to_string())
        } else {
            log.push("⚠️ No Environment Canada data found, falling back to general info.");
            Ok(CANADA_FALLBACK_NOTE.to_string())
        }
    }
}

/// Fixed regional summary
pub struct RegionalSummary {
    note: &'static str,
}

impl RegionalSummary {
    #[must_use]
    pub const fn new(note: &'static str) -> Self {
        Self { note }
    }
}

#[async_trait]
impl WaterResourceStrategy for RegionalSummary {
    async fn note(&self, site: &SiteContext<'_>, log: &mut AgentLog) -> Result<String> {
        log.push(format!(
            "🔍 Using regional water-resource summary for {}.",
            site.country
        ));
        Ok(self.note.to_string())
    }
}

/// Country name to strategy table with a catch-all fallback
pub struct WaterResourceRegistry {
    strategies: HashMap<String, Box<dyn WaterResourceStrategy>>,
    fallback: Box<dyn WaterResourceStrategy>,
}

impl WaterResourceRegistry {
    /// Default table: live lookups for the U.S. and Canada, fixed
    /// summaries for Brazil and Argentina
    pub fn new(config: &WaterConfig, user_agent: &str) -> Result<Self> {
        let http = lookup_client(user_agent, config.timeout_seconds, config.max_retries)?;

        let mut registry = Self::with_fallback(Box::new(RegionalSummary::new(DEFAULT_NOTE)));
        registry.register(
            "United States",
            Box::new(UsgsSiteService::new(
                http.clone(),
                &config.usgs_base_url,
                config.bounding_box_degrees,
            )),
        );
        registry.register(
            "Canada",
            Box::new(CanadaHydrometric::new(
                http,
                &config.canada_base_url,
                config.canada_radius_km,
            )),
        );
        registry.register("Brazil", Box::new(RegionalSummary::new(BRAZIL_NOTE)));
        registry.register("Argentina", Box::new(RegionalSummary::new(ARGENTINA_NOTE)));
        Ok(registry)
    }

    #[must_use]
    pub fn with_fallback(fallback: Box<dyn WaterResourceStrategy>) -> Self {
        Self {
            strategies: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, country: impl Into<String>, strategy: Box<dyn WaterResourceStrategy>) {
        self.strategies.insert(country.into(), strategy);
    }

    /// Never fails; strategy errors become a fixed note
    pub async fn lookup(&self, site: &SiteContext<'_>, log: &mut AgentLog) -> String {
        log.push(format!(
            "🌊 Fetching water resource data for {} in {}, {}...",
            site.coordinate, site.country, site.city
        ));

        let strategy = self.strategies.get(site.country).unwrap_or(&self.fallback);
        match strategy.note(site, log).await {
            Ok(note) => note,
            Err(e) => {
                log.push(format!("❌ Error fetching water resource data: {e}"));
                LOOKUP_ERROR_NOTE.to_string()
            }
        }
    }
}
