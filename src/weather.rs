//! Current weather conditions for a location (`OpenWeatherMap`)
//!
//! Purely supplementary display data. Lookups never fail: an unconfigured
//! client or any upstream error yields [`CurrentConditions::default`].

use anyhow::{Result, bail};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::WeatherConfig;
use crate::http::lookup_client;
use crate::models::Coordinate;

const NOT_AVAILABLE: &str = "N/A";

/// Observed conditions at a point, metric units
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Rain volume over the last hour in mm
    pub rain_1h: f32,
    /// Rain volume over the last three hours in mm
    pub rain_3h: f32,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Cloud cover in percent
    pub cloud_cover: u8,
    /// Temperature in Celsius
    pub temperature: f32,
    /// Wind speed in m/s
    pub wind_speed: f32,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    /// Atmospheric pressure in hPa
    pub pressure: f32,
    pub description: String,
}

impl Default for CurrentConditions {
    fn default() -> Self {
        Self {
            rain_1h: 0.0,
            rain_3h: 0.0,
            humidity: 0,
            cloud_cover: 0,
            temperature: 0.0,
            wind_speed: 0.0,
            wind_direction: 0,
            pressure: 0.0,
            description: NOT_AVAILABLE.to_string(),
        }
    }
}

impl CurrentConditions {
    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format!(
            "{:.1} m/s {} ({}°)",
            self.wind_speed,
            Self::wind_direction_to_cardinal(self.wind_direction),
            self.wind_direction
        )
    }

    /// Multi-line summary for terminal output
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut description = self.description.clone();
        if let Some(first) = description.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        vec![
            format!("Recent Rainfall (last 1 hour): {} mm", self.rain_1h),
            format!("Recent Rainfall (last 3 hours): {} mm", self.rain_3h),
            format!("Humidity: {}%", self.humidity),
            format!("Cloud Cover: {}%", self.cloud_cover),
            format!("Temperature: {:.1}°C", self.temperature),
            format!("Wind: {}", self.format_wind()),
            format!("Atmospheric Pressure: {} hPa", self.pressure),
            format!("Weather Description: {description}"),
        ]
    }
}

/// `OpenWeatherMap` response structures
mod openweathermap {
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default)]
    pub struct CurrentResponse {
        #[serde(default)]
        pub rain: Option<Rain>,
        #[serde(default)]
        pub main: Option<Main>,
        #[serde(default)]
        pub clouds: Option<Clouds>,
        #[serde(default)]
        pub wind: Option<Wind>,
        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Rain {
        #[serde(rename = "1h", default)]
        pub one_hour: f32,
        #[serde(rename = "3h", default)]
        pub three_hours: f32,
    }

    #[derive(Debug, Deserialize)]
    pub struct Main {
        #[serde(default)]
        pub temp: f32,
        #[serde(default)]
        pub humidity: u8,
        #[serde(default)]
        pub pressure: f32,
    }

    #[derive(Debug, Deserialize)]
    pub struct Clouds {
        #[serde(default)]
        pub all: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct Wind {
        #[serde(default)]
        pub speed: f32,
        #[serde(default)]
        pub deg: u16,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: Option<String>,
    }
}

impl From<openweathermap::CurrentResponse> for CurrentConditions {
    fn from(response: openweathermap::CurrentResponse) -> Self {
        let defaults = Self::default();
        Self {
            rain_1h: response.rain.as_ref().map_or(0.0, |r| r.one_hour),
            rain_3h: response.rain.as_ref().map_or(0.0, |r| r.three_hours),
            humidity: response.main.as_ref().map_or(0, |m| m.humidity),
            cloud_cover: response.clouds.map_or(0, |c| c.all),
            temperature: response.main.as_ref().map_or(0.0, |m| m.temp),
            wind_speed: response.wind.as_ref().map_or(0.0, |w| w.speed),
            wind_direction: response.wind.as_ref().map_or(0, |w| w.deg),
            pressure: response.main.as_ref().map_or(0.0, |m| m.pressure),
            description: response
                .weather
                .into_iter()
                .next()
                .and_then(|c| c.description)
                .unwrap_or(defaults.description),
        }
    }
}

pub struct WeatherClient {
    http: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig, user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: lookup_client(user_agent, config.timeout_seconds, 0)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current conditions, or the zeroed record on any failure
    pub async fn current_conditions(&self, coordinate: &Coordinate) -> CurrentConditions {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No weather API key configured, skipping lookup");
            return CurrentConditions::default();
        };

        match self.fetch(coordinate, api_key).await {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!("Error fetching weather data: {}", e);
                CurrentConditions::default()
            }
        }
    }

    #[instrument(skip(self, api_key), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn fetch(&self, coordinate: &Coordinate, api_key: &str) -> Result<CurrentConditions> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            coordinate.latitude,
            coordinate.longitude,
            urlencoding::encode(api_key)
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Weather lookup failed with status {status}");
        }

        let body: openweathermap::CurrentResponse = response.json().await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    fn client_for(base_url: &str, api_key: Option<&str>) -> WeatherClient {
        let config = WeatherConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(str::to_string),
            ..WeatherConfig::default()
        };
        WeatherClient::new(&config, "test").unwrap()
    }

    #[test]
    fn test_wind_direction_to_cardinal() {
        assert_eq!(CurrentConditions::wind_direction_to_cardinal(0), "N");
        assert_eq!(CurrentConditions::wind_direction_to_cardinal(90), "E");
        assert_eq!(CurrentConditions::wind_direction_to_cardinal(180), "S");
        assert_eq!(CurrentConditions::wind_direction_to_cardinal(270), "W");
        assert_eq!(CurrentConditions::wind_direction_to_cardinal(45), "NE");
    }

    #[test]
    fn test_partial_response_keeps_defaults() {
        let body: openweathermap::CurrentResponse =
            serde_json::from_str(r#"{"main": {"temp": 21.5, "humidity": 60, "pressure": 1012}}"#)
                .unwrap();
        let conditions = CurrentConditions::from(body);

        assert_eq!(conditions.temperature, 21.5);
        assert_eq!(conditions.humidity, 60);
        assert_eq!(conditions.rain_1h, 0.0);
        assert_eq!(conditions.description, "N/A");
    }

    #[test]
    fn test_summary_capitalises_description() {
        let conditions = CurrentConditions {
            description: "light rain".to_string(),
            ..CurrentConditions::default()
        };
        assert_eq!(
            conditions.summary_lines().last().unwrap(),
            "Weather Description: Light rain"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_client_returns_default() {
        let client = client_for("http://127.0.0.1:1", None);
        assert!(!client.is_configured());
        let conditions = client
            .current_conditions(&Coordinate::new(1.0, 2.0).unwrap())
            .await;
        assert_eq!(conditions, CurrentConditions::default());
    }

    #[tokio::test]
    async fn test_current_conditions_from_upstream() {
        let router = Router::new().route(
            "/weather",
            get(|| async {
                Json(json!({
                    "weather": [{"description": "moderate rain"}],
                    "main": {"temp": 18.2, "humidity": 88, "pressure": 1004},
                    "wind": {"speed": 4.1, "deg": 200},
                    "clouds": {"all": 90},
                    "rain": {"1h": 2.5}
                }))
            }),
        );
        let base_url = serve(router).await;
        let client = client_for(&base_url, Some("weather-key-123"));

        let conditions = client
            .current_conditions(&Coordinate::new(35.5, -78.3).unwrap())
            .await;

        assert_eq!(conditions.rain_1h, 2.5);
        assert_eq!(conditions.rain_3h, 0.0);
        assert_eq!(conditions.cloud_cover, 90);
        assert_eq!(conditions.wind_direction, 200);
        assert_eq!(conditions.description, "moderate rain");
    }

    #[tokio::test]
    async fn test_upstream_error_returns_default() {
        let router = Router::new().route(
            "/weather",
            get(|| async { (StatusCode::UNAUTHORIZED, "Invalid API key") }),
        );
        let base_url = serve(router).await;
        let client = client_for(&base_url, Some("weather-key-123"));

        let conditions = client
            .current_conditions(&Coordinate::new(35.5, -78.3).unwrap())
            .await;

        assert_eq!(conditions, CurrentConditions::default());
    }
}
