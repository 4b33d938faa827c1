//! Current weather for the header widget (Open-Meteo)
//!
//! Two calls: geocode the configured city, then read the current conditions.
//! Any failure simply means no weather is shown.

use kiosk_core::resilience::timeout;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClientError;

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// How often a shown widget refreshes
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Coarse condition derived from the WMO weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl Condition {
    #[must_use]
    pub const fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Clear,
            Some(1..=3) => Self::Cloudy,
            Some(45 | 48) => Self::Fog,
            Some(51..=57) => Self::Drizzle,
            Some(61..=67 | 80..=82) => Self::Rain,
            Some(71..=77 | 85 | 86) => Self::Snow,
            Some(95..=99) => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Place name as resolved by the geocoder
    pub city: String,
    pub temperature: Option<f64>,
    pub code: Option<i64>,
}

impl WeatherReport {
    #[must_use]
    pub const fn condition(&self) -> Condition {
        Condition::from_code(self.code)
    }

    /// Header label, e.g. `Oslo 4°C`
    #[must_use]
    pub fn label(&self) -> String {
        match self.temperature {
            #[allow(clippy::cast_possible_truncation)]
            Some(t) => format!("{} {}°C", self.city, t.round() as i64),
            None => self.city.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
    current: Option<Current>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
    weathercode: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temperature_2m: Option<f64>,
    weather_code: Option<i64>,
}

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
    timeout: Duration,
}

impl WeatherClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_endpoints(client, GEOCODING_URL, FORECAST_URL)
    }

    #[must_use]
    pub fn with_endpoints(client: Client, geocoding_url: &str, forecast_url: &str) -> Self {
        Self {
            client,
            geocoding_url: geocoding_url.to_string(),
            forecast_url: forecast_url.to_string(),
            timeout: timeout::WEATHER_FETCH,
        }
    }

    /// Current weather for `city`; `None` on blank city, unknown place or any error
    pub async fn fetch(&self, city: &str) -> Option<WeatherReport> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }
        match self.try_fetch(city).await {
            Ok(report) => report,
            Err(e) => {
                warn!(city = %city, error = %e, "Weather lookup failed");
                None
            }
        }
    }

    async fn try_fetch(&self, city: &str) -> Result<Option<WeatherReport>, ClientError> {
        let geo: GeocodingResponse = self
            .client
            .get(&self.geocoding_url)
            .query(&[("name", city), ("count", "1"), ("format", "json")])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(location) = geo.results.into_iter().next() else {
            debug!(city = %city, "City not found by geocoder");
            return Ok(None);
        };
        let (Some(latitude), Some(longitude)) = (location.latitude, location.longitude) else {
            return Ok(None);
        };

        let forecast: ForecastResponse = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let (temperature, code) = match (forecast.current_weather, forecast.current) {
            (Some(cw), _) if cw.temperature.is_some() => (cw.temperature, cw.weathercode),
            (cw, Some(current)) => (
                current.temperature_2m,
                current.weather_code.or(cw.and_then(|c| c.weathercode)),
            ),
            (Some(cw), None) => (None, cw.weathercode),
            (None, None) => (None, None),
        };

        Ok(Some(WeatherReport {
            city: location.name.unwrap_or_else(|| city.to_string()),
            temperature,
            code,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        WeatherClient::with_endpoints(
            Client::new(),
            &format!("{}/v1/search", server.uri()),
            &format!("{}/v1/forecast", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_fetch_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Bergen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"name": "Bergen", "latitude": 60.39, "longitude": 5.32}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": {"temperature": 7.6, "weathercode": 61}
            })))
            .mount(&server)
            .await;

        let report = client_for(&server).fetch(" Bergen ").await.unwrap();
        assert_eq!(report.city, "Bergen");
        assert_eq!(report.condition(), Condition::Rain);
        assert_eq!(report.label(), "Bergen 8°C");
    }

    #[tokio::test]
    async fn test_unknown_city_and_errors_yield_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Atlantis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Oslo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let weather = client_for(&server);
        assert!(weather.fetch("Atlantis").await.is_none());
        assert!(weather.fetch("Oslo").await.is_none());
        assert!(weather.fetch("   ").await.is_none());
    }

    #[test]
    fn test_condition_codes() {
        assert_eq!(Condition::from_code(Some(0)), Condition::Clear);
        assert_eq!(Condition::from_code(Some(48)), Condition::Fog);
        assert_eq!(Condition::from_code(Some(86)), Condition::Snow);
        assert_eq!(Condition::from_code(Some(96)), Condition::Thunderstorm);
        assert_eq!(Condition::from_code(None), Condition::Unknown);
    }
}
