//! Weather provider interface and the OpenWeatherMap-backed client.
//!
//! The core only ever talks to the provider through the [`WeatherProvider`]
//! trait; the orchestrator classifies its raw results into refresh outcomes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::outcome::ProviderError;
use crate::types::{
    AirQuality, Coordinates, CurrentConditions, DailyForecast, HourlyForecast, WeatherAlert,
    WeatherBundle,
};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const USER_AGENT: &str = "stratus/0.1.0";

/// Asynchronous source of weather data for the refresh core.
///
/// Both operations honor the caller-supplied deadline; expiry surfaces as a
/// transport error and classifies as unreachable.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve a city/country pair to coordinates. Used only while adding a
    /// place.
    async fn resolve_coordinates(
        &self,
        city: &str,
        country_code: &str,
        deadline: Duration,
    ) -> Result<Coordinates, ProviderError>;

    /// Fetch the complete weather payload for the given coordinates.
    async fn fetch_bundle(
        &self,
        coords: Coordinates,
        deadline: Duration,
    ) -> Result<WeatherBundle, ProviderError>;
}

/// OpenWeatherMap client: geocoding + one-call + air pollution endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    client: Client,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client with the production base URL.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
            api_key: api_key.into(),
        })
    }

    /// Override the base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        deadline: Duration,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(deadline)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn resolve_coordinates(
        &self,
        city: &str,
        country_code: &str,
        deadline: Duration,
    ) -> Result<Coordinates, ProviderError> {
        tracing::debug!(city, country_code, "resolving coordinates");

        let query = [
            ("q", format!("{},{}", city, country_code)),
            ("limit", "1".to_string()),
            ("appid", self.api_key.clone()),
        ];
        let results: Vec<GeoEntry> = self.get_json("/geo/1.0/direct", &query, deadline).await?;

        match results.first() {
            Some(entry) => Ok(Coordinates {
                latitude: entry.lat,
                longitude: entry.lon,
            }),
            None => Err(ProviderError::NoMatch),
        }
    }

    async fn fetch_bundle(
        &self,
        coords: Coordinates,
        deadline: Duration,
    ) -> Result<WeatherBundle, ProviderError> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let onecall_query = [
            ("lat", lat.clone()),
            ("lon", lon.clone()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
            ("exclude", "minutely".to_string()),
        ];
        let onecall: OneCallResponse = self
            .get_json("/data/2.5/onecall", &onecall_query, deadline)
            .await?;

        let air_query = [("lat", lat), ("lon", lon), ("appid", self.api_key.clone())];
        let air: AirPollutionResponse = self
            .get_json("/data/2.5/air_pollution", &air_query, deadline)
            .await?;

        tracing::debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            hourly = onecall.hourly.len(),
            daily = onecall.daily.len(),
            "fetched weather bundle"
        );

        Ok(build_bundle(onecall, air))
    }
}

fn build_bundle(onecall: OneCallResponse, air: AirPollutionResponse) -> WeatherBundle {
    let current = CurrentConditions {
        condition_code: primary_code(&onecall.current.weather),
        description: primary_description(&onecall.current.weather),
        temperature: onecall.current.temp,
        feels_like: onecall.current.feels_like,
        pressure: onecall.current.pressure,
        humidity: onecall.current.humidity,
        wind_speed: onecall.current.wind_speed,
        wind_gust: onecall.current.wind_gust.unwrap_or(0.0),
        wind_direction: onecall.current.wind_deg,
        cloudiness: onecall.current.clouds,
        visibility: onecall.current.visibility.unwrap_or(0),
        rain: onecall.current.rain.map(|p| p.one_hour).unwrap_or(0.0),
        snow: onecall.current.snow.map(|p| p.one_hour).unwrap_or(0.0),
        observed_at: ts(onecall.current.dt),
        sunrise: ts(onecall.current.sunrise),
        sunset: ts(onecall.current.sunset),
    };

    let hourly = onecall
        .hourly
        .into_iter()
        .map(|h| HourlyForecast {
            time: ts(h.dt),
            temperature: h.temp,
            feels_like: h.feels_like,
            condition_code: primary_code(&h.weather),
            precipitation_chance: h.pop,
            rain: h.rain.map(|p| p.one_hour).unwrap_or(0.0),
            snow: h.snow.map(|p| p.one_hour).unwrap_or(0.0),
        })
        .collect();

    let daily = onecall
        .daily
        .into_iter()
        .map(|d| DailyForecast {
            date: ts(d.dt),
            temp_min: d.temp.min,
            temp_max: d.temp.max,
            condition_code: primary_code(&d.weather),
            precipitation_chance: d.pop,
            sunrise: ts(d.sunrise),
            sunset: ts(d.sunset),
        })
        .collect();

    let alerts = onecall
        .alerts
        .unwrap_or_default()
        .into_iter()
        .map(|a| WeatherAlert {
            sender: a.sender_name,
            event: a.event,
            start: ts(a.start),
            end: ts(a.end),
            description: a.description,
        })
        .collect();

    let air_quality = air.list.into_iter().next().map(|entry| AirQuality {
        aqi: entry.main.aqi,
        co: entry.components.co,
        no: entry.components.no,
        no2: entry.components.no2,
        o3: entry.components.o3,
        so2: entry.components.so2,
        nh3: entry.components.nh3,
        pm2_5: entry.components.pm2_5,
        pm10: entry.components.pm10,
    });

    WeatherBundle {
        timezone: onecall.timezone,
        current,
        hourly,
        daily,
        air_quality,
        alerts,
    }
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn primary_code(conditions: &[OwCondition]) -> i32 {
    conditions.first().map(|c| c.id).unwrap_or(0)
}

fn primary_description(conditions: &[OwCondition]) -> String {
    conditions
        .first()
        .map(|c| c.description.clone())
        .unwrap_or_default()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        body.to_string()
    } else {
        format!("{}...", &body[..MAX])
    }
}

// Wire format structs, private to this module.

#[derive(Debug, Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    timezone: String,
    current: OwCurrent,
    #[serde(default)]
    hourly: Vec<OwHourly>,
    #[serde(default)]
    daily: Vec<OwDaily>,
    alerts: Option<Vec<OwAlert>>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    sunrise: i64,
    sunset: i64,
    temp: f64,
    feels_like: f64,
    pressure: u32,
    humidity: u8,
    clouds: u8,
    visibility: Option<u32>,
    wind_speed: f64,
    wind_gust: Option<f64>,
    wind_deg: Option<u16>,
    #[serde(default)]
    weather: Vec<OwCondition>,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<OwCondition>,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    sunrise: i64,
    sunset: i64,
    temp: OwDailyTemp,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: i32,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwPrecipitation {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    sender_name: String,
    event: String,
    start: i64,
    end: i64,
    description: String,
}

#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAirIndex,
    components: OwAirComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirIndex {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAirComponents {
    co: f64,
    no: f64,
    no2: f64,
    o3: f64,
    so2: f64,
    nh3: f64,
    pm2_5: f64,
    pm10: f64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_onecall_deserialization() {
        let json = r#"{
            "timezone": "Europe/Paris",
            "current": {
                "dt": 1700000000,
                "sunrise": 1699990000,
                "sunset": 1700020000,
                "temp": 12.3,
                "feels_like": 11.0,
                "pressure": 1015,
                "humidity": 76,
                "clouds": 40,
                "visibility": 10000,
                "wind_speed": 4.2,
                "wind_deg": 220,
                "weather": [{"id": 801, "main": "Clouds", "description": "few clouds"}],
                "rain": {"1h": 0.4}
            },
            "hourly": [
                {"dt": 1700003600, "temp": 12.0, "feels_like": 10.8, "pop": 0.2,
                 "weather": [{"id": 500, "description": "light rain"}]}
            ],
            "daily": [
                {"dt": 1700006400, "sunrise": 1699990000, "sunset": 1700020000,
                 "temp": {"min": 8.0, "max": 14.0}, "pop": 0.35,
                 "weather": [{"id": 500, "description": "light rain"}]}
            ]
        }"#;

        let parsed: OneCallResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.timezone, "Europe/Paris");
        assert_eq!(parsed.current.weather[0].id, 801);
        assert_eq!(parsed.hourly.len(), 1);
        assert_eq!(parsed.daily[0].temp.max, 14.0);
        assert!(parsed.alerts.is_none());
    }

    #[test]
    fn test_build_bundle_maps_fields() {
        let onecall = OneCallResponse {
            timezone: "Europe/Paris".to_string(),
            current: OwCurrent {
                dt: 1_700_000_000,
                sunrise: 1_699_990_000,
                sunset: 1_700_020_000,
                temp: 12.3,
                feels_like: 11.0,
                pressure: 1015,
                humidity: 76,
                clouds: 40,
                visibility: None,
                wind_speed: 4.2,
                wind_gust: None,
                wind_deg: None,
                weather: vec![OwCondition {
                    id: 801,
                    description: "few clouds".to_string(),
                }],
                rain: Some(OwPrecipitation { one_hour: 0.4 }),
                snow: None,
            },
            hourly: vec![],
            daily: vec![],
            alerts: None,
        };
        let air = AirPollutionResponse {
            list: vec![OwAirEntry {
                main: OwAirIndex { aqi: 2 },
                components: OwAirComponents {
                    co: 201.9,
                    no: 0.02,
                    no2: 0.77,
                    o3: 68.66,
                    so2: 0.64,
                    nh3: 0.12,
                    pm2_5: 0.5,
                    pm10: 0.54,
                },
            }],
        };

        let bundle = build_bundle(onecall, air);
        assert_eq!(bundle.timezone, "Europe/Paris");
        assert_eq!(bundle.current.condition_code, 801);
        assert_eq!(bundle.current.observed_at.timestamp(), 1_700_000_000);
        assert_eq!(bundle.current.rain, 0.4);
        assert_eq!(bundle.current.wind_direction, None);
        assert_eq!(bundle.air_quality.as_ref().unwrap().aqi, 2);
        assert!(bundle.alerts.is_empty());
    }

    #[test]
    fn test_empty_air_pollution_list_yields_none() {
        let onecall: OneCallResponse = serde_json::from_str(
            r#"{"timezone": "UTC", "current": {"dt": 0, "sunrise": 0, "sunset": 0,
                "temp": 0.0, "feels_like": 0.0, "pressure": 1000, "humidity": 50,
                "clouds": 0, "wind_speed": 0.0}}"#,
        )
        .unwrap();
        let air = AirPollutionResponse { list: vec![] };
        let bundle = build_bundle(onecall, air);
        assert!(bundle.air_quality.is_none());
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(truncate_body(short), short);
        let long = "x".repeat(1000);
        assert_eq!(truncate_body(&long).len(), 259);
    }
}
