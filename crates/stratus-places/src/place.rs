//! The place model: identity plus cached weather snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratus_weather::{
    AirQuality, Coordinates, CurrentConditions, DailyForecast, HourlyForecast, RefreshErrorKind,
    WeatherAlert, WeatherBundle,
};

/// Stable identity of a tracked place: normalized city name plus ISO-3166
/// alpha-2 country code. Display text lives on the place and may change
/// without affecting identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId {
    city: String,
    country_code: String,
}

impl PlaceId {
    pub fn new(city: &str, country_code: &str) -> Self {
        Self {
            city: city.trim().to_lowercase(),
            country_code: country_code.trim().to_ascii_uppercase(),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.country_code)
    }
}

/// Last failed refresh, recorded on the affected place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub kind: RefreshErrorKind,
    /// HTTP status when the failure carried one
    pub status: Option<u16>,
}

/// One tracked place with its locally cached weather snapshot.
///
/// Mutated only by the refresh orchestrator applying an outcome and by
/// explicit user add/remove; never by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    id: PlaceId,
    /// City name as the user entered it
    pub display_city: String,
    pub coordinates: Coordinates,
    /// IANA timezone name, updated from each successful refresh
    pub timezone: String,
    pub current: Option<CurrentConditions>,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
    pub air_quality: Option<AirQuality>,
    pub alerts: Vec<WeatherAlert>,
    /// Observation time of the last successful refresh (provider time, not
    /// receipt time)
    pub updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<LastError>,
}

impl Place {
    pub fn new(city: &str, country_code: &str, coordinates: Coordinates) -> Self {
        Self {
            id: PlaceId::new(city, country_code),
            display_city: city.trim().to_string(),
            coordinates,
            timezone: "UTC".to_string(),
            current: None,
            hourly: Vec::new(),
            daily: Vec::new(),
            air_quality: None,
            alerts: Vec::new(),
            updated_at: None,
            last_error: None,
        }
    }

    pub fn id(&self) -> &PlaceId {
        &self.id
    }

    /// Apply a successful refresh: replace the whole cached snapshot, clear
    /// the error marker, stamp the provider's observation time.
    pub fn apply_bundle(&mut self, bundle: WeatherBundle) {
        self.timezone = bundle.timezone;
        self.updated_at = Some(bundle.current.observed_at);
        self.current = Some(bundle.current);
        self.hourly = bundle.hourly;
        self.daily = bundle.daily;
        self.air_quality = bundle.air_quality;
        self.alerts = bundle.alerts;
        self.last_error = None;
    }

    /// Record a failed refresh. Previously cached weather data is kept;
    /// stale-but-present beats a blank entry.
    pub fn record_failure(&mut self, kind: RefreshErrorKind, status: Option<u16>) {
        self.last_error = Some(LastError { kind, status });
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }
}
