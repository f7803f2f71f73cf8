use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::icons::{self, IconKey};

/// Geographic coordinates of a tracked place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current observed conditions for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Provider condition code (OpenWeatherMap code space)
    pub condition_code: i32,
    /// Human-readable condition text from the provider
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    /// Pressure in hPa
    pub pressure: u32,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Wind gust speed in m/s
    pub wind_gust: f64,
    /// Wind direction in degrees; `None` when the provider reports no
    /// readable direction
    pub wind_direction: Option<u16>,
    /// Cloud cover in percent
    pub cloudiness: u8,
    /// Visibility in metres
    pub visibility: u32,
    /// Rain volume over the last hour, in mm
    pub rain: f64,
    /// Snow volume over the last hour, in mm
    pub snow: f64,
    pub observed_at: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl CurrentConditions {
    /// Icon for these conditions, honoring the day/night split.
    pub fn icon_key(&self) -> IconKey {
        icons::resolve(
            self.condition_code,
            self.observed_at.timestamp(),
            self.sunrise.timestamp(),
            self.sunset.timestamp(),
        )
    }
}

/// One point of the hourly forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition_code: i32,
    /// Probability of precipitation, 0.0..=1.0
    pub precipitation_chance: f64,
    pub rain: f64,
    pub snow: f64,
}

/// One point of the daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: DateTime<Utc>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition_code: i32,
    /// Probability of precipitation, 0.0..=1.0
    pub precipitation_chance: f64,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Air quality snapshot. Concentrations are in microgrammes per cubic metre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// Air quality index, 1 (good) to 5 (very poor)
    pub aqi: u8,
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub nh3: f64,
    pub pm2_5: f64,
    pub pm10: f64,
}

impl AirQuality {
    /// Qualitative band for the index.
    pub fn band(&self) -> AqiBand {
        AqiBand::from_index(self.aqi)
    }
}

/// Qualitative air-quality bands, following the provider's 1..=5 index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiBand {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiBand {
    /// Band for a raw index; out-of-range values read as `Good`, matching
    /// the provider's own fallback.
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            2 => Self::Fair,
            3 => Self::Moderate,
            4 => Self::Poor,
            5 => Self::VeryPoor,
            _ => Self::Good,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Weather alert issued for a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    /// Issuing authority
    pub sender: String,
    pub event: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
}

/// Complete decoded payload of one successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherBundle {
    /// IANA timezone name of the place, e.g. "Europe/Paris"
    pub timezone: String,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
    /// `None` when the provider returned no air quality data
    pub air_quality: Option<AirQuality>,
    pub alerts: Vec<WeatherAlert>,
}
