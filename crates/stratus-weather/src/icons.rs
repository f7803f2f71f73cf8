//! Condition-code to icon key resolution.
//!
//! The code groups below mirror the OpenWeatherMap condition code space and
//! are a de-facto contract with the provider; the boundary codes must not
//! drift. Codes whose icon depends on light level consult the day/night
//! flag, the rest do not.

/// Symbolic icon identifier. `as_str()` yields the asset key a view layer
/// can resolve to an actual drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKey {
    Thunderstorm,
    Storm,
    RainAndSun,
    RainyNight,
    Rain,
    HeavyRain,
    Snow,
    SnowAndNight,
    Sleet,
    Fog,
    FogAndNight,
    Sun,
    MoonPhase,
    CloudsAndSun,
    CloudyNight,
    Cloudy,
}

impl IconKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "thunderstorm_flat",
            Self::Storm => "storm_flat",
            Self::RainAndSun => "rain_and_sun_flat",
            Self::RainyNight => "rainy_night_flat",
            Self::Rain => "rain_flat",
            Self::HeavyRain => "heavy_rain_flat",
            Self::Snow => "snow_flat",
            Self::SnowAndNight => "snow_and_night_flat",
            Self::Sleet => "sleet_flat",
            Self::Fog => "fog_flat",
            Self::FogAndNight => "fog_and_night_flat",
            Self::Sun => "sun_flat",
            Self::MoonPhase => "moon_phase_flat",
            Self::CloudsAndSun => "clouds_and_sun_flat",
            Self::CloudyNight => "cloudy_night_flat",
            Self::Cloudy => "cloudy_flat",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum IconFamily {
    Thunderstorm,
    Storm,
    LightRain,
    Rain,
    HeavyRain,
    LightSnow,
    HeavySnow,
    Sleet,
    Atmosphere,
    ClearSky,
    FewClouds,
    Overcast,
}

impl IconFamily {
    fn icon(self, daytime: bool) -> IconKey {
        match self {
            Self::Thunderstorm => IconKey::Thunderstorm,
            Self::Storm => IconKey::Storm,
            Self::LightRain => {
                if daytime {
                    IconKey::RainAndSun
                } else {
                    IconKey::RainyNight
                }
            }
            Self::Rain => IconKey::Rain,
            Self::HeavyRain => IconKey::HeavyRain,
            Self::LightSnow => {
                if daytime {
                    IconKey::Snow
                } else {
                    IconKey::SnowAndNight
                }
            }
            Self::HeavySnow => IconKey::Snow,
            Self::Sleet => IconKey::Sleet,
            Self::Atmosphere => {
                if daytime {
                    IconKey::Fog
                } else {
                    IconKey::FogAndNight
                }
            }
            Self::ClearSky => {
                if daytime {
                    IconKey::Sun
                } else {
                    IconKey::MoonPhase
                }
            }
            Self::FewClouds => {
                if daytime {
                    IconKey::CloudsAndSun
                } else {
                    IconKey::CloudyNight
                }
            }
            Self::Overcast => IconKey::Cloudy,
        }
    }
}

/// Condition code groups, one entry per icon family.
const ICON_FAMILIES: &[(&[i32], IconFamily)] = &[
    // Thunderstorm group
    (&[210, 211, 212, 221], IconFamily::Thunderstorm),
    (&[200, 201, 202, 230, 231, 232], IconFamily::Storm),
    // Drizzle and rain, light
    (&[300, 310, 500, 501, 520], IconFamily::LightRain),
    // Drizzle and rain, moderate
    (&[301, 302, 311, 313, 321, 511, 521, 531], IconFamily::Rain),
    // Drizzle and rain, heavy
    (&[312, 314, 502, 503, 504, 522], IconFamily::HeavyRain),
    // Snow
    (&[600, 601, 620, 621], IconFamily::LightSnow),
    (&[602, 622], IconFamily::HeavySnow),
    (&[611, 612, 613, 615, 616], IconFamily::Sleet),
    // Atmosphere
    (
        &[701, 711, 721, 731, 741, 751, 761, 762, 771, 781],
        IconFamily::Atmosphere,
    ),
    // Sky
    (&[800], IconFamily::ClearSky),
    (&[801, 802, 803], IconFamily::FewClouds),
    (&[804], IconFamily::Overcast),
];

/// Resolve a condition code to an icon key.
///
/// Total: unrecognized codes fall back to the storm icon, never an error.
/// An observation at the exact sunrise instant counts as day, at the exact
/// sunset instant as night.
pub fn resolve(condition_code: i32, observed_at: i64, sunrise: i64, sunset: i64) -> IconKey {
    let daytime = observed_at >= sunrise && observed_at < sunset;

    ICON_FAMILIES
        .iter()
        .find(|(codes, _)| codes.contains(&condition_code))
        .map(|(_, family)| family.icon(daytime))
        .unwrap_or(IconKey::Storm)
}
