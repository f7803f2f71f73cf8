//! Weather domain for Stratus
//!
//! Domain types for cached weather snapshots, condition-code to icon
//! resolution, refresh-outcome classification, and the OpenWeatherMap-backed
//! provider.

pub mod icons;
pub mod outcome;
pub mod provider;
pub mod types;

pub use icons::IconKey;
pub use outcome::{ProviderError, RefreshErrorKind, RefreshOutcome};
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use types::*;
