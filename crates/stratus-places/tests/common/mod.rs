//! Shared test doubles: a scriptable provider and a recording sink.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::Mutex;

use stratus_places::{PlaceId, PresentationSink, PresentationState};
use stratus_weather::{
    Coordinates, CurrentConditions, ProviderError, RefreshErrorKind, WeatherBundle,
    WeatherProvider,
};

/// Distinct coordinates per test place.
pub fn coords_for(index: usize) -> Coordinates {
    Coordinates {
        latitude: index as f64,
        longitude: -(index as f64) - 1.0,
    }
}

/// Minimal but complete weather payload.
pub fn bundle(observed_secs: i64, temperature: f64) -> WeatherBundle {
    let ts = |secs: i64| DateTime::from_timestamp(secs, 0).unwrap();
    WeatherBundle {
        timezone: "Europe/Paris".to_string(),
        current: CurrentConditions {
            condition_code: 800,
            description: "clear sky".to_string(),
            temperature,
            feels_like: temperature - 0.5,
            pressure: 1013,
            humidity: 55,
            wind_speed: 3.0,
            wind_gust: 4.5,
            wind_direction: Some(180),
            cloudiness: 10,
            visibility: 10_000,
            rain: 0.0,
            snow: 0.0,
            observed_at: ts(observed_secs),
            sunrise: ts(observed_secs - 3_600),
            sunset: ts(observed_secs + 3_600),
        },
        hourly: Vec::new(),
        daily: Vec::new(),
        air_quality: None,
        alerts: Vec::new(),
    }
}

pub fn status_err(status: u16) -> ProviderError {
    ProviderError::Status {
        status,
        body: String::new(),
    }
}

struct ScriptedFetch {
    delay: Duration,
    result: Result<WeatherBundle, ProviderError>,
}

/// Provider whose responses are scripted per place ahead of time.
#[derive(Default)]
pub struct ScriptedProvider {
    resolves: Mutex<HashMap<String, VecDeque<Result<Coordinates, ProviderError>>>>,
    fetches: Mutex<HashMap<String, VecDeque<ScriptedFetch>>>,
    fetch_count: AtomicUsize,
}

fn resolve_key(city: &str, country_code: &str) -> String {
    format!(
        "{},{}",
        city.trim().to_lowercase(),
        country_code.trim().to_ascii_uppercase()
    )
}

fn coord_key(coords: Coordinates) -> String {
    format!("{:.4},{:.4}", coords.latitude, coords.longitude)
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_resolve(&self, city: &str, country_code: &str, coords: Coordinates) {
        self.resolves
            .lock()
            .entry(resolve_key(city, country_code))
            .or_default()
            .push_back(Ok(coords));
    }

    pub fn script_resolve_err(&self, city: &str, country_code: &str, err: ProviderError) {
        self.resolves
            .lock()
            .entry(resolve_key(city, country_code))
            .or_default()
            .push_back(Err(err));
    }

    pub fn script_fetch(&self, coords: Coordinates, result: Result<WeatherBundle, ProviderError>) {
        self.script_fetch_delayed(coords, Duration::ZERO, result);
    }

    pub fn script_fetch_delayed(
        &self,
        coords: Coordinates,
        delay: Duration,
        result: Result<WeatherBundle, ProviderError>,
    ) {
        self.fetches
            .lock()
            .entry(coord_key(coords))
            .or_default()
            .push_back(ScriptedFetch { delay, result });
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn resolve_coordinates(
        &self,
        city: &str,
        country_code: &str,
        _deadline: Duration,
    ) -> Result<Coordinates, ProviderError> {
        self.resolves
            .lock()
            .get_mut(&resolve_key(city, country_code))
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(ProviderError::NoMatch))
    }

    async fn fetch_bundle(
        &self,
        coords: Coordinates,
        _deadline: Duration,
    ) -> Result<WeatherBundle, ProviderError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .fetches
            .lock()
            .get_mut(&coord_key(coords))
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(fetch) => {
                if !fetch.delay.is_zero() {
                    tokio::time::sleep(fetch.delay).await;
                }
                fetch.result
            }
            None => panic!("no scripted fetch for {}", coord_key(coords)),
        }
    }
}

/// Everything a sink can observe, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Inserted(usize, PlaceId),
    Removed(usize, PlaceId),
    Moved(usize, usize, PlaceId),
    Updated(PlaceId),
    RefreshFailed(PlaceId, RefreshErrorKind),
    Presentation(PlaceId, PresentationState),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, id: &PlaceId) -> Vec<SinkEvent> {
        self.events()
            .into_iter()
            .filter(|event| match event {
                SinkEvent::Inserted(_, e)
                | SinkEvent::Removed(_, e)
                | SinkEvent::Moved(_, _, e)
                | SinkEvent::Updated(e)
                | SinkEvent::RefreshFailed(e, _)
                | SinkEvent::Presentation(e, _) => e == id,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn place_inserted(&self, index: usize, id: &PlaceId) {
        self.events.lock().push(SinkEvent::Inserted(index, id.clone()));
    }

    fn place_removed(&self, index: usize, id: &PlaceId) {
        self.events.lock().push(SinkEvent::Removed(index, id.clone()));
    }

    fn place_moved(&self, from: usize, to: usize, id: &PlaceId) {
        self.events.lock().push(SinkEvent::Moved(from, to, id.clone()));
    }

    fn place_updated(&self, id: &PlaceId) {
        self.events.lock().push(SinkEvent::Updated(id.clone()));
    }

    fn place_refresh_failed(&self, id: &PlaceId, kind: RefreshErrorKind) {
        self.events.lock().push(SinkEvent::RefreshFailed(id.clone(), kind));
    }

    fn presentation_changed(&self, id: &PlaceId, state: PresentationState) {
        self.events.lock().push(SinkEvent::Presentation(id.clone(), state));
    }
}
