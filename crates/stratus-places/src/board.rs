//! The per-session coordination context.
//!
//! One `PlaceBoard` owns the store, the presentation map, and the refresh
//! orchestrator for one app session; nothing here is process-global. User
//! operations run synchronously against the store; refreshes rendezvous
//! back through the same store mutex.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use stratus_core::Config;
use stratus_weather::{RefreshErrorKind, RefreshOutcome, WeatherProvider};

use crate::orchestrator::{BatchReport, RefreshOrchestrator, RefreshReport};
use crate::persistence::PersistenceGateway;
use crate::place::{Place, PlaceId};
use crate::presentation::{PresentationState, PresentationStateMap};
use crate::sink::PresentationSink;
use crate::store::{PlaceStore, StoreError};

/// Failure modes of the add-place flow.
#[derive(Debug, Error)]
pub enum AddPlaceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Coordinate resolution or the initial fetch failed.
    #[error("could not add place: {kind:?}")]
    Lookup {
        kind: RefreshErrorKind,
        status: Option<u16>,
    },
}

impl AddPlaceError {
    /// User-friendly message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AddPlaceError::Store(e) => e.user_message(),
            AddPlaceError::Lookup { kind, .. } => kind.user_message(),
        }
    }

    fn from_outcome(outcome: &RefreshOutcome) -> Self {
        let (kind, status) = outcome
            .failure()
            .unwrap_or((RefreshErrorKind::Unknown, None));
        AddPlaceError::Lookup { kind, status }
    }
}

/// Session-scoped owner of the place list and its presentation state.
pub struct PlaceBoard {
    store: Arc<Mutex<PlaceStore>>,
    presentation: Mutex<PresentationStateMap>,
    provider: Arc<dyn WeatherProvider>,
    gateway: Arc<dyn PersistenceGateway>,
    sink: Arc<dyn PresentationSink>,
    orchestrator: RefreshOrchestrator,
    deadline: Duration,
}

impl PlaceBoard {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        gateway: Arc<dyn PersistenceGateway>,
        sink: Arc<dyn PresentationSink>,
        deadline: Duration,
    ) -> Self {
        let store = Arc::new(Mutex::new(PlaceStore::new()));
        let orchestrator = RefreshOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&provider),
            Arc::clone(&gateway),
            Arc::clone(&sink),
            deadline,
        );

        Self {
            store,
            presentation: Mutex::new(PresentationStateMap::new()),
            provider,
            gateway,
            sink,
            orchestrator,
            deadline,
        }
    }

    /// Build a board using the configured request deadline.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn WeatherProvider>,
        gateway: Arc<dyn PersistenceGateway>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self::new(provider, gateway, sink, config.weather.request_timeout())
    }

    /// Populate the store from the gateway at session start. Returns the
    /// number of places loaded; storage trouble costs places, never the
    /// session.
    pub fn load(&self) -> usize {
        let places = match self.gateway.load_all() {
            Ok(places) => places,
            Err(e) => {
                tracing::warn!(error = %e, "could not load stored places");
                return 0;
            }
        };

        let mut loaded = 0;
        for place in places {
            let id = place.id().clone();
            let inserted = {
                let mut store = self.store.lock();
                let at = store.len();
                store.insert(place, at)
            };
            match inserted {
                Ok(index) => {
                    self.sink.place_inserted(index, &id);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(place = %id, error = %e, "skipping stored place");
                }
            }
        }

        tracing::info!(count = loaded, "loaded stored places");
        loaded
    }

    /// Add a place: duplicate fast-fail, then coordinate resolution and an
    /// initial fetch through the normal outcome taxonomy. On success the
    /// place lands at the tail of the list.
    pub async fn add_place(&self, city: &str, country_code: &str) -> Result<usize, AddPlaceError> {
        let id = PlaceId::new(city, country_code);
        if self.store.lock().contains(&id) {
            return Err(StoreError::AlreadyExists(id).into());
        }

        let coords = self
            .provider
            .resolve_coordinates(city, country_code, self.deadline)
            .await
            .map_err(|e| AddPlaceError::from_outcome(&RefreshOutcome::from_provider_error(e)))?;

        let bundle = self
            .provider
            .fetch_bundle(coords, self.deadline)
            .await
            .map_err(|e| AddPlaceError::from_outcome(&RefreshOutcome::from_provider_error(e)))?;

        let mut place = Place::new(city, country_code, coords);
        place.apply_bundle(bundle);

        let index = {
            let mut store = self.store.lock();
            let at = store.len();
            store.insert(place.clone(), at)?
        };

        if let Err(e) = self.gateway.save_one(&place) {
            tracing::warn!(place = %id, error = %e, "failed to persist new place");
        }
        self.sink.place_inserted(index, &id);
        tracing::info!(place = %id, index, "place added");

        Ok(index)
    }

    /// Remove the place at `index`. Its in-flight refresh, if any, becomes
    /// an orphan and its result is discarded.
    pub fn remove_place_at(&self, index: usize) -> Result<Place, StoreError> {
        let place = self.store.lock().remove_by_index(index)?;
        self.finish_removal(index, &place);
        Ok(place)
    }

    /// Remove the place with the given identity.
    pub fn remove_place(&self, id: &PlaceId) -> Result<Place, StoreError> {
        let (index, place) = self.store.lock().remove_by_identity(id)?;
        self.finish_removal(index, &place);
        Ok(place)
    }

    fn finish_removal(&self, index: usize, place: &Place) {
        self.presentation.lock().on_removed(place.id());
        if let Err(e) = self.gateway.delete_one(place.id()) {
            tracing::warn!(place = %place.id(), error = %e, "failed to delete stored place");
        }
        self.sink.place_removed(index, place.id());
        tracing::info!(place = %place.id(), index, "place removed");
    }

    /// Move a place between positions; remove-then-reinsert semantics, see
    /// [`PlaceStore::move_entry`].
    pub fn move_place(&self, from: usize, to: usize) -> Result<(), StoreError> {
        let (id, order) = {
            let mut store = self.store.lock();
            let id = store
                .get(from)
                .map(|p| p.id().clone())
                .ok_or(StoreError::NotFound)?;
            store.move_entry(from, to)?;
            (id, store.ids())
        };

        if let Err(e) = self.gateway.save_order(&order) {
            tracing::warn!(error = %e, "failed to persist place order");
        }
        self.sink.place_moved(from, to, &id);
        Ok(())
    }

    pub fn toggle_main(&self, id: &PlaceId) -> PresentationState {
        let state = self.presentation.lock().toggle_main(id);
        self.sink.presentation_changed(id, state);
        state
    }

    pub fn toggle_hourly(&self, id: &PlaceId) -> PresentationState {
        let state = self.presentation.lock().toggle_hourly(id);
        self.sink.presentation_changed(id, state);
        state
    }

    pub fn toggle_daily(&self, id: &PlaceId) -> PresentationState {
        let state = self.presentation.lock().toggle_daily(id);
        self.sink.presentation_changed(id, state);
        state
    }

    /// Point-in-time snapshot of the place list.
    pub fn places(&self) -> Vec<Place> {
        self.store.lock().all()
    }

    pub fn presentation_of(&self, id: &PlaceId) -> PresentationState {
        self.presentation.lock().get(id)
    }

    pub fn position_of(&self, id: &PlaceId) -> Result<usize, StoreError> {
        self.store.lock().position_of(id)
    }

    pub async fn refresh_one(&self, id: &PlaceId) -> RefreshReport {
        self.orchestrator.refresh_one(id).await
    }

    pub async fn refresh_all(&self) -> BatchReport {
        self.orchestrator.refresh_all().await
    }
}
