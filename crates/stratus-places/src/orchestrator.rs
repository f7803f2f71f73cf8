//! Refresh orchestration.
//!
//! Issues refresh requests for one or many places, coalesces duplicates so
//! at most one request per identity is in flight, and applies classified
//! outcomes back onto the store. A failure on one place never touches a
//! sibling entry; a completion for a removed place is discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use stratus_weather::{RefreshErrorKind, RefreshOutcome, WeatherProvider};

use crate::persistence::PersistenceGateway;
use crate::place::PlaceId;
use crate::sink::PresentationSink;
use crate::store::PlaceStore;

/// How a single refresh request was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDisposition {
    /// Fresh data was applied to the place.
    Updated,
    /// The attempt failed; the failure was recorded on the place.
    Failed(RefreshErrorKind),
    /// The place was removed while the request was in flight; the result
    /// was discarded.
    Orphaned,
    /// A refresh for this identity was already in flight; no second request
    /// was issued.
    Coalesced,
    /// The identity is not tracked; nothing to refresh.
    UnknownPlace,
}

/// Report for one `refresh_one` call.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub id: PlaceId,
    pub disposition: RefreshDisposition,
}

/// Report for one `refresh_all` batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One report per refresh actually issued, in issue order.
    pub reports: Vec<RefreshReport>,
    /// Identities abandoned after an unauthorized outcome.
    pub abandoned: Vec<PlaceId>,
    /// True when the batch stopped early because the API key was rejected.
    pub halted_unauthorized: bool,
}

enum FlightRole {
    Leader(watch::Sender<bool>),
    Follower(watch::Receiver<bool>),
}

/// Clears the in-flight entry even when the leading refresh future is
/// dropped mid-flight; dropping the watch sender then wakes any followers.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<PlaceId, watch::Receiver<bool>>>,
    id: PlaceId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.id);
    }
}

/// Issues refreshes and applies their outcomes onto the store.
pub struct RefreshOrchestrator {
    store: Arc<Mutex<PlaceStore>>,
    provider: Arc<dyn WeatherProvider>,
    gateway: Arc<dyn PersistenceGateway>,
    sink: Arc<dyn PresentationSink>,
    deadline: Duration,
    in_flight: Mutex<HashMap<PlaceId, watch::Receiver<bool>>>,
}

impl RefreshOrchestrator {
    pub fn new(
        store: Arc<Mutex<PlaceStore>>,
        provider: Arc<dyn WeatherProvider>,
        gateway: Arc<dyn PersistenceGateway>,
        sink: Arc<dyn PresentationSink>,
        deadline: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            gateway,
            sink,
            deadline,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Refresh one place. A call for an identity already in flight attaches
    /// to the pending operation instead of issuing a second request.
    pub async fn refresh_one(&self, id: &PlaceId) -> RefreshReport {
        let role = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(id) {
                Some(rx) => FlightRole::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(false);
                    in_flight.insert(id.clone(), rx);
                    FlightRole::Leader(tx)
                }
            }
        };

        match role {
            FlightRole::Follower(mut rx) => {
                // Ride out the existing flight; its leader applies the
                // outcome for both of us.
                while !*rx.borrow_and_update() {
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
                RefreshReport {
                    id: id.clone(),
                    disposition: RefreshDisposition::Coalesced,
                }
            }
            FlightRole::Leader(tx) => {
                let guard = InFlightGuard {
                    in_flight: &self.in_flight,
                    id: id.clone(),
                };
                let disposition = self.run_refresh(id).await;
                drop(guard);
                let _ = tx.send(true);
                RefreshReport {
                    id: id.clone(),
                    disposition,
                }
            }
        }
    }

    /// Refresh every place currently in the store, in store order. Each
    /// place is independent, except that an unauthorized outcome abandons
    /// the identities not yet started (a bad key will not validate again);
    /// flights already in progress are left to finish.
    pub async fn refresh_all(&self) -> BatchReport {
        let ids = self.store.lock().ids();
        let mut report = BatchReport::default();

        for (issued, id) in ids.iter().enumerate() {
            let one = self.refresh_one(id).await;
            let unauthorized = matches!(
                one.disposition,
                RefreshDisposition::Failed(RefreshErrorKind::Unauthorized)
            );
            report.reports.push(one);

            if unauthorized {
                report.abandoned = ids[issued + 1..].to_vec();
                report.halted_unauthorized = true;
                tracing::warn!(
                    abandoned = report.abandoned.len(),
                    "refresh batch halted: API key rejected"
                );
                break;
            }
        }

        report
    }

    async fn run_refresh(&self, id: &PlaceId) -> RefreshDisposition {
        let coords = {
            let store = self.store.lock();
            match store.get_by_identity(id) {
                Some(place) => place.coordinates,
                None => return RefreshDisposition::UnknownPlace,
            }
        };

        tracing::debug!(place = %id, "refreshing");
        let result = self.provider.fetch_bundle(coords, self.deadline).await;
        let outcome = RefreshOutcome::classify(result);
        self.apply_outcome(id, outcome)
    }

    /// Apply a classified outcome under the store lock. The lock is held
    /// only for the in-memory update; persistence and sink notification run
    /// on the cloned snapshot afterwards.
    fn apply_outcome(&self, id: &PlaceId, outcome: RefreshOutcome) -> RefreshDisposition {
        let snapshot = {
            let mut store = self.store.lock();
            let Some(place) = store.get_mut_by_identity(id) else {
                tracing::debug!(place = %id, "refresh completed for a removed place; discarding");
                return RefreshDisposition::Orphaned;
            };
            match outcome {
                RefreshOutcome::Success(bundle) => place.apply_bundle(bundle),
                failure => {
                    if let Some((kind, status)) = failure.failure() {
                        tracing::debug!(place = %id, kind = ?kind, status, "refresh failed");
                        place.record_failure(kind, status);
                    }
                }
            }
            place.clone()
        };

        match snapshot.last_error {
            None => {
                if let Err(e) = self.gateway.save_one(&snapshot) {
                    tracing::warn!(place = %id, error = %e, "failed to persist refreshed place");
                }
                self.sink.place_updated(id);
                RefreshDisposition::Updated
            }
            Some(err) => {
                self.sink.place_refresh_failed(id, err.kind);
                RefreshDisposition::Failed(err.kind)
            }
        }
    }
}
