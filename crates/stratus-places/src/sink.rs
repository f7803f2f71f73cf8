//! Change notifications for a view layer.

use stratus_weather::RefreshErrorKind;

use crate::place::PlaceId;
use crate::presentation::PresentationState;

/// Receives structural and per-identity state changes so a view layer can
/// re-render incrementally. The core makes no assumption about how these
/// are consumed; implementations must be cheap and non-blocking.
pub trait PresentationSink: Send + Sync {
    fn place_inserted(&self, index: usize, id: &PlaceId);

    fn place_removed(&self, index: usize, id: &PlaceId);

    fn place_moved(&self, from: usize, to: usize, id: &PlaceId);

    /// A refresh applied fresh data to the place.
    fn place_updated(&self, id: &PlaceId);

    /// A refresh failed; the failure was recorded on the place.
    fn place_refresh_failed(&self, id: &PlaceId, kind: RefreshErrorKind);

    fn presentation_changed(&self, id: &PlaceId, state: PresentationState);
}

/// Sink that drops every notification, for headless operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn place_inserted(&self, _index: usize, _id: &PlaceId) {}

    fn place_removed(&self, _index: usize, _id: &PlaceId) {}

    fn place_moved(&self, _from: usize, _to: usize, _id: &PlaceId) {}

    fn place_updated(&self, _id: &PlaceId) {}

    fn place_refresh_failed(&self, _id: &PlaceId, _kind: RefreshErrorKind) {}

    fn presentation_changed(&self, _id: &PlaceId, _state: PresentationState) {}
}
