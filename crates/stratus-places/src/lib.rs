//! Place tracking core for Stratus
//!
//! Owns the ordered, identity-stable collection of tracked places, the
//! per-place presentation state, the refresh orchestration with its closed
//! failure taxonomy, and the persistence seam.

pub mod board;
pub mod orchestrator;
pub mod persistence;
pub mod place;
pub mod presentation;
pub mod sink;
pub mod store;

pub use board::{AddPlaceError, PlaceBoard};
pub use orchestrator::{BatchReport, RefreshDisposition, RefreshOrchestrator, RefreshReport};
pub use persistence::{PersistenceGateway, SqlitePlaceGateway};
pub use place::{LastError, Place, PlaceId};
pub use presentation::{PresentationState, PresentationStateMap};
pub use sink::{NullSink, PresentationSink};
pub use store::{PlaceStore, StoreError};
