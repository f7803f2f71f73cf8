//! Per-place expansion state, keyed by identity.
//!
//! Keyed by identity rather than position so a reorder or an insertion
//! elsewhere never perturbs an unrelated place's expansion state.

use std::collections::HashMap;

use crate::place::PlaceId;

/// Expansion level of one place entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationState {
    #[default]
    Collapsed,
    Expanded,
    ExpandedHourly,
    ExpandedDaily,
    ExpandedFull,
}

impl PresentationState {
    pub fn is_expanded(self) -> bool {
        !matches!(self, Self::Collapsed)
    }

    /// Main tap: collapse any expanded variant, otherwise expand.
    pub fn after_toggle_main(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            _ => Self::Collapsed,
        }
    }

    /// Hourly-section tap. From Collapsed this promotes straight to the
    /// hourly-expanded view.
    pub fn after_toggle_hourly(self) -> Self {
        match self {
            Self::Collapsed => Self::ExpandedHourly,
            Self::Expanded => Self::ExpandedHourly,
            Self::ExpandedHourly => Self::Expanded,
            Self::ExpandedDaily => Self::ExpandedFull,
            Self::ExpandedFull => Self::ExpandedDaily,
        }
    }

    /// Daily-section tap. From Collapsed this promotes straight to the
    /// daily-expanded view.
    pub fn after_toggle_daily(self) -> Self {
        match self {
            Self::Collapsed => Self::ExpandedDaily,
            Self::Expanded => Self::ExpandedDaily,
            Self::ExpandedDaily => Self::Expanded,
            Self::ExpandedHourly => Self::ExpandedFull,
            Self::ExpandedFull => Self::ExpandedHourly,
        }
    }
}

/// Identity-keyed expansion states. An entry for a removed place is
/// garbage; looking up an unknown identity yields the collapsed default.
#[derive(Debug, Default)]
pub struct PresentationStateMap {
    states: HashMap<PlaceId, PresentationState>,
}

impl PresentationStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PlaceId) -> PresentationState {
        self.states.get(id).copied().unwrap_or_default()
    }

    pub fn toggle_main(&mut self, id: &PlaceId) -> PresentationState {
        self.apply(id, PresentationState::after_toggle_main)
    }

    pub fn toggle_hourly(&mut self, id: &PlaceId) -> PresentationState {
        self.apply(id, PresentationState::after_toggle_hourly)
    }

    pub fn toggle_daily(&mut self, id: &PlaceId) -> PresentationState {
        self.apply(id, PresentationState::after_toggle_daily)
    }

    /// Drop the entry for a removed place. Idempotent.
    pub fn on_removed(&mut self, id: &PlaceId) {
        self.states.remove(id);
    }

    fn apply(
        &mut self,
        id: &PlaceId,
        transition: fn(PresentationState) -> PresentationState,
    ) -> PresentationState {
        let next = transition(self.get(id));
        self.states.insert(id.clone(), next);
        next
    }
}
