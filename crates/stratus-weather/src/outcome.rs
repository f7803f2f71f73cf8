//! Refresh outcome classification.
//!
//! Every transport result of a provider request resolves to exactly one
//! `RefreshOutcome` variant; there is no silently-swallowed case. The
//! classification is pure and never touches the place store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::WeatherBundle;

/// Raw failure of one provider request, before classification.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure: offline, connection refused, deadline
    /// expiry. Carries the underlying client error.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed payload: {0}")]
    Decode(String),

    /// A lookup produced no candidates (geocoding an unknown place).
    #[error("no matching place")]
    NoMatch,
}

/// Storable kind of a failed refresh, recorded on the affected place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshErrorKind {
    NotFound,
    RateLimited,
    Unauthorized,
    Unreachable,
    ServerError,
    Unknown,
}

impl RefreshErrorKind {
    /// User-friendly message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound => "Place not found. Check the city and country.",
            Self::RateLimited => "Too many requests. Please wait and try again.",
            Self::Unauthorized => "The weather API key was rejected. Check your settings.",
            Self::Unreachable => "Server unreachable. Check your connection.",
            Self::ServerError => "The weather service is experiencing issues. Try again later.",
            Self::Unknown => "An unknown error occurred. Please try again.",
        }
    }
}

/// Result of one refresh attempt for one place. Consumed immediately by the
/// orchestrator and discarded.
#[derive(Debug)]
pub enum RefreshOutcome {
    Success(WeatherBundle),
    NotFound,
    RateLimited,
    Unauthorized,
    Unreachable,
    ServerError(u16),
    Unknown(String),
}

impl RefreshOutcome {
    /// Classify a raw provider result. Total: every transport result maps
    /// to exactly one variant.
    pub fn classify(result: Result<WeatherBundle, ProviderError>) -> Self {
        match result {
            Ok(bundle) => Self::Success(bundle),
            Err(err) => Self::from_provider_error(err),
        }
    }

    /// Classify the error half alone (used by flows that never produce a
    /// bundle, e.g. coordinate resolution).
    pub fn from_provider_error(err: ProviderError) -> Self {
        match err {
            ProviderError::Http(e) => {
                if let Some(status) = e.status() {
                    Self::from_status(status.as_u16(), e.to_string())
                } else if e.is_decode() || e.is_body() {
                    Self::Unknown(e.to_string())
                } else {
                    // No usable response: offline, refused, DNS, deadline
                    Self::Unreachable
                }
            }
            ProviderError::Status { status, body } => Self::from_status(status, body),
            ProviderError::Decode(cause) => Self::Unknown(cause),
            ProviderError::NoMatch => Self::NotFound,
        }
    }

    fn from_status(status: u16, detail: String) -> Self {
        match status {
            404 => Self::NotFound,
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError(status),
            _ => Self::Unknown(format!("unexpected status {}: {}", status, detail)),
        }
    }

    /// Error kind and HTTP status for every non-success variant.
    pub fn failure(&self) -> Option<(RefreshErrorKind, Option<u16>)> {
        match self {
            Self::Success(_) => None,
            Self::NotFound => Some((RefreshErrorKind::NotFound, Some(404))),
            Self::RateLimited => Some((RefreshErrorKind::RateLimited, Some(429))),
            Self::Unauthorized => Some((RefreshErrorKind::Unauthorized, Some(401))),
            Self::Unreachable => Some((RefreshErrorKind::Unreachable, None)),
            Self::ServerError(code) => Some((RefreshErrorKind::ServerError, Some(*code))),
            Self::Unknown(_) => Some((RefreshErrorKind::Unknown, None)),
        }
    }
}
