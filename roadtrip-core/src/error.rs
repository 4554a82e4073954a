//! Error types for the route planner.
//!
//! [`ProviderError`] describes one failed outbound call; [`PlanError`] is what
//! the pipeline surfaces to its caller when a plan cannot be produced.

use thiserror::Error;

use crate::model::Coordinate;

/// Failure of a single call to an external collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("{service} request timed out after {timeout_ms} ms")]
    Timeout { service: &'static str, timeout_ms: u64 },

    #[error("{service} transport error: {message}")]
    Transport { service: &'static str, message: String },

    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unreadable response: {message}")]
    Decode { service: &'static str, message: String },

    /// The provider answered, but with a service-level error code.
    #[error("{service} reported {code}: {message}")]
    Service {
        service: &'static str,
        code: String,
        message: String,
    },
}

impl ProviderError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::Service { .. } => false,
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Timeout { service, .. }
            | Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Decode { service, .. }
            | Self::Service { service, .. } => service,
        }
    }

    pub(crate) fn decode(service: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            service,
            message: message.into(),
        }
    }
}

/// A coordinate outside the valid latitude/longitude ranges.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("coordinate out of range: lat={lat}, lon={lon}")]
pub struct CoordinateRangeError {
    pub lat: f64,
    pub lon: f64,
}

/// Fatal failure of a plan request. No partial plan accompanies any variant.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    #[error("No route found between {origin} and {destination}")]
    NoRouteFound {
        origin: Coordinate,
        destination: Coordinate,
    },

    #[error("Network error: {source}")]
    Network {
        #[from]
        source: ProviderError,
    },
}

impl PlanError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Single message suitable for showing to the person who asked for the plan.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlanError::Validation { message } => format!("Please check your input: {message}."),
            PlanError::LocationNotFound { query } => {
                format!("Could not find a location matching '{query}'.")
            }
            PlanError::NoRouteFound { .. } => {
                "No driving route exists between these locations.".to_string()
            }
            PlanError::Network { .. } => {
                "Unable to reach the map services. Please check your connection and try again."
                    .to_string()
            }
        }
    }
}
