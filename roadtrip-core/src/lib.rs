//! Core library for the `roadtrip` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstractions over geocoding, directions, place lookup and weather providers
//! - The route planning pipeline and its latest-request-wins session
//! - Shared domain models (coordinates, routes, annotated plans)
//!
//! It is used by `roadtrip-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod eta;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod retry;
pub mod route;
pub mod sampling;
pub mod session;
pub mod weather;

pub use config::{Config, ProviderConfig};
pub use error::{PlanError, ProviderError};
pub use model::{AnnotatedWaypoint, Coordinate, LocationPoint, Route, RouteGeometry, RoutePlan, Weather};
pub use pipeline::{PipelineOptions, RoutePlanPipeline};
pub use provider::{
    DirectionsProvider, GeocodingProvider, PlaceLookupProvider, ProviderId, Providers,
    WeatherProvider,
};
pub use session::{PlanOutcome, PlanSession, RenderSink, RequestId};
