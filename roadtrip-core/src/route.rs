use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::PlanError;
use crate::model::{Coordinate, Route};
use crate::provider::DirectionsProvider;
use crate::retry::{self, RetryPolicy};

/// Fetches the best driving route between two coordinates.
#[derive(Debug, Clone)]
pub struct RouteProvider {
    provider: Arc<dyn DirectionsProvider>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl RouteProvider {
    pub fn new(provider: Arc<dyn DirectionsProvider>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            provider,
            retry,
            timeout,
        }
    }

    pub async fn get_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Route, PlanError> {
        let provider = &self.provider;
        let timeout = self.timeout;
        let routes = self
            .retry
            .run("directions", move || {
                retry::with_timeout("directions", timeout, provider.directions(origin, destination))
            })
            .await?;

        match routes.into_iter().next() {
            Some(route) if !route.geometry.is_empty() => {
                debug!(
                    points = route.geometry.len(),
                    duration_seconds = route.duration_seconds,
                    "route found"
                );
                Ok(route)
            }
            _ => Err(PlanError::NoRouteFound {
                origin,
                destination,
            }),
        }
    }
}
