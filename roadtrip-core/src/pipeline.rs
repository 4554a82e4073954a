//! Orchestration of one plan request: geocode, route, sample, enrich.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::PlanError;
use crate::eta::estimate_arrival;
use crate::model::{AnnotatedWaypoint, Coordinate, LocationPoint, RoutePlan, WaypointSample};
use crate::provider::{Providers, providers_from_config};
use crate::resolver::{LocationResolver, PlaceNameResolver};
use crate::retry::RetryPolicy;
use crate::route::RouteProvider;
use crate::sampling::{self, DEFAULT_SAMPLE_COUNT};
use crate::weather::WeatherEnricher;

/// Knobs shared by every component of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub sample_count: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Cap on concurrent reverse place lookups.
    pub max_concurrent_lookups: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            max_concurrent_lookups: 4,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sample_count: config.sample_count,
            timeout: config.timeout(),
            retry: RetryPolicy::default().with_max_retries(config.max_retries),
            max_concurrent_lookups: config.max_concurrent_lookups,
        }
    }
}

/// Builds a [`RoutePlan`] from two pieces of user text.
///
/// Holds no per-request state, so one pipeline can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct RoutePlanPipeline {
    locations: LocationResolver,
    routes: RouteProvider,
    places: PlaceNameResolver,
    weather: WeatherEnricher,
    sample_count: usize,
}

impl RoutePlanPipeline {
    pub fn new(providers: Providers, options: PipelineOptions) -> Self {
        Self {
            locations: LocationResolver::new(providers.geocoder, options.retry, options.timeout),
            routes: RouteProvider::new(providers.directions, options.retry, options.timeout),
            places: PlaceNameResolver::new(
                providers.places,
                options.timeout,
                options.max_concurrent_lookups,
            ),
            weather: WeatherEnricher::new(providers.weather, options.timeout),
            sample_count: options.sample_count,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let providers = providers_from_config(config)?;
        Ok(Self::new(providers, PipelineOptions::from_config(config)))
    }

    #[instrument(skip(self), fields(samples = self.sample_count))]
    pub async fn plan(
        &self,
        origin_text: &str,
        destination_text: &str,
        departure: DateTime<Utc>,
    ) -> Result<RoutePlan, PlanError> {
        let origin_text = origin_text.trim();
        let destination_text = destination_text.trim();
        if origin_text.is_empty() {
            return Err(PlanError::validation("origin must not be empty"));
        }
        if destination_text.is_empty() {
            return Err(PlanError::validation("destination must not be empty"));
        }

        let (origin, destination) = tokio::try_join!(
            self.locations.resolve(origin_text),
            self.locations.resolve(destination_text),
        )?;

        let route = self.routes.get_route(origin, destination).await?;
        let samples = sampling::sample(&route.geometry, self.sample_count);
        debug!(count = samples.len(), "waypoints sampled");

        let annotations = samples.iter().filter_map(|sample| {
            let coordinate = route.geometry.get(sample.sequence_index)?;
            Some(self.annotate(
                *sample,
                coordinate,
                departure,
                route.duration_seconds,
            ))
        });

        let (waypoints, origin_name, destination_name) = tokio::join!(
            join_all(annotations),
            self.places.resolve(origin),
            self.places.resolve(destination),
        );

        let plan = RoutePlan {
            origin: LocationPoint::new(origin_text, origin).with_place_name(origin_name),
            destination: LocationPoint::new(destination_text, destination)
                .with_place_name(destination_name),
            total_duration_seconds: route.duration_seconds,
            geometry: route.geometry,
            departure_time: departure,
            waypoints,
        };

        info!(
            origin = %plan.origin.coordinate,
            destination = %plan.destination.coordinate,
            duration_seconds = plan.total_duration_seconds,
            waypoints = plan.waypoints.len(),
            "route plan ready"
        );
        Ok(plan)
    }

    async fn annotate(
        &self,
        sample: WaypointSample,
        coordinate: Coordinate,
        departure: DateTime<Utc>,
        duration_seconds: f64,
    ) -> AnnotatedWaypoint {
        let (place_name, weather) = tokio::join!(
            self.places.resolve(coordinate),
            self.weather.fetch(coordinate),
        );

        AnnotatedWaypoint {
            sequence_index: sample.sequence_index,
            fraction_along_route: sample.fraction_along_route,
            coordinate,
            estimated_arrival: estimate_arrival(
                departure,
                duration_seconds,
                sample.fraction_along_route,
            ),
            place_name,
            weather,
        }
    }
}
