//! In-memory providers for exercising the pipeline without a network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use roadtrip_core::retry::RetryPolicy;
use roadtrip_core::{
    Coordinate, DirectionsProvider, GeocodingProvider, PipelineOptions, PlaceLookupProvider,
    ProviderError, Providers, Route, RouteGeometry, RoutePlan, RoutePlanPipeline, RenderSink,
    Weather, WeatherProvider,
};
use tokio::sync::Notify;

pub fn point(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).expect("valid coordinate")
}

pub fn delhi() -> Coordinate {
    point(28.61, 77.20)
}

pub fn mumbai() -> Coordinate {
    point(19.07, 72.88)
}

/// `points` coordinates evenly spaced on the straight line `from` to `to`,
/// both ends included.
pub fn straight_line(from: Coordinate, to: Coordinate, points: usize) -> RouteGeometry {
    let last = points.saturating_sub(1).max(1) as f64;
    (0..points)
        .map(|i| {
            let t = i as f64 / last;
            point(
                from.lat + (to.lat - from.lat) * t,
                from.lon + (to.lon - from.lon) * t,
            )
        })
        .collect::<Vec<_>>()
        .into()
}

fn unavailable(service: &'static str) -> ProviderError {
    ProviderError::Status {
        service,
        status: 503,
        body: "service unavailable".into(),
    }
}

/// Geocoder answering from a fixed table of names.
#[derive(Debug, Default)]
pub struct FakeGeocoder {
    known: HashMap<String, Coordinate>,
    transient_failures: AtomicU32,
    calls: AtomicU32,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, coordinate: Coordinate) -> Self {
        self.known.insert(name.to_string(), coordinate);
        self
    }

    /// Fail the next `count` calls with HTTP 503.
    pub fn failing_first(self, count: u32) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Hold every lookup of `name` until the returned handle is notified.
    pub fn gate(&self, name: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gate lock")
            .insert(name.to_string(), notify.clone());
        notify
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingProvider for FakeGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<Coordinate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().expect("gate lock").get(query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(unavailable("geocoding"));
        }

        Ok(self.known.get(query).copied().into_iter().collect())
    }
}

/// Directions that always answer with the same route list.
#[derive(Debug, Default)]
pub struct FakeDirections {
    routes: Vec<Route>,
}

impl FakeDirections {
    pub fn with_route(geometry: RouteGeometry, duration_seconds: f64) -> Self {
        Self {
            routes: vec![Route {
                geometry,
                duration_seconds,
            }],
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectionsProvider for FakeDirections {
    async fn directions(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Result<Vec<Route>, ProviderError> {
        Ok(self.routes.clone())
    }
}

/// Names every place after its rounded coordinate.
#[derive(Debug, Default)]
pub struct FakePlaces;

pub fn place_name(coordinate: Coordinate) -> String {
    format!("Town near {coordinate}")
}

#[async_trait]
impl PlaceLookupProvider for FakePlaces {
    async fn reverse_place(&self, coordinate: Coordinate) -> Result<Vec<String>, ProviderError> {
        Ok(vec![place_name(coordinate)])
    }
}

/// Mild weather everywhere except at `broken`.
#[derive(Debug, Default)]
pub struct FakeWeather {
    broken: Option<Coordinate>,
}

impl FakeWeather {
    pub fn failing_at(coordinate: Coordinate) -> Self {
        Self {
            broken: Some(coordinate),
        }
    }
}

pub fn mild() -> Weather {
    Weather {
        temperature_c: 21.0,
        condition: "few clouds".into(),
        icon_url: "https://openweathermap.org/img/wn/02d@2x.png".into(),
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current_weather(&self, coordinate: Coordinate) -> Result<Weather, ProviderError> {
        if self.broken == Some(coordinate) {
            return Err(unavailable("weather"));
        }
        Ok(mild())
    }
}

pub fn options(sample_count: usize, max_retries: u32) -> PipelineOptions {
    PipelineOptions {
        sample_count,
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(max_retries, Duration::ZERO, Duration::ZERO),
        max_concurrent_lookups: 4,
    }
}

pub fn pipeline(
    geocoder: Arc<FakeGeocoder>,
    directions: FakeDirections,
    weather: FakeWeather,
    options: PipelineOptions,
) -> RoutePlanPipeline {
    RoutePlanPipeline::new(
        Providers {
            geocoder,
            places: Arc::new(FakePlaces),
            directions: Arc::new(directions),
            weather: Some(Arc::new(weather)),
        },
        options,
    )
}

/// Sink that remembers everything it was asked to draw.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub rendered: Vec<RoutePlan>,
}

impl RenderSink for RecordingSink {
    fn render(&mut self, plan: &RoutePlan) {
        self.rendered.push(plan.clone());
    }
}
