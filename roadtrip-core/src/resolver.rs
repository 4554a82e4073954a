//! Forward geocoding of user text and reverse place lookup for display names.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::PlanError;
use crate::model::Coordinate;
use crate::provider::{GeocodingProvider, PlaceLookupProvider};
use crate::retry::{self, RetryPolicy};

/// Display name used whenever a place lookup yields nothing usable.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Turns free text into a coordinate. Failures here abort a plan.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn GeocodingProvider>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            provider,
            retry,
            timeout,
        }
    }

    /// Resolve `text` to the provider's best candidate.
    ///
    /// Text of the form `"<lat>,<lon>"` is taken literally and never sent to
    /// the geocoder.
    pub async fn resolve(&self, text: &str) -> Result<Coordinate, PlanError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(PlanError::validation("location must not be empty"));
        }

        if let Some(coordinate) = Coordinate::parse(query) {
            debug!(query, %coordinate, "using literal coordinate");
            return Ok(coordinate);
        }

        let provider = &self.provider;
        let timeout = self.timeout;
        let candidates = self
            .retry
            .run("geocode", move || {
                retry::with_timeout("geocoding", timeout, provider.geocode(query))
            })
            .await?;

        match candidates.into_iter().next() {
            Some(coordinate) => {
                debug!(query, %coordinate, "location resolved");
                Ok(coordinate)
            }
            None => Err(PlanError::LocationNotFound {
                query: query.to_string(),
            }),
        }
    }
}

/// Names the place around a coordinate, falling back to [`UNKNOWN_LOCATION`].
///
/// At most `max_concurrent` lookups are in flight at once across all clones.
#[derive(Debug, Clone)]
pub struct PlaceNameResolver {
    provider: Arc<dyn PlaceLookupProvider>,
    timeout: Duration,
    rate_limiter: Arc<Semaphore>,
}

impl PlaceNameResolver {
    pub fn new(
        provider: Arc<dyn PlaceLookupProvider>,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            provider,
            timeout,
            rate_limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn resolve(&self, coordinate: Coordinate) -> String {
        let Ok(_permit) = self.rate_limiter.acquire().await else {
            warn!(%coordinate, "place lookup limiter closed");
            return UNKNOWN_LOCATION.to_string();
        };

        let lookup = retry::with_timeout(
            "place lookup",
            self.timeout,
            self.provider.reverse_place(coordinate),
        )
        .await;

        match lookup {
            Ok(names) => match names.into_iter().map(|name| name.trim().to_string()).next() {
                Some(name) if !name.is_empty() => name,
                _ => {
                    debug!(%coordinate, "no place found");
                    UNKNOWN_LOCATION.to_string()
                }
            },
            Err(err) => {
                warn!(%coordinate, error = %err, "place lookup failed");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use futures::future::join_all;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingGeocoder {
        calls: AtomicU32,
        answer: Vec<Coordinate>,
    }

    #[async_trait]
    impl GeocodingProvider for CountingGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Vec<Coordinate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    #[derive(Debug)]
    enum Places {
        Named(Vec<String>),
        Failing,
        Hanging,
    }

    #[async_trait]
    impl PlaceLookupProvider for Places {
        async fn reverse_place(&self, _coordinate: Coordinate) -> Result<Vec<String>, ProviderError> {
            match self {
                Places::Named(names) => Ok(names.clone()),
                Places::Failing => Err(ProviderError::Status {
                    service: "places",
                    status: 500,
                    body: String::new(),
                }),
                Places::Hanging => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(vec!["too late".into()])
                }
            }
        }
    }

    fn point(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    fn resolver(geocoder: Arc<CountingGeocoder>) -> LocationResolver {
        LocationResolver::new(geocoder, RetryPolicy::none(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn first_candidate_wins() {
        let geocoder = Arc::new(CountingGeocoder {
            answer: vec![point(48.85, 2.35), point(33.66, -95.55)],
            ..Default::default()
        });
        let found = resolver(geocoder).resolve("  Paris ").await.expect("resolved");
        assert_eq!(found, point(48.85, 2.35));
    }

    #[tokio::test]
    async fn no_candidates_is_location_not_found() {
        let geocoder = Arc::new(CountingGeocoder::default());
        let err = resolver(geocoder).resolve("Atlantis").await.unwrap_err();
        assert!(matches!(err, PlanError::LocationNotFound { query } if query == "Atlantis"));
    }

    #[tokio::test]
    async fn literal_coordinates_skip_the_geocoder() {
        let geocoder = Arc::new(CountingGeocoder::default());
        let found = resolver(geocoder.clone())
            .resolve("28.61, 77.20")
            .await
            .expect("resolved");
        assert_eq!(found, point(28.61, 77.20));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn blank_text_is_rejected(#[case] text: &str) {
        let geocoder = Arc::new(CountingGeocoder::default());
        let err = resolver(geocoder.clone()).resolve(text).await.unwrap_err();
        assert!(matches!(err, PlanError::Validation { .. }));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[case(Places::Named(vec!["Jaipur, Rajasthan, India".into()]), "Jaipur, Rajasthan, India")]
    #[case(Places::Named(vec![]), UNKNOWN_LOCATION)]
    #[case(Places::Named(vec!["  ".into()]), UNKNOWN_LOCATION)]
    #[case(Places::Failing, UNKNOWN_LOCATION)]
    #[tokio::test]
    async fn place_names_fall_back(#[case] places: Places, #[case] expected: &str) {
        let resolver = PlaceNameResolver::new(Arc::new(places), Duration::from_secs(1), 4);
        assert_eq!(resolver.resolve(point(26.9, 75.8)).await, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_place_lookup_times_out_to_fallback() {
        let resolver =
            PlaceNameResolver::new(Arc::new(Places::Hanging), Duration::from_millis(100), 4);
        assert_eq!(resolver.resolve(point(26.9, 75.8)).await, UNKNOWN_LOCATION);
    }

    #[derive(Debug, Default)]
    struct SlowPlaces {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PlaceLookupProvider for SlowPlaces {
        async fn reverse_place(&self, _coordinate: Coordinate) -> Result<Vec<String>, ProviderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec!["Somewhere".into()])
        }
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[tokio::test(start_paused = true)]
    async fn lookups_in_flight_are_capped(#[case] limit: usize) {
        let places = Arc::new(SlowPlaces::default());
        let resolver = PlaceNameResolver::new(places.clone(), Duration::from_secs(1), limit);

        let names = join_all((0..8u32).map(|i| resolver.resolve(point(10.0 + f64::from(i), 20.0)))).await;

        assert_eq!(names.len(), 8);
        assert!(names.iter().all(|name| name == "Somewhere"));
        assert_eq!(places.peak.load(Ordering::SeqCst), limit);
    }
}
