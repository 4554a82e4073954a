//! OpenStreetMap Nominatim: the open community geocoder.
//!
//! Needs no credentials, but the public instance asks every client to send an
//! identifying user agent, which [`HttpClient`] always does. It also allows
//! roughly one request per second, so plans against it should set
//! `max_concurrent_lookups = 1`; throttled reverse lookups fall back to
//! "Unknown location".

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::Coordinate;

use super::http::{self, HttpClient};
use super::{GeocodingProvider, PlaceLookupProvider};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

const SERVICE: &str = "nominatim";

/// City-level detail for reverse lookups.
const PLACE_ZOOM: &str = "10";

#[derive(Debug, Clone)]
pub struct NominatimProvider {
    base_url: String,
    http: HttpClient,
}

impl NominatimProvider {
    pub fn new(base_url: Option<String>, http: HttpClient) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http,
        }
    }
}

/// Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NmPlace {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct NmReverse {
    display_name: Option<String>,
    error: Option<String>,
}

fn candidates(places: Vec<NmPlace>) -> Result<Vec<Coordinate>, ProviderError> {
    places
        .into_iter()
        .map(|place| {
            let lat = place.lat.parse::<f64>();
            let lon = place.lon.parse::<f64>();
            match (lat, lon) {
                (Ok(lat), Ok(lon)) => Coordinate::new(lat, lon)
                    .map_err(|err| ProviderError::decode(SERVICE, err.to_string())),
                _ => Err(ProviderError::decode(
                    SERVICE,
                    format!("unparseable coordinate '{}', '{}'", place.lat, place.lon),
                )),
            }
        })
        .collect()
}

fn place_names(reverse: NmReverse) -> Vec<String> {
    if let Some(error) = reverse.error {
        tracing::debug!(%error, "nominatim reverse lookup found nothing");
        return Vec::new();
    }
    reverse.display_name.into_iter().collect()
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    async fn geocode(&self, query: &str) -> Result<Vec<Coordinate>, ProviderError> {
        let url = format!("{}/search", http::base(&self.base_url));
        let places: Vec<NmPlace> = self
            .http
            .get_json(
                SERVICE,
                &url,
                &[("q", query), ("format", "jsonv2"), ("limit", "1")],
            )
            .await?;
        candidates(places)
    }
}

#[async_trait]
impl PlaceLookupProvider for NominatimProvider {
    async fn reverse_place(&self, coordinate: Coordinate) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/reverse", http::base(&self.base_url));
        let lat = coordinate.lat.to_string();
        let lon = coordinate.lon.to_string();
        let reverse: NmReverse = self
            .http
            .get_json(
                SERVICE,
                &url,
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "jsonv2"),
                    ("zoom", PLACE_ZOOM),
                ],
            )
            .await?;
        Ok(place_names(reverse))
    }
}
