use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, Route};

use super::http::{self, HttpClient, RouteWire};
use super::{DirectionsProvider, GeocodingProvider, PlaceLookupProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

const GEOCODING: &str = "mapbox geocoding";
const DIRECTIONS: &str = "mapbox directions";

/// Mapbox geocoding, reverse place lookup and driving directions.
#[derive(Debug, Clone)]
pub struct MapboxProvider {
    access_token: String,
    base_url: String,
    http: HttpClient,
}

impl MapboxProvider {
    pub fn new(access_token: String, base_url: Option<String>, http: HttpClient) -> Self {
        Self {
            access_token,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http,
        }
    }

    fn geocode_url(&self, query: &str) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{}.json",
            http::base(&self.base_url),
            urlencoding::encode(query)
        )
    }

    fn reverse_url(&self, coordinate: Coordinate) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{},{}.json",
            http::base(&self.base_url),
            coordinate.lon,
            coordinate.lat
        )
    }

    fn directions_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/directions/v5/mapbox/driving/{},{};{},{}",
            http::base(&self.base_url),
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat
        )
    }
}

#[derive(Debug, Deserialize)]
struct MbFeature {
    center: [f64; 2],
    #[serde(default)]
    place_name: String,
}

#[derive(Debug, Deserialize)]
struct MbGeocodeResponse {
    #[serde(default)]
    features: Vec<MbFeature>,
}

#[derive(Debug, Deserialize)]
struct MbDirectionsResponse {
    #[serde(default)]
    routes: Vec<RouteWire>,
}

fn candidates(response: MbGeocodeResponse) -> Result<Vec<Coordinate>, ProviderError> {
    response
        .features
        .into_iter()
        .map(|feature| http::lon_lat(GEOCODING, feature.center))
        .collect()
}

fn place_names(response: MbGeocodeResponse) -> Vec<String> {
    response
        .features
        .into_iter()
        .map(|feature| feature.place_name)
        .collect()
}

fn routes(response: MbDirectionsResponse) -> Result<Vec<Route>, ProviderError> {
    response
        .routes
        .into_iter()
        .map(|route| route.into_route(DIRECTIONS))
        .collect()
}

#[async_trait]
impl GeocodingProvider for MapboxProvider {
    async fn geocode(&self, query: &str) -> Result<Vec<Coordinate>, ProviderError> {
        let url = self.geocode_url(query);
        let response: MbGeocodeResponse = self
            .http
            .get_json(
                GEOCODING,
                &url,
                &[("access_token", self.access_token.as_str()), ("limit", "1")],
            )
            .await?;
        candidates(response)
    }
}

#[async_trait]
impl PlaceLookupProvider for MapboxProvider {
    async fn reverse_place(&self, coordinate: Coordinate) -> Result<Vec<String>, ProviderError> {
        let url = self.reverse_url(coordinate);
        let response: MbGeocodeResponse = self
            .http
            .get_json(
                GEOCODING,
                &url,
                &[
                    ("access_token", self.access_token.as_str()),
                    ("types", "place"),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(place_names(response))
    }
}

#[async_trait]
impl DirectionsProvider for MapboxProvider {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Route>, ProviderError> {
        let url = self.directions_url(origin, destination);
        let response: MbDirectionsResponse = self
            .http
            .get_json(
                DIRECTIONS,
                &url,
                &[
                    ("access_token", self.access_token.as_str()),
                    ("geometries", "geojson"),
                    ("overview", "full"),
                ],
            )
            .await?;
        routes(response)
    }
}
