//! OSRM route service, the open community directions provider.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, Route};

use super::DirectionsProvider;
use super::http::{self, HttpClient, RouteWire};

pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

const SERVICE: &str = "osrm";

#[derive(Debug, Clone)]
pub struct OsrmProvider {
    base_url: String,
    http: HttpClient,
}

impl OsrmProvider {
    pub fn new(base_url: Option<String>, http: HttpClient) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http,
        }
    }

    /// `{base_url}/route/v1/driving/{lon},{lat};{lon},{lat}`
    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            http::base(&self.base_url),
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat
        )
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    routes: Option<Vec<RouteWire>>,
}

fn routes(response: RouteResponse) -> Result<Vec<Route>, ProviderError> {
    match response.code.as_str() {
        "Ok" => response
            .routes
            .unwrap_or_default()
            .into_iter()
            .map(|route| route.into_route(SERVICE))
            .collect(),
        "NoRoute" => Ok(Vec::new()),
        _ => Err(ProviderError::Service {
            service: SERVICE,
            code: response.code,
            message: response.message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl DirectionsProvider for OsrmProvider {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Route>, ProviderError> {
        let url = self.route_url(origin, destination);
        let response: RouteResponse = match self
            .http
            .get_json(
                SERVICE,
                &url,
                &[("overview", "full"), ("geometries", "geojson")],
            )
            .await
        {
            Ok(response) => response,
            // Some deployments answer an unroutable pair with HTTP 400.
            Err(ProviderError::Status {
                status: 400, body, ..
            }) if body.contains("NoRoute") => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        routes(response)
    }
}
