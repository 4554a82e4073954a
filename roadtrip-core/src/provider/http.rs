//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, Route, RouteGeometry};

pub const USER_AGENT: &str = concat!("roadtrip/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over [`reqwest::Client`] that maps failures onto
/// [`ProviderError`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http, timeout })
    }

    /// GET `url` with `query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| self.transport_error(service, err))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|err| self.transport_error(service, err))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                service,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|err| ProviderError::decode(service, err.to_string()))
    }

    fn transport_error(&self, service: &'static str, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            return ProviderError::Timeout {
                service,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        // Query strings carry access tokens.
        ProviderError::Transport {
            service,
            message: err.without_url().to_string(),
        }
    }
}

pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

/// GeoJSON `LineString` as returned with `geometries=geojson`.
#[derive(Debug, Deserialize)]
pub struct LineString {
    pub coordinates: Vec<[f64; 2]>,
}

/// Route object shared by the Mapbox Directions and OSRM route services.
#[derive(Debug, Deserialize)]
pub struct RouteWire {
    pub geometry: LineString,
    /// Seconds.
    pub duration: f64,
}

impl RouteWire {
    pub fn into_route(self, service: &'static str) -> Result<Route, ProviderError> {
        let points = self
            .geometry
            .coordinates
            .into_iter()
            .map(|pair| lon_lat(service, pair))
            .collect::<Result<Vec<_>, _>>()?;
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ProviderError::decode(
                service,
                format!("invalid route duration {}", self.duration),
            ));
        }
        Ok(Route {
            geometry: RouteGeometry::new(points),
            duration_seconds: self.duration,
        })
    }
}

pub fn lon_lat(service: &'static str, pair: [f64; 2]) -> Result<Coordinate, ProviderError> {
    Coordinate::from_lon_lat(pair).map_err(|err| ProviderError::decode(service, err.to_string()))
}

/// Strip a trailing slash so paths can be appended with `format!`.
pub fn base(url: &str) -> &str {
    url.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[test]
    fn route_wire_converts_lon_lat_pairs() {
        let wire: RouteWire = serde_json::from_str(
            r#"{"geometry":{"type":"LineString","coordinates":[[77.2,28.61],[72.88,19.07]]},"duration":36000.5}"#,
        )
        .expect("valid json");

        let route = wire.into_route("directions").expect("valid route");
        assert_eq!(route.geometry.len(), 2);
        assert_eq!(route.geometry.get(0).map(|c| c.lat), Some(28.61));
        assert_eq!(route.duration_seconds, 36000.5);
    }

    #[test]
    fn route_wire_rejects_out_of_range_points() {
        let wire = RouteWire {
            geometry: LineString {
                coordinates: vec![[200.0, 10.0]],
            },
            duration: 10.0,
        };
        let err = wire.into_route("directions").expect_err("should fail");
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[test]
    fn base_strips_trailing_slash() {
        assert_eq!(base("https://api.mapbox.com/"), "https://api.mapbox.com");
        assert_eq!(base("https://api.mapbox.com"), "https://api.mapbox.com");
    }
}
