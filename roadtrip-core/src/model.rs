use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoordinateRangeError;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting latitudes outside [-90, 90] and
    /// longitudes outside [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateRangeError> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Ok(Self { lat, lon })
        } else {
            Err(CoordinateRangeError { lat, lon })
        }
    }

    /// Build from the `[lon, lat]` pair order used by GeoJSON and Mapbox.
    pub fn from_lon_lat([lon, lat]: [f64; 2]) -> Result<Self, CoordinateRangeError> {
        Self::new(lat, lon)
    }

    /// Parse free text of the form `"<lat>,<lon>"`.
    ///
    /// Returns `None` for anything else, including place names that happen to
    /// contain a comma such as `"Paris, France"`.
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lon) = text.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lon = lon.trim().parse::<f64>().ok()?;
        Self::new(lat, lon).ok()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// A user-supplied location after geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub query_text: String,
    pub coordinate: Coordinate,
    pub place_name: Option<String>,
}

impl LocationPoint {
    pub fn new(query_text: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            query_text: query_text.into(),
            coordinate,
            place_name: None,
        }
    }

    #[must_use]
    pub fn with_place_name(self, place_name: impl Into<String>) -> Self {
        Self {
            place_name: Some(place_name.into()),
            ..self
        }
    }
}

/// Route polyline in travel order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteGeometry(Vec<Coordinate>);

impl RouteGeometry {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.0.get(index).copied()
    }
}

impl From<Vec<Coordinate>> for RouteGeometry {
    fn from(points: Vec<Coordinate>) -> Self {
        Self(points)
    }
}

/// One route as reported by a directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub geometry: RouteGeometry,
    pub duration_seconds: f64,
}

/// A sampled position along a route geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointSample {
    /// Index into the route geometry.
    pub sequence_index: usize,
    pub fraction_along_route: f64,
}

/// Current conditions at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature_c: f64,
    pub condition: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedWaypoint {
    pub sequence_index: usize,
    pub fraction_along_route: f64,
    pub coordinate: Coordinate,
    pub estimated_arrival: DateTime<Utc>,
    pub place_name: String,
    pub weather: Option<Weather>,
}

/// A fully annotated drive, built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub origin: LocationPoint,
    pub destination: LocationPoint,
    pub geometry: RouteGeometry,
    pub total_duration_seconds: f64,
    pub departure_time: DateTime<Utc>,
    pub waypoints: Vec<AnnotatedWaypoint>,
}

impl RoutePlan {
    /// Arrival at the destination.
    pub fn arrival_time(&self) -> DateTime<Utc> {
        crate::eta::estimate_arrival(self.departure_time, self.total_duration_seconds, 1.0)
    }
}
