use crate::{
    Config,
    error::ProviderError,
    model::{Coordinate, Route, Weather},
    provider::{
        http::HttpClient, mapbox::MapboxProvider, nominatim::NominatimProvider,
        openweather::OpenWeatherProvider, osrm::OsrmProvider,
    },
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod http;
pub mod mapbox;
pub mod nominatim;
pub mod openweather;
pub mod osrm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Mapbox,
    Nominatim,
    Osrm,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Mapbox => "mapbox",
            ProviderId::Nominatim => "nominatim",
            ProviderId::Osrm => "osrm",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Mapbox,
            ProviderId::Nominatim,
            ProviderId::Osrm,
            ProviderId::OpenWeather,
        ]
    }

    /// Commercial providers refuse requests without a key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::Mapbox | ProviderId::OpenWeather)
    }

    /// Forward geocoding and reverse place lookup.
    pub fn can_geocode(&self) -> bool {
        matches!(self, ProviderId::Mapbox | ProviderId::Nominatim)
    }

    pub fn can_route(&self) -> bool {
        matches!(self, ProviderId::Mapbox | ProviderId::Osrm)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "mapbox" => Ok(ProviderId::Mapbox),
            "nominatim" => Ok(ProviderId::Nominatim),
            "osrm" => Ok(ProviderId::Osrm),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: mapbox, nominatim, osrm, openweather."
            )),
        }
    }
}

/// Free text to candidate coordinates, best match first.
#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    async fn geocode(&self, query: &str) -> Result<Vec<Coordinate>, ProviderError>;
}

/// Driving routes between two points, best route first.
#[async_trait]
pub trait DirectionsProvider: Send + Sync + Debug {
    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Route>, ProviderError>;
}

/// Place-level display names around a coordinate, best match first.
#[async_trait]
pub trait PlaceLookupProvider: Send + Sync + Debug {
    async fn reverse_place(&self, coordinate: Coordinate) -> Result<Vec<String>, ProviderError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, coordinate: Coordinate) -> Result<Weather, ProviderError>;
}

/// The collaborators one pipeline talks to.
#[derive(Debug, Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn GeocodingProvider>,
    pub places: Arc<dyn PlaceLookupProvider>,
    pub directions: Arc<dyn DirectionsProvider>,
    /// `None` disables weather enrichment.
    pub weather: Option<Arc<dyn WeatherProvider>>,
}

fn required_api_key(id: ProviderId, config: &Config) -> anyhow::Result<String> {
    config
        .provider_api_key(id)
        .map(str::to_owned)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `roadtrip configure {id}` and enter your API key."
            )
        })
}

/// Construct every provider the configuration selects.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Providers> {
    let http = HttpClient::new(config.timeout())?;
    let geocoder_id = config.geocoder_id()?;
    let router_id = config.router_id()?;

    let mapbox = if geocoder_id == ProviderId::Mapbox || router_id == ProviderId::Mapbox {
        Some(Arc::new(MapboxProvider::new(
            required_api_key(ProviderId::Mapbox, config)?,
            config.provider_base_url(ProviderId::Mapbox),
            http.clone(),
        )))
    } else {
        None
    };

    let (geocoder, places): (Arc<dyn GeocodingProvider>, Arc<dyn PlaceLookupProvider>) =
        match (geocoder_id, &mapbox) {
            (ProviderId::Mapbox, Some(mapbox)) => (mapbox.clone(), mapbox.clone()),
            _ => {
                let nominatim = Arc::new(NominatimProvider::new(
                    config.provider_base_url(ProviderId::Nominatim),
                    http.clone(),
                ));
                (nominatim.clone(), nominatim)
            }
        };

    let directions: Arc<dyn DirectionsProvider> = match (router_id, &mapbox) {
        (ProviderId::Mapbox, Some(mapbox)) => mapbox.clone(),
        _ => Arc::new(OsrmProvider::new(
            config.provider_base_url(ProviderId::Osrm),
            http.clone(),
        )),
    };

    let weather: Option<Arc<dyn WeatherProvider>> = match config.provider_api_key(ProviderId::OpenWeather) {
        Some(api_key) => Some(Arc::new(OpenWeatherProvider::new(
            api_key.to_owned(),
            config.provider_base_url(ProviderId::OpenWeather),
            http,
        ))),
        None => {
            tracing::info!("no OpenWeather key configured, weather enrichment disabled");
            None
        }
    };

    tracing::debug!(%geocoder_id, %router_id, weather = weather.is_some(), "providers ready");

    Ok(Providers {
        geocoder,
        places,
        directions,
        weather,
    })
}
