use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Coordinate, Weather};

use super::WeatherProvider;
use super::http::{self, HttpClient};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const SERVICE: &str = "openweather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: Option<String>, http: HttpClient) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

fn current(parsed: OwCurrentResponse) -> Result<Weather, ProviderError> {
    let main = parsed
        .main
        .ok_or_else(|| ProviderError::decode(SERVICE, "incomplete weather data: no main block"))?;
    let conditions = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::decode(SERVICE, "incomplete weather data: no conditions"))?;

    Ok(Weather {
        temperature_c: main.temp,
        condition: conditions.description,
        icon_url: icon_url(&conditions.icon),
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, coordinate: Coordinate) -> Result<Weather, ProviderError> {
        let url = format!("{}/data/2.5/weather", http::base(&self.base_url));
        let lat = coordinate.lat.to_string();
        let lon = coordinate.lon.to_string();

        let parsed: OwCurrentResponse = self
            .http
            .get_json(
                SERVICE,
                &url,
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("appid", self.api_key.as_str()),
                    ("units", "metric"),
                ],
            )
            .await?;

        current(parsed)
    }
}
