use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::model::{Coordinate, Weather};
use crate::provider::WeatherProvider;
use crate::retry;

/// Optional current-conditions lookup. Never fails the caller.
#[derive(Debug, Clone)]
pub struct WeatherEnricher {
    provider: Option<Arc<dyn WeatherProvider>>,
    timeout: Duration,
}

impl WeatherEnricher {
    pub fn new(provider: Option<Arc<dyn WeatherProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn fetch(&self, coordinate: Coordinate) -> Option<Weather> {
        let provider = self.provider.as_ref()?;
        match retry::with_timeout("weather", self.timeout, provider.current_weather(coordinate)).await
        {
            Ok(weather) => Some(weather),
            Err(err) => {
                warn!(%coordinate, error = %err, "weather lookup failed");
                None
            }
        }
    }
}
