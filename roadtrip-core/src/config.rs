use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::provider::ProviderId;
use crate::sampling::DEFAULT_SAMPLE_COUNT;

/// Environment variables that override stored credentials.
const ENV_KEYS: &[(&str, ProviderId)] = &[
    ("MAPBOX_TOKEN", ProviderId::Mapbox),
    ("OPENWEATHER_API_KEY", ProviderId::OpenWeather),
];

const MAX_SAMPLE_COUNT: usize = 100;
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_RETRIES: u32 = 10;
const MAX_CONCURRENT_LOOKUPS: usize = 32;

/// Configuration for a single provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Alternative endpoint, e.g. a self-hosted Nominatim or OSRM instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Geocoding provider id, "mapbox" or "nominatim".
    pub geocoder: Option<String>,

    /// Directions provider id, "mapbox" or "osrm".
    pub router: Option<String>,

    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Bound on every outbound call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for geocoding and directions calls.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Reverse place lookups in flight at once. The public Nominatim
    /// instance allows one request per second; use 1 there.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Example TOML:
    /// [providers.mapbox]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_sample_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_concurrent_lookups() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoder: None,
            router: None,
            sample_count: default_sample_count(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// Geocoding provider: the configured one, else Mapbox when it has a key,
    /// else Nominatim.
    pub fn geocoder_id(&self) -> Result<ProviderId> {
        let id = match &self.geocoder {
            Some(s) => ProviderId::try_from(s.as_str())?,
            None if self.is_provider_configured(ProviderId::Mapbox) => ProviderId::Mapbox,
            None => ProviderId::Nominatim,
        };
        if !id.can_geocode() {
            bail!("Provider '{id}' cannot geocode. Supported geocoders: mapbox, nominatim.");
        }
        Ok(id)
    }

    /// Directions provider: the configured one, else Mapbox when it has a
    /// key, else OSRM.
    pub fn router_id(&self) -> Result<ProviderId> {
        let id = match &self.router {
            Some(s) => ProviderId::try_from(s.as_str())?,
            None if self.is_provider_configured(ProviderId::Mapbox) => ProviderId::Mapbox,
            None => ProviderId::Osrm,
        };
        if !id.can_route() {
            bail!("Provider '{id}' cannot provide directions. Supported routers: mapbox, osrm.");
        }
        Ok(id)
    }

    pub fn set_geocoder(&mut self, id: ProviderId) {
        self.geocoder = Some(id.as_str().to_string());
    }

    pub fn set_router(&mut self, id: ProviderId) {
        self.router = Some(id.as_str().to_string());
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// [`Config::load`], then credentials from the environment, then validation.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "roadtrip", "roadtrip-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace stored API keys with non-empty values from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (name, id) in ENV_KEYS {
            if let Some(key) = lookup(name).filter(|key| !key.trim().is_empty()) {
                self.providers.entry(id.as_str().to_string()).or_default().api_key =
                    key.trim().to_string();
            }
        }
    }

    /// Set/replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = api_key;
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<String> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.clone())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_count > MAX_SAMPLE_COUNT {
            bail!("sample_count cannot exceed {MAX_SAMPLE_COUNT}");
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            bail!("timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}");
        }
        if self.max_retries > MAX_RETRIES {
            bail!("max_retries cannot exceed {MAX_RETRIES}");
        }
        if self.max_concurrent_lookups == 0 || self.max_concurrent_lookups > MAX_CONCURRENT_LOOKUPS {
            bail!("max_concurrent_lookups must be between 1 and {MAX_CONCURRENT_LOOKUPS}");
        }
        for (name, provider) in &self.providers {
            if let Some(url) = &provider.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    bail!("Base URL for provider '{name}' must be an HTTP or HTTPS URL");
                }
            }
        }
        self.geocoder_id()?;
        self.router_id()?;
        Ok(())
    }
}
