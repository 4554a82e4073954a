use anyhow::{Context, anyhow};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use inquire::Password;
use roadtrip_core::{Config, PlanOutcome, PlanSession, ProviderId, RenderSink, RoutePlanPipeline};

use crate::render::{JsonRenderer, TerminalRenderer};

const LOCAL_DEPARTURE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "roadtrip",
    version,
    about = "Plan a drive with arrival times, places and weather along the way"
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "mapbox", "nominatim", "osrm" or "openweather".
        provider: String,

        /// API key; prompted for when the provider needs one and none is given.
        #[arg(long)]
        api_key: Option<String>,

        /// Alternative endpoint, e.g. a self-hosted instance.
        #[arg(long)]
        base_url: Option<String>,

        /// Make this the default geocoder and/or router.
        #[arg(long)]
        default: bool,
    },

    /// Plan a drive between two places.
    Plan {
        /// Origin: place name or "lat,lon".
        origin: String,

        /// Destination: place name or "lat,lon".
        destination: String,

        /// "now", RFC 3339, or local "YYYY-MM-DD HH:MM".
        #[arg(long, default_value = "now")]
        depart: String,

        /// Number of waypoints to sample along the route.
        #[arg(long)]
        samples: Option<usize>,

        /// Geocoding provider for this run.
        #[arg(long)]
        geocoder: Option<String>,

        /// Directions provider for this run.
        #[arg(long)]
        router: Option<String>,

        /// Print the plan as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure {
                provider,
                api_key,
                base_url,
                default,
            } => configure(&provider, api_key, base_url, default),
            Command::Plan {
                origin,
                destination,
                depart,
                samples,
                geocoder,
                router,
                json,
            } => {
                let mut config = Config::load_with_env()?;
                if let Some(samples) = samples {
                    config.sample_count = samples;
                }
                if let Some(id) = geocoder {
                    config.set_geocoder(ProviderId::try_from(id.as_str())?);
                }
                if let Some(id) = router {
                    config.set_router(ProviderId::try_from(id.as_str())?);
                }
                config.validate()?;

                let departure = parse_departure(&depart, Utc::now())?;
                let pipeline = RoutePlanPipeline::from_config(&config)?;

                if json {
                    plan(pipeline, JsonRenderer::stdout(), &origin, &destination, departure).await
                } else {
                    plan(pipeline, TerminalRenderer::stdout(), &origin, &destination, departure)
                        .await
                }
            }
        }
    }
}

fn configure(
    provider: &str,
    api_key: Option<String>,
    base_url: Option<String>,
    make_default: bool,
) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => Some(key),
        None if id.requires_api_key() => Some(
            Password::new(&format!("API key for {id}:"))
                .without_confirmation()
                .prompt()
                .context("Failed to read API key")?,
        ),
        None => None,
    };

    if let Some(key) = api_key {
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(anyhow!("API key for '{id}' must not be empty"));
        }
        config.upsert_provider_api_key(id, key);
    }

    if let Some(url) = base_url {
        config
            .providers
            .entry(id.as_str().to_string())
            .or_default()
            .base_url = Some(url.trim().to_string());
    }

    if make_default {
        if id.can_geocode() {
            config.set_geocoder(id);
        }
        if id.can_route() {
            config.set_router(id);
        }
        if !id.can_geocode() && !id.can_route() {
            println!("'{id}' is always used when configured; nothing to make default.");
        }
    }

    config.validate()?;
    config.save()?;
    println!(
        "Saved '{id}' configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn plan<S: RenderSink>(
    pipeline: RoutePlanPipeline,
    sink: S,
    origin: &str,
    destination: &str,
    departure: DateTime<Utc>,
) -> anyhow::Result<()> {
    let session = PlanSession::new(pipeline, sink);

    match session.submit(origin, destination, departure).await {
        Ok(PlanOutcome::Rendered(_)) => Ok(()),
        Ok(PlanOutcome::Superseded { request_id }) => {
            tracing::debug!(%request_id, "request superseded");
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = ?err, "plan failed");
            Err(anyhow!(err.user_message()))
        }
    }
}

/// Parse `--depart`: "now", an RFC 3339 timestamp, or local wall-clock time.
pub fn parse_departure(text: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(text, LOCAL_DEPARTURE_FORMAT).map_err(|_| {
        anyhow!("Invalid departure '{text}'. Use \"now\", RFC 3339, or \"YYYY-MM-DD HH:MM\".")
    })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Departure '{text}' does not exist in the local time zone"))
}
