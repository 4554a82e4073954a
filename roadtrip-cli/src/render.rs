//! Terminal and JSON output for finished plans.

use std::fmt::Write as _;
use std::io::{self, Write};

use chrono::{DateTime, Local, TimeZone};
use roadtrip_core::{LocationPoint, RenderSink, RoutePlan, Weather};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Human-readable table, times shown in the local time zone.
pub struct TerminalRenderer<W> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> RenderSink for TerminalRenderer<W> {
    fn render(&mut self, plan: &RoutePlan) {
        let text = format_plan(plan, &Local);
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %err, "failed to write plan");
        }
    }
}

/// Pretty-printed JSON, one document per plan.
pub struct JsonRenderer<W> {
    out: W,
}

impl<W> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl JsonRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> RenderSink for JsonRenderer<W> {
    fn render(&mut self, plan: &RoutePlan) {
        let written = serde_json::to_writer_pretty(&mut self.out, plan)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out));
        if let Err(err) = written {
            tracing::warn!(error = %err, "failed to write plan as JSON");
        }
    }
}

fn label(point: &LocationPoint) -> String {
    match point.place_name.as_deref() {
        Some(name) if name != point.query_text => format!("{} ({name})", point.query_text),
        _ => point.query_text.clone(),
    }
}

fn weather_summary(weather: Option<&Weather>) -> String {
    match weather {
        Some(w) => format!("{:.1}°C {}", w.temperature_c, w.condition),
        None => "-".to_string(),
    }
}

/// `"10h 05m"`, rounded to the minute.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds.max(0.0) / 60.0).round() as u64;
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

fn format_time<Tz>(time: DateTime<chrono::Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.with_timezone(tz).format(TIME_FORMAT).to_string()
}

pub fn format_plan<Tz>(plan: &RoutePlan, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{} -> {}", label(&plan.origin), label(&plan.destination));
    let _ = writeln!(
        out,
        "Depart {}  Arrive {}  Drive {}",
        format_time(plan.departure_time, tz),
        format_time(plan.arrival_time(), tz),
        format_duration(plan.total_duration_seconds)
    );

    if plan.waypoints.is_empty() {
        let _ = writeln!(out, "Route too short for waypoints.");
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:>3}  {:<16}  {:<32}  Weather", "#", "ETA", "Place");
    for (n, waypoint) in plan.waypoints.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<16}  {:<32}  {}",
            n + 1,
            format_time(waypoint.estimated_arrival, tz),
            waypoint.place_name,
            weather_summary(waypoint.weather.as_ref())
        );
    }
    out
}
