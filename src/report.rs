//! Rendering a [`ProbeResult`] for monitoring systems
//!
//! Two encodings are supported: a JSON object and a single
//! [InfluxDB line protocol](https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/)
//! record. Durations are whole microseconds in both.

use crate::config::ProbeConfig;
use crate::error::Error;
use crate::probe::ProbeResult;
use crate::timeline::iso8601;
use chrono::TimeDelta;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Measurement name of the metrics record.
pub const MEASUREMENT: &str = "mail-e2e";

/// Report encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Influx,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Influx => "influx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "influx" => Ok(Self::Influx),
            _ => Err(Error::Config(format!("Unknown output format: {s}"))),
        }
    }
}

/// The JSON form of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonReport {
    pub success: bool,
    pub hash: String,
    pub start: String,
    pub end: String,
    pub start_time_smtp: String,
    pub start_time_imap: String,
    pub start_time_imap_search: String,
    pub tries: u32,
    pub total_duration: i64,
    pub smtp_duration: i64,
    pub imap_duration: i64,
}

impl From<&ProbeResult> for JsonReport {
    fn from(result: &ProbeResult) -> Self {
        Self {
            success: result.success,
            hash: result.token.to_string(),
            start: iso8601(&result.started_at),
            end: iso8601(&result.finished_at),
            start_time_smtp: iso8601(&result.smtp_started_at),
            start_time_imap: iso8601(&result.imap_started_at),
            start_time_imap_search: iso8601(&result.search_started_at),
            tries: result.attempts,
            total_duration: micros(result.total_duration()),
            smtp_duration: micros(result.smtp_duration()),
            imap_duration: micros(result.imap_duration()),
        }
    }
}

/// Render `result` in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(
    format: OutputFormat,
    config: &ProbeConfig,
    result: &ProbeResult,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => json(result),
        OutputFormat::Influx => Ok(influx_line(config, result)),
    }
}

/// The result as a single-line JSON object.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json(result: &ProbeResult) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport::from(result))
}

/// The result as one line-protocol record, tagged with the addresses
/// and both endpoints.
#[must_use]
pub fn influx_line(config: &ProbeConfig, result: &ProbeResult) -> String {
    format!(
        "{MEASUREMENT},email-from={},email-to={},smtp={},imap={} \
         success={},total_dur={},smtp_dur={},imap_dur={}",
        escape_tag(&config.email_from),
        escape_tag(&config.email_to),
        escape_tag(&config.smtp.endpoint.address()),
        escape_tag(&config.imap.endpoint.address()),
        u8::from(result.success),
        micros(result.total_duration()),
        micros(result.smtp_duration()),
        micros(result.imap_duration()),
    )
}

/// Escape a tag value: commas, spaces and equals signs get a backslash.
fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn micros(delta: TimeDelta) -> i64 {
    delta.num_microseconds().unwrap_or(i64::MAX)
}
