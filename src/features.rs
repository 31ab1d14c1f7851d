//! Feature preparation: turns a raw connection-log frame into typed session records
//!
//! Preparation never fails. Values that cannot be converted degrade to
//! missing (or to a documented default) instead of aborting the request.

use crate::business::BusinessType;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

/// Canonical duration column, in minutes
pub const DURATION_COLUMN: &str = "duration";
/// Alternate duration column found in some exports
pub const ALT_DURATION_COLUMN: &str = "session_duration_minutes";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const DEVICE_TYPE_COLUMN: &str = "device_type";
pub const FREQUENT_VISITOR_COLUMN: &str = "frequent_visitor";
pub const SIGNAL_STRENGTH_COLUMN: &str = "signal_strength_dbm";
pub const DATA_USED_COLUMN: &str = "data_used_mb";
pub const PEAK_USAGE_HOUR_COLUMN: &str = "peak_usage_hour";

/// Every column the pipeline knows how to use
pub const RECOGNIZED_COLUMNS: [&str; 8] = [
    TIMESTAMP_COLUMN,
    DEVICE_TYPE_COLUMN,
    DURATION_COLUMN,
    ALT_DURATION_COLUMN,
    FREQUENT_VISITOR_COLUMN,
    SIGNAL_STRENGTH_COLUMN,
    DATA_USED_COLUMN,
    PEAK_USAGE_HOUR_COLUMN,
];

/// Share of guests assumed to be returning when the log has no visitor column
pub const DEFAULT_RETURNING_PROBABILITY: f64 = 0.3;

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
];

/// One WiFi session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub timestamp: Option<NaiveDateTime>,
    pub device_type: Option<String>,
    /// Session length in minutes, never negative
    pub duration: Option<f64>,
    /// 1 for a returning guest, 0 otherwise
    pub frequent_visitor: u8,
    pub hour_of_day: Option<u32>,
    /// Monday = 0
    pub day_of_week: Option<u32>,
    pub is_weekend: Option<bool>,
    pub signal_strength_dbm: Option<f64>,
    pub data_used_mb: Option<f64>,
    pub peak_usage_hour: Option<f64>,
}

impl Record {
    /// Set the timestamp and the calendar features derived from it
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.set_timestamp(Some(timestamp));
        self
    }

    pub fn with_duration(mut self, minutes: f64) -> Self {
        self.duration = Some(minutes);
        self
    }

    pub fn with_device(mut self, device: &str) -> Self {
        self.device_type = Some(device.to_string());
        self
    }

    pub fn with_frequent_visitor(mut self, returning: bool) -> Self {
        self.frequent_visitor = u8::from(returning);
        self
    }

    fn set_timestamp(&mut self, timestamp: Option<NaiveDateTime>) {
        self.timestamp = timestamp;
        self.hour_of_day = timestamp.map(|t| t.hour());
        self.day_of_week = timestamp.map(|t| t.weekday().num_days_from_monday());
        self.is_weekend = self.day_of_week.map(|d| d >= 5);
    }
}

/// Where the frequent-visitor flag came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorSource {
    Measured,
    /// Drawn at random; an approximation, not measured truth
    Synthesized,
}

/// Which source columns a dataset was built from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnPresence {
    pub timestamp: bool,
    pub device_type: bool,
    /// Source column the durations were read from, if any
    pub duration_source: Option<String>,
    pub frequent_visitor: VisitorSource,
}

/// Ordered session records for one business type
#[derive(Debug, Clone)]
pub struct Dataset {
    pub business_type: BusinessType,
    pub records: Vec<Record>,
    pub columns: ColumnPresence,
}

impl Dataset {
    /// Build a dataset directly from records, inferring column presence from the values
    pub fn from_records(business_type: BusinessType, records: Vec<Record>) -> Self {
        let columns = ColumnPresence {
            timestamp: records.iter().any(|r| r.timestamp.is_some()),
            device_type: records.iter().any(|r| r.device_type.is_some()),
            duration_source: records
                .iter()
                .any(|r| r.duration.is_some())
                .then(|| DURATION_COLUMN.to_string()),
            frequent_visitor: VisitorSource::Measured,
        };
        Self {
            business_type,
            records,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Prepare a loaded frame for analysis
///
/// # Arguments
/// * `frame` - Frame with normalized (lower-case) column names
/// * `business_type` - Business type the frame belongs to
/// * `rng` - Random source used only when the frequent-visitor column is absent
/// * `returning_probability` - Probability of drawing a returning guest
pub fn prepare<R: Rng + ?Sized>(
    frame: &DataFrame,
    business_type: BusinessType,
    rng: &mut R,
    returning_probability: f64,
) -> Dataset {
    let height = frame.height();
    let mut records = vec![Record::default(); height];

    // Duration, falling back to the alternate column name
    let duration_source = [DURATION_COLUMN, ALT_DURATION_COLUMN]
        .into_iter()
        .find(|name| has_column(frame, name));
    if let Some(source) = duration_source {
        if source != DURATION_COLUMN {
            debug!("Using '{}' as '{}'", source, DURATION_COLUMN);
        }
        if let Some(values) = numeric_column(frame, source) {
            for (record, value) in records.iter_mut().zip(values) {
                record.duration = value.filter(|v| *v >= 0.0);
            }
        }
    }

    let has_timestamp = has_column(frame, TIMESTAMP_COLUMN);
    if let Some(values) = text_column(frame, TIMESTAMP_COLUMN) {
        let mut invalid = 0usize;
        for (record, value) in records.iter_mut().zip(values) {
            let parsed = value.as_deref().and_then(parse_timestamp);
            if value.is_some() && parsed.is_none() {
                invalid += 1;
            }
            record.set_timestamp(parsed);
        }
        if invalid > 0 {
            warn!("{} timestamps could not be parsed and were treated as missing", invalid);
        }
    }

    let has_device = has_column(frame, DEVICE_TYPE_COLUMN);
    if let Some(values) = text_column(frame, DEVICE_TYPE_COLUMN) {
        for (record, value) in records.iter_mut().zip(values) {
            record.device_type = value;
        }
    }

    let frequent_visitor = match text_column(frame, FREQUENT_VISITOR_COLUMN) {
        Some(values) => {
            for (record, value) in records.iter_mut().zip(values) {
                record.frequent_visitor = value.as_deref().and_then(parse_flag).unwrap_or(0);
            }
            VisitorSource::Measured
        }
        None => {
            let p = if (0.0..=1.0).contains(&returning_probability) {
                returning_probability
            } else {
                warn!(
                    "Returning probability {} is outside [0, 1]; using {}",
                    returning_probability, DEFAULT_RETURNING_PROBABILITY
                );
                DEFAULT_RETURNING_PROBABILITY
            };
            synthesize_frequent_visitor(&mut records, rng, p);
            debug!("Synthesized frequent_visitor with p={}", p);
            VisitorSource::Synthesized
        }
    };

    for (column, setter) in [
        (SIGNAL_STRENGTH_COLUMN, set_signal as fn(&mut Record, Option<f64>)),
        (DATA_USED_COLUMN, set_data_used),
        (PEAK_USAGE_HOUR_COLUMN, set_peak_hour),
    ] {
        if let Some(values) = numeric_column(frame, column) {
            for (record, value) in records.iter_mut().zip(values) {
                setter(record, value);
            }
        }
    }

    Dataset {
        business_type,
        records,
        columns: ColumnPresence {
            timestamp: has_timestamp,
            device_type: has_device,
            duration_source: duration_source.map(str::to_string),
            frequent_visitor,
        },
    }
}

/// Fill the frequent-visitor flag with independent Bernoulli draws
pub fn synthesize_frequent_visitor<R: Rng + ?Sized>(records: &mut [Record], rng: &mut R, p: f64) {
    for record in records.iter_mut() {
        record.frequent_visitor = u8::from(rng.gen_bool(p));
    }
}

/// Parse a timestamp in any of the accepted layouts
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Interpret a yes/no style flag; `None` when the token is not recognized
pub fn parse_flag(value: &str) -> Option<u8> {
    let token = value.trim().to_lowercase();
    match token.as_str() {
        "yes" | "y" | "true" | "t" | "1" | "returning" => Some(1),
        "no" | "n" | "false" | "f" | "0" | "new" => Some(0),
        _ => token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| u8::from(v > 0.0)),
    }
}

fn set_signal(record: &mut Record, value: Option<f64>) {
    record.signal_strength_dbm = value;
}

fn set_data_used(record: &mut Record, value: Option<f64>) {
    record.data_used_mb = value;
}

fn set_peak_hour(record: &mut Record, value: Option<f64>) {
    record.peak_usage_hour = value;
}

fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.column(name).is_ok()
}

/// Column cast to f64; unparseable cells become `None`
fn numeric_column(frame: &DataFrame, name: &str) -> Option<Vec<Option<f64>>> {
    let series = frame.column(name).ok()?;
    let cast = series.cast(&DataType::Float64).ok()?;
    let values = cast.f64().ok()?;
    Some(
        values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect(),
    )
}

/// Column cast to trimmed strings; blank cells become `None`
fn text_column(frame: &DataFrame, name: &str) -> Option<Vec<Option<String>>> {
    let series = frame.column(name).ok()?;
    let cast = series.cast(&DataType::String).ok()?;
    let values = cast.str().ok()?;
    Some(
        values
            .into_iter()
            .map(|v| {
                v.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect(),
    )
}
