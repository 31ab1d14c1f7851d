//! Descriptive analytics used when the data cannot be clustered

use crate::business::BusinessType;
use crate::features::{Dataset, VisitorSource};
use serde::Serialize;
use std::collections::HashMap;

/// Connections per device type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceShare {
    pub device_type: String,
    pub count: usize,
    /// Fraction of sessions with a known device type
    pub share: f64,
}

/// Counts and distributions over a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackReport {
    pub business_type: BusinessType,
    pub record_count: usize,
    /// Connections per hour of day; present when the log has timestamps
    pub hourly_connections: Option<[usize; 24]>,
    /// Most common first; present when the log has device types
    pub devices: Option<Vec<DeviceShare>>,
    pub mean_duration: Option<f64>,
    pub weekend_share: Option<f64>,
    /// Only reported for measured (not synthesized) visitor flags
    pub returning_share: Option<f64>,
}

/// Connections per hour of day, ignoring sessions without a parsed timestamp
pub fn hourly_histogram(dataset: &Dataset) -> [usize; 24] {
    let mut counts = [0usize; 24];
    for hour in dataset.records.iter().filter_map(|r| r.hour_of_day) {
        if let Some(slot) = counts.get_mut(hour as usize) {
            *slot += 1;
        }
    }
    counts
}

/// Device type frequencies, most common first and ties by name
pub fn device_distribution(dataset: &Dataset) -> Vec<DeviceShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for device in dataset.records.iter().filter_map(|r| r.device_type.as_deref()) {
        *counts.entry(device).or_default() += 1;
    }
    let total: usize = counts.values().sum();

    let mut shares: Vec<DeviceShare> = counts
        .into_iter()
        .map(|(device, count)| DeviceShare {
            device_type: device.to_string(),
            count,
            share: count as f64 / total as f64,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.device_type.cmp(&b.device_type)));
    shares
}

pub fn fallback_report(dataset: &Dataset) -> FallbackReport {
    let durations: Vec<f64> = dataset.records.iter().filter_map(|r| r.duration).collect();
    let weekend: Vec<bool> = dataset.records.iter().filter_map(|r| r.is_weekend).collect();

    FallbackReport {
        business_type: dataset.business_type,
        record_count: dataset.len(),
        hourly_connections: dataset.columns.timestamp.then(|| hourly_histogram(dataset)),
        devices: dataset.columns.device_type.then(|| device_distribution(dataset)),
        mean_duration: mean(&durations),
        weekend_share: (!weekend.is_empty())
            .then(|| weekend.iter().filter(|w| **w).count() as f64 / weekend.len() as f64),
        returning_share: (dataset.columns.frequent_visitor == VisitorSource::Measured
            && !dataset.is_empty())
        .then(|| {
            dataset
                .records
                .iter()
                .map(|r| f64::from(r.frequent_visitor))
                .sum::<f64>()
                / dataset.len() as f64
        }),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
