//! wifi-insights: guest segmentation for captive-portal WiFi connection logs
//!
//! This library loads per-business connection logs, derives session
//! features, clusters guests with K-Means and turns each segment into a
//! marketing recommendation. When a log holds too little numeric data it
//! falls back to hourly and device-type analytics.

pub mod analytics;
pub mod auth;
pub mod automation;
pub mod business;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod insights;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod splash;
pub mod viz;

// Re-export public items for easier access
pub use business::BusinessType;
pub use config::AppConfig;
pub use data::{load_dataset, resolve_path, upload};
pub use error::{Error, Result};
pub use features::{prepare, Dataset, Record};
pub use model::{
    fit_kmeans, segment, KMeansModel, Segmentation, SegmentationParams, SegmentationResult,
};
pub use pipeline::{analyze, Analysis, InsightReport};
