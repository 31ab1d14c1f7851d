//! Load → prepare → segment → report, once per request

use crate::analytics::{self, FallbackReport};
use crate::business::BusinessType;
use crate::config::AppConfig;
use crate::data;
use crate::error::Result;
use crate::features::{ColumnPresence, Dataset};
use crate::insights::{self, Insight};
use crate::model::{
    self, ClusterProfile, Feature, InsufficientData, Segmentation, SegmentationParams,
    SegmentationResult,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::Serialize;
use tracing::{info, warn};

/// Clustering summary with recommendations
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub business_type: BusinessType,
    pub record_count: usize,
    pub clustered_records: usize,
    pub features: Vec<Feature>,
    pub clusters: usize,
    pub inertia: f64,
    pub silhouette: f64,
    pub profiles: Vec<ClusterProfile>,
    pub insights: Vec<Insight>,
    pub columns: ColumnPresence,
}

/// Result of analysing one business type
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Analysis {
    Segmented {
        report: InsightReport,
        #[serde(skip)]
        result: Box<SegmentationResult>,
    },
    Fallback {
        reason: InsufficientData,
        report: FallbackReport,
    },
}

/// Segment a prepared dataset, falling back to descriptive analytics
pub fn analyze(dataset: &Dataset, params: &SegmentationParams) -> Result<Analysis> {
    match model::segment(dataset, params)? {
        Segmentation::Clustered(result) => {
            let insights = insights::recommend(&result.profiles, dataset.business_type);
            let report = InsightReport {
                business_type: dataset.business_type,
                record_count: dataset.len(),
                clustered_records: result.rows.len(),
                features: result.features.clone(),
                clusters: params.clusters,
                inertia: result.model.inertia,
                silhouette: result.silhouette(),
                profiles: result.profiles.clone(),
                insights,
                columns: dataset.columns.clone(),
            };
            Ok(Analysis::Segmented {
                report,
                result: Box::new(result),
            })
        }
        Segmentation::Insufficient(reason) => {
            warn!(
                "Not enough numeric data to cluster {}: {}",
                dataset.business_type.title(),
                reason
            );
            Ok(Analysis::Fallback {
                reason,
                report: analytics::fallback_report(dataset),
            })
        }
    }
}

/// Load the dataset for a business type using the configured data directory and seed
pub fn load(config: &AppConfig, business_type: BusinessType) -> Result<Dataset> {
    // Same seed for synthesis and clustering keeps a request reproducible
    let mut rng = Xoshiro256Plus::seed_from_u64(config.segmentation.seed);
    data::load_dataset(
        &config.data_dir,
        business_type,
        &mut rng,
        config.segmentation.returning_probability,
    )
}

/// Full request: load, prepare and analyse
pub fn run(
    config: &AppConfig,
    business_type: BusinessType,
    params: &SegmentationParams,
) -> Result<(Dataset, Analysis)> {
    let dataset = load(config, business_type)?;
    let analysis = analyze(&dataset, params)?;
    if let Analysis::Segmented { report, .. } = &analysis {
        info!(
            "{}: {} clusters over {} of {} records",
            business_type.title(),
            report.clusters,
            report.clustered_records,
            report.record_count
        );
    }
    Ok((dataset, analysis))
}
