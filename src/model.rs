//! Customer segmentation: feature selection, standardization and K-Means clustering

use crate::error::{Error, Result};
use crate::features::{Dataset, Record};
use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Smallest number of sessions worth clustering
pub const MIN_RECORDS: usize = 3;
/// Smallest number of varying features worth clustering
pub const MIN_FEATURES: usize = 2;
/// Allowed range for the operator-chosen cluster count
pub const CLUSTER_RANGE: std::ops::RangeInclusive<usize> = 2..=5;

const ZERO_VARIANCE: f64 = 1e-12;

/// Candidate clustering feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Duration,
    HourOfDay,
    FrequentVisitor,
}

impl Feature {
    pub const CANDIDATES: [Feature; 3] =
        [Feature::Duration, Feature::HourOfDay, Feature::FrequentVisitor];

    pub fn column_name(&self) -> &'static str {
        match self {
            Feature::Duration => "duration",
            Feature::HourOfDay => "hour_of_day",
            Feature::FrequentVisitor => "frequent_visitor",
        }
    }

    /// Value of this feature for a record, if known
    pub fn value(&self, record: &Record) -> Option<f64> {
        match self {
            Feature::Duration => record.duration,
            Feature::HourOfDay => record.hour_of_day.map(f64::from),
            Feature::FrequentVisitor => Some(f64::from(record.frequent_visitor)),
        }
    }

    pub fn from_column_name(name: &str) -> Option<Feature> {
        Feature::CANDIDATES
            .into_iter()
            .find(|f| f.column_name() == name.trim().to_lowercase())
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Clustering parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentationParams {
    pub clusters: usize,
    pub seed: u64,
    pub n_runs: usize,
    pub max_iters: u64,
    pub tolerance: f64,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            clusters: 3,
            seed: 42,
            n_runs: 10,
            max_iters: 300,
            tolerance: 1e-4,
        }
    }
}

impl SegmentationParams {
    pub fn validate(&self) -> Result<()> {
        if !CLUSTER_RANGE.contains(&self.clusters) {
            return Err(Error::InvalidClusterCount(self.clusters));
        }
        if self.n_runs == 0 || self.max_iters == 0 || !(self.tolerance > 0.0) {
            return Err(Error::Config(
                "n_runs, max_iters and tolerance must all be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-feature standardization to zero mean and unit variance
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Fit on the columns of `data` using the population standard deviation
    pub fn fit(data: &Array2<f64>) -> Self {
        let n = data.nrows().max(1) as f64;
        let mean = data.sum_axis(Axis(0)) / n;
        let std = data
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(column, &m)| {
                let variance = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
                let std = variance.sqrt();
                if std > ZERO_VARIANCE {
                    std
                } else {
                    1.0
                }
            })
            .collect::<Array1<f64>>();
        Self { mean, std }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.mean) / &self.std
    }

    pub fn transform_row(&self, row: &Array1<f64>) -> Array1<f64> {
        (row - &self.mean) / &self.std
    }
}

/// K-Means model wrapper with fitted parameters
#[derive(Debug)]
pub struct KMeansModel {
    /// Fitted K-Means model from linfa
    pub model: KMeans<f64, L2Dist>,
    pub n_clusters: usize,
    /// Cluster assignments for the clustered rows
    pub labels: Array1<usize>,
    /// Cluster centroids in standardized space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares
    pub inertia: f64,
}

impl KMeansModel {
    /// Nearest centroid for a standardized observation
    pub fn predict(&self, features: &Array1<f64>) -> Result<usize> {
        if features.len() != self.centroids.ncols() {
            return Err(Error::InvalidInput(format!(
                "observation has {} features, model expects {}",
                features.len(),
                self.centroids.ncols()
            )));
        }

        let mut min_distance = f64::INFINITY;
        let mut closest_cluster = 0;
        for (cluster_idx, centroid) in self.centroids.outer_iter().enumerate() {
            let distance = euclidean_distance(&features.view(), &centroid);
            if distance < min_distance {
                min_distance = distance;
                closest_cluster = cluster_idx;
            }
        }

        Ok(closest_cluster)
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Mean silhouette coefficient over the first `sample_size` rows
    pub fn compute_silhouette_sample(&self, features: &Array2<f64>, sample_size: usize) -> f64 {
        let n_samples = features.nrows().min(sample_size);
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;
        for i in 0..n_samples {
            let point = features.row(i);
            let cluster_label = self.labels[i];

            let mut same_cluster_distances = Vec::new();
            let mut other_cluster_distances: Vec<Vec<f64>> = vec![Vec::new(); self.n_clusters];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }
                let distance = euclidean_distance(&point, &features.row(j));
                let other_label = self.labels[j];
                if other_label == cluster_label {
                    same_cluster_distances.push(distance);
                } else if other_label < self.n_clusters {
                    other_cluster_distances[other_label].push(distance);
                }
            }

            let a_i = if same_cluster_distances.is_empty() {
                0.0
            } else {
                same_cluster_distances.iter().sum::<f64>() / same_cluster_distances.len() as f64
            };

            let b_i = other_cluster_distances
                .iter()
                .filter(|distances| !distances.is_empty())
                .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
                .fold(f64::INFINITY, f64::min);

            // Singletons score 0
            let silhouette_i = if b_i.is_infinite()
                || same_cluster_distances.is_empty()
                || (a_i == 0.0 && b_i == 0.0)
            {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}

/// Cluster id for one dataset row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    /// Index into `Dataset::records`
    pub row: usize,
    pub cluster: usize,
}

/// Aggregate statistics for one cluster, in original (unstandardized) units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    /// Empty for a cluster with no members
    pub means: BTreeMap<Feature, f64>,
}

impl ClusterProfile {
    pub fn mean(&self, feature: Feature) -> Option<f64> {
        self.means.get(&feature).copied()
    }
}

/// Why clustering was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsufficientData {
    TooFewRecords { found: usize, required: usize },
    TooFewFeatures { usable: Vec<Feature>, required: usize },
    TooFewDistinctObservations { distinct: usize, clusters: usize },
}

impl fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsufficientData::TooFewRecords { found, required } => write!(
                f,
                "only {} complete records, at least {} needed",
                found, required
            ),
            InsufficientData::TooFewFeatures { usable, required } => {
                let names: Vec<&str> = usable.iter().map(|f| f.column_name()).collect();
                write!(
                    f,
                    "only {} varying numeric features ({}), at least {} needed",
                    usable.len(),
                    if names.is_empty() { "none".to_string() } else { names.join(", ") },
                    required
                )
            }
            InsufficientData::TooFewDistinctObservations { distinct, clusters } => write!(
                f,
                "only {} distinct observations for {} clusters",
                distinct, clusters
            ),
        }
    }
}

/// Clustered dataset
#[derive(Debug)]
pub struct SegmentationResult {
    /// Features used, in matrix column order
    pub features: Vec<Feature>,
    /// Dataset rows that were clustered, in matrix row order
    pub rows: Vec<usize>,
    pub raw: Array2<f64>,
    pub scaled: Array2<f64>,
    pub scaler: StandardScaler,
    pub model: KMeansModel,
    pub profiles: Vec<ClusterProfile>,
}

impl SegmentationResult {
    pub fn assignments(&self) -> Vec<ClusterAssignment> {
        self.rows
            .iter()
            .zip(self.model.labels.iter())
            .map(|(&row, &cluster)| ClusterAssignment { row, cluster })
            .collect()
    }

    /// Silhouette score over at most 200 rows
    pub fn silhouette(&self) -> f64 {
        self.model.compute_silhouette_sample(&self.scaled, 200)
    }

    /// Assign a new raw observation to a cluster
    ///
    /// Every feature used for clustering must be supplied.
    pub fn classify(&self, observation: &BTreeMap<Feature, f64>) -> Result<usize> {
        let values = self
            .features
            .iter()
            .map(|feature| {
                observation.get(feature).copied().ok_or_else(|| {
                    Error::InvalidInput(format!("missing value for feature '{}'", feature))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        let scaled = self.scaler.transform_row(&Array1::from(values));
        self.model.predict(&scaled)
    }
}

/// Outcome of segmentation; too little data is a normal outcome
#[derive(Debug)]
pub enum Segmentation {
    Clustered(SegmentationResult),
    Insufficient(InsufficientData),
}

/// Segment the sessions of a dataset
///
/// # Arguments
/// * `dataset` - Prepared dataset
/// * `params` - Cluster count (2-5), seed and convergence settings
///
/// # Returns
/// * `Segmentation::Insufficient` when fewer than 3 complete records or
///   fewer than 2 varying features remain, without fitting anything
pub fn segment(dataset: &Dataset, params: &SegmentationParams) -> Result<Segmentation> {
    params.validate()?;

    // Candidates with at least one value
    let present: Vec<Feature> = Feature::CANDIDATES
        .into_iter()
        .filter(|f| dataset.records.iter().any(|r| f.value(r).is_some()))
        .collect();

    // Complete rows over the present features
    let rows: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| present.iter().all(|f| f.value(r).is_some()))
        .map(|(i, _)| i)
        .collect();

    // Constant columns break standardization
    let features: Vec<Feature> = present
        .into_iter()
        .filter(|f| {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|&i| f.value(&dataset.records[i]))
                .collect();
            let keep = variance(&values) > ZERO_VARIANCE;
            if !keep {
                debug!("Dropping constant feature '{}'", f);
            }
            keep
        })
        .collect();

    if rows.len() < MIN_RECORDS {
        return Ok(Segmentation::Insufficient(InsufficientData::TooFewRecords {
            found: rows.len(),
            required: MIN_RECORDS,
        }));
    }
    if features.len() < MIN_FEATURES {
        return Ok(Segmentation::Insufficient(InsufficientData::TooFewFeatures {
            usable: features,
            required: MIN_FEATURES,
        }));
    }

    let raw = feature_matrix(dataset, &rows, &features)?;
    let distinct = count_distinct_rows(&raw);
    if distinct < params.clusters {
        return Ok(Segmentation::Insufficient(
            InsufficientData::TooFewDistinctObservations {
                distinct,
                clusters: params.clusters,
            },
        ));
    }

    debug!(
        "Clustering {} records on [{}] into {} clusters",
        rows.len(),
        features.iter().map(|f| f.column_name()).collect::<Vec<_>>().join(", "),
        params.clusters
    );

    let scaler = StandardScaler::fit(&raw);
    let scaled = scaler.transform(&raw);
    let model = fit_kmeans(&scaled, params)?;
    let profiles = cluster_profiles(&raw, &features, &model.labels, params.clusters);

    info!(
        "Fitted {} clusters over {} records (inertia {:.3})",
        params.clusters,
        rows.len(),
        model.inertia
    );

    Ok(Segmentation::Clustered(SegmentationResult {
        features,
        rows,
        raw,
        scaled,
        scaler,
        model,
        profiles,
    }))
}

/// Fit K-Means on standardized features with a fixed seed
pub fn fit_kmeans(features: &Array2<f64>, params: &SegmentationParams) -> Result<KMeansModel> {
    params.validate()?;
    if features.nrows() < params.clusters {
        return Err(Error::Clustering(format!(
            "number of data points ({}) must be at least equal to number of clusters ({})",
            features.nrows(),
            params.clusters
        )));
    }

    let dataset = DatasetBase::from(features.clone());
    let rng = Xoshiro256Plus::seed_from_u64(params.seed);
    let model = KMeans::params_with(params.clusters, rng, L2Dist)
        .n_runs(params.n_runs)
        .max_n_iterations(params.max_iters)
        .tolerance(params.tolerance)
        .fit(&dataset)?;

    let labels: Array1<usize> = model.predict(features);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(features, &labels, &centroids);

    Ok(KMeansModel {
        model,
        n_clusters: params.clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Per-cluster size and feature means in original units
pub fn cluster_profiles(
    raw: &Array2<f64>,
    features: &[Feature],
    labels: &Array1<usize>,
    n_clusters: usize,
) -> Vec<ClusterProfile> {
    (0..n_clusters)
        .map(|cluster| {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|&(_, &label)| label == cluster)
                .map(|(i, _)| i)
                .collect();
            let means = if members.is_empty() {
                BTreeMap::new()
            } else {
                features
                    .iter()
                    .enumerate()
                    .map(|(col, &feature)| {
                        let sum: f64 = members.iter().map(|&i| raw[[i, col]]).sum();
                        (feature, sum / members.len() as f64)
                    })
                    .collect()
            };
            ClusterProfile {
                cluster,
                size: members.len(),
                means,
            }
        })
        .collect()
}

fn feature_matrix(dataset: &Dataset, rows: &[usize], features: &[Feature]) -> Result<Array2<f64>> {
    let values: Vec<f64> = rows
        .iter()
        .flat_map(|&i| {
            let record = &dataset.records[i];
            features.iter().map(move |f| f.value(record).unwrap_or(0.0))
        })
        .collect();
    Ok(Array2::from_shape_vec((rows.len(), features.len()), values)?)
}

fn count_distinct_rows(data: &Array2<f64>) -> usize {
    data.outer_iter()
        .map(|row| row.iter().map(|v| v.to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    let mut inertia = 0.0;
    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let distance = euclidean_distance(&features.row(i), &centroids.row(cluster));
            inertia += distance.powi(2);
        }
    }
    inertia
}

fn euclidean_distance(point1: &ArrayView1<f64>, point2: &ArrayView1<f64>) -> f64 {
    point1
        .iter()
        .zip(point2.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::BusinessType;
    use chrono::NaiveDate;

    fn at_hour(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(hour, 15, 0)
            .unwrap()
    }

    fn session(duration: f64, hour: u32, returning: bool) -> Record {
        Record::default()
            .with_duration(duration)
            .with_timestamp(at_hour(hour))
            .with_frequent_visitor(returning)
    }

    fn ten_sessions() -> Dataset {
        Dataset::from_records(
            BusinessType::Restaurant,
            vec![
                session(5.0, 8, false),
                session(7.0, 9, false),
                session(6.0, 8, true),
                session(45.0, 13, false),
                session(50.0, 12, true),
                session(48.0, 13, false),
                session(120.0, 19, true),
                session(110.0, 20, true),
                session(130.0, 21, true),
                session(115.0, 20, false),
            ],
        )
    }

    #[test]
    fn test_standard_scaler_zero_mean_unit_variance() {
        let data =
            Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
                .unwrap();
        let scaler = StandardScaler::fit(&data);
        let scaled = scaler.transform(&data);
        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.sum() / 4.0;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ten_rows_three_clusters() {
        let dataset = ten_sessions();
        let params = SegmentationParams::default();
        let result = match segment(&dataset, &params).unwrap() {
            Segmentation::Clustered(result) => result,
            Segmentation::Insufficient(reason) => panic!("unexpected: {reason}"),
        };

        assert_eq!(result.profiles.len(), 3);
        assert_eq!(result.profiles.iter().map(|p| p.size).sum::<usize>(), 10);
        assert_eq!(result.assignments().len(), 10);
        assert!(result.assignments().iter().all(|a| a.cluster < 3));
        assert_eq!(
            result.features,
            vec![Feature::Duration, Feature::HourOfDay, Feature::FrequentVisitor]
        );
        assert!(result.model.inertia.is_finite());
        assert!(result.model.inertia >= 0.0);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let dataset = ten_sessions();
        let params = SegmentationParams { clusters: 4, ..Default::default() };
        let first = match segment(&dataset, &params).unwrap() {
            Segmentation::Clustered(r) => r.assignments(),
            _ => panic!("expected clusters"),
        };
        let second = match segment(&dataset, &params).unwrap() {
            Segmentation::Clustered(r) => r.assignments(),
            _ => panic!("expected clusters"),
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_profile_means_weight_back_to_overall_mean() {
        let dataset = ten_sessions();
        let result = match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Clustered(r) => r,
            _ => panic!("expected clusters"),
        };
        let n = result.rows.len() as f64;
        for (col, &feature) in result.features.iter().enumerate() {
            let overall = result.raw.column(col).sum() / n;
            let weighted: f64 = result
                .profiles
                .iter()
                .filter_map(|p| p.mean(feature).map(|m| m * p.size as f64))
                .sum::<f64>()
                / n;
            assert!((overall - weighted).abs() < 1e-9, "{feature}: {overall} vs {weighted}");
        }
    }

    #[test]
    fn test_two_rows_is_insufficient() {
        let dataset = Dataset::from_records(
            BusinessType::Hospital,
            vec![session(5.0, 8, false), session(60.0, 14, true)],
        );
        match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Insufficient(InsufficientData::TooFewRecords { found, required }) => {
                assert_eq!(found, 2);
                assert_eq!(required, 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_constant_features_are_dropped_before_feature_check() {
        // Hour and visitor flag are constant; only duration varies
        let records = (0..6)
            .map(|i| session(10.0 + i as f64, 9, false))
            .collect();
        let dataset = Dataset::from_records(BusinessType::Boutique, records);
        match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Insufficient(InsufficientData::TooFewFeatures { usable, .. }) => {
                assert_eq!(usable, vec![Feature::Duration]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_constant_feature_excluded_but_clustering_proceeds() {
        let records = vec![
            session(5.0, 8, true),
            session(6.0, 9, true),
            session(60.0, 18, true),
            session(65.0, 19, true),
            session(30.0, 12, true),
            session(31.0, 13, true),
        ];
        let dataset = Dataset::from_records(BusinessType::Supermarket, records);
        match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Clustered(result) => {
                assert_eq!(result.features, vec![Feature::Duration, Feature::HourOfDay]);
                assert!(result.profiles.iter().all(|p| p.mean(Feature::FrequentVisitor).is_none()));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let mut records: Vec<Record> = ten_sessions().records;
        records.push(Record::default().with_duration(12.0));
        records.push(Record::default().with_timestamp(at_hour(10)));
        let dataset = Dataset::from_records(BusinessType::Restaurant, records);
        match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Clustered(result) => {
                assert_eq!(result.rows, (0..10).collect::<Vec<_>>());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_fewer_distinct_points_than_clusters() {
        let records = vec![
            session(5.0, 8, false),
            session(5.0, 8, false),
            session(50.0, 18, true),
            session(50.0, 18, true),
        ];
        let dataset = Dataset::from_records(BusinessType::Restaurant, records);
        let params = SegmentationParams { clusters: 3, ..Default::default() };
        match segment(&dataset, &params).unwrap() {
            Segmentation::Insufficient(InsufficientData::TooFewDistinctObservations {
                distinct,
                clusters,
            }) => {
                assert_eq!(distinct, 2);
                assert_eq!(clusters, 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_cluster_count() {
        let dataset = ten_sessions();
        for clusters in [1, 6] {
            let params = SegmentationParams { clusters, ..Default::default() };
            assert!(matches!(
                segment(&dataset, &params),
                Err(Error::InvalidClusterCount(c)) if c == clusters
            ));
        }
    }

    #[test]
    fn test_classify_new_session() {
        let dataset = ten_sessions();
        let result = match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Clustered(r) => r,
            _ => panic!("expected clusters"),
        };
        // A training row must land in its own cluster
        let first = &dataset.records[0];
        let observation: BTreeMap<Feature, f64> = result
            .features
            .iter()
            .map(|&f| (f, f.value(first).unwrap()))
            .collect();
        assert_eq!(result.classify(&observation).unwrap(), result.model.labels[0]);

        let partial = BTreeMap::from([(Feature::Duration, 10.0)]);
        assert!(result.classify(&partial).is_err());
    }

    #[test]
    fn test_cluster_sizes_and_silhouette() {
        let dataset = ten_sessions();
        let result = match segment(&dataset, &SegmentationParams::default()).unwrap() {
            Segmentation::Clustered(r) => r,
            _ => panic!("expected clusters"),
        };
        let sizes = result.model.cluster_sizes();
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        let silhouette = result.silhouette();
        assert!((-1.0..=1.0).contains(&silhouette));
    }

    #[test]
    fn test_cluster_profiles_empty_cluster() {
        let raw = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let labels = Array1::from(vec![0, 0]);
        let profiles = cluster_profiles(&raw, &[Feature::Duration, Feature::HourOfDay], &labels, 2);
        assert_eq!(profiles[0].mean(Feature::Duration), Some(2.0));
        assert_eq!(profiles[0].mean(Feature::HourOfDay), Some(3.0));
        assert_eq!(profiles[1].size, 0);
        assert!(profiles[1].means.is_empty());
    }

    #[test]
    fn test_feature_from_column_name() {
        assert_eq!(Feature::from_column_name("Hour_Of_Day"), Some(Feature::HourOfDay));
        assert_eq!(Feature::from_column_name("signal"), None);
    }
}
