//! Application configuration

use crate::auth::{Role, UserEntry};
use crate::error::{Error, Result};
use crate::features::DEFAULT_RETURNING_PROBABILITY;
use crate::model::{SegmentationParams, CLUSTER_RANGE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `{business_type}.csv` connection logs
    pub data_dir: PathBuf,

    /// CSV file receiving guest splash-page registrations
    pub registrations_file: PathBuf,

    /// JSON file holding automation rules
    pub rules_file: PathBuf,

    pub segmentation: SegmentationConfig,

    pub upload: UploadConfig,

    /// Credential table
    pub users: Vec<UserEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("connection_logs"),
            registrations_file: PathBuf::from("connection_logs/registrations.csv"),
            rules_file: PathBuf::from("automation_rules.json"),
            segmentation: SegmentationConfig::default(),
            upload: UploadConfig::default(),
            users: vec![
                UserEntry::new("admin", "admin123", Role::Admin),
                UserEntry::new("guest", "guest123", Role::Guest),
            ],
        }
    }
}

/// Clustering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub default_clusters: usize,
    pub seed: u64,
    /// Number of K-Means initializations
    pub n_runs: usize,
    pub max_iters: u64,
    pub tolerance: f64,
    /// Probability of a synthesized returning guest
    pub returning_probability: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        let params = SegmentationParams::default();
        Self {
            default_clusters: params.clusters,
            seed: params.seed,
            n_runs: params.n_runs,
            max_iters: params.max_iters,
            tolerance: params.tolerance,
            returning_probability: DEFAULT_RETURNING_PROBABILITY,
        }
    }
}

impl SegmentationConfig {
    /// Clustering parameters, with an optional cluster count override
    pub fn params(&self, clusters: Option<usize>) -> SegmentationParams {
        SegmentationParams {
            clusters: clusters.unwrap_or(self.default_clusters),
            seed: self.seed,
            n_runs: self.n_runs,
            max_iters: self.max_iters,
            tolerance: self.tolerance,
        }
    }
}

/// Upload validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Columns an uploaded log must contain
    pub required_columns: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            required_columns: vec![
                "timestamp".to_string(),
                "device_type".to_string(),
                "duration".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let seg = &self.segmentation;
        if !CLUSTER_RANGE.contains(&seg.default_clusters) {
            return Err(Error::Config(format!(
                "default_clusters must be between 2 and 5, got {}",
                seg.default_clusters
            )));
        }
        if !(0.0..=1.0).contains(&seg.returning_probability) {
            return Err(Error::Config(format!(
                "returning_probability must be within [0, 1], got {}",
                seg.returning_probability
            )));
        }
        seg.params(None).validate()?;
        if self.users.iter().any(|u| u.username.trim().is_empty()) {
            return Err(Error::Config("user entries need a username".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.segmentation.default_clusters, 3);
        assert_eq!(config.segmentation.seed, 42);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.data_dir = PathBuf::from("/srv/logs");
        config.segmentation.default_clusters = 4;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = \"logs\"\n[segmentation]\nseed = 7\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("logs"));
        assert_eq!(config.segmentation.seed, 7);
        assert_eq!(config.segmentation.n_runs, 10);
        assert_eq!(config.users.len(), 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[segmentation]\ndefault_clusters = 9\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[segmentation]\nreturning_probability = 1.5\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(Error::Config(_))));
    }
}
