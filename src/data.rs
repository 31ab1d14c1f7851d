//! Data loading and dataset upload using Polars

use crate::business::BusinessType;
use crate::error::{Error, Result};
use crate::features::{self, Dataset, ALT_DURATION_COLUMN, DURATION_COLUMN, RECOGNIZED_COLUMNS};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use rand::Rng;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Availability of the dataset for one business type
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatasetStatus {
    pub business_type: BusinessType,
    pub path: PathBuf,
    pub present: bool,
}

/// Resolve the dataset file for a business type
pub fn resolve_path(data_dir: &Path, business_type: BusinessType) -> PathBuf {
    business_type.dataset_path(data_dir)
}

/// Report which business types currently have a dataset on disk
pub fn dataset_status(data_dir: &Path) -> Vec<DatasetStatus> {
    BusinessType::ALL
        .into_iter()
        .map(|business_type| {
            let path = resolve_path(data_dir, business_type);
            let present = path.is_file();
            DatasetStatus {
                business_type,
                path,
                present,
            }
        })
        .collect()
}

/// Read a CSV file with a header row and normalize its column names
///
/// Column names are trimmed and lower-cased so that `signal_strength_dBm`
/// and `Signal_Strength_DBM` address the same column.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let parse_error = |reason: String| Error::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let mut frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| parse_error(e.to_string()))?;

    let names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_lowercase())
        .collect();
    frame
        .set_column_names(names.as_slice())
        .map_err(|e| parse_error(e.to_string()))?;

    Ok(frame)
}

/// Load a connection log, rejecting files with no column the pipeline can use
pub fn load_frame(path: &Path) -> Result<DataFrame> {
    let frame = read_frame(path)?;
    let usable = column_names(&frame)
        .iter()
        .any(|name| RECOGNIZED_COLUMNS.contains(&name.as_str()));
    if !usable || frame.width() == 0 {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            reason: "no usable columns".to_string(),
        });
    }
    debug!(
        "Loaded {} rows x {} columns from {}",
        frame.height(),
        frame.width(),
        path.display()
    );
    Ok(frame)
}

/// Load and prepare the dataset for a business type
///
/// # Arguments
/// * `data_dir` - Directory holding `{business_type}.csv` files
/// * `business_type` - Dataset to load
/// * `rng` - Random source for synthesized features
/// * `returning_probability` - Used when the log lacks a frequent-visitor column
pub fn load_dataset<R: Rng + ?Sized>(
    data_dir: &Path,
    business_type: BusinessType,
    rng: &mut R,
    returning_probability: f64,
) -> Result<Dataset> {
    let path = resolve_path(data_dir, business_type);
    if !path.is_file() {
        return Err(Error::NotFound {
            business_type: business_type.to_string(),
            path,
        });
    }

    let frame = load_frame(&path)?;
    let dataset = features::prepare(&frame, business_type, rng, returning_probability);
    info!(
        "Loaded {} records for {}",
        dataset.len(),
        business_type.title()
    );
    Ok(dataset)
}

/// Required columns absent from `columns`, sorted by name
///
/// The alternate duration column satisfies a `duration` requirement.
pub fn missing_columns(columns: &[String], required: &[String]) -> Vec<String> {
    let mut missing: Vec<String> = required
        .iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| {
            let present = columns.contains(name)
                || (name == DURATION_COLUMN && columns.iter().any(|c| c == ALT_DURATION_COLUMN));
            !present
        })
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

/// Validate an uploaded CSV and store it as the dataset for a business type
///
/// The file replaces any previous dataset atomically: it is written to a
/// temporary file beside the target and renamed into place. A rejected
/// upload leaves the existing dataset untouched.
pub fn upload(
    source: &Path,
    data_dir: &Path,
    business_type: BusinessType,
    required: &[String],
) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(Error::InvalidInput(format!(
            "upload source {} does not exist",
            source.display()
        )));
    }

    let frame = read_frame(source)?;
    let missing = missing_columns(&column_names(&frame), required);
    if !missing.is_empty() {
        return Err(Error::MissingColumns { missing });
    }

    fs::create_dir_all(data_dir)?;
    let target = resolve_path(data_dir, business_type);
    let mut staged = NamedTempFile::new_in(data_dir)?;
    io::copy(&mut File::open(source)?, &mut staged)?;
    staged.as_file().sync_all()?;
    staged.persist(&target).map_err(|e| Error::Io(e.error))?;

    info!(
        "Stored {} rows for {} at {}",
        frame.height(),
        business_type.title(),
        target.display()
    );
    Ok(target)
}

fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}
