//! SVG charts for segmentation results and fallback analytics using Plotters

use crate::analytics::FallbackReport;
use crate::business::BusinessType;
use crate::error::{Error, Result};
use crate::model::SegmentationResult;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, RGBColor(230, 159, 0), MAGENTA];

fn cluster_color(cluster: usize) -> RGBColor {
    CLUSTER_COLORS.get(cluster).copied().unwrap_or(BLACK)
}

/// Value range covering `values` with a margin on both sides
pub fn padded_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = ((max - min) * 0.1).max(0.5);
    (min - pad)..(max + pad)
}

/// Scatter of the first two clustering features, colored by cluster, with centroids
pub fn create_cluster_scatter(
    result: &SegmentationResult,
    business_type: BusinessType,
    output_path: &Path,
) -> Result<()> {
    draw_cluster_scatter(result, business_type, output_path)
        .map_err(|e| Error::Chart(e.to_string()))?;
    info!("Cluster scatter saved to: {}", output_path.display());
    Ok(())
}

fn draw_cluster_scatter(
    result: &SegmentationResult,
    business_type: BusinessType,
    output_path: &Path,
) -> DrawResult {
    let x_values: Vec<f64> = result.raw.column(0).to_vec();
    let y_values: Vec<f64> = result.raw.column(1).to_vec();
    let x_name = result.features[0].column_name();
    let y_name = result.features[1].column_name();

    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} guest segments: {} vs {}", business_type.title(), x_name, y_name),
            ("sans-serif", 26),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(padded_range(&x_values), padded_range(&y_values))?;

    chart
        .configure_mesh()
        .x_desc(x_name)
        .y_desc(y_name)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for ((&x, &y), &cluster) in x_values.iter().zip(&y_values).zip(result.model.labels.iter()) {
        let color = cluster_color(cluster);
        chart.draw_series(std::iter::once(Circle::new((x, y), 4, color.filled())))?;
    }

    let x_span = padded_range(&x_values);
    let y_span = padded_range(&y_values);
    let (dx, dy) = (
        (x_span.end - x_span.start) * 0.01,
        (y_span.end - y_span.start) * 0.01,
    );

    // Centroids back in original units
    for (cluster, centroid) in result.model.centroids.outer_iter().enumerate() {
        let cx = centroid[0] * result.scaler.std[0] + result.scaler.mean[0];
        let cy = centroid[1] * result.scaler.std[1] + result.scaler.mean[1];
        let color = cluster_color(cluster);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(cx - dx, cy - dy), (cx + dx, cy + dy)],
                color.filled(),
            )))?
            .label(format!("Cluster {}", cluster))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Bar chart of records per cluster
pub fn create_cluster_size_chart(sizes: &[usize], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, usize)> = sizes
        .iter()
        .enumerate()
        .map(|(cluster, &size)| (format!("Cluster {}", cluster), size))
        .collect();
    draw_bar_chart("Cluster sizes", "Sessions", &bars, true, output_path)
        .map_err(|e| Error::Chart(e.to_string()))?;
    info!("Cluster size chart saved to: {}", output_path.display());
    Ok(())
}

/// Bar chart of connections per hour of day
pub fn create_hourly_chart(hourly: &[usize; 24], output_path: &Path) -> Result<()> {
    let bars: Vec<(String, usize)> = hourly
        .iter()
        .enumerate()
        .map(|(hour, &count)| (format!("{:02}", hour), count))
        .collect();
    draw_bar_chart("Connection frequency by hour", "Connections", &bars, false, output_path)
        .map_err(|e| Error::Chart(e.to_string()))?;
    info!("Hourly chart saved to: {}", output_path.display());
    Ok(())
}

/// Bar chart of connections per device type
pub fn create_device_chart(devices: &[(String, usize)], output_path: &Path) -> Result<()> {
    draw_bar_chart("Device type distribution", "Connections", devices, true, output_path)
        .map_err(|e| Error::Chart(e.to_string()))?;
    info!("Device chart saved to: {}", output_path.display());
    Ok(())
}

fn draw_bar_chart(
    title: &str,
    y_desc: &str,
    bars: &[(String, usize)],
    colored: bool,
    output_path: &Path,
) -> DrawResult {
    let max = bars.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1) as f64;
    let n = bars.len().max(1);

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..(max * 1.1))?;

    let label_for = |x: &f64| {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        bars.get(rounded as usize)
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_for)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, (_, value)) in bars.iter().enumerate() {
        let color = if colored { cluster_color(i % CLUSTER_COLORS.len()) } else { BLUE };
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, *value as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Scatter and size charts for a segmentation; returns the written files
pub fn render_segmentation_charts(
    result: &SegmentationResult,
    business_type: BusinessType,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let scatter = output_dir.join(format!("{}_clusters.svg", business_type.slug()));
    let sizes = output_dir.join(format!("{}_cluster_sizes.svg", business_type.slug()));

    create_cluster_scatter(result, business_type, &scatter)?;
    create_cluster_size_chart(&result.model.cluster_sizes(), &sizes)?;
    Ok(vec![scatter, sizes])
}

/// Hourly and device charts for whatever the fallback report contains
pub fn render_fallback_charts(report: &FallbackReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let slug = report.business_type.slug();
    let mut written = Vec::new();

    if let Some(hourly) = &report.hourly_connections {
        let path = output_dir.join(format!("{}_hourly.svg", slug));
        create_hourly_chart(hourly, &path)?;
        written.push(path);
    }
    if let Some(devices) = &report.devices {
        let bars: Vec<(String, usize)> = devices
            .iter()
            .map(|d| (d.device_type.clone(), d.count))
            .collect();
        let path = output_dir.join(format!("{}_devices.svg", slug));
        create_device_chart(&bars, &path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_padded_range() {
        let range = padded_range(&[0.0, 10.0]);
        assert_eq!(range, -1.0..11.0);

        // Constant values still get a visible range
        let range = padded_range(&[3.0, 3.0]);
        assert_eq!(range, 2.5..3.5);

        assert_eq!(padded_range(&[]), 0.0..1.0);
    }

    #[test]
    fn test_cluster_color_fallback() {
        assert_eq!(cluster_color(0).rgb(), RED.rgb());
        assert_eq!(cluster_color(42).rgb(), BLACK.rgb());
    }

    #[test]
    fn test_create_cluster_size_chart() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("sizes.svg");

        create_cluster_size_chart(&[4, 3, 3], &output_path).unwrap();
        let svg = std::fs::read_to_string(&output_path).unwrap();
        assert!(svg.contains("<svg"));
    }
}
