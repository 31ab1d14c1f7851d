//! Output formatting for the CLI

use crate::analytics::FallbackReport;
use crate::automation::AutomationRule;
use crate::data::DatasetStatus;
use crate::error::Result;
use crate::model::InsufficientData;
use crate::pipeline::InsightReport;
use crate::splash::GuestRegistration;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use std::io::Write;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON
    Json,
}

/// Items that can be displayed as table rows
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Write a value as pretty-printed JSON followed by a newline
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write a list of items as a table or a JSON array
pub fn write_list<W, T>(out: &mut W, items: &[T], format: OutputFormat) -> Result<()>
where
    W: Write,
    T: Serialize + TableDisplay,
{
    match format {
        OutputFormat::Json => write_json(out, items)?,
        OutputFormat::Table => {
            if items.is_empty() {
                writeln!(out, "No items found.")?;
                return Ok(());
            }
            let mut table = new_table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            writeln!(out, "{table}")?;
        }
    }
    Ok(())
}

/// Render a clustering report as tables
pub fn render_insight_report(report: &InsightReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {} of {} records clustered on {}\n",
        report.business_type.title(),
        report.clustered_records,
        report.record_count,
        report
            .features
            .iter()
            .map(|f| f.column_name())
            .collect::<Vec<_>>()
            .join(", ")
    ));

    let mut headers = vec!["Cluster".to_string(), "Size".to_string()];
    headers.extend(report.features.iter().map(|f| format!("Mean {}", f)));
    let mut profiles = new_table();
    profiles.set_header(headers);
    for profile in &report.profiles {
        let mut row = vec![profile.cluster.to_string(), profile.size.to_string()];
        row.extend(report.features.iter().map(|&f| {
            profile
                .mean(f)
                .map(|m| format!("{:.2}", m))
                .unwrap_or_else(|| "-".to_string())
        }));
        profiles.add_row(row);
    }
    out.push_str(&format!("{profiles}\n"));

    let mut insights = new_table();
    insights.set_header(vec!["Cluster", "Segment", "Recommendation"]);
    for insight in &report.insights {
        insights.add_row(vec![
            insight.cluster.to_string(),
            insight.label.clone(),
            insight.recommendation.clone(),
        ]);
    }
    out.push_str(&format!("{insights}\n"));
    out.push_str(&format!(
        "Inertia: {:.3}  Silhouette (sample): {:.3}\n",
        report.inertia, report.silhouette
    ));
    if report.columns.frequent_visitor == crate::features::VisitorSource::Synthesized {
        out.push_str("Note: frequent_visitor was synthesized at random, not measured.\n");
    }
    out
}

/// Render the clustering fallback: the reason followed by the analytics tables
pub fn render_fallback_report(reason: &InsufficientData, report: &FallbackReport) -> String {
    format!(
        "Not enough numeric data for clustering ({}). Showing simple analytics instead.\n{}",
        reason,
        render_analytics(report)
    )
}

/// Render descriptive analytics as tables with text bars
pub fn render_analytics(report: &FallbackReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {} records\n",
        report.business_type.title(),
        report.record_count
    ));

    let mut summary = new_table();
    summary.set_header(vec!["Metric", "Value"]);
    let metrics = [
        ("Mean duration (min)", report.mean_duration),
        ("Weekend share", report.weekend_share),
        ("Returning share", report.returning_share),
    ];
    for (name, value) in metrics {
        if let Some(value) = value {
            summary.add_row(vec![name.to_string(), format!("{:.2}", value)]);
        }
    }
    out.push_str(&format!("{summary}\n"));

    if let Some(hourly) = &report.hourly_connections {
        let max = hourly.iter().copied().max().unwrap_or(0).max(1);
        let mut table = new_table();
        table.set_header(vec!["Hour", "Connections", ""]);
        for (hour, &count) in hourly.iter().enumerate().filter(|&(_, &c)| c > 0) {
            table.add_row(vec![format!("{:02}:00", hour), count.to_string(), bar(count, max)]);
        }
        out.push_str(&format!("Connection frequency by hour\n{table}\n"));
    }

    if let Some(devices) = &report.devices {
        let mut table = new_table();
        table.set_header(vec!["Device type", "Connections", "Share"]);
        for device in devices {
            table.add_row(vec![
                device.device_type.clone(),
                device.count.to_string(),
                format!("{:.1}%", device.share * 100.0),
            ]);
        }
        out.push_str(&format!("Device type distribution\n{table}\n"));
    }
    out
}

fn bar(count: usize, max: usize) -> String {
    const WIDTH: usize = 30;
    "█".repeat((count * WIDTH).div_ceil(max))
}

impl TableDisplay for DatasetStatus {
    fn headers() -> Vec<&'static str> {
        vec!["Business type", "Dataset", "Present"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.business_type.title().to_string(),
            self.path.display().to_string(),
            if self.present { "yes" } else { "no" }.to_string(),
        ]
    }
}

impl TableDisplay for AutomationRule {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Business", "Trigger", "Action", "Content"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string()[..8].to_string(),
            self.business_type
                .map(|b| b.title().to_string())
                .unwrap_or_else(|| "all".to_string()),
            self.trigger.to_string(),
            self.action.to_string(),
            self.content.clone(),
        ]
    }
}

impl TableDisplay for GuestRegistration {
    fn headers() -> Vec<&'static str> {
        vec!["Connected at", "Email", "Phone", "Location"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.connected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.email.clone(),
            self.phone.clone(),
            self.location.clone(),
        ]
    }
}

/// Write success message
pub fn write_success<W: Write>(out: &mut W, message: &str) -> Result<()> {
    writeln!(out, "✅ {}", message)?;
    Ok(())
}

/// Write warning message
pub fn write_warning<W: Write>(out: &mut W, message: &str) -> Result<()> {
    writeln!(out, "⚠️  {}", message)?;
    Ok(())
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
