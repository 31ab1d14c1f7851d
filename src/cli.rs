//! Command-line interface definitions and argument parsing

use crate::business::BusinessType;
use crate::error::{Error, Result};
use crate::model::Feature;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Guest segmentation and analytics for captive-portal WiFi connection logs
#[derive(Parser, Debug)]
#[command(name = "wifi-insights")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "wifi_insights.toml", global = true)]
    pub config: PathBuf,

    /// Directory holding the per-business connection logs (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// User to sign in as
    #[arg(long, env = "WIFI_INSIGHTS_USER", global = true)]
    pub user: Option<String>,

    /// Password for --user
    #[arg(long, env = "WIFI_INSIGHTS_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cluster guest sessions and print segment recommendations
    Insights {
        /// Business type, e.g. restaurant or "business cafe"
        business: BusinessType,

        /// Number of clusters (2-5)
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Random seed for synthesis and K-Means initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Write SVG charts into this directory
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Assign an observation to a segment, e.g. "duration=45,hour_of_day=13"
        #[arg(long)]
        classify: Option<String>,
    },

    /// Hourly and device breakdown without clustering
    Analytics {
        business: BusinessType,

        /// Write SVG charts into this directory
        #[arg(long)]
        chart_dir: Option<PathBuf>,
    },

    /// Replace the connection log of a business type with a CSV file
    Upload {
        business: BusinessType,
        file: PathBuf,
    },

    /// Register a guest from the splash page
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        location: String,
    },

    /// List splash-page registrations
    Registrations,

    /// Manage marketing automation rules
    #[command(subcommand)]
    Automation(AutomationCommand),

    /// List business types and whether a dataset exists for each
    Businesses,
}

#[derive(Subcommand, Debug)]
pub enum AutomationCommand {
    /// Add a rule
    Add {
        /// on-connect, on-disconnect or after:<minutes>
        #[arg(long)]
        trigger: String,

        /// sms, email or webhook:<url>
        #[arg(long)]
        action: String,

        /// Message sent to the guest
        #[arg(long)]
        content: String,

        /// Restrict the rule to one business type
        #[arg(long)]
        business: Option<BusinessType>,
    },

    /// List rules
    List,

    /// Remove a rule by id or id prefix
    Remove { id: String },

    /// Show which rules would fire for a session event
    Test {
        /// connected, disconnected or elapsed:<minutes>
        #[arg(long)]
        event: String,

        #[arg(long)]
        business: Option<BusinessType>,
    },
}

/// Parse an observation given as comma-separated `feature=value` pairs
///
/// Expected format: "duration=45,hour_of_day=13,frequent_visitor=1"
pub fn parse_observation(input: &str) -> Result<BTreeMap<Feature, f64>> {
    let mut observation = BTreeMap::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = part.split_once('=').ok_or_else(|| {
            Error::InvalidInput(format!("expected feature=value, got '{}'", part))
        })?;
        let feature = Feature::from_column_name(name.trim())
            .ok_or_else(|| Error::InvalidInput(format!("unknown feature: {}", name.trim())))?;
        let value: f64 = value.trim().parse().map_err(|_| {
            Error::InvalidInput(format!("invalid {} value: {}", feature, value.trim()))
        })?;
        observation.insert(feature, value);
    }
    if observation.is_empty() {
        return Err(Error::InvalidInput("observation has no values".to_string()));
    }
    Ok(observation)
}
