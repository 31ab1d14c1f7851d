//! Command handlers behind the CLI
//!
//! Every handler receives the signed-in [`RequestContext`] and writes its
//! result to an output sink, so the role checks and both output formats can
//! be exercised without a terminal. Diagnostics go through `tracing`, never
//! to the sink.

use crate::analytics::fallback_report;
use crate::auth::{CredentialStore, RequestContext};
use crate::automation::{Action, AutomationRule, RuleStore, SessionEvent, Trigger};
use crate::cli::{parse_observation, AutomationCommand, Command};
use crate::config::AppConfig;
use crate::data;
use crate::error::{Error, Result};
use crate::output::{self, OutputFormat};
use crate::pipeline::{self, Analysis};
use crate::splash::{self, GuestRegistration};
use crate::viz;
use serde::Serialize;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Options of the `insights` command
#[derive(Debug, Clone, Default)]
pub struct InsightsRequest {
    pub clusters: Option<usize>,
    pub seed: Option<u64>,
    pub chart_dir: Option<PathBuf>,
    pub classify: Option<String>,
}

/// Segment an observation was assigned to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub cluster: usize,
    pub label: String,
}

/// JSON document printed by `insights`
#[derive(Debug, Serialize)]
struct InsightsOutput<'a> {
    analysis: &'a Analysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<Classification>,
    charts: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct UploadOutput<'a> {
    business_type: crate::business::BusinessType,
    path: &'a Path,
}

/// Sign in with the configured credential table
pub fn sign_in(
    config: &AppConfig,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<RequestContext> {
    let (Some(user), Some(password)) = (user, password) else {
        return Err(Error::Unauthorized);
    };
    CredentialStore::new(&config.users).login(user, password)
}

/// Run one CLI command
///
/// `businesses` needs no account; every other command signs in first.
pub fn execute<W: Write>(
    config: &AppConfig,
    command: Command,
    user: Option<&str>,
    password: Option<&str>,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    if let Command::Businesses = command {
        return output::write_list(out, &data::dataset_status(&config.data_dir), format);
    }

    let ctx = sign_in(config, user, password)?;
    match command {
        Command::Insights {
            business,
            clusters,
            seed,
            chart_dir,
            classify,
        } => {
            let request = InsightsRequest {
                clusters,
                seed,
                chart_dir,
                classify,
            };
            insights(config, &ctx.with_business(business), &request, format, out)
        }
        Command::Analytics { business, chart_dir } => analytics(
            config,
            &ctx.with_business(business),
            chart_dir.as_deref(),
            format,
            out,
        ),
        Command::Upload { business, file } => {
            upload(config, &ctx.with_business(business), &file, format, out)
        }
        Command::Register {
            email,
            phone,
            location,
        } => register(config, &ctx, &email, &phone, &location, format, out),
        Command::Registrations => registrations(config, &ctx, format, out),
        Command::Automation(cmd) => automation(config, &ctx, cmd, format, out),
        Command::Businesses => Ok(()),
    }
}

/// Cluster the selected business type and report its segments
pub fn insights<W: Write>(
    config: &AppConfig,
    ctx: &RequestContext,
    request: &InsightsRequest,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    ctx.require_admin()?;
    let business = ctx.business()?;

    let config = match request.seed {
        Some(seed) => {
            let mut seeded = config.clone();
            seeded.segmentation.seed = seed;
            Cow::Owned(seeded)
        }
        None => Cow::Borrowed(config),
    };
    let params = config.segmentation.params(request.clusters);
    params.validate()?;
    let observation = request
        .classify
        .as_deref()
        .map(parse_observation)
        .transpose()?;

    let start_time = Instant::now();
    let (_, analysis) = pipeline::run(&config, business, &params)?;
    debug!("Analysis finished in {:.2}s", start_time.elapsed().as_secs_f64());

    let mut classification = None;
    let mut charts = Vec::new();
    match &analysis {
        Analysis::Segmented { report, result } => {
            if let Some(observation) = &observation {
                let cluster = result.classify(observation)?;
                let label = report
                    .insights
                    .iter()
                    .find(|insight| insight.cluster == cluster)
                    .map(|insight| insight.label.clone())
                    .unwrap_or_default();
                classification = Some(Classification { cluster, label });
            }
            if let Some(dir) = &request.chart_dir {
                charts = viz::render_segmentation_charts(result, business, dir)?;
            }
        }
        Analysis::Fallback { report, .. } => {
            if observation.is_some() {
                warn!("No segments were built, so the observation cannot be classified");
            }
            if let Some(dir) = &request.chart_dir {
                charts = viz::render_fallback_charts(report, dir)?;
            }
        }
    }

    match format {
        OutputFormat::Json => output::write_json(
            out,
            &InsightsOutput {
                analysis: &analysis,
                classification,
                charts,
            },
        ),
        OutputFormat::Table => {
            match &analysis {
                Analysis::Segmented { report, .. } => {
                    write!(out, "{}", output::render_insight_report(report))?
                }
                Analysis::Fallback { reason, report } => {
                    write!(out, "{}", output::render_fallback_report(reason, report))?;
                    if observation.is_some() {
                        output::write_warning(
                            out,
                            "No segments were built, so the observation cannot be classified.",
                        )?;
                    }
                }
            }
            if let Some(Classification { cluster, label }) = &classification {
                output::write_success(
                    out,
                    &format!("Observation belongs to cluster {} ({})", cluster, label),
                )?;
            }
            write_charts(out, &charts)
        }
    }
}

/// Hourly and device breakdown of the selected business type
pub fn analytics<W: Write>(
    config: &AppConfig,
    ctx: &RequestContext,
    chart_dir: Option<&Path>,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    ctx.require_admin()?;
    let dataset = pipeline::load(config, ctx.business()?)?;
    let report = fallback_report(&dataset);
    let charts = match chart_dir {
        Some(dir) => viz::render_fallback_charts(&report, dir)?,
        None => Vec::new(),
    };

    match format {
        OutputFormat::Json => output::write_json(out, &report),
        OutputFormat::Table => {
            write!(out, "{}", output::render_analytics(&report))?;
            write_charts(out, &charts)
        }
    }
}

/// Replace the connection log of the selected business type
pub fn upload<W: Write>(
    config: &AppConfig,
    ctx: &RequestContext,
    file: &Path,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    ctx.require_admin()?;
    let business = ctx.business()?;
    let target = data::upload(file, &config.data_dir, business, &config.upload.required_columns)?;

    match format {
        OutputFormat::Json => output::write_json(
            out,
            &UploadOutput {
                business_type: business,
                path: &target,
            },
        ),
        OutputFormat::Table => output::write_success(
            out,
            &format!(
                "Uploaded {} as the {} connection log ({})",
                file.display(),
                business.title(),
                target.display()
            ),
        ),
    }
}

/// Record a guest sign-up from the splash page
pub fn register<W: Write>(
    config: &AppConfig,
    ctx: &RequestContext,
    email: &str,
    phone: &str,
    location: &str,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    ctx.require_guest()?;
    let registration = GuestRegistration::new(email, phone, location);
    splash::register(&config.registrations_file, &registration)?;

    match format {
        OutputFormat::Json => output::write_json(out, &registration),
        OutputFormat::Table => output::write_success(
            out,
            "Registration complete. You are now connected to the WiFi.",
        ),
    }
}

pub fn registrations<W: Write>(
    config: &AppConfig,
    ctx: &RequestContext,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    ctx.require_admin()?;
    let registrations = splash::read_registrations(&config.registrations_file)?;
    output::write_list(out, &registrations, format)
}

pub fn automation<W: Write>(
    config: &AppConfig,
    ctx: &RequestContext,
    cmd: AutomationCommand,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    ctx.require_admin()?;
    let mut store = RuleStore::load(&config.rules_file)?;

    match cmd {
        AutomationCommand::Add {
            trigger,
            action,
            content,
            business,
        } => {
            let trigger: Trigger = trigger.parse()?;
            let action: Action = action.parse()?;
            let rule = store.add(AutomationRule::new(business, trigger, action, &content)?)?;
            match format {
                OutputFormat::Json => output::write_json(out, rule),
                OutputFormat::Table => {
                    output::write_success(out, &format!("Automation rule {} saved", rule.id))
                }
            }
        }
        AutomationCommand::List => output::write_list(out, store.rules(), format),
        AutomationCommand::Remove { id } => {
            let removed = store.remove(&id)?;
            match format {
                OutputFormat::Json => output::write_json(out, &removed),
                OutputFormat::Table => {
                    output::write_success(out, &format!("Automation rule {} removed", removed.id))
                }
            }
        }
        AutomationCommand::Test { event, business } => {
            let event: SessionEvent = event.parse()?;
            let fired: Vec<AutomationRule> = store
                .matching(&event, business)
                .into_iter()
                .cloned()
                .collect();
            output::write_list(out, &fired, format)
        }
    }
}

fn write_charts<W: Write>(out: &mut W, charts: &[PathBuf]) -> Result<()> {
    for path in charts {
        output::write_success(out, &format!("Chart saved to {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::business::BusinessType;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const SESSIONS: &str = "\
timestamp,device_type,duration
2024-03-04 08:05:00,ios,5
2024-03-04 08:40:00,android,8
2024-03-04 09:15:00,ios,12
2024-03-05 12:30:00,windows,45
2024-03-05 13:10:00,ios,50
2024-03-06 13:45:00,android,55
2024-03-09 18:20:00,macos,120
2024-03-09 19:00:00,ios,110
2024-03-10 20:30:00,android,130
2024-03-10 21:15:00,ios,95
";

    fn setup() -> (TempDir, AppConfig) {
        let dir = tempdir().unwrap();
        fs::write(BusinessType::Restaurant.dataset_path(dir.path()), SESSIONS).unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            registrations_file: dir.path().join("registrations.csv"),
            rules_file: dir.path().join("rules.json"),
            ..AppConfig::default()
        };
        (dir, config)
    }

    fn run(config: &AppConfig, args: &[&str], user: &str, password: &str) -> Result<String> {
        use clap::Parser;
        let mut argv = vec!["wifi-insights"];
        argv.extend_from_slice(args);
        let parsed = crate::cli::Args::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        execute(
            config,
            parsed.command,
            Some(user),
            Some(password),
            parsed.format,
            &mut out,
        )?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_guest_cannot_run_admin_commands() {
        let (dir, config) = setup();
        let upload_source = dir.path().join("upload.csv");
        fs::write(&upload_source, SESSIONS).unwrap();
        let upload_arg = upload_source.to_str().unwrap();

        for args in [
            vec!["insights", "restaurant"],
            vec!["analytics", "restaurant"],
            vec!["upload", "hospital", upload_arg],
            vec!["registrations"],
            vec!["automation", "list"],
        ] {
            let err = run(&config, &args, "guest", "guest123").unwrap_err();
            assert!(
                matches!(err, Error::PermissionDenied { .. }),
                "{:?} gave {:?}",
                args,
                err
            );
        }
        // The rejected upload wrote nothing
        assert!(!BusinessType::Hospital.dataset_path(dir.path()).exists());
    }

    #[test]
    fn test_admin_cannot_register() {
        let (_dir, config) = setup();
        let args = [
            "register",
            "--email",
            "a@example.com",
            "--phone",
            "5551234567",
            "--location",
            "Lobby",
        ];
        let err = run(&config, &args, "admin", "admin123").unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
        assert!(!config.registrations_file.exists());

        let text = run(&config, &args, "guest", "guest123").unwrap();
        assert!(text.contains("Registration complete"));
    }

    #[test]
    fn test_wrong_password_and_missing_credentials() {
        let (_dir, config) = setup();
        let err = run(&config, &["insights", "restaurant"], "admin", "nope").unwrap_err();
        assert!(matches!(err, Error::Unauthorized));

        let mut out = Vec::new();
        let err = execute(
            &config,
            Command::Registrations,
            None,
            None,
            OutputFormat::Table,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert!(out.is_empty());
    }

    #[test]
    fn test_businesses_needs_no_sign_in() {
        let (_dir, config) = setup();
        let mut out = Vec::new();
        execute(
            &config,
            Command::Businesses,
            None,
            None,
            OutputFormat::Json,
            &mut out,
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let statuses = parsed.as_array().unwrap();
        assert_eq!(statuses.len(), BusinessType::ALL.len());
        assert_eq!(statuses[0]["business_type"], "restaurant");
        assert_eq!(statuses[0]["present"], true);
    }

    #[test]
    fn test_insights_json_is_a_single_document() {
        let (dir, config) = setup();
        let charts = dir.path().join("charts");
        let text = run(
            &config,
            &[
                "--format",
                "json",
                "insights",
                "restaurant",
                "-k",
                "3",
                "--classify",
                "duration=50,hour_of_day=13",
                "--chart-dir",
                charts.to_str().unwrap(),
            ],
            "admin",
            "admin123",
        )
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["analysis"]["outcome"], "segmented");
        assert_eq!(parsed["analysis"]["report"]["clusters"], 3);
        assert!(parsed["classification"]["cluster"].as_u64().unwrap() < 3);
        assert_eq!(parsed["charts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_insights_json_fallback_keeps_warning_out_of_output() {
        let (dir, config) = setup();
        fs::write(
            BusinessType::Hospital.dataset_path(dir.path()),
            "timestamp,device_type,duration\n2024-03-04 09:00:00,ios,30\n",
        )
        .unwrap();

        let text = run(
            &config,
            &["--format", "json", "insights", "hospital", "--classify", "duration=30"],
            "admin",
            "admin123",
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["analysis"]["outcome"], "fallback");
        assert!(parsed.get("classification").is_none());
    }

    #[test]
    fn test_insights_table_reports_classification() {
        let (_dir, config) = setup();
        let text = run(
            &config,
            &["insights", "restaurant", "--classify", "duration=50,hour_of_day=13"],
            "admin",
            "admin123",
        )
        .unwrap();
        assert!(text.contains("Observation belongs to cluster"));
    }

    #[test]
    fn test_automation_round_trip_in_json() {
        let (_dir, config) = setup();
        let add = [
            "--format",
            "json",
            "automation",
            "add",
            "--trigger",
            "on-connect",
            "--action",
            "email",
            "--content",
            "Welcome in!",
            "--business",
            "restaurant",
        ];
        let added: serde_json::Value =
            serde_json::from_str(&run(&config, &add, "admin", "admin123").unwrap()).unwrap();
        assert_eq!(added["content"], "Welcome in!");

        let test = [
            "--format",
            "json",
            "automation",
            "test",
            "--event",
            "connected",
            "--business",
            "restaurant",
        ];
        let fired: serde_json::Value =
            serde_json::from_str(&run(&config, &test, "admin", "admin123").unwrap()).unwrap();
        assert_eq!(fired.as_array().unwrap().len(), 1);

        let id = added["id"].as_str().unwrap().to_string();
        let remove = ["automation", "remove", &id[..8]];
        let text = run(&config, &remove, "admin", "admin123").unwrap();
        assert!(text.contains("removed"));
    }

    #[test]
    fn test_sign_in_returns_role() {
        let config = AppConfig::default();
        let ctx = sign_in(&config, Some("admin"), Some("admin123")).unwrap();
        assert_eq!(ctx.role, Role::Admin);
    }
}
