//! PledgeBoard CLI — bundle listing, metrics, export and session replay.
//!
//! Commands:
//! - `bundles`: list bundles with estimated cost and pledge progress
//! - `metrics <bundle>`: print trailing returns, risk and dividend tables
//! - `export <bundle>`: write a bundle's metrics as JSON or CSV
//! - `replay <actions...>`: drive the dashboard with scripted actions

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pledgeboard_core::ledger::{format_cents, format_currency};
use pledgeboard_core::{AppConfig, ProviderKind};
use pledgeboard_runner::report::{metrics_markdown, write_export};
use pledgeboard_runner::{build_dashboard, Action, Dashboard, ExportFormat};

#[derive(Parser)]
#[command(
    name = "pledgeboard",
    about = "PledgeBoard CLI — ETF bundle metrics and pledges"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file. Defaults to ./pledgeboard.toml or the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Price provider: yahoo, csv or synthetic. Overrides the config file.
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Wide price CSV to read instead of the network. Implies --provider csv.
    #[arg(long, global = true)]
    offline_csv: Option<PathBuf>,

    /// Long dividend CSV (date,symbol,amount) for the csv provider.
    #[arg(long, global = true)]
    dividends_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List bundles with estimated cost and pledge progress.
    Bundles,
    /// Print metrics tables for one bundle.
    Metrics {
        /// Bundle name (e.g. "Bundle 1") or zero-based index.
        bundle: String,
    },
    /// Export one bundle's metrics.
    Export {
        /// Bundle name (e.g. "Bundle 1") or zero-based index.
        bundle: String,

        /// Output format: json or csv.
        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Output file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Replay a scripted session: select:N, pledge:AMOUNT, pledge, back, noop.
    Replay {
        #[arg(required = true)]
        actions: Vec<String>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Bundles => run_bundles(&config),
        Commands::Metrics { bundle } => run_metrics(&config, &bundle),
        Commands::Export {
            bundle,
            format,
            out,
        } => run_export(&config, &bundle, format, out),
        Commands::Replay { actions } => run_replay(&config, &actions),
    }
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = AppConfig::discover(cli.config.as_deref())?;
    apply_overrides(cli, config)
}

fn apply_overrides(cli: &Cli, mut config: AppConfig) -> Result<AppConfig> {
    if let Some(kind) = cli.provider {
        config.provider.kind = kind;
    }
    if let Some(path) = &cli.offline_csv {
        config.provider.kind = ProviderKind::Csv;
        config.provider.prices_path = Some(path.clone());
    }
    if let Some(path) = &cli.dividends_csv {
        config.provider.dividends_path = Some(path.clone());
    }
    config.validate()?;
    tracing::debug!(provider = ?config.provider.kind, bundles = config.bundles.len(), "configuration loaded");
    Ok(config)
}

/// Resolve a bundle argument: exact name, else zero-based index.
fn resolve_bundle(dashboard: &Dashboard, arg: &str) -> Result<usize> {
    let bundles = dashboard.catalog().list_bundles();
    if let Some(index) = bundles.iter().position(|b| b.name == arg) {
        return Ok(index);
    }
    match arg.parse::<usize>() {
        Ok(index) if index < bundles.len() => Ok(index),
        _ => {
            let names: Vec<&str> = bundles.iter().map(|b| b.name.as_str()).collect();
            bail!("unknown bundle '{arg}'. Valid: {} or 0..{}", names.join(", "), bundles.len())
        }
    }
}

fn run_bundles(config: &AppConfig) -> Result<()> {
    let dashboard = build_dashboard(config)?;

    println!("{:<12} {:<20} {:>14} {:>14} {:>10}", "Bundle", "Symbols", "Est. Cost", "Pledged", "Progress");
    println!("{}", "-".repeat(74));
    for row in dashboard.selection_rows() {
        let cost = match &row.estimated_cost {
            Ok(c) => format!("${}", format_currency(*c)),
            Err(_) => "unavailable".to_string(),
        };
        println!(
            "{:<12} {:<20} {:>14} {:>14} {:>9.2}%",
            row.name,
            row.symbols,
            cost,
            format!("${}", format_cents(row.progress.pledged_cents)),
            row.progress.percent_achieved()
        );
        if let Err(reason) = &row.estimated_cost {
            eprintln!("  {}: {reason}", row.name);
        }
    }
    Ok(())
}

fn run_metrics(config: &AppConfig, bundle: &str) -> Result<()> {
    let mut dashboard = build_dashboard(config)?;
    let index = resolve_bundle(&dashboard, bundle)?;
    dashboard.select_bundle(index)?;
    let view = dashboard
        .view()
        .context("bundle detail did not load")?;

    if let (Some(first), Some(last)) = (view.first_date, view.last_date) {
        println!("{} to {} ({} trading days)\n", first, last, view.rows);
    }
    print!("{}", metrics_markdown(&view.bundle.name, &view.metrics));
    Ok(())
}

fn run_export(config: &AppConfig, bundle: &str, format: ExportFormat, out: PathBuf) -> Result<()> {
    let mut dashboard = build_dashboard(config)?;
    let index = resolve_bundle(&dashboard, bundle)?;
    dashboard.select_bundle(index)?;
    let view = dashboard
        .view()
        .context("bundle detail did not load")?;
    write_export(&view.metrics, format, &out)?;
    tracing::info!(bundle = %view.bundle.name, path = %out.display(), "metrics exported");
    println!("Metrics for {} saved to: {}", view.bundle.name, out.display());
    Ok(())
}

/// Parse one scripted step. `noop` is the absent action.
fn parse_action(step: &str) -> Result<Option<Action>> {
    let (verb, arg) = match step.split_once(':') {
        Some((verb, arg)) => (verb, Some(arg)),
        None => (step, None),
    };
    match (verb.to_ascii_lowercase().as_str(), arg) {
        ("select", Some(n)) => {
            let index = n
                .parse::<usize>()
                .with_context(|| format!("bad bundle index in '{step}'"))?;
            Ok(Some(Action::SelectBundle(index)))
        }
        ("pledge", None) | ("pledge", Some("")) => Ok(Some(Action::SubmitPledge(None))),
        ("pledge", Some(amount)) => {
            let amount = amount
                .parse::<f64>()
                .with_context(|| format!("bad pledge amount in '{step}'"))?;
            Ok(Some(Action::SubmitPledge(Some(amount))))
        }
        ("back", None) => Ok(Some(Action::Back)),
        ("noop", None) => Ok(None),
        _ => bail!("unknown action '{step}'. Valid: select:N, pledge:AMOUNT, pledge, back, noop"),
    }
}

fn run_replay(config: &AppConfig, steps: &[String]) -> Result<()> {
    let actions = steps
        .iter()
        .map(|s| parse_action(s))
        .collect::<Result<Vec<_>>>()?;

    let mut dashboard = build_dashboard(config)?;
    for (step, action) in steps.iter().zip(actions) {
        match dashboard.dispatch(action) {
            Ok(transition) => {
                tracing::debug!(step = %step, state = %dashboard.state(), "replayed");
                println!("{step:<16} {transition}");
            }
            Err(e) => {
                tracing::warn!(step = %step, error = %e, "step rejected");
                println!("{step:<16} rejected: {e}");
            }
        }
    }

    println!("\nPledge summary ({}):", dashboard.state());
    for line in dashboard.pledge_summary() {
        println!("  {line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scripted_actions() {
        assert_eq!(parse_action("select:0").unwrap(), Some(Action::SelectBundle(0)));
        assert_eq!(
            parse_action("pledge:2500").unwrap(),
            Some(Action::SubmitPledge(Some(2500.0)))
        );
        assert_eq!(parse_action("pledge").unwrap(), Some(Action::SubmitPledge(None)));
        assert_eq!(parse_action("pledge:").unwrap(), Some(Action::SubmitPledge(None)));
        assert_eq!(parse_action("BACK").unwrap(), Some(Action::Back));
        assert_eq!(parse_action("noop").unwrap(), None);
    }

    #[test]
    fn negative_pledge_parses_and_is_left_to_the_ledger() {
        assert_eq!(
            parse_action("pledge:-5").unwrap(),
            Some(Action::SubmitPledge(Some(-5.0)))
        );
    }

    #[test]
    fn rejects_malformed_actions() {
        assert!(parse_action("select").is_err());
        assert!(parse_action("select:one").is_err());
        assert!(parse_action("pledge:lots").is_err());
        assert!(parse_action("back:1").is_err());
        assert!(parse_action("jump").is_err());
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "pledgeboard",
            "--provider",
            "synthetic",
            "export",
            "Bundle 2",
            "--format",
            "csv",
            "--out",
            "out/metrics.csv",
        ])
        .unwrap();
        assert_eq!(cli.provider, Some(ProviderKind::Synthetic));
        match cli.command {
            Commands::Export { bundle, format, out } => {
                assert_eq!(bundle, "Bundle 2");
                assert_eq!(format, ExportFormat::Csv);
                assert_eq!(out, PathBuf::from("out/metrics.csv"));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn offline_csv_forces_csv_provider() {
        let cli = Cli::try_parse_from([
            "pledgeboard",
            "--offline-csv",
            "prices.csv",
            "bundles",
        ])
        .unwrap();
        let config = apply_overrides(&cli, AppConfig::default()).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(config.provider.prices_path, Some(PathBuf::from("prices.csv")));
        assert_eq!(config.bundles.len(), 3);
    }

    #[test]
    fn explicit_config_file_is_read_before_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pledgeboard.toml");
        std::fs::write(
            &path,
            r#"
markup = 1.10

[[bundles]]
name = "Metals"
symbols = ["GLD", "SLV"]
goal = 5000.0
"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "pledgeboard",
            "--config",
            path.to_str().unwrap(),
            "--offline-csv",
            "prices.csv",
            "bundles",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.markup, 1.10);
        assert_eq!(config.bundles.len(), 1);
        assert_eq!(config.bundles[0].name, "Metals");
        assert_eq!(config.provider.kind, ProviderKind::Csv);
    }

    #[test]
    fn replay_requires_actions() {
        assert!(Cli::try_parse_from(["pledgeboard", "replay"]).is_err());
    }
}
