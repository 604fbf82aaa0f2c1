#![deny(warnings)]

//! Headless plant margin simulator: compares a scenario against the baseline.

use anyhow::{bail, Context, Result};
use plant_core::{
    load_mapping, parse_override, Baseline, MetricsResult, ScenarioParameters, CONTROLS,
};
use plant_report::{compare, Comparison, ComparisonRow};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DISCLAIMER: &str =
    "Educational simulation only. Not official financial reporting. Use for learning and discussion.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    baseline: Option<PathBuf>,
    scenario: Option<PathBuf>,
    overrides: Vec<String>,
    format: OutputFormat,
    list_params: bool,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--baseline" => match it.next() {
                Some(path) => out.baseline = Some(PathBuf::from(path)),
                None => bail!("--baseline needs a file argument"),
            },
            "--scenario" => match it.next() {
                Some(path) => out.scenario = Some(PathBuf::from(path)),
                None => bail!("--scenario needs a file argument"),
            },
            "--set" => match it.next() {
                Some(expr) => out.overrides.push(expr),
                None => bail!("--set needs a name=value argument"),
            },
            "--format" => {
                out.format = match it.next().as_deref() {
                    Some("table") => OutputFormat::Table,
                    Some("json") => OutputFormat::Json,
                    other => bail!("unsupported --format {:?}, expected table or json", other),
                }
            }
            "--list-params" => out.list_params = true,
            "--version" | "-V" => out.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(out)
}

/// Apply the scenario file, then `--set` overrides, to a reset copy of the baseline.
fn current_scenario(baseline: &Baseline, args: &Args) -> Result<ScenarioParameters> {
    let mut current = baseline.reset_current();
    if let Some(path) = &args.scenario {
        let map = load_mapping(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        current = current.with_overrides(&map)?;
    }
    for expr in &args.overrides {
        let (p, value) = parse_override(expr)?;
        current.set(p, value);
    }
    Ok(current)
}

#[derive(Serialize)]
struct Report<'a> {
    baseline_inputs: &'a ScenarioParameters,
    current_inputs: &'a ScenarioParameters,
    baseline: &'a MetricsResult,
    current: &'a MetricsResult,
    comparison: &'a Comparison,
}

fn render_table(cmp: &Comparison) -> String {
    let mut lines = Vec::new();
    let k = &cmp.kpis;
    lines.push(format!(
        "Baseline EBITDA: {} | Current EBITDA: {} {} | Δ EBITDA vs Baseline: {}",
        k.baseline_ebitda,
        k.current_ebitda,
        k.delta_sign.arrow(),
        k.ebitda_delta
    ));
    lines.push(String::new());
    lines.push(format!(
        "{:<30} {:>16} {:>18} {:>16}",
        "Metric", "Baseline", "Current", "Delta"
    ));
    for row in &cmp.rows {
        match row {
            ComparisonRow::Header { name, .. } => lines.push(name.to_string()),
            ComparisonRow::Metric(m) => {
                let current = format!("{} {}", m.current, m.sign.arrow());
                lines.push(format!(
                    "  {:<28} {:>16} {:>18} {:>16}",
                    m.label, m.baseline, current, m.delta
                ));
                if let Some(f) = &m.baseline_formula {
                    lines.push(format!("      ({f})"));
                }
            }
        }
    }
    lines.join("\n")
}

fn render_controls() -> String {
    let mut lines = Vec::with_capacity(CONTROLS.len() + 1);
    lines.push(format!(
        "{:<20} {:<30} {:<24} {:>10} {:>12} {:>8}",
        "Group", "Parameter", "Label", "Min", "Max", "Step"
    ));
    for c in CONTROLS {
        let max = c
            .max
            .map(|m| m.to_string())
            .unwrap_or_else(|| "planned".to_string());
        lines.push(format!(
            "{:<20} {:<30} {:<24} {:>10} {:>12} {:>8}",
            c.group.name(),
            c.parameter.key(),
            c.label,
            c.min,
            max,
            c.step
        ));
    }
    lines.join("\n")
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "plant-margin {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("PLANT_GIT_SHA"),
            env!("PLANT_BUILD_DATE")
        );
        return Ok(());
    }
    if args.list_params {
        println!("{}", render_controls());
        return Ok(());
    }

    let baseline = match &args.baseline {
        Some(path) => Baseline::load(path)
            .with_context(|| format!("reading baseline {}", path.display()))?,
        None => Baseline::default(),
    };
    let current_inputs = current_scenario(&baseline, &args)?;
    info!(
        baseline = ?args.baseline,
        scenario = ?args.scenario,
        overrides = args.overrides.len(),
        "evaluating scenario"
    );

    let base_metrics = plant_econ::compute(baseline.params());
    let current_metrics = plant_econ::compute(&current_inputs);
    let cmp = compare(&base_metrics, &current_metrics);

    match args.format {
        OutputFormat::Table => {
            println!("{DISCLAIMER}");
            println!();
            println!("{}", render_table(&cmp));
        }
        OutputFormat::Json => {
            let report = Report {
                baseline_inputs: baseline.params(),
                current_inputs: &current_inputs,
                baseline: &base_metrics,
                current: &current_metrics,
                comparison: &cmp,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
