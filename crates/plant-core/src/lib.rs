#![deny(warnings)]

//! Core domain model for the plant margin simulator.
//!
//! This crate defines the operating parameters of a plant scenario, the
//! derived financial metrics, the fixed baseline scenario and the adapters
//! that turn a flat name→number mapping into a parameter set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Operating and cost inputs for a single monthly plant snapshot.
///
/// Values outside their nominal ranges are accepted as-is; the metrics
/// engine clamps them when computing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioParameters {
    /// Selling price in USD per net saleable ton.
    pub price_per_ton: f64,
    /// Throughput while running, tons per hour.
    pub run_rate_tph: f64,
    /// Scheduled hours in the month.
    pub planned_hours_per_month: f64,
    /// Unplanned stop hours; capped at planned hours.
    pub downtime_hours: f64,
    /// Yield in percent (0-100).
    pub yield_pct: f64,
    /// Energy cost in USD per processed ton.
    pub energy_cost_per_ton: f64,
    /// Labor cost in USD per processed ton.
    pub labor_cost_per_ton: f64,
    /// Scrap in percent (0-100) of saleable tons.
    pub scrap_pct: f64,
    /// Remaining variable cost in USD per processed ton.
    pub other_variable_cost_per_ton: f64,
    /// Fixed cost in USD per month.
    pub fixed_cost_per_month: f64,
}

/// The reference scenario shown in the "Baseline" column.
pub const BASELINE: ScenarioParameters = ScenarioParameters {
    price_per_ton: 500.0,
    run_rate_tph: 120.0,
    planned_hours_per_month: 600.0,
    downtime_hours: 40.0,
    yield_pct: 95.0,
    energy_cost_per_ton: 35.0,
    labor_cost_per_ton: 25.0,
    scrap_pct: 1.0,
    other_variable_cost_per_ton: 60.0,
    fixed_cost_per_month: 2_000_000.0,
};

impl Default for ScenarioParameters {
    fn default() -> Self {
        BASELINE
    }
}

/// Names of the ten scenario inputs, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    PricePerTon,
    RunRateTph,
    PlannedHoursPerMonth,
    DowntimeHours,
    YieldPct,
    EnergyCostPerTon,
    LaborCostPerTon,
    ScrapPct,
    OtherVariableCostPerTon,
    FixedCostPerMonth,
}

impl Parameter {
    pub const ALL: [Parameter; 10] = [
        Parameter::PricePerTon,
        Parameter::RunRateTph,
        Parameter::PlannedHoursPerMonth,
        Parameter::DowntimeHours,
        Parameter::YieldPct,
        Parameter::EnergyCostPerTon,
        Parameter::LaborCostPerTon,
        Parameter::ScrapPct,
        Parameter::OtherVariableCostPerTon,
        Parameter::FixedCostPerMonth,
    ];

    /// Mapping key used by control surfaces and scenario files.
    pub fn key(self) -> &'static str {
        match self {
            Parameter::PricePerTon => "price_per_ton",
            Parameter::RunRateTph => "run_rate_tph",
            Parameter::PlannedHoursPerMonth => "planned_hours_per_month",
            Parameter::DowntimeHours => "downtime_hours",
            Parameter::YieldPct => "yield_pct",
            Parameter::EnergyCostPerTon => "energy_cost_per_ton",
            Parameter::LaborCostPerTon => "labor_cost_per_ton",
            Parameter::ScrapPct => "scrap_pct",
            Parameter::OtherVariableCostPerTon => "other_variable_cost_per_ton",
            Parameter::FixedCostPerMonth => "fixed_cost_per_month",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Parameter {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Parameter::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| ScenarioError::UnknownParameter(key.to_string()))
    }
}

/// Errors raised while building a parameter set from external input.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Key does not name any scenario parameter.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    /// A complete mapping was required but this key was absent.
    #[error("missing parameter: {0}")]
    MissingParameter(Parameter),
    /// NaN or infinite value supplied for a parameter.
    #[error("non-finite value for {0}")]
    NonFinite(Parameter),
    /// Override expression not of the form `name=value`.
    #[error("malformed override {0:?}, expected name=value")]
    MalformedOverride(String),
    /// Scenario file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Scenario file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ScenarioParameters {
    /// Read a single field.
    pub fn get(&self, p: Parameter) -> f64 {
        match p {
            Parameter::PricePerTon => self.price_per_ton,
            Parameter::RunRateTph => self.run_rate_tph,
            Parameter::PlannedHoursPerMonth => self.planned_hours_per_month,
            Parameter::DowntimeHours => self.downtime_hours,
            Parameter::YieldPct => self.yield_pct,
            Parameter::EnergyCostPerTon => self.energy_cost_per_ton,
            Parameter::LaborCostPerTon => self.labor_cost_per_ton,
            Parameter::ScrapPct => self.scrap_pct,
            Parameter::OtherVariableCostPerTon => self.other_variable_cost_per_ton,
            Parameter::FixedCostPerMonth => self.fixed_cost_per_month,
        }
    }

    /// Overwrite a single field.
    pub fn set(&mut self, p: Parameter, value: f64) {
        let slot = match p {
            Parameter::PricePerTon => &mut self.price_per_ton,
            Parameter::RunRateTph => &mut self.run_rate_tph,
            Parameter::PlannedHoursPerMonth => &mut self.planned_hours_per_month,
            Parameter::DowntimeHours => &mut self.downtime_hours,
            Parameter::YieldPct => &mut self.yield_pct,
            Parameter::EnergyCostPerTon => &mut self.energy_cost_per_ton,
            Parameter::LaborCostPerTon => &mut self.labor_cost_per_ton,
            Parameter::ScrapPct => &mut self.scrap_pct,
            Parameter::OtherVariableCostPerTon => &mut self.other_variable_cost_per_ton,
            Parameter::FixedCostPerMonth => &mut self.fixed_cost_per_month,
        };
        *slot = value;
    }

    /// Build a parameter set from a complete name→number mapping.
    ///
    /// Every one of the ten keys must be present; unknown keys and
    /// non-finite values are rejected.
    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self, ScenarioError> {
        let mut params = BASELINE;
        let mut seen = Vec::with_capacity(Parameter::ALL.len());
        for (key, &value) in values {
            let p: Parameter = key.parse()?;
            params.set(p, finite(p, value)?);
            seen.push(p);
        }
        if let Some(missing) = Parameter::ALL.into_iter().find(|p| !seen.contains(p)) {
            return Err(ScenarioError::MissingParameter(missing));
        }
        Ok(params)
    }

    /// Copy of `self` with some fields replaced from a partial mapping.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, f64>) -> Result<Self, ScenarioError> {
        let mut params = *self;
        for (key, &value) in overrides {
            let p: Parameter = key.parse()?;
            params.set(p, finite(p, value)?);
        }
        Ok(params)
    }

    /// Flat name→number view, the inverse of [`ScenarioParameters::from_map`].
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Parameter::ALL
            .into_iter()
            .map(|p| (p.key().to_string(), self.get(p)))
            .collect()
    }
}

fn finite(p: Parameter, value: f64) -> Result<f64, ScenarioError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScenarioError::NonFinite(p))
    }
}

/// Parse a `name=value` override as typed on a command line.
pub fn parse_override(expr: &str) -> Result<(Parameter, f64), ScenarioError> {
    let (name, raw) = expr
        .split_once('=')
        .ok_or_else(|| ScenarioError::MalformedOverride(expr.to_string()))?;
    let p: Parameter = name.parse()?;
    let value: f64 = raw
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|_| ScenarioError::MalformedOverride(expr.to_string()))?;
    Ok((p, finite(p, value)?))
}

/// Read a flat name→number mapping from a YAML or JSON file.
///
/// Files ending in `.json` are parsed as JSON, anything else as YAML.
pub fn load_mapping<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, f64>, ScenarioError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let map: BTreeMap<String, f64> = if is_json {
        serde_json::from_str(&text).map_err(|e| ScenarioError::Parse(e.to_string()))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| ScenarioError::Parse(e.to_string()))?
    };
    debug!(path = %path.display(), entries = map.len(), "loaded scenario mapping");
    Ok(map)
}

/// The fixed reference scenario for one process.
///
/// Built once at start-up and never mutated; comparisons take it by
/// reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    params: ScenarioParameters,
}

impl Baseline {
    pub fn new(params: ScenarioParameters) -> Self {
        Self { params }
    }

    /// Load a baseline from a file holding all ten parameters.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let map = load_mapping(path)?;
        Ok(Self::new(ScenarioParameters::from_map(&map)?))
    }

    pub fn params(&self) -> &ScenarioParameters {
        &self.params
    }

    /// Fresh current-scenario inputs equal to the baseline ("reset").
    pub fn reset_current(&self) -> ScenarioParameters {
        self.params
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self::new(BASELINE)
    }
}

/// Derived financial metrics for one scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub operating_hours: f64,
    pub tons_processed: f64,
    pub net_saleable_tons: f64,
    pub revenue: f64,
    pub variable_cost: f64,
    pub contribution: f64,
    /// Contribution as a percentage of revenue; 0 when revenue is 0.
    pub contribution_pct: f64,
    pub fixed_cost: f64,
    pub ebitda: f64,
    /// EBITDA as a percentage of revenue; 0 when revenue is 0.
    pub ebitda_pct: f64,
    /// Variable cost per processed ton; 0 when nothing was processed.
    pub var_cost_per_ton: f64,
    /// Contribution per processed ton; 0 when nothing was processed.
    pub contribution_per_ton: f64,
}

/// Names of the twelve derived metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    OperatingHours,
    TonsProcessed,
    NetSaleableTons,
    Revenue,
    VariableCost,
    Contribution,
    ContributionPct,
    FixedCost,
    Ebitda,
    EbitdaPct,
    VarCostPerTon,
    ContributionPerTon,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::OperatingHours,
        Metric::TonsProcessed,
        Metric::NetSaleableTons,
        Metric::Revenue,
        Metric::VariableCost,
        Metric::Contribution,
        Metric::ContributionPct,
        Metric::FixedCost,
        Metric::Ebitda,
        Metric::EbitdaPct,
        Metric::VarCostPerTon,
        Metric::ContributionPerTon,
    ];

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Metric::OperatingHours => "Operating hours",
            Metric::TonsProcessed => "Tons processed",
            Metric::NetSaleableTons => "Net saleable tons",
            Metric::Revenue => "Revenue",
            Metric::VariableCost => "Variable cost",
            Metric::Contribution => "Contribution",
            Metric::ContributionPct => "Contribution %",
            Metric::FixedCost => "Fixed cost",
            Metric::Ebitda => "EBITDA",
            Metric::EbitdaPct => "EBITDA %",
            Metric::VarCostPerTon => "Var cost / processed ton",
            Metric::ContributionPerTon => "Contribution / processed ton",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl MetricsResult {
    /// Read one metric by name.
    pub fn value(&self, m: Metric) -> f64 {
        match m {
            Metric::OperatingHours => self.operating_hours,
            Metric::TonsProcessed => self.tons_processed,
            Metric::NetSaleableTons => self.net_saleable_tons,
            Metric::Revenue => self.revenue,
            Metric::VariableCost => self.variable_cost,
            Metric::Contribution => self.contribution,
            Metric::ContributionPct => self.contribution_pct,
            Metric::FixedCost => self.fixed_cost,
            Metric::Ebitda => self.ebitda,
            Metric::EbitdaPct => self.ebitda_pct,
            Metric::VarCostPerTon => self.var_cost_per_ton,
            Metric::ContributionPerTon => self.contribution_per_ton,
        }
    }
}

/// Sidebar sections a control surface groups its inputs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlGroup {
    MarketThroughput,
    Time,
    YieldQuality,
    Costs,
}

impl ControlGroup {
    pub fn name(self) -> &'static str {
        match self {
            ControlGroup::MarketThroughput => "Market & Throughput",
            ControlGroup::Time => "Time",
            ControlGroup::YieldQuality => "Yield & Quality",
            ControlGroup::Costs => "Costs",
        }
    }
}

/// Suggested input range for one parameter.
///
/// Advisory only: the engine accepts any value and applies its own clamps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParameterControl {
    pub parameter: Parameter,
    pub label: &'static str,
    pub group: ControlGroup,
    pub min: f64,
    /// Upper bound; `None` means "up to planned hours" (downtime).
    pub max: Option<f64>,
    pub step: f64,
}

impl ParameterControl {
    /// Upper bound resolved against the scenario it applies to.
    pub fn max_for(&self, scenario: &ScenarioParameters) -> f64 {
        self.max.unwrap_or(scenario.planned_hours_per_month)
    }
}

/// Control catalogue in display order.
pub const CONTROLS: [ParameterControl; 10] = [
    ParameterControl {
        parameter: Parameter::PricePerTon,
        label: "Selling price ($/ton)",
        group: ControlGroup::MarketThroughput,
        min: 200.0,
        max: Some(1200.0),
        step: 5.0,
    },
    ParameterControl {
        parameter: Parameter::RunRateTph,
        label: "Run rate (tons/hour)",
        group: ControlGroup::MarketThroughput,
        min: 20.0,
        max: Some(400.0),
        step: 5.0,
    },
    ParameterControl {
        parameter: Parameter::PlannedHoursPerMonth,
        label: "Planned hours/month",
        group: ControlGroup::Time,
        min: 200.0,
        max: Some(744.0),
        step: 10.0,
    },
    ParameterControl {
        parameter: Parameter::DowntimeHours,
        label: "Downtime hours",
        group: ControlGroup::Time,
        min: 0.0,
        max: None,
        step: 1.0,
    },
    ParameterControl {
        parameter: Parameter::YieldPct,
        label: "Yield (%)",
        group: ControlGroup::YieldQuality,
        min: 80.0,
        max: Some(99.5),
        step: 0.1,
    },
    ParameterControl {
        parameter: Parameter::ScrapPct,
        label: "Scrap (%)",
        group: ControlGroup::YieldQuality,
        min: 0.0,
        max: Some(10.0),
        step: 0.1,
    },
    ParameterControl {
        parameter: Parameter::EnergyCostPerTon,
        label: "Energy ($/ton)",
        group: ControlGroup::Costs,
        min: 0.0,
        max: Some(200.0),
        step: 1.0,
    },
    ParameterControl {
        parameter: Parameter::LaborCostPerTon,
        label: "Labor ($/ton)",
        group: ControlGroup::Costs,
        min: 0.0,
        max: Some(200.0),
        step: 1.0,
    },
    ParameterControl {
        parameter: Parameter::OtherVariableCostPerTon,
        label: "Other variable ($/ton)",
        group: ControlGroup::Costs,
        min: 0.0,
        max: Some(400.0),
        step: 1.0,
    },
    ParameterControl {
        parameter: Parameter::FixedCostPerMonth,
        label: "Fixed cost ($/month)",
        group: ControlGroup::Costs,
        min: 0.0,
        max: Some(20_000_000.0),
        step: 50_000.0,
    },
];
