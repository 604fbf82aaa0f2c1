#![deny(warnings)]

//! Baseline-vs-current comparison: grouped rows, deltas and display strings.
//!
//! Row layout is fixed by [`MetricGroup::ALL`] and each group's metric list,
//! never by the data, so repeated comparisons line up row for row.

pub mod format;

use crate::format::{money0, UnitClass};
use plant_core::{Metric, MetricsResult};
use serde::Serialize;
use tracing::debug;

/// Deltas within this distance of zero are treated as no change.
pub const EPSILON: f64 = 1e-9;

/// Direction of a change between baseline and current.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Neutral,
}

impl Sign {
    /// Classify `delta` against [`EPSILON`].
    pub fn of(delta: f64) -> Self {
        if delta > EPSILON {
            Sign::Positive
        } else if delta < -EPSILON {
            Sign::Negative
        } else {
            Sign::Neutral
        }
    }

    /// Direction marker for renderers.
    pub fn arrow(self) -> &'static str {
        match self {
            Sign::Positive => "▲",
            Sign::Negative => "▼",
            Sign::Neutral => "●",
        }
    }
}

/// Display tone of an absolute EBITDA value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Normal,
    Negative,
}

impl Tone {
    /// Normal for a profit, negative for break-even or a loss.
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Tone::Normal
        } else {
            Tone::Negative
        }
    }
}

/// Table sections, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroup {
    ProductionTime,
    Costs,
    FinancialResults,
    UnitEconomics,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 4] = [
        MetricGroup::ProductionTime,
        MetricGroup::Costs,
        MetricGroup::FinancialResults,
        MetricGroup::UnitEconomics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricGroup::ProductionTime => "Production & Time",
            MetricGroup::Costs => "Costs",
            MetricGroup::FinancialResults => "Financial Results",
            MetricGroup::UnitEconomics => "Unit Economics",
        }
    }

    pub fn metrics(self) -> &'static [Metric] {
        match self {
            MetricGroup::ProductionTime => &[
                Metric::OperatingHours,
                Metric::TonsProcessed,
                Metric::NetSaleableTons,
            ],
            MetricGroup::Costs => &[Metric::VariableCost, Metric::FixedCost],
            MetricGroup::FinancialResults => &[
                Metric::Revenue,
                Metric::Contribution,
                Metric::ContributionPct,
                Metric::Ebitda,
                Metric::EbitdaPct,
            ],
            MetricGroup::UnitEconomics => &[Metric::VarCostPerTon, Metric::ContributionPerTon],
        }
    }
}

pub fn unit_class(metric: Metric) -> UnitClass {
    match metric {
        Metric::ContributionPct | Metric::EbitdaPct => UnitClass::Percent,
        Metric::VarCostPerTon | Metric::ContributionPerTon => UnitClass::CurrencyPerTon,
        Metric::OperatingHours | Metric::TonsProcessed | Metric::NetSaleableTons => {
            UnitClass::Count
        }
        Metric::Revenue
        | Metric::VariableCost
        | Metric::Contribution
        | Metric::FixedCost
        | Metric::Ebitda => UnitClass::Currency,
    }
}

/// How a derived metric is obtained from its inputs, if it has a formula.
pub fn formula(metric: Metric) -> Option<&'static str> {
    match metric {
        Metric::Revenue => Some("Unit Price × Net Saleable Tons"),
        Metric::VariableCost => Some("Processed Tons × (Energy + Labor + Other)"),
        Metric::Contribution => Some("Revenue − Variable Cost"),
        Metric::ContributionPct => Some("Contribution ÷ Revenue"),
        Metric::Ebitda => Some("Contribution − Fixed Cost"),
        Metric::EbitdaPct => Some("EBITDA ÷ Revenue"),
        Metric::VarCostPerTon => Some("Variable Cost ÷ Processed Tons"),
        Metric::ContributionPerTon => Some("Contribution ÷ Processed Tons"),
        Metric::OperatingHours
        | Metric::TonsProcessed
        | Metric::NetSaleableTons
        | Metric::FixedCost => None,
    }
}

/// One metric's baseline, current and delta cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricRow {
    pub metric: Metric,
    pub label: &'static str,
    pub baseline: String,
    /// Annotation under the baseline cell, e.g. `Revenue = Unit Price × Net Saleable Tons`.
    pub baseline_formula: Option<String>,
    pub current: String,
    pub delta: String,
    pub delta_value: f64,
    pub sign: Sign,
}

/// A table line: a section header or a metric.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonRow {
    Header { group: MetricGroup, name: &'static str },
    Metric(MetricRow),
}

/// Top-line EBITDA tiles.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpiSummary {
    pub baseline_ebitda: String,
    pub current_ebitda: String,
    pub current_tone: Tone,
    pub ebitda_delta: String,
    pub delta_sign: Sign,
}

/// Everything a renderer needs to draw the comparison.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    /// `current.ebitda - baseline.ebitda`.
    pub ebitda_delta: f64,
    pub kpis: KpiSummary,
}

impl Comparison {
    /// Metric rows only, skipping headers.
    pub fn metric_rows(&self) -> impl Iterator<Item = &MetricRow> {
        self.rows.iter().filter_map(|r| match r {
            ComparisonRow::Metric(m) => Some(m),
            ComparisonRow::Header { .. } => None,
        })
    }

    pub fn row(&self, metric: Metric) -> Option<&MetricRow> {
        self.metric_rows().find(|r| r.metric == metric)
    }
}

fn metric_row(metric: Metric, baseline: &MetricsResult, current: &MetricsResult) -> MetricRow {
    let b = baseline.value(metric);
    let c = current.value(metric);
    let d = c - b;
    let unit = unit_class(metric);
    MetricRow {
        metric,
        label: metric.label(),
        baseline: unit.value(b),
        baseline_formula: formula(metric).map(|f| format!("{} = {}", metric.label(), f)),
        current: unit.value(c),
        delta: unit.delta(d),
        delta_value: d,
        sign: Sign::of(d),
    }
}

/// Build the grouped baseline/current comparison.
pub fn compare(baseline: &MetricsResult, current: &MetricsResult) -> Comparison {
    let n_rows = MetricGroup::ALL.len() + Metric::ALL.len();
    let mut rows = Vec::with_capacity(n_rows);
    for group in MetricGroup::ALL {
        rows.push(ComparisonRow::Header {
            group,
            name: group.name(),
        });
        for &metric in group.metrics() {
            rows.push(ComparisonRow::Metric(metric_row(metric, baseline, current)));
        }
    }

    let ebitda_delta = current.ebitda - baseline.ebitda;
    let kpis = KpiSummary {
        baseline_ebitda: money0(baseline.ebitda),
        current_ebitda: money0(current.ebitda),
        current_tone: Tone::of(current.ebitda),
        ebitda_delta: money0(ebitda_delta),
        delta_sign: Sign::of(ebitda_delta),
    };
    debug!(rows = rows.len(), ebitda_delta, "comparison built");
    Comparison {
        rows,
        ebitda_delta,
        kpis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_core::{ScenarioParameters, BASELINE};
    use plant_econ::compute;
    use proptest::prelude::*;

    fn baseline_vs(current: &ScenarioParameters) -> Comparison {
        compare(&compute(&BASELINE), &compute(current))
    }

    #[test]
    fn sign_boundaries() {
        assert_eq!(Sign::of(2e-9), Sign::Positive);
        assert_eq!(Sign::of(1e-9), Sign::Neutral);
        assert_eq!(Sign::of(1e-10), Sign::Neutral);
        assert_eq!(Sign::of(0.0), Sign::Neutral);
        assert_eq!(Sign::of(-1e-9), Sign::Neutral);
        assert_eq!(Sign::of(-2e-9), Sign::Negative);
        assert_eq!(Sign::of(f64::NAN), Sign::Neutral);
    }

    #[test]
    fn arrows_and_tone() {
        assert_eq!(Sign::Positive.arrow(), "▲");
        assert_eq!(Sign::Negative.arrow(), "▼");
        assert_eq!(Sign::Neutral.arrow(), "●");
        assert_eq!(Tone::of(1.0), Tone::Normal);
        assert_eq!(Tone::of(0.0), Tone::Negative);
        assert_eq!(Tone::of(-5.0), Tone::Negative);
    }

    #[test]
    fn groups_partition_metrics() {
        let mut seen: Vec<Metric> = MetricGroup::ALL
            .iter()
            .flat_map(|g| g.metrics().iter().copied())
            .collect();
        assert_eq!(seen.len(), Metric::ALL.len());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), Metric::ALL.len());
    }

    #[test]
    fn layout_is_fixed() {
        let cmp = baseline_vs(&BASELINE);
        let names: Vec<&str> = cmp
            .rows
            .iter()
            .map(|r| match r {
                ComparisonRow::Header { name, .. } => *name,
                ComparisonRow::Metric(m) => m.label,
            })
            .collect();
        assert_eq!(
            names,
            [
                "Production & Time",
                "Operating hours",
                "Tons processed",
                "Net saleable tons",
                "Costs",
                "Variable cost",
                "Fixed cost",
                "Financial Results",
                "Revenue",
                "Contribution",
                "Contribution %",
                "EBITDA",
                "EBITDA %",
                "Unit Economics",
                "Var cost / processed ton",
                "Contribution / processed ton",
            ]
        );
    }

    #[test]
    fn baseline_cells() {
        let cmp = baseline_vs(&BASELINE);
        let cell = |m| cmp.row(m).unwrap().baseline.clone();
        assert_eq!(cell(Metric::OperatingHours), "560");
        assert_eq!(cell(Metric::TonsProcessed), "67,200");
        assert_eq!(cell(Metric::NetSaleableTons), "63,202");
        assert_eq!(cell(Metric::Revenue), "$31,600,800");
        assert_eq!(cell(Metric::VariableCost), "$8,064,000");
        assert_eq!(cell(Metric::FixedCost), "$2,000,000");
        assert_eq!(cell(Metric::Contribution), "$23,536,800");
        assert_eq!(cell(Metric::ContributionPct), "74.48%");
        assert_eq!(cell(Metric::Ebitda), "$21,536,800");
        assert_eq!(cell(Metric::EbitdaPct), "68.15%");
        assert_eq!(cell(Metric::VarCostPerTon), "$120.00");
        assert_eq!(cell(Metric::ContributionPerTon), "$350.25");
    }

    #[test]
    fn identical_scenarios_are_neutral() {
        let cmp = baseline_vs(&BASELINE);
        for row in cmp.metric_rows() {
            assert_eq!(row.sign, Sign::Neutral, "{}", row.label);
            assert_eq!(row.baseline, row.current);
        }
        assert_eq!(cmp.row(Metric::Revenue).unwrap().delta, "$0");
        assert_eq!(cmp.row(Metric::EbitdaPct).unwrap().delta, "0.00 pts");
        assert_eq!(cmp.row(Metric::VarCostPerTon).unwrap().delta, "$0.00");
        assert_eq!(cmp.row(Metric::TonsProcessed).unwrap().delta, "0");
        assert_eq!(cmp.ebitda_delta, 0.0);
        assert_eq!(cmp.kpis.delta_sign, Sign::Neutral);
    }

    #[test]
    fn price_increase_deltas() {
        let cmp = baseline_vs(&ScenarioParameters {
            price_per_ton: 550.0,
            ..BASELINE
        });
        let revenue = cmp.row(Metric::Revenue).unwrap();
        assert_eq!(revenue.current, "$34,760,880");
        assert_eq!(revenue.delta, "$3,160,080");
        assert_eq!(revenue.sign, Sign::Positive);
        assert_eq!(cmp.row(Metric::ContributionPct).unwrap().delta, "2.32 pts");
        assert_eq!(cmp.row(Metric::EbitdaPct).unwrap().delta, "2.90 pts");
        assert_eq!(cmp.row(Metric::TonsProcessed).unwrap().sign, Sign::Neutral);
        assert_eq!(cmp.row(Metric::VariableCost).unwrap().sign, Sign::Neutral);
        assert_eq!(cmp.kpis.baseline_ebitda, "$21,536,800");
        assert_eq!(cmp.kpis.current_ebitda, "$24,696,880");
        assert_eq!(cmp.kpis.ebitda_delta, "$3,160,080");
        assert_eq!(cmp.kpis.delta_sign, Sign::Positive);
        assert_eq!(cmp.kpis.current_tone, Tone::Normal);
    }

    #[test]
    fn full_downtime_goes_negative() {
        let cmp = baseline_vs(&ScenarioParameters {
            downtime_hours: 600.0,
            ..BASELINE
        });
        assert_eq!(cmp.row(Metric::OperatingHours).unwrap().current, "0");
        assert_eq!(cmp.row(Metric::OperatingHours).unwrap().delta, "-560");
        assert_eq!(cmp.row(Metric::ContributionPct).unwrap().current, "0.00%");
        assert_eq!(cmp.row(Metric::Ebitda).unwrap().current, "$-2,000,000");
        assert_eq!(cmp.row(Metric::Ebitda).unwrap().sign, Sign::Negative);
        assert_eq!(cmp.kpis.current_tone, Tone::Negative);
        assert_eq!(cmp.kpis.delta_sign, Sign::Negative);
    }

    #[test]
    fn formulas_only_on_derived_metrics() {
        let cmp = baseline_vs(&BASELINE);
        let revenue = cmp.row(Metric::Revenue).unwrap();
        assert_eq!(
            revenue.baseline_formula.as_deref(),
            Some("Revenue = Unit Price × Net Saleable Tons")
        );
        for m in [
            Metric::OperatingHours,
            Metric::TonsProcessed,
            Metric::NetSaleableTons,
            Metric::FixedCost,
        ] {
            assert!(cmp.row(m).unwrap().baseline_formula.is_none());
        }
        assert_eq!(
            cmp.metric_rows()
                .filter(|r| r.baseline_formula.is_some())
                .count(),
            8
        );
    }

    #[test]
    fn rows_serialize_with_kind_tag() {
        let cmp = baseline_vs(&BASELINE);
        let v = serde_json::to_value(&cmp).unwrap();
        assert_eq!(v["rows"][0]["kind"], "header");
        assert_eq!(v["rows"][0]["name"], "Production & Time");
        assert_eq!(v["rows"][1]["kind"], "metric");
        assert_eq!(v["rows"][1]["metric"], "operating_hours");
        assert_eq!(v["rows"][1]["sign"], "neutral");
    }

    proptest! {
        #[test]
        fn layout_independent_of_values(price in 0.0f64..2_000.0,
                                        downtime in 0.0f64..900.0,
                                        yld in 0.0f64..120.0,
                                        fixed in 0.0f64..5e7) {
            let current = ScenarioParameters {
                price_per_ton: price,
                downtime_hours: downtime,
                yield_pct: yld,
                fixed_cost_per_month: fixed,
                ..BASELINE
            };
            let cmp = baseline_vs(&current);
            prop_assert_eq!(cmp.rows.len(), 16);
            let mut expected = Vec::new();
            for g in MetricGroup::ALL {
                expected.push(None);
                expected.extend(g.metrics().iter().copied().map(Some));
            }
            let actual: Vec<Option<Metric>> = cmp.rows.iter().map(|r| match r {
                ComparisonRow::Header { .. } => None,
                ComparisonRow::Metric(m) => Some(m.metric),
            }).collect();
            prop_assert_eq!(actual, expected);
            let headers = cmp.rows.iter().filter(|r| matches!(r, ComparisonRow::Header { .. })).count();
            prop_assert_eq!(headers, 4);
        }

        #[test]
        fn sign_matches_delta(price in 0.0f64..2_000.0) {
            let cmp = baseline_vs(&ScenarioParameters { price_per_ton: price, ..BASELINE });
            for row in cmp.metric_rows() {
                prop_assert_eq!(row.sign, Sign::of(row.delta_value));
            }
        }
    }
}
