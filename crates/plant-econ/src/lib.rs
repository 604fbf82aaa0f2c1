#![deny(warnings)]

//! Metrics engine: derives monthly financial results from plant inputs.
//!
//! [`compute`] is total. Inputs are clamped into range instead of being
//! rejected, and every division is guarded so that zero revenue or zero
//! throughput yields zero-valued ratios.

use plant_core::{MetricsResult, ScenarioParameters};
use tracing::trace;

/// Lowest representable yield fraction.
pub const MIN_YIELD_FRACTION: f64 = 0.50;
/// Highest representable yield fraction.
pub const MAX_YIELD_FRACTION: f64 = 1.00;
/// Highest representable scrap fraction.
pub const MAX_SCRAP_FRACTION: f64 = 0.20;

/// Bound `x` to `[lo, hi]` without panicking on NaN or inverted bounds.
///
/// When `hi < lo` the lower bound wins, matching `max(lo, min(hi, x))`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(x))
}

/// `num / den`, or 0 when `den` is zero.
fn ratio(num: f64, den: f64) -> f64 {
    if den != 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Compute the twelve derived metrics for one scenario.
///
/// Variable cost scales with processed tons, not net saleable tons: yield
/// and scrap losses still consume energy, labor and material.
///
/// Example:
/// let m = compute(&plant_core::BASELINE);
/// assert_eq!(m.tons_processed, 67_200.0);
pub fn compute(params: &ScenarioParameters) -> MetricsResult {
    let planned = params.planned_hours_per_month;
    // NaN downtime counts as no downtime.
    let downtime = if params.downtime_hours.is_nan() {
        0.0
    } else {
        clamp(params.downtime_hours, 0.0, planned)
    };
    let raw_yield = params.yield_pct / 100.0;
    let raw_scrap = params.scrap_pct / 100.0;
    let yield_frac = clamp(raw_yield, MIN_YIELD_FRACTION, MAX_YIELD_FRACTION);
    let scrap_frac = clamp(raw_scrap, 0.0, MAX_SCRAP_FRACTION);
    if downtime != params.downtime_hours || yield_frac != raw_yield || scrap_frac != raw_scrap {
        trace!(
            downtime,
            yield_frac,
            scrap_frac,
            "inputs clamped into representable range"
        );
    }

    let operating_hours = planned - downtime;
    let tons_processed = params.run_rate_tph * operating_hours;
    let saleable_tons = tons_processed * yield_frac;
    let net_saleable_tons = saleable_tons * (1.0 - scrap_frac);

    let revenue = net_saleable_tons * params.price_per_ton;
    let variable_cost = tons_processed
        * (params.energy_cost_per_ton
            + params.labor_cost_per_ton
            + params.other_variable_cost_per_ton);
    let contribution = revenue - variable_cost;
    let fixed_cost = params.fixed_cost_per_month;
    let ebitda = contribution - fixed_cost;

    MetricsResult {
        operating_hours,
        tons_processed,
        net_saleable_tons,
        revenue,
        variable_cost,
        contribution,
        contribution_pct: ratio(contribution, revenue) * 100.0,
        fixed_cost,
        ebitda,
        ebitda_pct: ratio(ebitda, revenue) * 100.0,
        var_cost_per_ton: ratio(variable_cost, tons_processed),
        contribution_per_ton: ratio(contribution, tons_processed),
    }
}
