//! The closed set of diagnostic probes the RCA orchestrator can invoke.
//!
//! Every probe is a pure function over already-fetched time series: no
//! network calls, no shared mutable state. A probe only fails to produce a
//! confident result when its inputs are missing or too short, in which case
//! it reports `fired: false` with a narrative explaining why, rather than
//! raising an error. Errors are reserved for the metric store adapter that
//! fetches the series in the first place.

mod budget_exhaustion;
mod cpm_spike;
mod creative_fatigue;
mod landing_page;
mod seasonality;
mod tracking;

use chrono::NaiveDate;

use crate::domain::{Evidence, ProbeKind};

/// One (date, value) observation in a per-ad or per-account daily series.
#[derive(Debug, Clone, Copy)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Bundles every series a probe might need. Fields are optional because the
/// orchestrator only fetches the series relevant to the probe it is about to
/// run; an absent field means "not fetched for this invocation", not
/// "known to be empty".
#[derive(Debug, Clone, Default)]
pub struct ProbeInputs {
    pub cpm_series: Option<Vec<DailyPoint>>,
    pub ctr_series: Option<Vec<DailyPoint>>,
    pub impressions_series: Option<Vec<DailyPoint>>,
    pub cvr_series: Option<Vec<DailyPoint>>,
    pub spend_series: Option<Vec<DailyPoint>>,
    pub daily_budget: Option<f64>,
    pub clicks: u64,
    pub conversions: u64,
    pub historical_conversion_rate: Option<f64>,
    /// Series long enough to cover t-7d and, ideally, t-364d for the metric under review.
    pub seasonal_metric_series: Option<Vec<DailyPoint>>,
}

/// Run one probe against the inputs relevant to it.
pub fn run_probe(kind: ProbeKind, inputs: &ProbeInputs) -> Evidence {
    match kind {
        ProbeKind::CpmSpike => cpm_spike::run(inputs),
        ProbeKind::CreativeFatigue => creative_fatigue::run(inputs),
        ProbeKind::LandingPage => landing_page::run(inputs),
        ProbeKind::Tracking => tracking::run(inputs),
        ProbeKind::BudgetExhaustion => budget_exhaustion::run(inputs),
        ProbeKind::Seasonality => seasonality::run(inputs),
    }
}
