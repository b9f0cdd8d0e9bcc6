use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The closed set of diagnostic probes the orchestrator may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    CpmSpike,
    CreativeFatigue,
    LandingPage,
    Tracking,
    BudgetExhaustion,
    Seasonality,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 6] = [
        ProbeKind::CpmSpike,
        ProbeKind::CreativeFatigue,
        ProbeKind::LandingPage,
        ProbeKind::Tracking,
        ProbeKind::BudgetExhaustion,
        ProbeKind::Seasonality,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            ProbeKind::CpmSpike => {
                "Compares 3-day vs 7-day rolling mean CPM; fires on a change beyond 25%."
            }
            ProbeKind::CreativeFatigue => {
                "Fits a linear trend to CTR over the window; fires on a decline beyond 15% with stable impressions."
            }
            ProbeKind::LandingPage => {
                "Checks for stable CTR alongside a CVR drop beyond 30%."
            }
            ProbeKind::Tracking => {
                "Checks for clicks with zero conversions against a historically positive conversion rate."
            }
            ProbeKind::BudgetExhaustion => {
                "Checks whether spend/daily_budget exceeds 0.95 over the last 3 days."
            }
            ProbeKind::Seasonality => {
                "Compares against the same day 7 and 364 days prior within a ±25% tolerance."
            }
        }
    }
}

/// Output of a single probe invocation. Probes never raise for a business
/// "not fired" outcome; `fired: false` with populated `detail` is a normal result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub probe: ProbeKind,
    pub fired: bool,
    pub detail: ProbeDetail,
    pub narrative: String,
}

/// Structured numeric facts a probe observed, kept per-variant so the
/// grounded output validator can compare model claims against real numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeDetail {
    CpmSpike {
        recent_3d_mean: f64,
        prior_7d_mean: f64,
        pct_change: f64,
        /// First day, scanning forward through the window, whose trailing
        /// 3-day mean exceeded 1.25x its trailing 7-day mean. `None` when no
        /// day in the series crossed that ratio.
        first_exceeded_date: Option<NaiveDate>,
    },
    CreativeFatigue {
        ctr_slope_pct: f64,
        impressions_stable: bool,
    },
    LandingPage {
        ctr_stable: bool,
        cvr_pct_change: f64,
    },
    Tracking {
        clicks: u64,
        conversions: u64,
        historical_conversion_rate: f64,
    },
    BudgetExhaustion {
        spend_to_budget_ratio: f64,
        days_checked: u32,
    },
    Seasonality {
        pct_change_vs_7d_ago: f64,
        pct_change_vs_364d_ago: f64,
        within_tolerance: bool,
    },
}
