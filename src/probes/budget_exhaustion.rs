use crate::domain::{Evidence, ProbeDetail, ProbeKind};

use super::ProbeInputs;

const EXHAUSTION_RATIO: f64 = 0.95;

pub fn run(inputs: &ProbeInputs) -> Evidence {
    let (Some(spend_series), Some(daily_budget)) =
        (inputs.spend_series.as_ref(), inputs.daily_budget)
    else {
        return inconclusive("spend series or daily budget missing");
    };
    if daily_budget <= 0.0 {
        return inconclusive("daily budget is zero or unset");
    }
    if spend_series.len() < 3 {
        return inconclusive("budget_exhaustion requires at least 3 days of spend history");
    }

    let mut sorted = spend_series.clone();
    sorted.sort_by_key(|p| p.date);
    let last_3 = &sorted[sorted.len() - 3..];

    let ratio = last_3.iter().map(|p| p.value / daily_budget).sum::<f64>() / last_3.len() as f64;
    let fired = ratio > EXHAUSTION_RATIO;

    Evidence {
        probe: ProbeKind::BudgetExhaustion,
        fired,
        detail: ProbeDetail::BudgetExhaustion {
            spend_to_budget_ratio: ratio,
            days_checked: last_3.len() as u32,
        },
        narrative: format!("average spend/budget ratio over the last 3 days is {ratio:.2}"),
    }
}

fn inconclusive(reason: &str) -> Evidence {
    Evidence {
        probe: ProbeKind::BudgetExhaustion,
        fired: false,
        detail: ProbeDetail::BudgetExhaustion {
            spend_to_budget_ratio: 0.0,
            days_checked: 0,
        },
        narrative: reason.to_string(),
    }
}
