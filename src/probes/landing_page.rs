use crate::domain::{Evidence, ProbeDetail, ProbeKind};

use super::{DailyPoint, ProbeInputs};

const CVR_DROP_THRESHOLD: f64 = 0.30;
const CTR_STABILITY_BAND: f64 = 0.10;

pub fn run(inputs: &ProbeInputs) -> Evidence {
    let (Some(ctr), Some(cvr)) = (inputs.ctr_series.as_ref(), inputs.cvr_series.as_ref()) else {
        return inconclusive("ctr or cvr series missing");
    };
    if cvr.len() < 4 {
        return inconclusive("landing_page requires at least 4 days of CVR history");
    }

    let ctr_pct_change = first_half_vs_second_half(ctr);
    let ctr_stable = ctr_pct_change.abs() <= CTR_STABILITY_BAND;
    let cvr_pct_change = first_half_vs_second_half(cvr);

    let fired = ctr_stable && cvr_pct_change < -CVR_DROP_THRESHOLD;

    Evidence {
        probe: ProbeKind::LandingPage,
        fired,
        detail: ProbeDetail::LandingPage {
            ctr_stable,
            cvr_pct_change,
        },
        narrative: format!(
            "CTR {} while CVR changed {cvr_pct_change:+.1}%",
            if ctr_stable { "held steady" } else { "also moved" }
        ),
    }
}

fn first_half_vs_second_half(points: &[DailyPoint]) -> f64 {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);
    let mid = sorted.len() / 2;
    let first_half_mean = sorted[..mid].iter().map(|p| p.value).sum::<f64>() / mid as f64;
    let second_half = &sorted[mid..];
    let second_half_mean = second_half.iter().map(|p| p.value).sum::<f64>() / second_half.len() as f64;

    if first_half_mean.abs() > f64::EPSILON {
        (second_half_mean - first_half_mean) / first_half_mean
    } else {
        0.0
    }
}

fn inconclusive(reason: &str) -> Evidence {
    Evidence {
        probe: ProbeKind::LandingPage,
        fired: false,
        detail: ProbeDetail::LandingPage {
            ctr_stable: false,
            cvr_pct_change: 0.0,
        },
        narrative: reason.to_string(),
    }
}
