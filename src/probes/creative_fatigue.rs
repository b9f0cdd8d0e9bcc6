use crate::domain::{Evidence, ProbeDetail, ProbeKind};

use super::{DailyPoint, ProbeInputs};

const DECLINE_THRESHOLD: f64 = 0.15;
/// Impressions in the last 3 days must retain at least this fraction of the
/// series mean for the decline to be attributed to fatigue rather than a
/// delivery collapse (§4.4 "impressions do not collapse").
const IMPRESSION_STABILITY_FLOOR: f64 = 0.50;

pub fn run(inputs: &ProbeInputs) -> Evidence {
    let (Some(ctr), Some(impressions)) = (
        inputs.ctr_series.as_ref(),
        inputs.impressions_series.as_ref(),
    ) else {
        return inconclusive("ctr or impressions series missing");
    };
    if ctr.len() < 5 {
        return inconclusive("creative_fatigue requires at least 5 days of CTR history");
    }

    let slope_pct = linear_slope_pct(ctr);
    let impressions_stable = last_3d_impression_ratio(impressions) >= IMPRESSION_STABILITY_FLOOR;

    let fired = slope_pct < -DECLINE_THRESHOLD && impressions_stable;

    Evidence {
        probe: ProbeKind::CreativeFatigue,
        fired,
        detail: ProbeDetail::CreativeFatigue {
            ctr_slope_pct: slope_pct,
            impressions_stable,
        },
        narrative: format!(
            "CTR trend {slope_pct:+.1}% over the window with impressions {}",
            if impressions_stable { "stable" } else { "unstable" }
        ),
    }
}

/// Fits a simple linear regression of CTR against day index and expresses
/// the fitted change over the window as a percentage of the fitted start value.
fn linear_slope_pct(points: &[DailyPoint]) -> f64 {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    let n = sorted.len() as f64;
    let xs: Vec<f64> = (0..sorted.len()).map(|i| i as f64).collect();
    let ys: Vec<f64> = sorted.iter().map(|p| p.value).collect();

    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        num += (x - x_mean) * (y - y_mean);
        den += (x - x_mean).powi(2);
    }
    let slope = if den.abs() > f64::EPSILON { num / den } else { 0.0 };

    let fitted_start = y_mean - slope * x_mean;
    let fitted_end = fitted_start + slope * (n - 1.0);

    if fitted_start.abs() > f64::EPSILON {
        (fitted_end - fitted_start) / fitted_start
    } else {
        0.0
    }
}

/// Ratio of the trailing-3-day impressions mean to the whole-series mean.
fn last_3d_impression_ratio(points: &[DailyPoint]) -> f64 {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    let series_mean = sorted.iter().map(|p| p.value).sum::<f64>() / sorted.len() as f64;
    if series_mean.abs() < f64::EPSILON {
        return 0.0;
    }
    let tail = &sorted[sorted.len().saturating_sub(3)..];
    let tail_mean = tail.iter().map(|p| p.value).sum::<f64>() / tail.len() as f64;
    tail_mean / series_mean
}

fn inconclusive(reason: &str) -> Evidence {
    Evidence {
        probe: ProbeKind::CreativeFatigue,
        fired: false,
        detail: ProbeDetail::CreativeFatigue {
            ctr_slope_pct: 0.0,
            impressions_stable: false,
        },
        narrative: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<DailyPoint> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyPoint {
                date: start + chrono::Duration::days(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn fires_on_declining_ctr_with_stable_impressions() {
        let ctr = series(&[0.03, 0.028, 0.025, 0.022, 0.020, 0.018]);
        let impressions = series(&[10000.0, 10100.0, 9900.0, 10050.0, 9950.0, 10000.0]);
        let inputs = ProbeInputs {
            ctr_series: Some(ctr),
            impressions_series: Some(impressions),
            ..Default::default()
        };
        assert!(run(&inputs).fired);
    }
}
