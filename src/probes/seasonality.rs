use chrono::Duration;

use crate::domain::{Evidence, ProbeDetail, ProbeKind};

use super::ProbeInputs;

const TOLERANCE: f64 = 0.25;

/// Unlike the other probes, a seasonality "fire" means the deviation is
/// explained by a recurring seasonal pattern rather than a genuine issue.
pub fn run(inputs: &ProbeInputs) -> Evidence {
    let Some(series) = inputs.seasonal_metric_series.as_ref() else {
        return inconclusive("no seasonal comparison series supplied");
    };
    if series.is_empty() {
        return inconclusive("seasonal comparison series is empty");
    }

    let mut sorted = series.clone();
    sorted.sort_by_key(|p| p.date);
    let today = sorted.last().unwrap();

    let find_on = |target| sorted.iter().find(|p| p.date == target).map(|p| p.value);

    let pct_change_vs_7d = find_on(today.date - Duration::days(7))
        .map(|prior| pct_change(today.value, prior));
    let pct_change_vs_364d = find_on(today.date - Duration::days(364))
        .map(|prior| pct_change(today.value, prior));

    let within_7d = pct_change_vs_7d.map(|c| c.abs() <= TOLERANCE);
    let within_364d = pct_change_vs_364d.map(|c| c.abs() <= TOLERANCE);

    let within_tolerance = match (within_7d, within_364d) {
        (Some(a), Some(b)) => a || b,
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => false,
    };

    Evidence {
        probe: ProbeKind::Seasonality,
        fired: within_tolerance,
        detail: ProbeDetail::Seasonality {
            pct_change_vs_7d_ago: pct_change_vs_7d.unwrap_or(0.0),
            pct_change_vs_364d_ago: pct_change_vs_364d.unwrap_or(0.0),
            within_tolerance,
        },
        narrative: if within_tolerance {
            "deviation falls within the historical seasonal envelope".to_string()
        } else {
            "deviation exceeds the historical seasonal envelope".to_string()
        },
    }
}

fn pct_change(current: f64, prior: f64) -> f64 {
    if prior.abs() > f64::EPSILON {
        (current - prior) / prior
    } else {
        0.0
    }
}

fn inconclusive(reason: &str) -> Evidence {
    Evidence {
        probe: ProbeKind::Seasonality,
        fired: false,
        detail: ProbeDetail::Seasonality {
            pct_change_vs_7d_ago: 0.0,
            pct_change_vs_364d_ago: 0.0,
            within_tolerance: false,
        },
        narrative: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::DailyPoint;
    use chrono::NaiveDate;

    #[test]
    fn fires_when_within_seasonal_band() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let series = vec![
            DailyPoint { date: today, value: 12.0 },
            DailyPoint { date: today - Duration::days(7), value: 11.0 },
        ];
        let inputs = ProbeInputs {
            seasonal_metric_series: Some(series),
            ..Default::default()
        };
        assert!(run(&inputs).fired);
    }
}
