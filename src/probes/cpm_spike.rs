use crate::domain::{Evidence, ProbeDetail, ProbeKind};

use super::{DailyPoint, ProbeInputs};

const PCT_CHANGE_THRESHOLD: f64 = 0.25;

pub fn run(inputs: &ProbeInputs) -> Evidence {
    let Some(series) = inputs.cpm_series.as_ref() else {
        return inconclusive("no cpm series supplied");
    };
    if series.len() < 10 {
        return inconclusive(&format!(
            "cpm_spike requires at least 10 days of history, got {}",
            series.len()
        ));
    }

    let mut sorted = series.clone();
    sorted.sort_by_key(|p| p.date);

    let n = sorted.len();
    let recent_3d = &sorted[n - 3..];
    let prior_7d = &sorted[n - 10..n - 3];

    let recent_3d_mean = mean(recent_3d);
    let prior_7d_mean = mean(prior_7d);

    let pct_change = if prior_7d_mean.abs() > f64::EPSILON {
        (recent_3d_mean - prior_7d_mean) / prior_7d_mean
    } else {
        0.0
    };

    let fired = pct_change.abs() > PCT_CHANGE_THRESHOLD;
    let first_exceeded_date = first_exceeded_date(&sorted);

    Evidence {
        probe: ProbeKind::CpmSpike,
        fired,
        detail: ProbeDetail::CpmSpike {
            recent_3d_mean,
            prior_7d_mean,
            pct_change,
            first_exceeded_date,
        },
        narrative: format!(
            "recent 3-day CPM mean {recent_3d_mean:.2} vs prior 7-day mean {prior_7d_mean:.2} ({:+.1}%)",
            pct_change * 100.0
        ),
    }
}

fn mean(points: &[DailyPoint]) -> f64 {
    points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64
}

/// Scans forward day by day (starting once 10 days of history are available)
/// for the first day whose trailing 3-day mean exceeds 1.25x its trailing
/// 7-day mean.
fn first_exceeded_date(sorted: &[DailyPoint]) -> Option<chrono::NaiveDate> {
    for i in 10..=sorted.len() {
        let recent = &sorted[i - 3..i];
        let prior = &sorted[i - 10..i - 3];
        let prior_mean = mean(prior);
        if prior_mean.abs() <= f64::EPSILON {
            continue;
        }
        if mean(recent) / prior_mean > 1.25 {
            return Some(sorted[i - 1].date);
        }
    }
    None
}

fn inconclusive(reason: &str) -> Evidence {
    Evidence {
        probe: ProbeKind::CpmSpike,
        fired: false,
        detail: ProbeDetail::CpmSpike {
            recent_3d_mean: 0.0,
            prior_7d_mean: 0.0,
            pct_change: 0.0,
            first_exceeded_date: None,
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
    fn fires_on_spike() {
        let mut values = vec![12.0; 7];
        values.extend([18.5, 18.5, 18.5]);
        let inputs = ProbeInputs {
            cpm_series: Some(series(&values)),
            ..Default::default()
        };
        let evidence = run(&inputs);
        assert!(evidence.fired);
        let ProbeDetail::CpmSpike {
            first_exceeded_date,
            ..
        } = evidence.detail
        else {
            unreachable!()
        };
        assert_eq!(
            first_exceeded_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap())
        );
    }

    #[test]
    fn stable_does_not_fire() {
        let values = vec![12.0; 10];
        let inputs = ProbeInputs {
            cpm_series: Some(series(&values)),
            ..Default::default()
        };
        let evidence = run(&inputs);
        assert!(!evidence.fired);
        let ProbeDetail::CpmSpike {
            first_exceeded_date,
            ..
        } = evidence.detail
        else {
            unreachable!()
        };
        assert_eq!(first_exceeded_date, None);
    }
}
