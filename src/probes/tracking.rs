use crate::domain::{Evidence, ProbeDetail, ProbeKind};

use super::ProbeInputs;

pub fn run(inputs: &ProbeInputs) -> Evidence {
    let historical_conversion_rate = inputs.historical_conversion_rate.unwrap_or(0.0);

    let fired =
        inputs.clicks > 0 && inputs.conversions == 0 && historical_conversion_rate > 0.0;

    Evidence {
        probe: ProbeKind::Tracking,
        fired,
        detail: ProbeDetail::Tracking {
            clicks: inputs.clicks,
            conversions: inputs.conversions,
            historical_conversion_rate,
        },
        narrative: format!(
            "{} clicks, {} conversions, historical conversion rate {:.4}",
            inputs.clicks, inputs.conversions, historical_conversion_rate
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_when_clicks_but_no_conversions_and_history_positive() {
        let inputs = ProbeInputs {
            clicks: 500,
            conversions: 0,
            historical_conversion_rate: Some(0.03),
            ..Default::default()
        };
        assert!(run(&inputs).fired);
    }

    #[test]
    fn does_not_fire_without_click_history_of_conversions() {
        let inputs = ProbeInputs {
            clicks: 500,
            conversions: 0,
            historical_conversion_rate: Some(0.0),
            ..Default::default()
        };
        assert!(!run(&inputs).fired);
    }
}
