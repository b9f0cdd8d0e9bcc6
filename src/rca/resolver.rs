use crate::domain::{Confidence, Evidence, ProbeDetail, ProbeKind, RootCauseTag};

/// Priority order used when more than one probe fired: the first match wins.
const TAG_PRIORITY: [ProbeKind; 6] = [
    ProbeKind::Tracking,
    ProbeKind::CpmSpike,
    ProbeKind::CreativeFatigue,
    ProbeKind::LandingPage,
    ProbeKind::BudgetExhaustion,
    ProbeKind::Seasonality,
];

fn tag_for(kind: ProbeKind) -> RootCauseTag {
    match kind {
        ProbeKind::CpmSpike => RootCauseTag::CpmSpike,
        ProbeKind::CreativeFatigue => RootCauseTag::CreativeFatigue,
        ProbeKind::LandingPage => RootCauseTag::LandingPage,
        ProbeKind::Tracking => RootCauseTag::Tracking,
        ProbeKind::BudgetExhaustion => RootCauseTag::BudgetExhaustion,
        ProbeKind::Seasonality => RootCauseTag::Seasonality,
    }
}

/// Resolves the closed-ontology root-cause tag from the evidence chain
/// gathered during one diagnosis. Always deterministic: the model never
/// picks the tag, only the probes that produced this evidence.
pub fn resolve_tag(evidence_chain: &[Evidence]) -> RootCauseTag {
    for kind in TAG_PRIORITY {
        if evidence_chain.iter().any(|e| e.probe == kind && e.fired) {
            return tag_for(kind);
        }
    }
    RootCauseTag::Unknown
}

/// Confidence follows from the strength of the evidence that produced the
/// winning tag, not from the anomaly's own z-score.
pub fn resolve_confidence(tag: RootCauseTag, evidence_chain: &[Evidence]) -> Confidence {
    let Some(winning) = evidence_chain
        .iter()
        .find(|e| e.fired && tag_for(e.probe) == tag)
    else {
        return Confidence::Low;
    };

    match &winning.detail {
        ProbeDetail::Tracking { .. } => Confidence::High, // binary, unambiguous signal
        ProbeDetail::CpmSpike { pct_change, .. } => strength_confidence(pct_change.abs(), 0.25),
        ProbeDetail::CreativeFatigue { ctr_slope_pct, .. } => {
            strength_confidence(ctr_slope_pct.abs(), 0.15)
        }
        ProbeDetail::LandingPage { cvr_pct_change, .. } => {
            strength_confidence(cvr_pct_change.abs(), 0.30)
        }
        ProbeDetail::BudgetExhaustion {
            spend_to_budget_ratio,
            ..
        } => strength_confidence(*spend_to_budget_ratio, 0.95),
        ProbeDetail::Seasonality {
            pct_change_vs_7d_ago,
            pct_change_vs_364d_ago,
            ..
        } => {
            if pct_change_vs_7d_ago.abs() <= 0.10 && pct_change_vs_364d_ago.abs() <= 0.10 {
                Confidence::High
            } else {
                Confidence::Medium
            }
        }
    }
}

fn strength_confidence(signal: f64, threshold: f64) -> Confidence {
    let ratio = signal / threshold;
    if ratio >= 2.0 {
        Confidence::High
    } else if ratio >= 1.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProbeDetail;

    fn ev(kind: ProbeKind, fired: bool, detail: ProbeDetail) -> Evidence {
        Evidence {
            probe: kind,
            fired,
            detail,
            narrative: String::new(),
        }
    }

    #[test]
    fn tracking_takes_priority_and_is_high_confidence() {
        let chain = vec![
            ev(
                ProbeKind::CpmSpike,
                true,
                ProbeDetail::CpmSpike {
                    recent_3d_mean: 18.5,
                    prior_7d_mean: 12.2,
                    pct_change: 0.52,
                    first_exceeded_date: None,
                },
            ),
            ev(
                ProbeKind::Tracking,
                true,
                ProbeDetail::Tracking {
                    clicks: 500,
                    conversions: 0,
                    historical_conversion_rate: 0.03,
                },
            ),
        ];
        let tag = resolve_tag(&chain);
        assert_eq!(tag, RootCauseTag::Tracking);
        assert_eq!(resolve_confidence(tag, &chain), Confidence::High);
    }

    #[test]
    fn no_firing_probe_is_unknown_low_confidence() {
        let chain = vec![ev(
            ProbeKind::CpmSpike,
            false,
            ProbeDetail::CpmSpike {
                recent_3d_mean: 12.0,
                prior_7d_mean: 12.0,
                pct_change: 0.0,
                first_exceeded_date: None,
            },
        )];
        let tag = resolve_tag(&chain);
        assert_eq!(tag, RootCauseTag::Unknown);
        assert_eq!(resolve_confidence(tag, &chain), Confidence::Low);
    }

    #[test]
    fn strong_cpm_spike_is_high_confidence() {
        let chain = vec![ev(
            ProbeKind::CpmSpike,
            true,
            ProbeDetail::CpmSpike {
                recent_3d_mean: 18.5,
                prior_7d_mean: 12.2,
                pct_change: 0.5164,
                first_exceeded_date: None,
            },
        )];
        let tag = resolve_tag(&chain);
        assert_eq!(tag, RootCauseTag::CpmSpike);
        assert_eq!(resolve_confidence(tag, &chain), Confidence::High);
    }
}
