use ad_rca::domain::{AdRecord, Provider};
use ad_rca::engine::{AnomalyDetector, AnomalyDetectorConfig, BaselineEngine};
use ad_rca::AdSummary;
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal_macros::dec;

fn synth_summaries(count: usize) -> Vec<AdSummary> {
    let today = Utc::now().date_naive();
    (0..count)
        .map(|i| {
            // Every tenth ad gets a zero-ROAS anomaly; the rest are uniform.
            let roas = if i % 10 == 0 { dec!(0.0) } else { dec!(6.88) };
            let records: Vec<AdRecord> = (0..30)
                .map(|d| AdRecord {
                    ad_id: format!("ad{i}"),
                    tenant: "acme".into(),
                    provider: Provider::GoogleAds,
                    date: today - Duration::days(29 - d),
                    spend: dec!(200.0),
                    impressions: 10_000,
                    clicks: 100,
                    conversions: 10,
                    revenue: dec!(200.0) * roas,
                    roas,
                    ctr: dec!(0.01),
                    cpm: dec!(5.0),
                    cpa: Some(dec!(10.0)),
                    daily_budget: Some(dec!(500.0)),
                })
                .collect();
            AdSummary::from_records(&format!("ad{i}"), &records)
        })
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("anomaly_detect");
    let engine = BaselineEngine::new(10);
    let detector = AnomalyDetector::new(AnomalyDetectorConfig::default());

    for count in [10usize, 100, 1_000].iter() {
        let summaries = synth_summaries(*count);
        let baseline = engine.compute(&summaries);
        group.bench_with_input(BenchmarkId::new("ads", count), &summaries, |b, summaries| {
            b.iter(|| black_box(detector.detect(summaries, &baseline)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
