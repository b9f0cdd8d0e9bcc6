use ad_rca::domain::{AdRecord, Provider};
use ad_rca::engine::BaselineEngine;
use ad_rca::{AccountBaseline, AdSummary};
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal_macros::dec;

fn synth_summaries(count: usize) -> Vec<AdSummary> {
    let today = Utc::now().date_naive();
    (0..count)
        .map(|i| {
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
                    revenue: dec!(1376.0),
                    roas: dec!(6.88),
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

fn bench_baseline_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("baseline_compute");

    for count in [10usize, 100, 1_000].iter() {
        let summaries = synth_summaries(*count);
        let engine = BaselineEngine::new(10);
        group.bench_with_input(BenchmarkId::new("ads", count), &summaries, |b, summaries| {
            b.iter(|| black_box(engine.compute(summaries)));
        });
    }

    group.finish();
}

fn bench_is_sufficient(c: &mut Criterion) {
    let summaries = synth_summaries(200);
    let engine = BaselineEngine::new(10);
    let baseline: AccountBaseline = engine.compute(&summaries);

    c.bench_function("baseline_is_sufficient", |b| {
        b.iter(|| {
            for metric in ad_rca::domain::Metric::ALL.iter() {
                black_box(baseline.is_sufficient(*metric));
            }
        })
    });
}

criterion_group!(benches, bench_baseline_compute, bench_is_sufficient);
criterion_main!(benches);
