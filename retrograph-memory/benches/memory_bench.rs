use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use retrograph_memory::{CommitCategory, EventMetadata, EventStore, SyntheticEvent, TemporalWeighter};

fn synthetic_events(count: usize) -> Vec<SyntheticEvent> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let hash = format!("{:040x}", i);
            SyntheticEvent::from_commit(
                &hash,
                start + Duration::minutes(i as i64),
                EventMetadata {
                    category: CommitCategory::Feature,
                    files: vec![format!("src/module_{}.rs", i)],
                    lines_changed: 100,
                    author: "bench".to_string(),
                    confidence: 0.7,
                    synthetic: true,
                    commit_hash: hash.clone(),
                    reasoning: "bench".to_string(),
                },
            )
        })
        .collect()
}

fn bench_weighting(c: &mut Criterion) {
    let weighter = TemporalWeighter::default();
    let now = Utc::now();
    let stamps: Vec<_> = (0..1000).map(|d| now - Duration::days(d)).collect();

    c.bench_function("weight_1000_events", |b| {
        b.iter(|| {
            stamps
                .iter()
                .map(|ts| weighter.adjust_confidence(0.8, weighter.calculate_weight(*ts, now)))
                .sum::<f32>()
        })
    });
}

fn bench_merge_day(c: &mut Criterion) {
    let events = synthetic_events(200);

    c.bench_function("merge_day_200_events", |b| {
        b.iter(|| {
            let dir = tempfile::TempDir::new().unwrap();
            let store = EventStore::new(dir.path());
            store
                .merge_day("2024-01-01", black_box(&events))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_weighting, bench_merge_day);
criterion_main!(benches);
