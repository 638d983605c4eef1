use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;
use worldtrim::retention::{self, NullReporter, RetentionPolicy, Snapshot};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 20).expect("valid date")
}

/// Hourly backups for `days` days across `worlds` worlds
fn history(worlds: usize, days: u64) -> Vec<Snapshot> {
    let mut snapshots = Vec::new();
    for world in 0..worlds {
        for day in 0..days {
            for hour in 0..24 {
                let modified_at: DateTime<FixedOffset> = today()
                    .checked_sub_days(Days::new(day))
                    .and_then(|d| d.and_hms_opt(hour, 0, 0))
                    .expect("valid timestamp")
                    .and_utc()
                    .fixed_offset();

                snapshots.push(Snapshot {
                    owner: format!("world-{world}"),
                    modified_at,
                    location: PathBuf::from(format!("/backups/world-{world}/{day}-{hour}.zip")),
                    size_bytes: 1_024,
                });
            }
        }
    }
    snapshots
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let policy = RetentionPolicy::default();

    for days in [14u64, 60, 365] {
        let snapshots = history(1, days);
        group.bench_with_input(BenchmarkId::new("hourly_days", days), &snapshots, |b, snapshots| {
            b.iter(|| {
                retention::classify(
                    black_box(snapshots.clone()),
                    &policy,
                    today(),
                    &mut NullReporter,
                )
            })
        });
    }

    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let policy = RetentionPolicy::default();
    let snapshots = history(8, 30);

    c.bench_function("plan_8_worlds_30_days", |b| {
        b.iter(|| retention::plan(black_box(snapshots.clone()), &policy, today(), &mut NullReporter))
    });
}

criterion_group!(benches, bench_classify, bench_plan);
criterion_main!(benches);
