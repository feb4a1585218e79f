use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scormkit_core::model::{CompletionWeights, EnrollmentStatus};
use scormkit_core::score::{completion_decision, merge_best, weighted_best_score};

fn bench_merge_best(c: &mut Criterion) {
    c.bench_function("merge_best over 1000 reports", |b| {
        b.iter(|| {
            let mut best: Option<f64> = None;
            for i in 0..1000u32 {
                let reported = f64::from(i % 101);
                best = Some(merge_best(black_box(best), black_box(reported)));
            }
            best
        })
    });
}

fn bench_weighted_best_score(c: &mut Criterion) {
    let weights = CompletionWeights::default();
    c.bench_function("weighted_best_score", |b| {
        b.iter(|| {
            weighted_best_score(
                black_box(Some(90.0)),
                black_box(Some(85.0)),
                black_box(weights),
            )
        })
    });
}

fn bench_completion_decision(c: &mut Criterion) {
    c.bench_function("completion_decision", |b| {
        b.iter(|| {
            completion_decision(
                black_box(EnrollmentStatus::InProgress),
                black_box(89),
                black_box(70),
                black_box(true),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_merge_best,
    bench_weighted_best_score,
    bench_completion_decision
);
criterion_main!(benches);
