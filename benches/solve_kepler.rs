use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hpop::kepler::{true_from_mean_anomaly, AnomalySolver};

/// Uniform random in [0, 2π)
#[inline]
fn rand_angle(rng: &mut StdRng) -> f64 {
    rng.random::<f64>() * std::f64::consts::TAU
}

/// Typical regime: e ∈ [0.0, 0.7]
fn bench_typical(c: &mut Criterion) {
    let mut group = c.benchmark_group("kepler_typical");

    group.bench_function("newton", |b| {
        let mut rng = StdRng::seed_from_u64(0xA57);
        b.iter_batched(
            || (rng.random::<f64>() * 0.7, rand_angle(&mut rng)),
            |(e, m)| black_box(true_from_mean_anomaly(e, m, AnomalySolver::Newton).unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("series", |b| {
        let mut rng = StdRng::seed_from_u64(0xA57);
        b.iter_batched(
            || (rng.random::<f64>() * 0.25, rand_angle(&mut rng)),
            |(e, m)| black_box(true_from_mean_anomaly(e, m, AnomalySolver::Series).unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

/// Stress regime: e ∈ [0.9, 0.99], where the Newton starter matters
fn bench_high_eccentricity(c: &mut Criterion) {
    let mut group = c.benchmark_group("kepler_high_ecc");

    group.bench_function("newton", |b| {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        b.iter_batched(
            || (0.9 + rng.random::<f64>() * 0.09, rand_angle(&mut rng)),
            |(e, m)| black_box(true_from_mean_anomaly(e, m, AnomalySolver::Newton).unwrap()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_typical, bench_high_eccentricity);
criterion_main!(benches);
