//! Criterion benchmarks for full trajectories and batch runs.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use spintrack_bench::{reference_field, reference_jobs, reference_options};
use spintrack_core::ParticleNumber;
use spintrack_engine::{
    BatchConfig, BatchRunner, ChaChaGenerator, KindRegistry, Particle, ParticleKind,
    ParticleProperties, TrackingContext, TrackingOptions,
};
use spintrack_log::NullSink;
use spintrack_test_utils::{test_properties, SlabGeometry, TestKind, NEUTRON_GYRO};

fn neutron() -> ParticleProperties {
    ParticleProperties {
        gyromagnetic_ratio: NEUTRON_GYRO,
        magnetic_moment: -9.662_365_0e-27,
        ..test_properties()
    }
}

/// Benchmark: one neutron through the guide field, spin transported.
fn bench_trajectory_transport(c: &mut Criterion) {
    let geometry = SlabGeometry::cube(1.0).with_slab(1, "foil", 1, 0, 0.3, 0.31);
    let field = reference_field();
    let ctx = TrackingContext::new(&geometry).with_field(&field);
    let kind: Arc<dyn ParticleKind> = Arc::new(TestKind::transparent(neutron()));
    let job = reference_jobs("transparent", 1, 42).remove(0);
    let options = TrackingOptions::default();

    c.bench_function("trajectory_transport_100ms", |b| {
        b.iter(|| {
            let mut mc = ChaChaGenerator::from_seed(1);
            let mut p =
                Particle::new(Arc::clone(&kind), job.number, &job.initial, &ctx, &mut mc).unwrap();
            p.integrate(0.1, &options, &ctx, &mut mc, &mut NullSink)
                .unwrap();
            std::hint::black_box(p.end());
        });
    });
}

/// Benchmark: same trajectory with the Bloch equation integrated.
fn bench_trajectory_bloch(c: &mut Criterion) {
    let geometry = SlabGeometry::cube(1.0);
    let field = reference_field();
    let ctx = TrackingContext::new(&geometry).with_field(&field);
    let kind: Arc<dyn ParticleKind> = Arc::new(TestKind::transparent(neutron()));
    let job = reference_jobs("transparent", 1, 42).remove(0);
    let options = reference_options();

    let mut group = c.benchmark_group("bloch");
    group.sample_size(10);
    group.bench_function("trajectory_bloch_50ms", |b| {
        b.iter(|| {
            let mut mc = ChaChaGenerator::from_seed(1);
            let mut p = Particle::new(
                Arc::clone(&kind),
                ParticleNumber(1),
                &job.initial,
                &ctx,
                &mut mc,
            )
            .unwrap();
            p.integrate(0.05, &options, &ctx, &mut mc, &mut NullSink)
                .unwrap();
            std::hint::black_box(p.spin_end());
        });
    });
    group.finish();
}

/// Benchmark: 64 particles on 1 and 4 workers.
fn bench_batch(c: &mut Criterion) {
    let geometry = SlabGeometry::cube(1.0);
    let kinds = KindRegistry::new().with(TestKind::transparent(test_properties()));
    let jobs = reference_jobs("transparent", 64, 7);

    let mut group = c.benchmark_group("batch_64");
    group.sample_size(10);
    for workers in [1, 4] {
        let ctx = TrackingContext::new(&geometry);
        let config = BatchConfig {
            workers,
            seed: 7,
            tmax: 0.5,
        };
        let runner = BatchRunner::new(ctx, TrackingOptions::default(), &kinds, config);
        group.bench_function(format!("workers_{workers}"), |b| {
            b.iter(|| {
                let report = runner.run(jobs.clone(), |_| NullSink).unwrap();
                std::hint::black_box(report.summaries.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_trajectory_transport,
    bench_trajectory_bloch,
    bench_batch
);
criterion_main!(benches);
