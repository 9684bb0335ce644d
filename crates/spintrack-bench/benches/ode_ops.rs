//! Criterion micro-benchmarks for the numerical kernels.

use criterion::{criterion_group, criterion_main, Criterion};
use spintrack_ode::{CubicSpline, DenseOutput, DenseStepper, OdeSystem, Tolerances};

/// Kepler problem in the plane: `r'' = -r / |r|³`.
struct Kepler;

impl OdeSystem<4> for Kepler {
    fn rhs(&self, _t: f64, y: &[f64; 4], dydt: &mut [f64; 4]) {
        let r3 = (y[0] * y[0] + y[1] * y[1]).powf(1.5);
        *dydt = [y[2], y[3], -y[0] / r3, -y[1] / r3];
    }
}

/// Benchmark: one eccentric orbit (e = 0.6) at tight tolerances.
fn bench_kepler_orbit(c: &mut Criterion) {
    let e: f64 = 0.6;
    let y0 = [1.0 - e, 0.0, 0.0, ((1.0 + e) / (1.0 - e)).sqrt()];
    let period = 2.0 * std::f64::consts::PI;

    c.bench_function("dopri5_kepler_orbit", |b| {
        b.iter(|| {
            let mut stepper = DenseStepper::<4>::new(Tolerances::new(1e-10, 1e-10));
            stepper.initialize(y0, 0.0, 1e-3);
            while stepper.current_time() < period {
                stepper.do_step(&Kepler).unwrap();
            }
            std::hint::black_box(stepper.calc_state(period));
        });
    });
}

/// Benchmark: 1000 dense-output evaluations inside one step.
fn bench_dense_output(c: &mut Criterion) {
    let mut stepper = DenseStepper::<4>::new(Tolerances::new(1e-6, 1e-6));
    stepper.initialize([0.4, 0.0, 0.0, 2.0], 0.0, 0.1);
    stepper.do_step(&Kepler).unwrap();
    let (t0, t1) = (stepper.previous_time(), stepper.current_time());

    c.bench_function("dopri5_calc_state_1k", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let t = t0 + (t1 - t0) * f64::from(i) / 1000.0;
                std::hint::black_box(stepper.calc_state(t));
            }
        });
    });
}

/// Benchmark: build an 11-knot spline and evaluate it 1000 times.
fn bench_spline(c: &mut Criterion) {
    let xs: Vec<f64> = (0..=10).map(|i| f64::from(i) * 0.1).collect();
    let ys: Vec<f64> = xs.iter().map(|x| (3.0 * x).sin()).collect();

    c.bench_function("spline_build_eval_1k", |b| {
        b.iter(|| {
            let spline = CubicSpline::new(&xs, &ys).unwrap();
            for i in 0..1000 {
                std::hint::black_box(spline.eval(f64::from(i) * 1e-3));
            }
        });
    });
}

criterion_group!(benches, bench_kepler_orbit, bench_dense_output, bench_spline);
criterion_main!(benches);
