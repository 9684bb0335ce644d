//! Benchmark profiles for the spintrack tracker.
//!
//! - [`reference_field`]: exponential guide field plus a linear holding
//!   field, the classic adiabatic spin-transport setup
//! - [`reference_options`]: full spin integration over the first 50 ms
//! - [`reference_jobs`]: deterministic slow-particle jobs via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::f64::consts::PI;

use spintrack_core::ParticleNumber;
use spintrack_engine::{
    ExponentialFieldX, FieldBounds, FieldManager, InitialConditions, LinearFieldZ, ParticleJob,
    SpinWindow, TrackingOptions,
};

/// Neutron rest mass [eV/c²].
const NEUTRON_MASS: f64 = 939_565_420.52;
const C: f64 = 299_792_458.0;

/// Guide field decaying along x from about 1 mT to 1 µT over the
/// first 20 cm, on top of a weak gradient along z.
pub fn reference_field() -> FieldManager {
    let bounds = FieldBounds::new([-1.0; 3], [1.0; 3]);
    FieldManager::new()
        .with_magnetic(ExponentialFieldX::new(1e-3, 35.0, 0.0, 1e-6, 0.0, bounds))
        .with_magnetic(LinearFieldZ::new(1e-5, 1e-6, bounds))
}

/// Spin fully integrated over `[0, 50 ms)` and transported afterwards.
pub fn reference_options() -> TrackingOptions {
    TrackingOptions {
        spin_windows: vec![SpinWindow {
            start: 0.0,
            end: 0.05,
        }],
        ..TrackingOptions::default()
    }
}

/// Generate `n` jobs of `kind` starting at the origin.
///
/// Speeds fall in `[2, 10)` m/s and directions in the forward
/// half-space, both drawn from a simple hash of the seed.
pub fn reference_jobs(kind: &str, n: u64, seed: u64) -> Vec<ParticleJob> {
    (0..n)
        .map(|i| {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407));
            let u = |shift: u32| ((h >> shift) & 0xffff) as f64 / 65536.0;
            let v = 2.0 + 8.0 * u(0);
            ParticleJob {
                number: ParticleNumber(i + 1),
                kind: kind.to_owned(),
                initial: InitialConditions {
                    t: 0.0,
                    position: [0.0; 3],
                    energy: 0.5 * NEUTRON_MASS * v * v / (C * C),
                    phi: PI * (u(16) - 0.5),
                    theta: PI * (0.25 + 0.5 * u(32)),
                    polarisation: 1.0,
                },
            }
        })
        .collect()
}
