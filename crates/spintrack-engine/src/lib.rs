//! Trajectory and spin-precession engine for the spintrack tracker.
//!
//! A [`Particle`] is created from [`InitialConditions`] inside a
//! [`TrackingContext`] (geometry, fields, constants, integrator settings)
//! and advanced with [`Particle::integrate`]. The loop drives an
//! adaptive dense-output stepper over the relativistic
//! [`EquationOfMotion`], localizes boundary crossings by bisection,
//! hands them to the particle's [`ParticleKind`] hooks and tracks the
//! spin alongside. [`BatchRunner`] runs many particles on a worker pool.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod batch;
mod collision;
pub mod config;
pub mod context;
pub mod fields;
mod integrate;
pub mod kind;
pub mod kinematics;
pub mod mc;
pub mod motion;
pub mod particle;
pub mod spin;

pub use batch::{
    BatchConfig, BatchError, BatchReport, BatchRunner, KindRegistry, ParticleJob, ParticleSummary,
};
pub use config::{ConfigError, IntegratorConfig, OptionMap, SpinWindow, TrackingOptions};
pub use context::TrackingContext;
pub use fields::{
    ElectricField, ExponentialFieldX, FieldBounds, FieldManager, LinearFieldZ, MagneticField,
    UniformElectricField, UniformField,
};
pub use kind::{
    Electron, HitEvent, HitVerdict, HookOutcome, InitialConditions, Lifetime, ParticleKind,
    ParticleProperties, Secondary, StepEvent, Waypoint,
};
pub use mc::ChaChaGenerator;
pub use motion::EquationOfMotion;
pub use particle::{Particle, ParticleError};
pub use spin::{LarmorStats, SpinIntegrator, SpinOutcome, SpinState};
