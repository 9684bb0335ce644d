//! Test fixtures and mock collaborators for spintrack development.
//!
//! - [`SlabGeometry`]: axis-aligned slabs inside a world box, with exact
//!   plane crossings.
//! - [`ScriptedGenerator`]: replays fixed random draws and counts them.
//! - [`FnField`] / [`UniformB`]: closure-driven and constant fields.
//! - [`TestKind`]: configurable particle kind (transparent, absorber,
//!   mirror, decaying) that records every hit it sees.
//! - [`Stationary`] / [`Ballistic`]: analytic dense trajectories for
//!   driving the spin sub-engine directly.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fields;
pub mod fixtures;
pub mod geometry;
pub mod rng;
pub mod trajectory;

pub use fields::{FnField, UniformB};
pub use fixtures::{
    test_properties, Behaviour, RecordedHit, RecordedStep, TestKind, NEUTRON_GYRO, NEUTRON_MASS,
};
pub use geometry::SlabGeometry;
pub use rng::ScriptedGenerator;
pub use trajectory::{Ballistic, Stationary};
