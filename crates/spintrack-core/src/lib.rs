//! Core types and traits for the spintrack particle tracker.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the value types shared by every other crate (state vector, solids,
//! collisions, stop codes) and the narrow read-only interfaces through
//! which the tracker queries its external collaborators: the geometry
//! kernel, the field models and the random-number generator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collision;
pub mod constants;
pub mod error;
pub mod id;
pub mod solid;
pub mod state;
pub mod status;
pub mod traits;
pub mod vec3;

pub use collision::{Collision, Crossing};
pub use constants::PhysicalConstants;
pub use error::GeometryError;
pub use id::{JobNumber, ParticleNumber, SolidId};
pub use solid::{Solid, SolidEntry, SolidSet};
pub use state::{SpinVector, StateVector, STATE_VARIABLES};
pub use status::StopStatus;
pub use traits::{BFieldSample, EFieldSample, FieldSource, Geometry, McGenerator};
pub use vec3::Vec3;
