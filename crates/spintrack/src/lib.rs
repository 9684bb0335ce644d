//! Spintrack: relativistic particle trajectories with spin precession.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all spintrack sub-crates. For most users, adding `spintrack` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use spintrack::prelude::*;
//!
//! // A one-metre vacuum box with no internal surfaces.
//! struct Vacuum(Solid);
//!
//! impl Geometry for Vacuum {
//!     fn check_segment(&self, p1: &Vec3, p2: &Vec3) -> bool {
//!         p1.iter().chain(p2).all(|c| c.abs() < 1.0)
//!     }
//!     fn collisions(
//!         &self,
//!         _: f64,
//!         _: &Vec3,
//!         _: f64,
//!         _: &Vec3,
//!     ) -> Result<Vec<Collision>, GeometryError> {
//!         Ok(Vec::new())
//!     }
//!     fn solids_at(&self, _: f64, _: &Vec3) -> SolidSet {
//!         let entry = SolidEntry { id: self.0.id, priority: 0, ignored: false };
//!         [entry].into_iter().collect()
//!     }
//!     fn solid(&self, id: SolidId) -> Option<&Solid> {
//!         (id == self.0.id).then_some(&self.0)
//!     }
//!     fn default_solid(&self) -> &Solid {
//!         &self.0
//!     }
//! }
//!
//! let geometry = Vacuum(Solid::new(SolidId(0), "vacuum", 0));
//! let ctx = TrackingContext::new(&geometry);
//! let kinds = KindRegistry::standard();
//! let jobs = vec![ParticleJob {
//!     number: ParticleNumber(1),
//!     kind: "electron".into(),
//!     initial: InitialConditions {
//!         t: 0.0,
//!         position: [0.0; 3],
//!         energy: 10.0,
//!         phi: 0.0,
//!         theta: 0.0,
//!         polarisation: 0.0,
//!     },
//! }];
//! let runner = BatchRunner::new(ctx, TrackingOptions::default(), &kinds, BatchConfig::default());
//! let report = runner.run(jobs, |_| NullSink).unwrap();
//! assert_eq!(report.summaries[0].status, StopStatus::HitBoundaries);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `spintrack-core` | IDs, state vectors, solids, geometry and field traits |
//! | [`ode`] | `spintrack-ode` | Dense Dormand–Prince stepper and cubic splines |
//! | [`output`] | `spintrack-log` | Output records, sinks and file layout |
//! | [`engine`] | `spintrack-engine` | Particles, tracking loop, spin, batch runner |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`spintrack-core`).
///
/// Implement [`types::Geometry`] and [`types::FieldSource`] here to plug
/// in a detector model.
pub use spintrack_core as types;

/// Numerical kernels (`spintrack-ode`).
pub use spintrack_ode as ode;

/// Output records and sinks (`spintrack-log`).
///
/// [`output::FileSink`] writes one whitespace-separated file per kind
/// and stream; [`output::MemorySink`] keeps records for inspection.
pub use spintrack_log as output;

/// Tracking engine (`spintrack-engine`).
///
/// [`engine::Particle`] for single trajectories, [`engine::BatchRunner`]
/// for many particles on a worker pool.
pub use spintrack_engine as engine;

/// Common imports for typical spintrack usage.
///
/// ```rust
/// use spintrack::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use spintrack_core::{
        Collision, FieldSource, Geometry, GeometryError, JobNumber, McGenerator, ParticleNumber,
        PhysicalConstants, Solid, SolidEntry, SolidId, SolidSet, StateVector, StopStatus, Vec3,
    };

    // Output
    pub use spintrack_log::{FileSink, LogError, MemorySink, NullSink, RecordSink};

    // Particle kinds
    pub use spintrack_engine::{
        HitEvent, HitVerdict, HookOutcome, InitialConditions, Lifetime, ParticleKind,
        ParticleProperties, StepEvent, Waypoint,
    };

    // Engine
    pub use spintrack_engine::{
        BatchConfig, BatchRunner, FieldManager, KindRegistry, Particle, ParticleJob,
        TrackingContext, TrackingOptions,
    };
}
