//! Numerical kernels for spintrack.
//!
//! - [`DenseStepper`]: adaptive Dormand–Prince 5(4) stepper with a
//!   continuous extension, so the solution can be evaluated anywhere
//!   inside the last accepted step ([`DenseOutput::calc_state`]).
//! - [`CubicSpline`]: parabolically terminated cubic interpolant used to
//!   smooth sampled precession axes.
//!
//! Both are fixed-size, allocation-free in the inner loop, and generic
//! over the state dimension `N`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dopri5;
pub mod error;
pub mod spline;
mod tableau;

pub use dopri5::{DenseOutput, DenseStepper, OdeSystem, StepController, StepperStats, Tolerances};
pub use error::{OdeError, SplineError};
pub use spline::CubicSpline;
