//! Error types for the ODE stepper and spline builder.

use std::error::Error;
use std::fmt;

/// Errors from [`DenseStepper`](crate::DenseStepper).
#[derive(Clone, Debug, PartialEq)]
pub enum OdeError {
    /// `do_step` was called before `initialize`.
    NotInitialized,
    /// Too many consecutive rejected attempts; the step size collapsed.
    StepSizeUnderflow {
        /// Time at which the step was attempted.
        t: f64,
        /// Last attempted step size.
        h: f64,
    },
    /// The right-hand side produced NaN or infinite values.
    NonFinite {
        /// Time at which the non-finite value appeared.
        t: f64,
    },
    /// A caller-imposed step budget was exhausted.
    TooManySteps {
        /// The exhausted budget.
        limit: u64,
    },
}

impl fmt::Display for OdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "stepper used before initialize()"),
            Self::StepSizeUnderflow { t, h } => {
                write!(f, "step size underflow at t={t} (h={h})")
            }
            Self::NonFinite { t } => write!(f, "non-finite derivative at t={t}"),
            Self::TooManySteps { limit } => write!(f, "step budget of {limit} exhausted"),
        }
    }
}

impl Error for OdeError {}

/// Errors from [`CubicSpline::new`](crate::CubicSpline::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplineError {
    /// Fewer than two nodes.
    TooFewPoints {
        /// Number of nodes supplied.
        count: usize,
    },
    /// Abscissae and ordinates differ in length.
    LengthMismatch {
        /// Number of abscissae.
        xs: usize,
        /// Number of ordinates.
        ys: usize,
    },
    /// Abscissae are not strictly increasing (or not finite).
    NotIncreasing {
        /// Index of the first offending node.
        index: usize,
    },
}

impl fmt::Display for SplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints { count } => {
                write!(f, "spline needs at least 2 nodes, got {count}")
            }
            Self::LengthMismatch { xs, ys } => {
                write!(f, "spline has {xs} abscissae but {ys} ordinates")
            }
            Self::NotIncreasing { index } => {
                write!(f, "spline abscissae not strictly increasing at node {index}")
            }
        }
    }
}

impl Error for SplineError {}
