//! Analytic dense trajectories for driving the spin sub-engine alone.

use spintrack_core::{StateVector, Vec3, STATE_VARIABLES};
use spintrack_ode::DenseOutput;

/// A particle at rest at `position` with polarisation marker `pol`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stationary {
    pub position: Vec3,
    pub pol: f64,
}

impl Stationary {
    pub fn new(position: Vec3, pol: f64) -> Self {
        Self { position, pol }
    }

    pub fn state(&self, t: f64) -> StateVector {
        StateVector(self.calc_state(t))
    }
}

impl DenseOutput<STATE_VARIABLES> for Stationary {
    fn calc_state(&self, t: f64) -> [f64; STATE_VARIABLES] {
        let p = self.position;
        [p[0], p[1], p[2], 0.0, 0.0, 0.0, t, self.pol]
    }
}

/// Force-free straight-line motion from `origin` at `t = 0`.
///
/// Proper time is taken equal to lab time; only valid for slow motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ballistic {
    pub origin: Vec3,
    pub velocity: Vec3,
    pub pol: f64,
}

impl Ballistic {
    pub fn new(origin: Vec3, velocity: Vec3, pol: f64) -> Self {
        Self {
            origin,
            velocity,
            pol,
        }
    }

    pub fn state(&self, t: f64) -> StateVector {
        StateVector(self.calc_state(t))
    }
}

impl DenseOutput<STATE_VARIABLES> for Ballistic {
    fn calc_state(&self, t: f64) -> [f64; STATE_VARIABLES] {
        let (o, v) = (self.origin, self.velocity);
        [
            o[0] + v[0] * t,
            o[1] + v[1] * t,
            o[2] + v[2] * t,
            v[0],
            v[1],
            v[2],
            t,
            self.pol,
        ]
    }
}
