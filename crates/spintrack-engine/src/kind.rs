//! Particle kinds: physical properties plus the boundary, step and
//! decay hooks the tracker calls at well-defined points.
//!
//! The tracker never depends on a kind's identity. Everything
//! kind-specific (reflection, absorption, decay products) goes through
//! [`ParticleKind`].

use spintrack_core::{McGenerator, Solid, StateVector, StopStatus, Vec3};
use spintrack_ode::DenseOutput;

/// A point on a trajectory: lab time plus full state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// Lab time [s].
    pub t: f64,
    /// State at `t`.
    pub y: StateVector,
}

impl Waypoint {
    /// Create a waypoint.
    pub fn new(t: f64, y: StateVector) -> Self {
        Self { t, y }
    }
}

/// How a particle's lifetime is chosen at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lifetime {
    /// The particle never decays.
    Stable,
    /// Fixed proper lifetime [s].
    Fixed(f64),
    /// Exponentially distributed proper lifetime with the given mean [s].
    Exponential {
        /// Mean lifetime [s].
        mean: f64,
    },
}

impl Lifetime {
    /// Draw a proper lifetime.
    pub fn draw(&self, mc: &mut dyn McGenerator) -> f64 {
        match *self {
            Self::Stable => f64::INFINITY,
            Self::Fixed(tau) => tau,
            Self::Exponential { mean } => mc.exponential(mean),
        }
    }
}

/// Physical constants of a particle kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleProperties {
    /// Charge [C].
    pub charge: f64,
    /// Rest mass [eV/c²].
    pub mass: f64,
    /// Magnetic moment [J/T].
    pub magnetic_moment: f64,
    /// Gyromagnetic ratio [1/(T·s)]. Zero disables spin tracking.
    pub gyromagnetic_ratio: f64,
    /// Lifetime distribution.
    pub lifetime: Lifetime,
    /// Maximum path length before the particle counts as not finished [m].
    pub max_trajectory_length: f64,
}

/// Result of a boundary or step hook.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HookOutcome {
    /// Nothing happened; keep integrating.
    Continue,
    /// The trajectory was altered; integration restarts from the waypoint.
    Redirect(Waypoint),
    /// The particle stops at the waypoint with the given status.
    Stop {
        /// Terminal status.
        status: StopStatus,
        /// Final state.
        at: Waypoint,
    },
}

/// What the hit hook decided about a boundary crossing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitVerdict {
    /// Whether the particle actually passed through the surface. A
    /// reflected particle has not, so its solid set stays unchanged.
    pub traversed: bool,
    /// Follow-up action.
    pub outcome: HookOutcome,
}

impl HitVerdict {
    /// The particle passes through unaffected.
    pub fn pass() -> Self {
        Self {
            traversed: true,
            outcome: HookOutcome::Continue,
        }
    }
}

/// Context handed to [`ParticleKind::on_hit`].
///
/// `t1, y1` and `t2, y2` bracket the crossing within the configured
/// reflect tolerance.
pub struct HitEvent<'a> {
    /// Time before the crossing.
    pub t1: f64,
    /// State before the crossing.
    pub y1: &'a StateVector,
    /// Time after the crossing.
    pub t2: f64,
    /// State after the crossing.
    pub y2: &'a StateVector,
    /// Surface normal of the governing collision.
    pub normal: Vec3,
    /// Solid being left.
    pub leaving: &'a Solid,
    /// Solid being entered.
    pub entering: &'a Solid,
}

/// Context handed to [`ParticleKind::on_step`].
pub struct StepEvent<'a> {
    /// Segment start time.
    pub t1: f64,
    /// Segment start state.
    pub y1: &'a StateVector,
    /// Segment end time.
    pub t2: f64,
    /// Segment end state.
    pub y2: &'a StateVector,
    /// Solid the particle currently occupies.
    pub solid: &'a Solid,
    /// The geometry's default solid.
    pub default_solid: &'a Solid,
    /// Dense trajectory, valid on `[t1, t2]`.
    pub trajectory: &'a dyn DenseOutput<8>,
}

impl StepEvent<'_> {
    /// State at time `t` inside the segment.
    pub fn state_at(&self, t: f64) -> StateVector {
        StateVector(self.trajectory.calc_state(t))
    }
}

/// Initial conditions of a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialConditions {
    /// Start time [s].
    pub t: f64,
    /// Start position [m].
    pub position: Vec3,
    /// Kinetic energy [eV].
    pub energy: f64,
    /// Azimuth of the velocity [rad].
    pub phi: f64,
    /// Polar angle of the velocity [rad].
    pub theta: f64,
    /// Initial polarisation in `[-1, 1]`.
    pub polarisation: f64,
}

/// A particle spawned by a decay, integrated after its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Secondary {
    /// Name of the kind to create.
    pub kind: String,
    /// Where and how it starts.
    pub initial: InitialConditions,
}

/// Capability set of a particle kind.
pub trait ParticleKind: Send + Sync {
    /// Kind name, used in output file names.
    fn name(&self) -> &str;

    /// Physical constants.
    fn properties(&self) -> &ParticleProperties;

    /// Called when the particle crosses between two different solids.
    fn on_hit(&self, hit: &HitEvent<'_>, mc: &mut dyn McGenerator) -> HitVerdict;

    /// Called for every resolved segment to decide absorption.
    fn on_step(&self, step: &StepEvent<'_>, mc: &mut dyn McGenerator) -> HookOutcome;

    /// Called once when the particle decays. Returns the products.
    fn decay(&self, end: &Waypoint, mc: &mut dyn McGenerator) -> Vec<Secondary> {
        let _ = (end, mc);
        Vec::new()
    }
}

// ── Electron ───────────────────────────────────────────────────────

/// Electron rest mass [eV/c²].
pub const ELECTRON_MASS: f64 = 510_998.950_69;

/// Electrons: charged, no magnetic moment, absorbed in any solid other
/// than the default one, never decay.
#[derive(Clone, Debug)]
pub struct Electron {
    properties: ParticleProperties,
}

impl Electron {
    /// Name used for output files.
    pub const NAME: &'static str = "electron";

    /// Create the electron kind.
    pub fn new() -> Self {
        Self {
            properties: ParticleProperties {
                charge: -1.602_176_634e-19,
                mass: ELECTRON_MASS,
                magnetic_moment: 0.0,
                gyromagnetic_ratio: 0.0,
                lifetime: Lifetime::Stable,
                max_trajectory_length: f64::INFINITY,
            },
        }
    }
}

impl Default for Electron {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleKind for Electron {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn properties(&self) -> &ParticleProperties {
        &self.properties
    }

    fn on_hit(&self, _: &HitEvent<'_>, _: &mut dyn McGenerator) -> HitVerdict {
        HitVerdict::pass()
    }

    fn on_step(&self, step: &StepEvent<'_>, mc: &mut dyn McGenerator) -> HookOutcome {
        if step.solid.id == step.default_solid.id {
            return HookOutcome::Continue;
        }
        // Absorbed at a uniformly chosen point of the segment.
        let t = step.t1 + mc.uniform(0.0, 1.0) * (step.t2 - step.t1);
        HookOutcome::Stop {
            status: StopStatus::AbsorbedInMaterial,
            at: Waypoint::new(t, step.state_at(t)),
        }
    }
}
