//! A single tracked particle: construction, bookkeeping and records.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use log::debug;
use spintrack_core::{
    vec3, JobNumber, McGenerator, ParticleNumber, SolidId, SolidSet, SpinVector, StateVector,
    StopStatus,
};
use spintrack_log::{EndpointRecord, StatusRecord};

use crate::context::TrackingContext;
use crate::kind::{InitialConditions, ParticleKind, Secondary, Waypoint};
use crate::kinematics;
use crate::spin::SpinState;

// ── ParticleError ──────────────────────────────────────────────────

/// Errors raised while creating a particle.
#[derive(Clone, Debug, PartialEq)]
pub enum ParticleError {
    /// Polarisation outside `[-1, 1]`.
    InvalidPolarisation {
        /// The rejected value.
        value: f64,
    },
    /// Negative or non-finite kinetic energy.
    InvalidEnergy {
        /// The rejected value.
        value: f64,
    },
    /// Non-positive or non-finite rest mass.
    InvalidMass {
        /// The rejected value.
        value: f64,
    },
    /// No particle kind registered under this name.
    UnknownKind {
        /// The requested name.
        name: String,
    },
}

impl fmt::Display for ParticleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPolarisation { value } => {
                write!(f, "polarisation {value} outside [-1, 1]")
            }
            Self::InvalidEnergy { value } => write!(f, "invalid kinetic energy {value} eV"),
            Self::InvalidMass { value } => write!(f, "invalid rest mass {value} eV/c²"),
            Self::UnknownKind { name } => write!(f, "unknown particle kind '{name}'"),
        }
    }
}

impl Error for ParticleError {}

// ── Particle ───────────────────────────────────────────────────────

/// One particle with its full trajectory bookkeeping.
///
/// Created with [`Particle::new`], advanced with
/// [`integrate`](Particle::integrate), and inspected through accessors
/// afterwards.
pub struct Particle {
    pub(crate) kind: Arc<dyn ParticleKind>,
    number: ParticleNumber,
    job: JobNumber,
    start: Waypoint,
    pub(crate) end: Waypoint,
    spin_start: SpinVector,
    pub(crate) spin: SpinState,
    solid_start: SolidId,
    pub(crate) solid_end: SolidId,
    pub(crate) current_solids: SolidSet,
    pub(crate) status: Option<StopStatus>,
    lifetime: f64,
    max_trajectory_length: f64,
    pub(crate) h_max: f64,
    pub(crate) path_length: f64,
    pub(crate) hits: u64,
    pub(crate) steps: u64,
    pub(crate) secondaries: Vec<Secondary>,
}

impl fmt::Debug for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("kind", &self.kind.name())
            .field("number", &self.number)
            .field("end", &self.end)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Particle {
    /// Create a particle.
    ///
    /// The polarisation slot of the state vector is diced to ±1, with +1
    /// chosen with probability `(1 + polarisation) / 2`. If a field is
    /// present at the start point, the spin is set with projection
    /// `polarisation` onto it and a random azimuth. The lifetime is drawn
    /// from the kind's distribution and the solid set is looked up.
    pub fn new(
        kind: Arc<dyn ParticleKind>,
        number: ParticleNumber,
        initial: &InitialConditions,
        ctx: &TrackingContext<'_>,
        mc: &mut dyn McGenerator,
    ) -> Result<Self, ParticleError> {
        let props = kind.properties();
        let p = initial.polarisation;
        if !(-1.0..=1.0).contains(&p) {
            return Err(ParticleError::InvalidPolarisation { value: p });
        }
        if !(initial.energy.is_finite() && initial.energy >= 0.0) {
            return Err(ParticleError::InvalidEnergy {
                value: initial.energy,
            });
        }
        if !(props.mass.is_finite() && props.mass > 0.0) {
            return Err(ParticleError::InvalidMass { value: props.mass });
        }

        let c = ctx.constants.speed_of_light;
        let v = kinematics::speed_from_energy(initial.energy, props.mass, c);
        let (sin_t, cos_t) = initial.theta.sin_cos();
        let (sin_p, cos_p) = initial.phi.sin_cos();
        let velocity = [v * cos_p * sin_t, v * sin_p * sin_t, v * cos_t];
        let y = StateVector::new(initial.position, velocity, 0.0, mc.dice_polarisation(p));
        let start = Waypoint::new(initial.t, y);

        let mut spin = [0.0; 3];
        if let Some(field) = ctx.field {
            let b = field.b_field(initial.t, &initial.position);
            if b.magnitude > 0.0 {
                let az = mc.azimuth();
                let r = (1.0 - p * p).sqrt();
                spin = vec3::rotate_onto(&[r * az.sin(), r * az.cos(), p], &b.b);
            }
        }

        let lifetime = props.lifetime.draw(mc);
        let max_trajectory_length = props.max_trajectory_length;
        let current_solids = ctx.geometry.solids_at(initial.t, &initial.position);
        let solid = current_solids
            .current()
            .map_or(ctx.geometry.default_solid().id, |e| e.id);
        let h_max = kinematics::total_energy(props, &ctx.constants, initial.t, &y, ctx.field);
        debug!(
            "created {} #{number}: E={} eV, tau={lifetime} s",
            kind.name(),
            initial.energy
        );

        Ok(Self {
            kind,
            number,
            job: ctx.job,
            start,
            end: start,
            spin_start: spin,
            spin: SpinState::new(spin),
            solid_start: solid,
            solid_end: solid,
            current_solids,
            status: None,
            lifetime,
            max_trajectory_length,
            h_max,
            path_length: 0.0,
            hits: 0,
            steps: 0,
            secondaries: Vec::new(),
        })
    }

    /// The particle's kind.
    pub fn kind(&self) -> &Arc<dyn ParticleKind> {
        &self.kind
    }

    /// Particle number within its job.
    pub fn number(&self) -> ParticleNumber {
        self.number
    }

    /// Job the particle belongs to.
    pub fn job(&self) -> JobNumber {
        self.job
    }

    /// State at creation.
    pub fn start(&self) -> &Waypoint {
        &self.start
    }

    /// Latest state: the stop point once the particle has stopped.
    pub fn end(&self) -> &Waypoint {
        &self.end
    }

    /// Spin at creation.
    pub fn spin_start(&self) -> &SpinVector {
        &self.spin_start
    }

    /// Latest spin.
    pub fn spin_end(&self) -> &SpinVector {
        &self.spin.spin
    }

    /// Spin vector and its flip/precession diagnostics.
    pub fn spin_state(&self) -> &SpinState {
        &self.spin
    }

    /// Solid occupied at creation.
    pub fn solid_start(&self) -> SolidId {
        self.solid_start
    }

    /// Solid occupied at the latest state.
    pub fn solid_end(&self) -> SolidId {
        self.solid_end
    }

    /// All solids the particle currently occupies.
    pub fn current_solids(&self) -> &SolidSet {
        &self.current_solids
    }

    /// The highest-priority non-ignored occupied solid, if any.
    pub fn current_solid(&self) -> Option<SolidId> {
        self.current_solids.current().map(|e| e.id)
    }

    /// Terminal status, once set.
    pub fn status(&self) -> Option<StopStatus> {
        self.status
    }

    /// Proper lifetime drawn at creation [s].
    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    /// Path length budget [m].
    pub fn max_trajectory_length(&self) -> f64 {
        self.max_trajectory_length
    }

    /// Maximum total energy observed [eV].
    pub fn h_max(&self) -> f64 {
        self.h_max
    }

    /// Path length travelled so far [m].
    pub fn path_length(&self) -> f64 {
        self.path_length
    }

    /// Number of boundaries crossed between different solids.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of accepted integrator steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Decay products produced when the particle decayed.
    pub fn secondaries(&self) -> &[Secondary] {
        &self.secondaries
    }

    /// Move the decay products out of the particle.
    pub fn take_secondaries(&mut self) -> Vec<Secondary> {
        std::mem::take(&mut self.secondaries)
    }

    /// Set the terminal status and stop point. Only the first call has
    /// an effect; returns whether this call set the status.
    pub(crate) fn stop(&mut self, status: StopStatus, at: Waypoint, solid: SolidId) -> bool {
        if self.status.is_some() {
            return false;
        }
        self.status = Some(status);
        self.end = at;
        self.solid_end = solid;
        true
    }

    // ── Records ────────────────────────────────────────────────────

    pub(crate) fn endpoint_record(
        &self,
        ctx: &TrackingContext<'_>,
        at: &Waypoint,
        solid: SolidId,
    ) -> EndpointRecord {
        let props = self.kind.properties();
        let p = at.y.position();
        let (field, potential) = match ctx.field {
            Some(f) => (f.b_field(at.t, &p).magnitude, f.e_field(at.t, &p).potential),
            None => (0.0, 0.0),
        };
        let kinetic_energy =
            kinematics::kinetic_energy(props.mass, &at.y.velocity(), ctx.constants.speed_of_light);
        EndpointRecord {
            t: at.t,
            position: p,
            velocity: at.y.velocity(),
            polarisation: at.y.polarisation(),
            total_energy: kinetic_energy
                + kinematics::potential_energy(props, &ctx.constants, at.t, &at.y, ctx.field),
            kinetic_energy,
            field,
            potential,
            solid,
        }
    }

    /// Summary record of the particle at `at`.
    ///
    /// The spin is only known at [`end`](Particle::end), so the Bloch
    /// polarisation is the spin projected onto the field there. For a
    /// snapshot that is the end of the sub-segment containing it.
    pub(crate) fn status_record(
        &self,
        ctx: &TrackingContext<'_>,
        at: &Waypoint,
        solid: SolidId,
        status: Option<StopStatus>,
    ) -> StatusRecord {
        let bloch_polarisation = match ctx.field {
            Some(f) => {
                let b = f.b_field(self.end.t, &self.end.y.position());
                self.spin.projection_onto(&b.b)
            }
            None => 0.0,
        };
        StatusRecord {
            job: self.job,
            particle: self.number,
            start: self.endpoint_record(ctx, &self.start, self.solid_start),
            end: self.endpoint_record(ctx, at, solid),
            status,
            spin_flips: self.spin.flips,
            flip_probability: 1.0 - self.spin.no_flip_probability,
            hits: self.hits,
            steps: self.steps,
            path_length: self.path_length,
            h_max: self.h_max,
            bloch_polarisation,
            larmor_mean: self.spin.larmor.mean(),
            larmor_spread: self.spin.larmor.std_dev(),
        }
    }

    /// Final status record; `None` until the particle has stopped.
    pub fn final_record(&self, ctx: &TrackingContext<'_>) -> Option<StatusRecord> {
        self.status
            .map(|s| self.status_record(ctx, &self.end, self.solid_end, Some(s)))
    }
}
