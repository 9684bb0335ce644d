//! Configurable particle kinds for engine tests.
//!
//! - [`Behaviour::Transparent`]: passes through everything.
//! - [`Behaviour::Absorber`]: absorbed at the end of any step spent in a
//!   solid other than the default one.
//! - [`Behaviour::Mirror`]: specularly reflected at every boundary.
//! - [`Behaviour::Decaying`]: spawns the listed kinds at rest on decay.

use std::sync::Mutex;

use spintrack_core::{vec3, McGenerator, SolidId, StateVector, StopStatus, Vec3};
use spintrack_engine::{
    HitEvent, HitVerdict, HookOutcome, InitialConditions, Lifetime, ParticleKind,
    ParticleProperties, Secondary, StepEvent, Waypoint,
};

/// Neutron rest mass [eV/c²].
pub const NEUTRON_MASS: f64 = 939_565_420.52;

/// Neutron gyromagnetic ratio [1/(T·s)].
pub const NEUTRON_GYRO: f64 = -1.832_471_71e8;

/// Neutral, moment-free, stable particle with the neutron's mass.
pub fn test_properties() -> ParticleProperties {
    ParticleProperties {
        charge: 0.0,
        mass: NEUTRON_MASS,
        magnetic_moment: 0.0,
        gyromagnetic_ratio: 0.0,
        lifetime: Lifetime::Stable,
        max_trajectory_length: f64::INFINITY,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Behaviour {
    Transparent,
    Absorber,
    Mirror,
    Decaying { products: Vec<String> },
}

/// A hit as seen by [`ParticleKind::on_hit`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedHit {
    pub t1: f64,
    pub y1: StateVector,
    pub t2: f64,
    pub y2: StateVector,
    pub normal: Vec3,
    pub leaving: SolidId,
    pub entering: SolidId,
}

/// A resolved segment as seen by [`ParticleKind::on_step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedStep {
    pub t1: f64,
    pub y1: StateVector,
    pub t2: f64,
    pub y2: StateVector,
    pub solid: SolidId,
}

pub struct TestKind {
    name: String,
    properties: ParticleProperties,
    behaviour: Behaviour,
    hits: Mutex<Vec<RecordedHit>>,
    steps: Mutex<Vec<RecordedStep>>,
}

impl TestKind {
    pub fn new(name: &str, properties: ParticleProperties, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_owned(),
            properties,
            behaviour,
            hits: Mutex::new(Vec::new()),
            steps: Mutex::new(Vec::new()),
        }
    }

    pub fn transparent(properties: ParticleProperties) -> Self {
        Self::new("transparent", properties, Behaviour::Transparent)
    }

    pub fn absorber(properties: ParticleProperties) -> Self {
        Self::new("absorber", properties, Behaviour::Absorber)
    }

    pub fn mirror(properties: ParticleProperties) -> Self {
        Self::new("mirror", properties, Behaviour::Mirror)
    }

    pub fn decaying(properties: ParticleProperties, products: &[&str]) -> Self {
        Self::new(
            "decaying",
            properties,
            Behaviour::Decaying {
                products: products.iter().map(|p| (*p).to_owned()).collect(),
            },
        )
    }

    /// Every hit seen so far, in order.
    pub fn hits(&self) -> Vec<RecordedHit> {
        match self.hits.lock() {
            Ok(h) => h.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Every segment passed to the step hook so far, in order.
    pub fn steps(&self) -> Vec<RecordedStep> {
        match self.steps.lock() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ParticleKind for TestKind {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &ParticleProperties {
        &self.properties
    }

    fn on_hit(&self, hit: &HitEvent<'_>, _mc: &mut dyn McGenerator) -> HitVerdict {
        let record = RecordedHit {
            t1: hit.t1,
            y1: *hit.y1,
            t2: hit.t2,
            y2: *hit.y2,
            normal: hit.normal,
            leaving: hit.leaving.id,
            entering: hit.entering.id,
        };
        match self.hits.lock() {
            Ok(mut h) => h.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }

        if self.behaviour != Behaviour::Mirror {
            return HitVerdict::pass();
        }
        let v = hit.y1.velocity();
        let n = hit.normal;
        let mut y = *hit.y1;
        y.set_velocity(vec3::sub(&v, &vec3::scale(&n, 2.0 * vec3::dot(&v, &n))));
        HitVerdict {
            traversed: false,
            outcome: HookOutcome::Redirect(Waypoint::new(hit.t1, y)),
        }
    }

    fn on_step(&self, step: &StepEvent<'_>, _mc: &mut dyn McGenerator) -> HookOutcome {
        let record = RecordedStep {
            t1: step.t1,
            y1: *step.y1,
            t2: step.t2,
            y2: *step.y2,
            solid: step.solid.id,
        };
        match self.steps.lock() {
            Ok(mut s) => s.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        if self.behaviour == Behaviour::Absorber && step.solid.id != step.default_solid.id {
            return HookOutcome::Stop {
                status: StopStatus::AbsorbedInMaterial,
                at: Waypoint::new(step.t2, *step.y2),
            };
        }
        HookOutcome::Continue
    }

    fn decay(&self, end: &Waypoint, _mc: &mut dyn McGenerator) -> Vec<Secondary> {
        let Behaviour::Decaying { products } = &self.behaviour else {
            return Vec::new();
        };
        products
            .iter()
            .map(|kind| Secondary {
                kind: kind.clone(),
                initial: InitialConditions {
                    t: end.t,
                    position: end.y.position(),
                    energy: 0.0,
                    phi: 0.0,
                    theta: 0.0,
                    polarisation: 0.0,
                },
            })
            .collect()
    }
}
