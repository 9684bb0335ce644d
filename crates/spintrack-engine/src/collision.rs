//! Boundary-crossing resolution for one trajectory sub-segment.
//!
//! A sub-segment is checked against the geometry for crossings. When the
//! earliest crossing is not yet localized to within the reflect
//! tolerance, the segment is cut just before and just after it and the
//! pieces are re-checked in time order. The cuts come from an explicit
//! worklist, so recursion depth is bounded by the bisection cap rather
//! than the call stack.
//!
//! Once a crossing is exact, the solid set is updated, the particle's
//! hit hook runs if the governing solid changes, and finally the step
//! hook decides on absorption.

use std::sync::Arc;

use log::{debug, warn};
use smallvec::SmallVec;
use spintrack_core::{
    Collision, Crossing, McGenerator, Solid, SolidEntry, SolidSet, StateVector, StopStatus,
    STATE_VARIABLES,
};
use spintrack_log::{HitRecord, LogError, RecordSink};
use spintrack_ode::DenseOutput;

use crate::config::TrackingOptions;
use crate::context::TrackingContext;
use crate::kind::{HitEvent, HookOutcome, ParticleKind, StepEvent, Waypoint};
use crate::particle::Particle;

/// Outcome of resolving one sub-segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// The segment was traversed unchanged.
    Continue,
    /// A hook altered the trajectory; integration restarts from here.
    Altered(Waypoint),
    /// The particle stopped here.
    Terminal(Waypoint),
}

/// Pending piece of a sub-segment with its bisection depth.
type Piece = (Waypoint, Waypoint, u32);

impl Particle {
    /// Resolve the sub-segment `a → b` of the current trajectory step.
    ///
    /// Returns `Err` only if writing a hit record fails.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn check_hit(
        &mut self,
        a: Waypoint,
        b: Waypoint,
        trajectory: &dyn DenseOutput<STATE_VARIABLES>,
        ctx: &TrackingContext<'_>,
        options: &TrackingOptions,
        mc: &mut dyn McGenerator,
        sink: &mut dyn RecordSink,
    ) -> Result<Resolution, LogError> {
        let kind = Arc::clone(&self.kind);
        let mut work: SmallVec<[Piece; 8]> = SmallVec::new();
        work.push((a, b, 0));

        while let Some((p1, p2, depth)) = work.pop() {
            let current = self.governing_solid(ctx);
            if !ctx
                .geometry
                .check_segment(&p1.y.position(), &p2.y.position())
            {
                warn!(
                    "#{}: hit outer boundaries at t={} x={:?}",
                    self.number(),
                    p2.t,
                    p2.y.position()
                );
                self.stop(StopStatus::HitBoundaries, p2, current.id);
                return Ok(Resolution::Terminal(p2));
            }

            let collisions = match ctx.geometry.collisions(
                p1.t,
                &p1.y.position(),
                p2.t,
                &p2.y.position(),
            ) {
                Ok(c) => c,
                Err(e) => {
                    warn!("#{}: geometry query failed at t={}: {e}", self.number(), p2.t);
                    self.stop(StopStatus::GeometryQueryError, p2, current.id);
                    return Ok(Resolution::Terminal(p2));
                }
            };

            let Some(first) = collisions.first().copied() else {
                match self.step_hook(kind.as_ref(), &p1, &p2, trajectory, ctx, mc) {
                    Resolution::Continue => continue,
                    other => return Ok(other),
                }
            };

            let tol = ctx.config.reflect_tolerance;
            let exact = (first.distance_from_start() < tol && first.distance_from_end() < tol)
                || depth >= ctx.config.max_bisection_depth;
            if exact {
                let resolved = self.cross(
                    kind.as_ref(),
                    &p1,
                    &p2,
                    &collisions,
                    trajectory,
                    ctx,
                    options,
                    mc,
                    sink,
                )?;
                match resolved {
                    Resolution::Continue => continue,
                    other => return Ok(other),
                }
            }

            // Cut just before and just after the crossing; the offset grows
            // with depth so each round strictly shrinks the bracket.
            let offset = 0.01 * f64::from(depth);
            let at = |s: f64| p1.t + (p2.t - p1.t) * s;
            let sample = |t: f64| Waypoint::new(t, StateVector(trajectory.calc_state(t)));

            let mut before = p1;
            let mut pieces: SmallVec<[Piece; 3]> = SmallVec::new();
            let t_a = at(first.s - offset);
            if t_a > p1.t && t_a < p2.t {
                before = sample(t_a);
                pieces.push((p1, before, depth + 1));
            }
            let mut after = before;
            let t_b = at(first.s + offset);
            if t_b > before.t && t_b < p2.t {
                after = sample(t_b);
                pieces.push((before, after, depth + 1));
            }
            pieces.push((after, p2, depth + 1));
            work.extend(pieces.into_iter().rev());
        }
        Ok(Resolution::Continue)
    }

    /// Highest-priority occupied solid, or the geometry's default.
    fn governing_solid<'c>(&self, ctx: &TrackingContext<'c>) -> &'c Solid {
        match self.current_solids.current() {
            Some(e) => ctx.solid(e.id),
            None => ctx.geometry.default_solid(),
        }
    }

    /// Apply an exactly localized set of crossings between `p1` and `p2`.
    #[allow(clippy::too_many_arguments)]
    fn cross(
        &mut self,
        kind: &dyn ParticleKind,
        p1: &Waypoint,
        p2: &Waypoint,
        collisions: &[Collision],
        trajectory: &dyn DenseOutput<STATE_VARIABLES>,
        ctx: &TrackingContext<'_>,
        options: &TrackingOptions,
        mc: &mut dyn McGenerator,
        sink: &mut dyn RecordSink,
    ) -> Result<Resolution, LogError> {
        let current = self.governing_solid(ctx);
        let mut new_solids: SolidSet = self.current_solids.clone();
        let mut governing: Option<(Collision, u32)> = None;

        for coll in collisions {
            let Some(solid) = ctx.geometry.solid(coll.solid) else {
                warn!("#{}: crossing of unknown solid {}", self.number(), coll.solid);
                self.stop(StopStatus::GeometryError, *p1, current.id);
                return Ok(Resolution::Terminal(*p1));
            };
            let present = self.current_solids.contains(coll.solid);
            let consistent = match coll.crossing() {
                Crossing::Entering => !present,
                Crossing::Leaving => present,
                Crossing::Tangential => false,
            };
            if !consistent {
                warn!(
                    "#{}: inconsistent {:?} crossing of '{}' at t={}",
                    self.number(),
                    coll.crossing(),
                    solid.name,
                    p2.t
                );
                self.stop(StopStatus::GeometryError, *p1, current.id);
                return Ok(Resolution::Terminal(*p1));
            }

            if coll.crossing() == Crossing::Entering {
                new_solids.insert(SolidEntry {
                    id: solid.id,
                    priority: solid.priority,
                    ignored: coll.ignored,
                });
            } else {
                new_solids.remove(solid.id);
            }

            match governing {
                Some((_, priority)) if solid.priority <= priority => {}
                _ => governing = Some((*coll, solid.priority)),
            }
        }
        let normal = governing.map_or([0.0; 3], |(c, _)| c.normal);

        let leaving = current;
        let entering = match new_solids.current() {
            Some(e) => ctx.solid(e.id),
            None => ctx.geometry.default_solid(),
        };

        let mut traversed = true;
        let mut outcome = HookOutcome::Continue;
        if leaving.id != entering.id {
            debug!(
                "#{}: {} -> {} at t={}",
                self.number(),
                leaving.name,
                entering.name,
                p2.t
            );
            let verdict = kind.on_hit(
                &HitEvent {
                    t1: p1.t,
                    y1: &p1.y,
                    t2: p2.t,
                    y2: &p2.y,
                    normal,
                    leaving,
                    entering,
                },
                mc,
            );
            traversed = verdict.traversed;
            outcome = verdict.outcome;

            if options.hit_log {
                let after = match &outcome {
                    HookOutcome::Continue => p2.y,
                    HookOutcome::Redirect(w) => w.y,
                    HookOutcome::Stop { at, .. } => at.y,
                };
                sink.hit(
                    kind.name(),
                    &HitRecord {
                        job: self.job(),
                        particle: self.number(),
                        t: p1.t,
                        position: p1.y.position(),
                        velocity_before: p1.y.velocity(),
                        polarisation_before: p1.y.polarisation(),
                        velocity_after: after.velocity(),
                        polarisation_after: after.polarisation(),
                        normal,
                        leaving: leaving.id,
                        entering: entering.id,
                    },
                )?;
            }
            self.hits += 1;
        }

        if traversed {
            self.current_solids = new_solids;
        }

        Ok(match outcome {
            HookOutcome::Continue => self.step_hook(kind, p1, p2, trajectory, ctx, mc),
            HookOutcome::Redirect(w) => Resolution::Altered(w),
            HookOutcome::Stop { status, at } => {
                let solid = self.governing_solid(ctx).id;
                self.stop(status, at, solid);
                Resolution::Terminal(at)
            }
        })
    }

    /// Run the kind's per-step hook on a resolved segment.
    fn step_hook(
        &mut self,
        kind: &dyn ParticleKind,
        p1: &Waypoint,
        p2: &Waypoint,
        trajectory: &dyn DenseOutput<STATE_VARIABLES>,
        ctx: &TrackingContext<'_>,
        mc: &mut dyn McGenerator,
    ) -> Resolution {
        let solid = self.governing_solid(ctx);
        let outcome = kind.on_step(
            &StepEvent {
                t1: p1.t,
                y1: &p1.y,
                t2: p2.t,
                y2: &p2.y,
                solid,
                default_solid: ctx.geometry.default_solid(),
                trajectory,
            },
            mc,
        );
        match outcome {
            HookOutcome::Continue => Resolution::Continue,
            HookOutcome::Redirect(w) => Resolution::Altered(w),
            HookOutcome::Stop { status, at } => {
                debug!("#{}: {status} in '{}' at t={}", self.number(), solid.name, at.t);
                self.stop(status, at, solid.id);
                Resolution::Terminal(at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spintrack_core::{Geometry, GeometryError, ParticleNumber, SolidId, Vec3};
    use spintrack_log::NullSink;

    use crate::kind::{Electron, InitialConditions};
    use crate::mc::ChaChaGenerator;

    const WALL: f64 = 0.37;

    /// Vacuum for `x <= WALL`, solid 1 beyond. An optional overlay
    /// solid shares the surface but reports its own normal.
    struct Plane {
        vacuum: Solid,
        wall: Solid,
        overlay: Option<(Solid, Vec3)>,
    }

    impl Plane {
        fn new() -> Self {
            Self {
                vacuum: Solid::new(SolidId(0), "vacuum", 0),
                wall: Solid::new(SolidId(1), "wall", 1),
                overlay: None,
            }
        }

        fn with_overlay(priority: u32, normal: Vec3) -> Self {
            Self {
                overlay: Some((Solid::new(SolidId(2), "overlay", priority), normal)),
                ..Self::new()
            }
        }

        fn beyond(&self) -> impl Iterator<Item = (&Solid, Vec3)> {
            std::iter::once((&self.wall, [-1.0, 0.0, 0.0]))
                .chain(self.overlay.as_ref().map(|(s, n)| (s, *n)))
        }
    }

    impl Geometry for Plane {
        fn check_segment(&self, _: &Vec3, _: &Vec3) -> bool {
            true
        }

        fn collisions(
            &self,
            _: f64,
            p1: &Vec3,
            _: f64,
            p2: &Vec3,
        ) -> Result<Vec<Collision>, GeometryError> {
            if !(p1[0] <= WALL && p2[0] > WALL) {
                return Ok(Vec::new());
            }
            let s = (WALL - p1[0]) / (p2[0] - p1[0]);
            Ok(self
                .beyond()
                .map(|(solid, normal)| Collision {
                    s,
                    distnormal: -(p2[0] - p1[0]),
                    solid: solid.id,
                    normal,
                    ignored: false,
                })
                .collect())
        }

        fn solids_at(&self, _: f64, p: &Vec3) -> SolidSet {
            let mut set = SolidSet::new();
            set.insert(SolidEntry {
                id: self.vacuum.id,
                priority: 0,
                ignored: false,
            });
            if p[0] > WALL {
                for (solid, _) in self.beyond() {
                    set.insert(SolidEntry {
                        id: solid.id,
                        priority: solid.priority,
                        ignored: false,
                    });
                }
            }
            set
        }

        fn solid(&self, id: SolidId) -> Option<&Solid> {
            std::iter::once(&self.vacuum)
                .chain(self.beyond().map(|(s, _)| s))
                .find(|s| s.id == id)
        }

        fn default_solid(&self) -> &Solid {
            &self.vacuum
        }
    }

    /// Unit-speed motion along x from the origin.
    struct Line;

    impl DenseOutput<STATE_VARIABLES> for Line {
        fn calc_state(&self, t: f64) -> [f64; STATE_VARIABLES] {
            StateVector::new([t, 0.0, 0.0], [1.0, 0.0, 0.0], t, 1.0).0
        }
    }

    fn at(t: f64) -> Waypoint {
        Waypoint::new(t, StateVector(Line.calc_state(t)))
    }

    fn particle(ctx: &TrackingContext<'_>, mc: &mut ChaChaGenerator) -> Particle {
        let initial = InitialConditions {
            t: 0.0,
            position: [0.0; 3],
            energy: 1.0,
            phi: 0.0,
            theta: std::f64::consts::FRAC_PI_2,
            polarisation: 1.0,
        };
        Particle::new(Arc::new(Electron::new()), ParticleNumber(1), &initial, ctx, mc).unwrap()
    }

    #[test]
    fn crossing_is_localized_then_absorbed() {
        let geometry = Plane::new();
        let ctx = TrackingContext::new(&geometry);
        let mut mc = ChaChaGenerator::from_seed(1);
        let mut p = particle(&ctx, &mut mc);
        let options = TrackingOptions::default();

        let out = p
            .check_hit(at(0.0), at(1.0), &Line, &ctx, &options, &mut mc, &mut NullSink)
            .unwrap();
        let Resolution::Terminal(end) = out else {
            panic!("expected absorption, got {out:?}");
        };
        let tol = ctx.config.reflect_tolerance;
        assert!((end.t - WALL).abs() < 2.0 * tol, "t = {}", end.t);
        assert_eq!(p.status(), Some(StopStatus::AbsorbedInMaterial));
        assert_eq!(p.hits(), 1);
        assert_eq!(p.current_solid(), Some(SolidId(1)));
        assert_eq!(p.solid_end(), SolidId(1));
    }

    #[test]
    fn segment_without_crossing_continues() {
        let geometry = Plane::new();
        let ctx = TrackingContext::new(&geometry);
        let mut mc = ChaChaGenerator::from_seed(1);
        let mut p = particle(&ctx, &mut mc);
        let out = p
            .check_hit(
                at(0.0),
                at(0.3),
                &Line,
                &ctx,
                &TrackingOptions::default(),
                &mut mc,
                &mut NullSink,
            )
            .unwrap();
        assert_eq!(out, Resolution::Continue);
        assert_eq!(p.status(), None);
        assert_eq!(p.hits(), 0);
    }

    #[test]
    fn bisection_cap_forces_resolution() {
        let geometry = Plane::new();
        let config = crate::config::IntegratorConfig {
            max_bisection_depth: 1,
            ..Default::default()
        };
        let ctx = TrackingContext::new(&geometry).with_config(config);
        let mut mc = ChaChaGenerator::from_seed(1);
        let mut p = particle(&ctx, &mut mc);
        let out = p
            .check_hit(
                at(0.0),
                at(1.0),
                &Line,
                &ctx,
                &TrackingOptions::default(),
                &mut mc,
                &mut NullSink,
            )
            .unwrap();
        assert!(matches!(out, Resolution::Terminal(_)));
        assert_eq!(p.hits(), 1);
    }

    fn hit_normal(geometry: &Plane) -> (Vec3, SolidId) {
        let ctx = TrackingContext::new(geometry);
        let mut mc = ChaChaGenerator::from_seed(1);
        let mut p = particle(&ctx, &mut mc);
        let options = TrackingOptions {
            hit_log: true,
            ..TrackingOptions::default()
        };
        let mut sink = spintrack_log::MemorySink::new();
        p.check_hit(at(0.0), at(1.0), &Line, &ctx, &options, &mut mc, &mut sink)
            .unwrap();
        assert_eq!(sink.hits.len(), 1);
        let hit = &sink.hits[0].1;
        (hit.normal, hit.entering)
    }

    #[test]
    fn simultaneous_crossings_take_highest_priority_normal() {
        let tilted = [0.0, -1.0, 0.0];
        let (normal, entering) = hit_normal(&Plane::with_overlay(5, tilted));
        assert_eq!(normal, tilted);
        assert_eq!(entering, SolidId(2));

        let (normal, entering) = hit_normal(&Plane::with_overlay(0, tilted));
        assert_eq!(normal, [-1.0, 0.0, 0.0]);
        assert_eq!(entering, SolidId(1));
    }
}
