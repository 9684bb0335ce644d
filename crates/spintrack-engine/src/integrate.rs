//! The adaptive trajectory loop.
//!
//! Each accepted macro-step of the trajectory stepper is clipped to the
//! decay instant and to `tmax`, then cut into sub-segments no longer
//! than the maximum sample distance. Every sub-segment goes through the
//! collision resolver and the spin sub-engine before the running totals
//! and logs are updated.

use std::sync::Arc;

use log::{debug, info, warn};
use spintrack_core::{McGenerator, SolidId, StateVector, StopStatus};
use spintrack_log::{LogError, RecordSink, TrackRecord};
use spintrack_ode::{DenseOutput, DenseStepper, Tolerances};

use crate::collision::Resolution;
use crate::config::TrackingOptions;
use crate::context::TrackingContext;
use crate::kind::Waypoint;
use crate::kinematics;
use crate::motion::EquationOfMotion;
use crate::particle::Particle;
use crate::spin::{SpinIntegrator, SpinOutcome};

impl Particle {
    /// Integrate the trajectory from the current end state until lab time
    /// `tmax` or until a terminal event stops the particle.
    ///
    /// Physics failures end the trajectory with a [`StopStatus`] and are
    /// not errors; `Err` means a record could not be written. The final
    /// status record goes to `sink`. If the particle decayed, its decay
    /// products are available from [`secondaries`](Particle::secondaries).
    pub fn integrate(
        &mut self,
        tmax: f64,
        options: &TrackingOptions,
        ctx: &TrackingContext<'_>,
        mc: &mut dyn McGenerator,
        sink: &mut dyn RecordSink,
    ) -> Result<(), LogError> {
        if self.status.is_some() {
            return Ok(());
        }
        let kind = Arc::clone(&self.kind);
        let props = kind.properties();
        let cfg = &ctx.config;
        let eom = EquationOfMotion::new(props, &ctx.constants, ctx.field);

        info!(
            "tracking {} #{} from t={} to tmax={tmax}",
            kind.name(),
            self.number(),
            self.end.t
        );

        let mut t = self.end.t;
        let mut y = self.end.y;
        let speed = y.speed();
        let mut h = if speed > 0.0 {
            cfg.initial_step_length / speed
        } else {
            cfg.initial_step_at_rest
        };

        if options.track_log {
            let rec = self.track_record(ctx, &self.end);
            sink.track(kind.name(), &rec)?;
        }
        let mut last_track = t;
        let t0 = t;
        let mut snapshots = options
            .snapshots
            .iter()
            .copied()
            .skip_while(move |&s| s < t0)
            .peekable();
        let mut spin = SpinIntegrator::new(props, ctx, options, kind.name(), self.number(), t);

        let tolerances = Tolerances::new(cfg.ode_tolerance, cfg.ode_tolerance);
        let mut stepper = DenseStepper::<8>::new(tolerances)
            .with_max_failed_attempts(cfg.max_failed_attempts);
        let mut reset = true;

        if t >= tmax {
            self.stop(StopStatus::NotFinished, self.end, self.solid_end);
        }

        while self.status.is_none() {
            if reset {
                stepper.initialize(*y.as_array(), t, h);
                reset = false;
            }
            let mut x1 = t;
            let mut y1 = y;

            if let Err(e) = stepper.do_step(&eom) {
                warn!("#{}: trajectory integration failed at t={t}: {e}", self.number());
                let solid = self.current_or_default(ctx);
                self.stop(StopStatus::OdeError, Waypoint::new(t, y), solid);
                break;
            }
            t = stepper.current_time();
            y = StateVector(*stepper.current_state());
            h = stepper.current_time_step();
            self.steps += 1;

            let mut decay_at = None;
            if y.proper_time() > self.lifetime() {
                t = x1 + (t - x1) * (self.lifetime() - y1.proper_time())
                    / (y.proper_time() - y1.proper_time());
                y = StateVector(stepper.calc_state(t));
                decay_at = Some(t);
            }
            if t > tmax {
                t = tmax;
                y = StateVector(stepper.calc_state(tmax));
            }

            while x1 < t {
                let v1 = y1.speed();
                let mut x2 = x1 + cfg.max_sample_distance / v1;
                let mut y2;
                if !(x2 > x1 && x2 < t) {
                    x2 = t;
                    y2 = y;
                } else {
                    y2 = StateVector(stepper.calc_state(x2));
                }

                let (from, to) = (Waypoint::new(x1, y1), Waypoint::new(x2, y2));
                match self.check_hit(from, to, &stepper, ctx, options, mc, sink)? {
                    Resolution::Continue => {}
                    Resolution::Altered(w) | Resolution::Terminal(w) => {
                        x2 = w.t;
                        y2 = w.y;
                        t = x2;
                        y = y2;
                        reset = true;
                    }
                }

                let to = Waypoint::new(x2, y2);
                match spin.step(&from, &to, &stepper, &mut self.spin, mc, sink)? {
                    SpinOutcome::Unchanged => {}
                    SpinOutcome::PolarisationChanged(p) => {
                        debug!("#{}: polarisation set to {p} at t={x2}", self.number());
                        y2.set_polarisation(p);
                        t = x2;
                        y = y2;
                        reset = true;
                    }
                    SpinOutcome::Failed(e) => {
                        warn!("#{}: spin integration failed at t={x1}: {e}", self.number());
                        let solid = self.current_or_default(ctx);
                        self.stop(StopStatus::OdeError, from, solid);
                        break;
                    }
                }

                self.path_length += y1.distance_to(&y2);
                let energy = kinematics::total_energy(props, &ctx.constants, x2, &y2, ctx.field);
                self.h_max = self.h_max.max(energy);
                if self.status.is_none() {
                    self.end = Waypoint::new(x2, y2);
                    self.solid_end = self.current_or_default(ctx);
                }

                if options.snapshot_log {
                    while let Some(&snap) = snapshots.peek() {
                        if !(x1 <= snap && x2 > snap) {
                            break;
                        }
                        let at = Waypoint::new(snap, StateVector(stepper.calc_state(snap)));
                        debug!("#{}: snapshot at t={snap}", self.number());
                        let solid = self.current_or_default(ctx);
                        let rec = self.status_record(ctx, &at, solid, None);
                        sink.snapshot(kind.name(), &rec)?;
                        snapshots.next();
                    }
                }

                if options.track_log && x2 - last_track > options.track_log_interval / v1 {
                    let rec = self.track_record(ctx, &Waypoint::new(x2, y2));
                    sink.track(kind.name(), &rec)?;
                    last_track = x2;
                }

                x1 = x2;
                y1 = y2;
            }

            if self.status.is_none() {
                let solid = self.current_or_default(ctx);
                if decay_at == Some(t) || y.proper_time() >= self.lifetime() {
                    self.stop(StopStatus::Decayed, Waypoint::new(t, y), solid);
                } else if t >= tmax || self.path_length >= self.max_trajectory_length() {
                    self.stop(StopStatus::NotFinished, Waypoint::new(t, y), solid);
                }
            }
        }

        if let Some(rec) = self.final_record(ctx) {
            sink.status(kind.name(), &rec)?;
        }
        if self.status == Some(StopStatus::Decayed) {
            let end = self.end;
            self.secondaries = kind.decay(&end, mc);
            debug!(
                "#{}: decayed into {} secondaries",
                self.number(),
                self.secondaries.len()
            );
        }
        info!(
            "{} #{} done: status={}, t={}, l={} m, hits={}, flips={}, steps={}",
            kind.name(),
            self.number(),
            self.status.map_or(0, StopStatus::code),
            self.end.t,
            self.path_length,
            self.hits,
            self.spin.flips,
            self.steps
        );
        Ok(())
    }

    fn current_or_default(&self, ctx: &TrackingContext<'_>) -> SolidId {
        self.current_solid()
            .unwrap_or_else(|| ctx.geometry.default_solid().id)
    }

    fn track_record(&self, ctx: &TrackingContext<'_>, at: &Waypoint) -> TrackRecord {
        let props = self.kind.properties();
        let p = at.y.position();
        let (b, e, potential) = match ctx.field {
            Some(f) => {
                let e = f.e_field(at.t, &p);
                (f.b_field(at.t, &p).as_table(), e.e, e.potential)
            }
            None => ([[0.0; 4]; 4], [0.0; 3], 0.0),
        };
        let kinetic_energy =
            kinematics::kinetic_energy(props.mass, &at.y.velocity(), ctx.constants.speed_of_light);
        TrackRecord {
            job: self.job(),
            particle: self.number(),
            polarisation: at.y.polarisation(),
            t: at.t,
            position: p,
            velocity: at.y.velocity(),
            total_energy: kinetic_energy
                + kinematics::potential_energy(props, &ctx.constants, at.t, &at.y, ctx.field),
            kinetic_energy,
            b,
            e,
            potential,
        }
    }
}
