//! Multi-particle runner.
//!
//! Particles are independent, so a run is a job queue drained by a pool
//! of worker threads. Workers share the geometry, fields and kind
//! registry read-only and own everything mutable: a record sink each and
//! a fresh [`ChaChaGenerator`] per particle. Decay products are tracked
//! on the worker that tracked their parent, continuing its random stream.
//!
//! ```text
//!   jobs ──► [crossbeam queue] ──► worker 0 ─┐
//!                              ├─► worker 1 ─┼──► [results] ──► report
//!                              └─► worker N ─┘
//! ```

use std::error::Error;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use log::{debug, info, warn};
use spintrack_core::{ParticleNumber, StopStatus};
use spintrack_log::{LogError, RecordSink};

use crate::config::{ConfigError, TrackingOptions};
use crate::context::TrackingContext;
use crate::kind::{Electron, InitialConditions, ParticleKind, Waypoint};
use crate::mc::ChaChaGenerator;
use crate::particle::{Particle, ParticleError};

// ── KindRegistry ───────────────────────────────────────────────────

/// Particle kinds available to a run, by name.
#[derive(Clone, Default)]
pub struct KindRegistry {
    kinds: IndexMap<String, Arc<dyn ParticleKind>>,
}

impl KindRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in kinds.
    pub fn standard() -> Self {
        Self::new().with(Electron::new())
    }

    /// Register `kind` under its name, replacing any previous entry.
    pub fn register(&mut self, kind: impl ParticleKind + 'static) {
        self.kinds.insert(kind.name().to_owned(), Arc::new(kind));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, kind: impl ParticleKind + 'static) -> Self {
        self.register(kind);
        self
    }

    /// Look up a kind.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ParticleKind>> {
        self.kinds.get(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds.keys()).finish()
    }
}

// ── Jobs and results ───────────────────────────────────────────────

/// One primary particle to track.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleJob {
    /// Particle number; also selects the random stream.
    pub number: ParticleNumber,
    /// Registered kind name.
    pub kind: String,
    /// Start conditions.
    pub initial: InitialConditions,
}

/// Outcome of one tracked particle.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSummary {
    /// Number of the primary this particle descends from.
    pub number: ParticleNumber,
    /// 0 for the primary, then 1, 2, ... for its decay products in
    /// the order they were tracked.
    pub generation_index: u32,
    /// Kind name.
    pub kind: String,
    /// Terminal status.
    pub status: StopStatus,
    /// Final state.
    pub end: Waypoint,
    /// Path length [m].
    pub path_length: f64,
    /// Boundary crossings.
    pub hits: u64,
    /// Polarisation sign changes.
    pub spin_flips: u64,
    /// Accepted integrator steps.
    pub steps: u64,
}

/// Errors that prevent a particle from being tracked or recorded.
#[derive(Debug)]
pub enum BatchError {
    /// The run configuration is invalid.
    Config(ConfigError),
    /// A particle could not be created.
    Particle {
        /// Affected particle.
        number: ParticleNumber,
        /// Underlying cause.
        source: ParticleError,
    },
    /// Writing records failed.
    Log {
        /// Affected particle.
        number: ParticleNumber,
        /// Underlying cause.
        source: LogError,
    },
    /// A worker thread could not be started.
    Spawn(io::Error),
    /// A worker thread panicked.
    WorkerPanicked {
        /// Worker index.
        worker: usize,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Particle { number, source } => write!(f, "particle {number}: {source}"),
            Self::Log { number, source } => write!(f, "particle {number}: {source}"),
            Self::Spawn(e) => write!(f, "cannot start worker: {e}"),
            Self::WorkerPanicked { worker } => write!(f, "worker {worker} panicked"),
        }
    }
}

impl Error for BatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Particle { source, .. } => Some(source),
            Self::Log { source, .. } => Some(source),
            Self::Spawn(e) => Some(e),
            Self::WorkerPanicked { .. } => None,
        }
    }
}

impl From<ConfigError> for BatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Tracked particles sorted by number, then generation.
    pub summaries: Vec<ParticleSummary>,
    /// Particles that could not be tracked, sorted by number.
    pub failures: Vec<BatchError>,
}

// ── BatchRunner ────────────────────────────────────────────────────

/// Run parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Worker threads. Default: 1.
    pub workers: usize,
    /// Base seed of every particle's random stream. Default: 0.
    pub seed: u64,
    /// Lab time at which tracking stops [s]. Default: 1.
    pub tmax: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            seed: 0,
            tmax: 1.0,
        }
    }
}

impl BatchConfig {
    /// Check the run parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "workers",
                reason: "need at least one worker".to_owned(),
            });
        }
        if !self.tmax.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "tmax",
                reason: format!("must be finite, got {}", self.tmax),
            });
        }
        Ok(())
    }
}

/// Tracks many particles concurrently.
pub struct BatchRunner<'a> {
    ctx: TrackingContext<'a>,
    options: TrackingOptions,
    registry: &'a KindRegistry,
    config: BatchConfig,
}

type WorkerResult = Result<ParticleSummary, BatchError>;

impl<'a> BatchRunner<'a> {
    /// Runner over a shared environment.
    pub fn new(
        ctx: TrackingContext<'a>,
        options: TrackingOptions,
        registry: &'a KindRegistry,
        config: BatchConfig,
    ) -> Self {
        Self {
            ctx,
            options,
            registry,
            config,
        }
    }

    /// Track every job and its decay products.
    ///
    /// `make_sink(worker)` is called once inside each worker thread.
    /// Per-particle failures are collected in the report and never stop
    /// the other particles; only an invalid configuration or a dead
    /// worker makes the whole run fail.
    pub fn run<F, S>(&self, jobs: Vec<ParticleJob>, make_sink: F) -> Result<BatchReport, BatchError>
    where
        F: Fn(usize) -> S + Sync,
        S: RecordSink,
    {
        self.config.validate()?;
        self.ctx.validate()?;
        self.options.validate()?;

        let total = jobs.len();
        let (job_tx, job_rx) = unbounded::<ParticleJob>();
        for job in jobs {
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        let (result_tx, result_rx) = unbounded::<WorkerResult>();
        let workers = self.config.workers.min(total.max(1));
        info!("tracking {total} particles on {workers} workers");

        let mut panicked = Vec::new();
        thread::scope(|s| -> Result<(), BatchError> {
            let mut handles = Vec::with_capacity(workers);
            for index in 0..workers {
                let rx = job_rx.clone();
                let tx = result_tx.clone();
                let make_sink = &make_sink;
                let handle = thread::Builder::new()
                    .name(format!("spintrack-worker-{index}"))
                    .spawn_scoped(s, move || self.worker(index, rx, tx, make_sink))
                    .map_err(BatchError::Spawn)?;
                handles.push((index, handle));
            }
            for (index, handle) in handles {
                if handle.join().is_err() {
                    panicked.push(index);
                }
            }
            Ok(())
        })?;
        drop(result_tx);

        if let Some(&worker) = panicked.first() {
            return Err(BatchError::WorkerPanicked { worker });
        }

        let mut report = BatchReport::default();
        for result in result_rx.iter() {
            match result {
                Ok(summary) => report.summaries.push(summary),
                Err(e) => report.failures.push(e),
            }
        }
        report
            .summaries
            .sort_by_key(|s| (s.number, s.generation_index));
        report.failures.sort_by_key(failure_number);
        info!(
            "run finished: {} tracked, {} failed",
            report.summaries.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn worker<S: RecordSink>(
        &self,
        index: usize,
        jobs: Receiver<ParticleJob>,
        results: Sender<WorkerResult>,
        make_sink: &(impl Fn(usize) -> S + Sync),
    ) {
        let mut sink = make_sink(index);
        let mut last = None;
        while let Ok(job) = jobs.recv() {
            debug!("worker {index}: particle {}", job.number);
            last = Some(job.number);
            for result in self.track(&job, &mut sink) {
                let _ = results.send(result);
            }
        }
        if let Err(source) = sink.flush() {
            warn!("worker {index}: flushing records failed: {source}");
            if let Some(number) = last {
                let _ = results.send(Err(BatchError::Log { number, source }));
            }
        }
    }

    /// Track one primary and, depth first, all of its decay products.
    fn track(&self, job: &ParticleJob, sink: &mut dyn RecordSink) -> Vec<WorkerResult> {
        let mut mc = ChaChaGenerator::for_particle(self.config.seed, job.number);
        let mut pending = vec![(job.kind.clone(), job.initial)];
        let mut results = Vec::new();
        let mut generation_index = 0;

        while let Some((name, initial)) = pending.pop() {
            let number = job.number;
            let Some(kind) = self.registry.get(&name) else {
                results.push(Err(BatchError::Particle {
                    number,
                    source: ParticleError::UnknownKind { name },
                }));
                continue;
            };
            let created = Particle::new(Arc::clone(kind), number, &initial, &self.ctx, &mut mc);
            let mut particle = match created {
                Ok(p) => p,
                Err(source) => {
                    results.push(Err(BatchError::Particle { number, source }));
                    continue;
                }
            };
            if let Err(source) =
                particle.integrate(self.config.tmax, &self.options, &self.ctx, &mut mc, sink)
            {
                results.push(Err(BatchError::Log { number, source }));
                continue;
            }
            let secondaries = particle.take_secondaries();
            pending.extend(secondaries.into_iter().rev().map(|s| (s.kind, s.initial)));

            let Some(status) = particle.status() else {
                continue;
            };
            results.push(Ok(ParticleSummary {
                number,
                generation_index,
                kind: name,
                status,
                end: *particle.end(),
                path_length: particle.path_length(),
                hits: particle.hits(),
                spin_flips: particle.spin_state().flips,
                steps: particle.steps(),
            }));
            generation_index += 1;
        }
        results
    }
}

fn failure_number(e: &BatchError) -> Option<ParticleNumber> {
    match e {
        BatchError::Particle { number, .. } | BatchError::Log { number, .. } => Some(*number),
        _ => None,
    }
}
