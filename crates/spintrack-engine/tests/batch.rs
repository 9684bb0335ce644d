//! Worker-pool runs: determinism, decay chains and failure reporting.

use std::f64::consts::FRAC_PI_2;
use std::fs;

use spintrack_core::{JobNumber, ParticleNumber, PhysicalConstants, StopStatus};
use spintrack_engine::{
    BatchConfig, BatchError, BatchRunner, InitialConditions, KindRegistry, Lifetime, ParticleError,
    ParticleJob, TrackingContext, TrackingOptions,
};
use spintrack_log::{FileSink, NullSink, Stream};
use spintrack_test_utils::{test_properties, SlabGeometry, TestKind, NEUTRON_MASS};

const C: f64 = 299_792_458.0;

fn registry(products: &[&str]) -> KindRegistry {
    let mut props = test_properties();
    props.lifetime = Lifetime::Exponential { mean: 0.05 };
    KindRegistry::new()
        .with(TestKind::transparent(test_properties()))
        .with(TestKind::decaying(props, products))
}

fn jobs(kind: &str, n: u64) -> Vec<ParticleJob> {
    (1..=n)
        .map(|i| ParticleJob {
            number: ParticleNumber(i),
            kind: kind.to_owned(),
            initial: InitialConditions {
                t: 0.0,
                position: [0.0; 3],
                energy: 0.5 * NEUTRON_MASS * (i as f64).powi(2) / (C * C),
                phi: 0.1 * i as f64,
                theta: FRAC_PI_2,
                polarisation: 0.0,
            },
        })
        .collect()
}

fn context(geometry: &SlabGeometry) -> TrackingContext<'_> {
    TrackingContext::new(geometry).with_constants(PhysicalConstants::without_gravity())
}

fn failed_number(err: &BatchError) -> Option<ParticleNumber> {
    match err {
        BatchError::Particle { number, .. } => Some(*number),
        _ => None,
    }
}

fn config(workers: usize) -> BatchConfig {
    BatchConfig {
        workers,
        seed: 42,
        tmax: 0.2,
    }
}

#[test]
fn results_do_not_depend_on_worker_count() {
    let geometry = SlabGeometry::cube(10.0);
    let kinds = registry(&["transparent", "transparent"]);
    let options = TrackingOptions::default();

    let serial = BatchRunner::new(context(&geometry), options.clone(), &kinds, config(1))
        .run(jobs("decaying", 12), |_| NullSink)
        .unwrap();
    let parallel = BatchRunner::new(context(&geometry), options, &kinds, config(4))
        .run(jobs("decaying", 12), |_| NullSink)
        .unwrap();

    assert!(serial.failures.is_empty());
    assert_eq!(serial.summaries, parallel.summaries);
    let primaries = serial
        .summaries
        .iter()
        .filter(|s| s.generation_index == 0)
        .count();
    assert_eq!(primaries, 12);
}

#[test]
fn decay_products_follow_their_parent() {
    let geometry = SlabGeometry::cube(10.0);
    let kinds = registry(&["transparent", "transparent"]);
    let report = BatchRunner::new(
        context(&geometry),
        TrackingOptions::default(),
        &kinds,
        config(2),
    )
    .run(jobs("decaying", 8), |_| NullSink)
    .unwrap();

    for number in 1..=8 {
        let chain: Vec<_> = report
            .summaries
            .iter()
            .filter(|s| s.number == ParticleNumber(number))
            .collect();
        let parent = chain[0];
        assert_eq!(parent.generation_index, 0);
        assert_eq!(parent.kind, "decaying");
        if parent.status == StopStatus::Decayed {
            assert_eq!(chain.len(), 3);
            for (i, child) in chain[1..].iter().enumerate() {
                assert_eq!(child.generation_index, i as u32 + 1);
                assert_eq!(child.kind, "transparent");
                assert_eq!(child.status, StopStatus::NotFinished);
                assert_eq!(child.end.t, 0.2);
                assert_eq!(child.end.y.position(), parent.end.y.position());
            }
        } else {
            assert_eq!(parent.status, StopStatus::NotFinished);
            assert_eq!(chain.len(), 1);
        }
    }
}

#[test]
fn unknown_kinds_are_reported_per_particle() {
    let geometry = SlabGeometry::cube(10.0);
    let kinds = registry(&["ghost"]);
    let mut work = jobs("transparent", 3);
    work.extend(jobs("muon", 1).into_iter().map(|mut j| {
        j.number = ParticleNumber(10);
        j
    }));
    work.extend(jobs("decaying", 1).into_iter().map(|mut j| {
        j.number = ParticleNumber(20);
        j
    }));

    let report = BatchRunner::new(
        context(&geometry),
        TrackingOptions::default(),
        &kinds,
        config(2),
    )
    .run(work, |_| NullSink)
    .unwrap();

    let tracked: Vec<_> = report.summaries.iter().map(|s| s.number).collect();
    assert!(tracked.starts_with(&[ParticleNumber(1), ParticleNumber(2), ParticleNumber(3)]));
    assert!(report
        .failures
        .iter()
        .all(|f| matches!(f, BatchError::Particle { .. })));

    let muon = report
        .failures
        .iter()
        .find(|f| failed_number(f) == Some(ParticleNumber(10)));
    match muon {
        Some(BatchError::Particle {
            source: ParticleError::UnknownKind { name },
            ..
        }) => assert_eq!(name, "muon"),
        other => panic!("expected unknown muon, got {other:?}"),
    }

    // A decayed particle's unknown products fail on their own.
    let parent = report
        .summaries
        .iter()
        .find(|s| s.number == ParticleNumber(20));
    let ghosts = report
        .failures
        .iter()
        .filter(|f| failed_number(f) == Some(ParticleNumber(20)))
        .count();
    match parent.map(|s| s.status) {
        Some(StopStatus::Decayed) => assert_eq!(ghosts, 1),
        Some(_) => assert_eq!(ghosts, 0),
        None => panic!("particle 20 was not tracked"),
    }
}

#[test]
fn invalid_config_fails_the_run() {
    let geometry = SlabGeometry::cube(1.0);
    let kinds = registry(&[]);
    let err = BatchRunner::new(
        context(&geometry),
        TrackingOptions::default(),
        &kinds,
        config(0),
    )
    .run(jobs("transparent", 1), |_| NullSink)
    .unwrap_err();
    assert!(matches!(err, BatchError::Config(_)));

    let bad = BatchConfig {
        tmax: f64::NAN,
        ..config(1)
    };
    let err = BatchRunner::new(context(&geometry), TrackingOptions::default(), &kinds, bad)
        .run(Vec::new(), |_| NullSink)
        .unwrap_err();
    assert!(err.to_string().contains("tmax"));
}

#[test]
fn empty_batch_is_empty_report() {
    let geometry = SlabGeometry::cube(1.0);
    let kinds = KindRegistry::standard();
    let report = BatchRunner::new(
        context(&geometry),
        TrackingOptions::default(),
        &kinds,
        config(3),
    )
    .run(Vec::new(), |_| NullSink)
    .unwrap();
    assert!(report.summaries.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn file_sink_writes_one_status_line_per_particle() {
    let dir = std::env::temp_dir().join(format!("spintrack-batch-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let job = JobNumber(7);
    let geometry = SlabGeometry::cube(10.0);
    let kinds = registry(&[]);

    let report = BatchRunner::new(
        context(&geometry).with_job(job),
        TrackingOptions::default(),
        &kinds,
        config(1),
    )
    .run(jobs("transparent", 5), |_| FileSink::new(&dir, job))
    .unwrap();
    assert_eq!(report.summaries.len(), 5);

    let path = FileSink::new(&dir, job).path("transparent", Stream::Status);
    assert!(path.ends_with("000000000007transparentend.out"));
    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().is_some_and(|h| h.starts_with("jobnumber particle")));
    let rows: Vec<_> = lines.collect();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.starts_with("7 ")));

    fs::remove_dir_all(&dir).unwrap();
}
