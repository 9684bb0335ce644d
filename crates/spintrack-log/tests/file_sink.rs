//! FileSink writes lazily created, header-prefixed files per kind.

use std::fs;

use spintrack_core::{JobNumber, ParticleNumber, SolidId, StopStatus};
use spintrack_log::{
    EndpointRecord, FileSink, HitRecord, Record, RecordSink, StatusRecord, Stream,
};

fn endpoint(t: f64) -> EndpointRecord {
    EndpointRecord {
        t,
        position: [0.0, 0.0, t],
        velocity: [0.0; 3],
        polarisation: 1.0,
        total_energy: 0.0,
        kinetic_energy: 0.0,
        field: 0.0,
        potential: 0.0,
        solid: SolidId(0),
    }
}

fn status(n: u64) -> StatusRecord {
    StatusRecord {
        job: JobNumber(3),
        particle: ParticleNumber(n),
        start: endpoint(0.0),
        end: endpoint(1.0),
        status: Some(StopStatus::NotFinished),
        spin_flips: 0,
        flip_probability: 0.0,
        hits: 0,
        steps: 10,
        path_length: 0.0,
        h_max: 0.0,
        bloch_polarisation: 1.0,
        larmor_mean: 0.0,
        larmor_spread: 0.0,
    }
}

#[test]
fn writes_one_file_per_kind_and_stream() {
    let dir = std::env::temp_dir().join(format!("spintrack_file_sink_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let mut sink = FileSink::new(&dir, JobNumber(3));
    sink.status("electron", &status(1)).unwrap();
    sink.status("electron", &status(2)).unwrap();
    sink.status("proton", &status(3)).unwrap();
    sink.flush().unwrap();

    let electron = fs::read_to_string(sink.path("electron", Stream::Status)).unwrap();
    let lines: Vec<&str> = electron.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], StatusRecord::HEADER);
    assert!(lines[1].starts_with("3 1 "));
    assert!(lines[2].starts_with("3 2 "));

    let proton = fs::read_to_string(sink.path("proton", Stream::Status)).unwrap();
    assert_eq!(proton.lines().count(), 2);

    // No hits were written, so no hit file exists.
    assert!(!sink.path("electron", Stream::Hit).exists());

    sink.hit(
        "electron",
        &HitRecord {
            job: JobNumber(3),
            particle: ParticleNumber(1),
            t: 0.5,
            position: [0.0; 3],
            velocity_before: [0.0, 0.0, -1.0],
            polarisation_before: 1.0,
            velocity_after: [0.0, 0.0, 1.0],
            polarisation_after: 1.0,
            normal: [0.0, 0.0, 1.0],
            leaving: SolidId(0),
            entering: SolidId(1),
        },
    )
    .unwrap();
    sink.close().unwrap();
    let hits = fs::read_to_string(dir.join("000000000003electronhit.out")).unwrap();
    assert_eq!(hits.lines().count(), 2);

    fs::remove_dir_all(&dir).unwrap();
}
