//! Record sinks: where the tracker sends its output.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use spintrack_core::JobNumber;

use crate::error::LogError;
use crate::record::{HitRecord, Record, SpinRecord, StatusRecord, TrackRecord};
use crate::writer::RecordWriter;

/// The five output streams of a particle kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    /// End-of-run status lines.
    Status,
    /// Full-state dumps at requested times.
    Snapshot,
    /// Sampled trajectory points.
    Track,
    /// Boundary crossings.
    Hit,
    /// Spin sub-step samples.
    Spin,
}

impl Stream {
    /// File name suffix, appended after the job number and kind name.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Status => "end.out",
            Self::Snapshot => "snapshot.out",
            Self::Track => "track.out",
            Self::Hit => "hit.out",
            Self::Spin => "spin.out",
        }
    }

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Snapshot => "snapshot",
            Self::Track => "track",
            Self::Hit => "hit",
            Self::Spin => "spin",
        }
    }
}

/// Destination for tracker output.
///
/// `kind` is the particle kind name (e.g. `"electron"`); sinks may
/// keep the streams of different kinds apart.
pub trait RecordSink {
    /// End-of-run status of one particle.
    fn status(&mut self, kind: &str, record: &StatusRecord) -> Result<(), LogError>;

    /// Snapshot of a particle at a requested lab time.
    fn snapshot(&mut self, kind: &str, record: &StatusRecord) -> Result<(), LogError>;

    /// Sampled trajectory point.
    fn track(&mut self, kind: &str, record: &TrackRecord) -> Result<(), LogError>;

    /// Boundary crossing.
    fn hit(&mut self, kind: &str, record: &HitRecord) -> Result<(), LogError>;

    /// Spin sub-step sample.
    fn spin(&mut self, kind: &str, record: &SpinRecord) -> Result<(), LogError>;

    /// Flush buffered output.
    fn flush(&mut self) -> Result<(), LogError> {
        Ok(())
    }
}

// ── NullSink ───────────────────────────────────────────────────────

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn status(&mut self, _: &str, _: &StatusRecord) -> Result<(), LogError> {
        Ok(())
    }
    fn snapshot(&mut self, _: &str, _: &StatusRecord) -> Result<(), LogError> {
        Ok(())
    }
    fn track(&mut self, _: &str, _: &TrackRecord) -> Result<(), LogError> {
        Ok(())
    }
    fn hit(&mut self, _: &str, _: &HitRecord) -> Result<(), LogError> {
        Ok(())
    }
    fn spin(&mut self, _: &str, _: &SpinRecord) -> Result<(), LogError> {
        Ok(())
    }
}

// ── MemorySink ─────────────────────────────────────────────────────

/// Collects records in memory, tagged with their kind name.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    /// Status records.
    pub statuses: Vec<(String, StatusRecord)>,
    /// Snapshot records.
    pub snapshots: Vec<(String, StatusRecord)>,
    /// Track records.
    pub tracks: Vec<(String, TrackRecord)>,
    /// Hit records.
    pub hits: Vec<(String, HitRecord)>,
    /// Spin records.
    pub spins: Vec<(String, SpinRecord)>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn status(&mut self, kind: &str, record: &StatusRecord) -> Result<(), LogError> {
        self.statuses.push((kind.to_owned(), record.clone()));
        Ok(())
    }
    fn snapshot(&mut self, kind: &str, record: &StatusRecord) -> Result<(), LogError> {
        self.snapshots.push((kind.to_owned(), record.clone()));
        Ok(())
    }
    fn track(&mut self, kind: &str, record: &TrackRecord) -> Result<(), LogError> {
        self.tracks.push((kind.to_owned(), record.clone()));
        Ok(())
    }
    fn hit(&mut self, kind: &str, record: &HitRecord) -> Result<(), LogError> {
        self.hits.push((kind.to_owned(), record.clone()));
        Ok(())
    }
    fn spin(&mut self, kind: &str, record: &SpinRecord) -> Result<(), LogError> {
        self.spins.push((kind.to_owned(), record.clone()));
        Ok(())
    }
}

// ── FileSink ───────────────────────────────────────────────────────

type FileWriter<R> = RecordWriter<BufWriter<File>, R>;

#[derive(Default)]
struct KindStreams {
    status: Option<FileWriter<StatusRecord>>,
    snapshot: Option<FileWriter<StatusRecord>>,
    track: Option<FileWriter<TrackRecord>>,
    hit: Option<FileWriter<HitRecord>>,
    spin: Option<FileWriter<SpinRecord>>,
}

impl KindStreams {
    fn flush(&mut self) -> Result<(), LogError> {
        if let Some(w) = self.status.as_mut() {
            w.flush()?;
        }
        if let Some(w) = self.snapshot.as_mut() {
            w.flush()?;
        }
        if let Some(w) = self.track.as_mut() {
            w.flush()?;
        }
        if let Some(w) = self.hit.as_mut() {
            w.flush()?;
        }
        if let Some(w) = self.spin.as_mut() {
            w.flush()?;
        }
        Ok(())
    }
}

/// Writes each stream to `<dir>/<job:012><kind><suffix>`.
///
/// Files are created on first use, so a run without hits produces no
/// hit file. After [`close`](FileSink::close) every write fails with
/// [`LogError::Closed`].
pub struct FileSink {
    dir: PathBuf,
    job: JobNumber,
    kinds: IndexMap<String, KindStreams>,
    closed: bool,
}

impl FileSink {
    /// Create a sink writing into `dir` for the given job.
    pub fn new(dir: impl Into<PathBuf>, job: JobNumber) -> Self {
        Self {
            dir: dir.into(),
            job,
            kinds: IndexMap::new(),
            closed: false,
        }
    }

    /// Path of the file holding `stream` for particles of `kind`.
    pub fn path(&self, kind: &str, stream: Stream) -> PathBuf {
        self.dir
            .join(format!("{:012}{}{}", self.job.0, kind, stream.suffix()))
    }

    /// Flush all open files and refuse further writes.
    pub fn close(&mut self) -> Result<(), LogError> {
        self.flush()?;
        self.kinds.clear();
        self.closed = true;
        Ok(())
    }

    fn streams(&mut self, kind: &str, stream: Stream) -> Result<&mut KindStreams, LogError> {
        if self.closed {
            return Err(LogError::Closed {
                stream: stream.name(),
            });
        }
        Ok(self.kinds.entry(kind.to_owned()).or_default())
    }
}

fn open_lazily<'a, R: Record>(
    slot: &'a mut Option<FileWriter<R>>,
    path: &Path,
) -> Result<&'a mut FileWriter<R>, LogError> {
    let writer = match slot.take() {
        Some(w) => w,
        None => {
            info!("creating {}", path.display());
            RecordWriter::new(BufWriter::new(File::create(path)?))?
        }
    };
    Ok(slot.insert(writer))
}

impl RecordSink for FileSink {
    fn status(&mut self, kind: &str, record: &StatusRecord) -> Result<(), LogError> {
        let path = self.path(kind, Stream::Status);
        let s = self.streams(kind, Stream::Status)?;
        open_lazily(&mut s.status, &path)?.write(record)
    }

    fn snapshot(&mut self, kind: &str, record: &StatusRecord) -> Result<(), LogError> {
        let path = self.path(kind, Stream::Snapshot);
        let s = self.streams(kind, Stream::Snapshot)?;
        open_lazily(&mut s.snapshot, &path)?.write(record)
    }

    fn track(&mut self, kind: &str, record: &TrackRecord) -> Result<(), LogError> {
        let path = self.path(kind, Stream::Track);
        let s = self.streams(kind, Stream::Track)?;
        open_lazily(&mut s.track, &path)?.write(record)
    }

    fn hit(&mut self, kind: &str, record: &HitRecord) -> Result<(), LogError> {
        let path = self.path(kind, Stream::Hit);
        let s = self.streams(kind, Stream::Hit)?;
        open_lazily(&mut s.hit, &path)?.write(record)
    }

    fn spin(&mut self, kind: &str, record: &SpinRecord) -> Result<(), LogError> {
        let path = self.path(kind, Stream::Spin);
        let s = self.streams(kind, Stream::Spin)?;
        open_lazily(&mut s.spin, &path)?.write(record)
    }

    fn flush(&mut self) -> Result<(), LogError> {
        for streams in self.kinds.values_mut() {
            streams.flush()?;
        }
        Ok(())
    }
}
