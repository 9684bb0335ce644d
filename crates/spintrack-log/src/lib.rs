//! Record output for the spintrack particle tracker.
//!
//! Each particle produces up to five text streams, one line per event:
//!
//! | Stream | Record | File suffix |
//! |--------|--------|-------------|
//! | end-of-run status | [`StatusRecord`] | `end.out` |
//! | snapshots | [`StatusRecord`] | `snapshot.out` |
//! | trajectory samples | [`TrackRecord`] | `track.out` |
//! | boundary crossings | [`HitRecord`] | `hit.out` |
//! | spin sub-steps | [`SpinRecord`] | `spin.out` |
//!
//! The tracker writes through the [`RecordSink`] trait. [`FileSink`]
//! writes the files above, [`MemorySink`] collects records for tests and
//! [`NullSink`] discards everything.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod record;
pub mod sink;
pub mod writer;

pub use error::LogError;
pub use record::{EndpointRecord, HitRecord, Record, SpinRecord, StatusRecord, TrackRecord};
pub use sink::{FileSink, MemorySink, NullSink, RecordSink, Stream};
pub use writer::RecordWriter;
