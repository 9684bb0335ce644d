//! Typed line writer for one record stream.

use std::io::Write;
use std::marker::PhantomData;

use crate::error::LogError;
use crate::record::Record;

/// Writes records of type `R` to a byte stream, one line each.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`. The header line is written
/// immediately on construction.
///
/// # Examples
///
/// ```
/// use spintrack_core::{JobNumber, ParticleNumber};
/// use spintrack_log::{Record, RecordWriter, SpinRecord};
///
/// let mut buf = Vec::new();
/// let mut writer = RecordWriter::<_, SpinRecord>::new(&mut buf).unwrap();
/// writer
///     .write(&SpinRecord {
///         job: JobNumber(0),
///         particle: ParticleNumber(1),
///         t: 0.0,
///         spin: [0.0, 0.0, 1.0],
///         omega: [0.0; 3],
///         b: [0.0, 0.0, 1.0],
///     })
///     .unwrap();
/// assert_eq!(writer.records_written(), 1);
/// drop(writer);
///
/// let text = String::from_utf8(buf).unwrap();
/// assert_eq!(text.lines().next(), Some(SpinRecord::HEADER));
/// assert_eq!(text.lines().count(), 2);
/// ```
pub struct RecordWriter<W: Write, R: Record> {
    writer: W,
    records_written: u64,
    _record: PhantomData<fn(&R)>,
}

impl<W: Write, R: Record> RecordWriter<W, R> {
    /// Create a writer, immediately writing the header line.
    pub fn new(mut writer: W) -> Result<Self, LogError> {
        writeln!(writer, "{}", R::HEADER)?;
        Ok(Self {
            writer,
            records_written: 0,
            _record: PhantomData,
        })
    }

    /// Append one record.
    pub fn write(&mut self, record: &R) -> Result<(), LogError> {
        record.write_line(&mut self.writer)?;
        self.records_written += 1;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), LogError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records written so far (excluding the header).
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
