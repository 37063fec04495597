//! CSV output.
//!
//! Renders records as `measurement,MM/DD/YYYY,HH:MM.SS` and writes a whole
//! acquisition run to disk in one pass. Historical capture files carry no
//! delimiter between records, so the default formatter appends nothing
//! after each record; line-delimited output is available as an explicit
//! opt-in.

use crate::output::RecordFormatter;
use crate::record::{Record, RecordError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Default output file name, created in the current working directory.
pub const DEFAULT_OUTPUT: &str = "test.csv";

/// Errors returned while writing a run to disk.
#[derive(Error, Debug)]
pub enum WriteError {
    /// A reading failed to parse; the write stops at the first occurrence.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// File creation or writing failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Fixed-column CSV formatter.
#[derive(Debug, Clone, Default)]
pub struct CsvFormatter {
    line_delimited: bool,
}

impl CsvFormatter {
    /// Create a formatter. With `line_delimited` set, each record is
    /// terminated with `\n` instead of the historical back-to-back layout.
    pub fn new(line_delimited: bool) -> Self {
        CsvFormatter { line_delimited }
    }
}

impl RecordFormatter for CsvFormatter {
    fn format(&self, record: &Record) -> String {
        if self.line_delimited {
            format!("{record}\n")
        } else {
            record.to_string()
        }
    }
}

/// Format raw readings in input order and write them to `out` as UTF-8.
///
/// Fail-fast: the first malformed reading or I/O error aborts the pass.
pub fn write_records(
    out: &mut dyn Write,
    readings: &[String],
    formatter: &dyn RecordFormatter,
) -> Result<(), WriteError> {
    for raw in readings {
        let record = Record::parse(raw)?;
        out.write_all(formatter.format(&record).as_bytes())?;
    }
    Ok(())
}

/// Write a whole run to `path`, replacing any existing file.
///
/// The file handle is closed on every exit path; the buffer is flushed
/// explicitly so write errors surface as `Err` instead of disappearing in
/// drop.
pub fn write_to_path(
    readings: &[String],
    path: &Path,
    formatter: &dyn RecordFormatter,
) -> Result<(), WriteError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    write_records(&mut out, readings, formatter)?;
    out.flush()?;
    Ok(())
}
