//! Output formatters for measurement records.
//!
//! This module provides a trait for rendering parsed records and the CSV
//! implementation used by the recorder. The trait keeps the writer
//! independent of the column layout, so alternative layouts can be added
//! without touching the file-writing pass.

pub mod csv;

use crate::record::Record;

/// Trait for rendering records into output strings.
pub trait RecordFormatter: Send + Sync {
    /// Render one record, including any record terminator the format uses.
    fn format(&self, record: &Record) -> String;
}
