//! Parsed measurement records.
//!
//! The instrument returns one reading per `READ?` query as a single line of
//! text: the measured value followed by an absolute timestamp, seven
//! comma-separated fields in total
//! (`value,month,day,year,hour,minute,second`). This module turns such a
//! line into a [`Record`] with the timestamp reassembled into date and time
//! columns.

use std::fmt;
use thiserror::Error;

/// Number of fields in the timestamp portion of a raw reading.
pub const TIMESTAMP_FIELDS: usize = 6;

/// A reading with its timestamp split into date and time columns.
///
/// Produced only by [`Record::parse`] and never mutated afterwards. The
/// measurement value is kept verbatim; the instrument performs no numeric
/// validation upstream and neither does this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The measured value, exactly as returned by the instrument
    pub measurement: String,
    /// Date as `MM/DD/YYYY`
    pub date: String,
    /// Time as `HH:MM.SS`
    pub time: String,
}

/// Errors returned when a raw reading does not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The line has no comma separating the value from the timestamp.
    #[error("malformed reading: no timestamp separator")]
    MissingTimestamp,
    /// The timestamp portion does not split into exactly six fields.
    /// Extra fields are rejected rather than dropped.
    #[error("malformed reading: expected 6 timestamp fields, got {0}")]
    TimestampFieldCount(usize),
}

impl Record {
    /// Parse a raw instrument reading.
    ///
    /// The line is split on the first comma into value and timestamp; the
    /// timestamp must contain exactly six comma-separated fields in the
    /// order `month, day, year, hour, minute, second`.
    ///
    /// # Arguments
    /// * `raw` - One reading line as returned by the instrument
    ///
    /// # Errors
    /// Returns a `RecordError` when the separator is missing or the
    /// timestamp field count is wrong. Malformed input is never truncated
    /// silently.
    ///
    /// # Example
    /// ```
    /// use daq_recorder::record::Record;
    ///
    /// let record = Record::parse("1.234,10,24,2024,16,00,5").unwrap();
    /// assert_eq!(record.measurement, "1.234");
    /// assert_eq!(record.date, "10/24/2024");
    /// assert_eq!(record.time, "16:00.5");
    /// ```
    pub fn parse(raw: &str) -> Result<Record, RecordError> {
        let (measurement, timestamp) = raw
            .split_once(',')
            .ok_or(RecordError::MissingTimestamp)?;

        let fields: Vec<&str> = timestamp.split(',').collect();
        if fields.len() != TIMESTAMP_FIELDS {
            return Err(RecordError::TimestampFieldCount(fields.len()));
        }

        let (month, day, year) = (fields[0], fields[1], fields[2]);
        let (hour, minute, second) = (fields[3], fields[4], fields[5]);

        Ok(Record {
            measurement: measurement.to_string(),
            date: format!("{month}/{day}/{year}"),
            time: format!("{hour}:{minute}.{second}"),
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.measurement, self.date, self.time)
    }
}
