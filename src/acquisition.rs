//! Sequential reading acquisition.
//!
//! One acquisition run issues a fixed number of `READ?` round-trips against
//! an open session, buffering the raw response lines in order and reporting
//! progress after each one. The loop is fail-fast: the first transport
//! error aborts the run and the readings collected so far are discarded
//! with it.

use crate::session::{READ_QUERY, Session, SessionError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Channel buffer size for progress events.
pub const PROGRESS_CHANNEL_BUFFER_SIZE: usize = 100;

/// Errors returned by an acquisition run.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// A round-trip failed; the run stops at the first occurrence.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The cancel token was set between round-trips.
    #[error("acquisition cancelled after {completed} of {requested} readings")]
    Cancelled {
        /// Round-trips completed before cancellation.
        completed: u32,
        /// Round-trips requested for the run.
        requested: u32,
    },
}

/// Cooperative cancellation flag, checked once per round-trip.
///
/// Clones share the flag, so one handle can be kept by a signal handler
/// while another travels with the acquisition task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run `count` sequential read round-trips and collect the raw responses.
///
/// After each round-trip `on_progress` is invoked with the number of
/// completed readings, so an observer sees exactly `1..=count` in order.
/// An optional pacing pause is inserted between round-trips (not after the
/// last one).
///
/// # Errors
/// The first failed round-trip aborts the run with the underlying session
/// error; no further round-trips are attempted. `AcquireError::Cancelled`
/// is returned when the token is set, with the number of readings that had
/// completed.
pub fn acquire<S>(
    session: &mut S,
    count: u32,
    pacing: Option<Duration>,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(u32),
) -> Result<Vec<String>, AcquireError>
where
    S: Session + ?Sized,
{
    let mut readings = Vec::with_capacity(count as usize);

    for done in 1..=count {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled {
                completed: done - 1,
                requested: count,
            });
        }

        session.write_command(READ_QUERY)?;
        readings.push(session.read_response()?);
        on_progress(done);

        if let Some(pause) = pacing
            && done < count
        {
            thread::sleep(pause);
        }
    }

    Ok(readings)
}

/// Parse a duration from a human-readable string.
///
/// Suffixes `ms`, `s`, `m` and `h` are recognized; a bare number is taken
/// as seconds.
///
/// # Examples
/// ```
/// use daq_recorder::acquisition::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    // Longest suffix first, so "ms" is not read as seconds.
    const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1000)];

    let src = src.trim();
    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    for (suffix, millis_per_unit) in UNITS {
        if let Some(number) = src.strip_suffix(suffix) {
            let value: u64 = number
                .trim()
                .parse()
                .map_err(|_| format!("invalid duration: {}", src))?;
            return Ok(Duration::from_millis(value * millis_per_unit));
        }
    }

    let secs: u64 = src
        .parse()
        .map_err(|_| format!("invalid duration: {}", src))?;
    Ok(Duration::from_secs(secs))
}
