//! Simulated DAQ backend.
//!
//! A stand-in instrument that answers `*IDN?` and `READ?` the way a
//! DAQ970A-class unit does, so the full pipeline can run without hardware.
//! Readings carry a nominal value with random jitter and an instrument-side
//! timestamp that advances one second per reading.

use super::{ConnectOptions, Connected, IDN_QUERY, READ_QUERY, Session, SessionError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Resource name reported for the simulated device.
pub const SIM_RESOURCE: &str = "SIM0::INSTR";

/// `*IDN?` reply of the simulated device.
pub const SIM_IDENTITY: &str = "Keysight Technologies,DAQ970A,SIM0000001,A.03.02";

const NOMINAL_VOLTS: f64 = 1.234;
const JITTER_VOLTS: f64 = 0.005;

/// Instrument-side absolute timestamp, field for field as the device
/// reports it: `month,day,year,hour,minute,second`.
#[derive(Debug, Clone, Copy)]
struct Timestamp {
    month: u32,
    day: u32,
    year: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Timestamp {
    fn tick(&mut self) {
        self.second += 1;
        if self.second == 60 {
            self.second = 0;
            self.minute += 1;
        }
        if self.minute == 60 {
            self.minute = 0;
            self.hour += 1;
        }
        if self.hour == 24 {
            self.hour = 0;
            self.day += 1;
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Minutes are the only zero-padded field in observed device output.
        write!(
            f,
            "{},{},{},{},{:02},{}",
            self.month, self.day, self.year, self.hour, self.minute, self.second
        )
    }
}

/// A simulated instrument session.
///
/// Query commands queue exactly one response; reading without a pending
/// query is a transport error, as it would be on the real device.
pub struct SimSession {
    rng: StdRng,
    clock: Timestamp,
    pending: Option<String>,
    closed: bool,
}

impl SimSession {
    /// Create a session with a random seed.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a session with a fixed seed, for deterministic output.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        SimSession {
            rng,
            clock: Timestamp {
                month: 10,
                day: 24,
                year: 2024,
                hour: 16,
                minute: 0,
                second: 5,
            },
            pending: None,
            closed: false,
        }
    }

    fn next_reading(&mut self) -> String {
        let volts = NOMINAL_VOLTS + self.rng.gen_range(-JITTER_VOLTS..JITTER_VOLTS);
        let line = format!("{volts:.3},{}", self.clock);
        self.clock.tick();
        line
    }
}

impl Default for SimSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for SimSession {
    fn clear(&mut self) -> Result<(), SessionError> {
        self.pending = None;
        Ok(())
    }

    fn write_command(&mut self, command: &str) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Write("session closed".into()));
        }
        match command {
            IDN_QUERY => self.pending = Some(SIM_IDENTITY.to_string()),
            READ_QUERY => self.pending = Some(self.next_reading()),
            // Setup commands expect no response.
            _ => {}
        }
        Ok(())
    }

    fn read_response(&mut self) -> Result<String, SessionError> {
        if self.closed {
            return Err(SessionError::Read("session closed".into()));
        }
        self.pending
            .take()
            .ok_or_else(|| SessionError::Read("no query pending".into()))
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        Ok(())
    }
}

/// Open the simulated device.
pub fn connect(options: &ConnectOptions) -> Result<Connected, SessionError> {
    let resource = match &options.resource {
        Some(resource) => resource.clone(),
        None => SIM_RESOURCE.parse().map_err(|_| SessionError::Open {
            resource: SIM_RESOURCE.to_string(),
            reason: "invalid builtin resource name".to_string(),
        })?,
    };

    let mut session = SimSession::new();
    match super::probe(&mut session, options.expect_idn.as_deref())? {
        Some(identity) => Ok(Connected {
            session: Box::new(session),
            resource,
            identity,
        }),
        None => Err(SessionError::NoDeviceFound(options.filter.clone())),
    }
}
