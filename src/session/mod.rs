//! Instrument session abstraction.
//!
//! This module provides a trait-based abstraction over different instrument
//! I/O backends, with shared connection logic: discover resources matching a
//! filter pattern, open a session, clear the device, and probe it with
//! `*IDN?` before handing it to the acquisition loop.

#[cfg(feature = "visa")]
pub mod visa;

#[cfg(feature = "sim")]
pub mod sim;

use crate::resource::ResourceName;
use std::time::Duration;
use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No instrument matched the discovery filter (or none passed the probe)
    #[error("no instrument matching '{0}' was found")]
    NoDeviceFound(String),
    /// Opening a resource failed
    #[error("failed to open '{resource}': {reason}")]
    Open {
        /// The resource that could not be opened.
        resource: String,
        /// Backend-reported failure reason.
        reason: String,
    },
    /// A command could not be written to the device
    #[error("command write failed: {0}")]
    Write(String),
    /// A response could not be read from the device
    #[error("response read failed: {0}")]
    Read(String),
    /// Device clear failed
    #[error("device clear failed: {0}")]
    Clear(String),
    /// Backend not available (not compiled in)
    #[allow(dead_code)]
    #[error("backend '{0}' not available (not compiled in)")]
    BackendNotAvailable(String),
}

/// A connection to an instrument that can exchange SCPI command strings.
///
/// Implementations block on every call; one round-trip is one
/// `write_command` followed by one `read_response`. All operations may fail
/// with a transport error, which callers propagate rather than retry.
pub trait Session: Send {
    /// Clear the device's I/O buffers.
    fn clear(&mut self) -> Result<(), SessionError>;

    /// Send one command string. The backend appends its line terminator.
    fn write_command(&mut self, command: &str) -> Result<(), SessionError>;

    /// Read one response line, with the line terminator stripped.
    fn read_response(&mut self) -> Result<String, SessionError>;

    /// Release the connection. Dropping the session is a backstop; calling
    /// `close` surfaces release errors instead of swallowing them.
    fn close(&mut self) -> Result<(), SessionError>;
}

/// Default discovery filter: any USB instrument.
pub const USB_FILTER: &str = "USB?*INSTR";

/// Identity query.
pub const IDN_QUERY: &str = "*IDN?";

/// Trigger-and-fetch query issued once per reading.
pub const READ_QUERY: &str = "READ?";

/// Commands that switch the instrument to absolute per-reading timestamps.
pub const TIMESTAMP_FORMAT_COMMANDS: [&str; 2] =
    ["FORM:READ:TIME ON", "FORM:READ:TIME:TYPE ABS"];

/// DC-voltage configuration command for one DAQ channel.
pub fn conf_volt_dc(channel: u16) -> String {
    format!("CONF:VOLT:DC 1mV,0.00001,(@{channel})")
}

/// Scan-list command for one DAQ channel.
pub fn rout_scan(channel: u16) -> String {
    format!("ROUT:SCAN (@{channel})")
}

/// Available session backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Real instrument I/O through a native VISA library
    #[cfg(feature = "visa")]
    Visa,
    /// Simulated DAQ, no hardware required
    #[cfg(feature = "sim")]
    Sim,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "visa")]
        return Backend::Visa;
        #[cfg(all(feature = "sim", not(feature = "visa")))]
        return Backend::Sim;
        #[cfg(not(any(feature = "visa", feature = "sim")))]
        compile_error!("At least one backend feature must be enabled");
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "visa")]
            Backend::Visa => write!(f, "visa"),
            #[cfg(feature = "sim")]
            Backend::Sim => write!(f, "sim"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            #[cfg(feature = "visa")]
            "visa" => Ok(Backend::Visa),
            #[cfg(feature = "sim")]
            "sim" | "mock" => Ok(Backend::Sim),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Parameters for establishing a connection.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Open this exact resource instead of running discovery.
    pub resource: Option<ResourceName>,
    /// Discovery filter pattern handed to the resource manager.
    pub filter: String,
    /// Substring the `*IDN?` reply must contain; candidates that do not
    /// match are skipped during discovery.
    pub expect_idn: Option<String>,
    /// Per-I/O timeout applied by the backend.
    pub timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            resource: None,
            filter: USB_FILTER.to_string(),
            expect_idn: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// An established, probed connection.
pub struct Connected {
    /// The open session, ready for configuration and acquisition.
    pub session: Box<dyn Session>,
    /// The resource the session was opened on.
    pub resource: ResourceName,
    /// The device's `*IDN?` reply.
    pub identity: String,
}

/// Open a session using the given backend.
///
/// Discovery, open and probe are backend concerns; both backends share
/// [`probe`] so that every connection is cleared and identified the same
/// way before use.
pub fn connect(backend: Backend, options: &ConnectOptions) -> Result<Connected, SessionError> {
    match backend {
        #[cfg(feature = "visa")]
        Backend::Visa => visa::connect(options),
        #[cfg(feature = "sim")]
        Backend::Sim => sim::connect(options),
    }
}

/// Clear the device and read its identity.
///
/// Returns `Ok(None)` when the identity does not contain `expect_idn`, so
/// discovery can move on to the next candidate. Transport errors propagate.
pub(crate) fn probe(
    session: &mut dyn Session,
    expect_idn: Option<&str>,
) -> Result<Option<String>, SessionError> {
    session.clear()?;
    session.write_command(IDN_QUERY)?;
    let identity = session.read_response()?;

    match expect_idn {
        Some(expected) if !identity.contains(expected) => Ok(None),
        _ => Ok(Some(identity)),
    }
}

/// Configure one channel for timestamped DC-voltage readings.
///
/// Sends the fixed setup sequence: measurement configuration, absolute
/// timestamp format, and the scan list. These commands expect no response.
pub fn configure(session: &mut dyn Session, channel: u16) -> Result<(), SessionError> {
    session.write_command(&conf_volt_dc(channel))?;
    for command in TIMESTAMP_FORMAT_COMMANDS {
        session.write_command(command)?;
    }
    session.write_command(&rout_scan(channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSession;
    use std::str::FromStr;

    #[test]
    fn test_conf_volt_dc_format() {
        assert_eq!(conf_volt_dc(301), "CONF:VOLT:DC 1mV,0.00001,(@301)");
        assert_eq!(conf_volt_dc(105), "CONF:VOLT:DC 1mV,0.00001,(@105)");
    }

    #[test]
    fn test_rout_scan_format() {
        assert_eq!(rout_scan(301), "ROUT:SCAN (@301)");
    }

    #[test]
    fn test_configure_sends_setup_sequence() {
        let mut session = FakeSession::with_results(vec![]);
        let commands = session.commands();

        configure(&mut session, 301).unwrap();

        assert_eq!(
            *commands.lock().unwrap(),
            vec![
                "CONF:VOLT:DC 1mV,0.00001,(@301)",
                "FORM:READ:TIME ON",
                "FORM:READ:TIME:TYPE ABS",
                "ROUT:SCAN (@301)",
            ]
        );
    }

    #[test]
    fn test_configure_propagates_write_failure() {
        let mut session = FakeSession::with_results(vec![]).fail_write_at(2);
        assert!(matches!(
            configure(&mut session, 301),
            Err(SessionError::Write(_))
        ));
    }

    #[test]
    fn test_probe_clears_then_queries_identity() {
        let mut session = FakeSession::new(vec!["Keysight Technologies,DAQ970A,MY0001,A.03"]);
        let commands = session.commands();

        let identity = probe(&mut session, None).unwrap();

        assert_eq!(
            identity.as_deref(),
            Some("Keysight Technologies,DAQ970A,MY0001,A.03")
        );
        assert_eq!(*commands.lock().unwrap(), vec!["<clear>", "*IDN?"]);
    }

    #[test]
    fn test_probe_rejects_mismatched_identity() {
        let mut session = FakeSession::new(vec!["Tektronix,TDS2022,0,1.0"]);
        assert_eq!(probe(&mut session, Some("DAQ970A")).unwrap(), None);
    }

    #[test]
    fn test_probe_accepts_matching_identity() {
        let mut session = FakeSession::new(vec!["Keysight Technologies,DAQ970A,MY0001,A.03"]);
        let identity = probe(&mut session, Some("DAQ970A")).unwrap();
        assert!(identity.unwrap().contains("DAQ970A"));
    }

    #[test]
    fn test_backend_from_str() {
        #[cfg(feature = "sim")]
        {
            assert_eq!(Backend::from_str("sim").unwrap(), Backend::Sim);
            assert_eq!(Backend::from_str("mock").unwrap(), Backend::Sim);
        }
        #[cfg(feature = "visa")]
        assert_eq!(Backend::from_str("visa").unwrap(), Backend::Visa);
        assert!(Backend::from_str("invalid").is_err());
    }

    #[test]
    fn test_backend_display() {
        #[cfg(feature = "sim")]
        assert_eq!(format!("{}", Backend::Sim), "sim");
        #[cfg(feature = "visa")]
        assert_eq!(format!("{}", Backend::Visa), "visa");
    }

    #[test]
    fn test_session_error_display() {
        assert_eq!(
            format!("{}", SessionError::NoDeviceFound("USB?*INSTR".into())),
            "no instrument matching 'USB?*INSTR' was found"
        );
        assert_eq!(
            format!("{}", SessionError::Read("timeout".into())),
            "response read failed: timeout"
        );
    }
}
