//! `daq-recorder` library.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing, signal wiring
//! and process exit codes. The core run loop lives in [`crate::app`] where
//! it can be tested deterministically with an injected session opener and
//! injected output streams.

pub mod acquisition;
pub mod app;
pub mod output;
pub mod record;
pub mod resource;
pub mod session;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use acquisition::{AcquireError, CancelToken, acquire, parse_duration};
pub use app::{Options, RealOpener, RunError, SessionOpener, run_with_io};
pub use output::RecordFormatter;
pub use output::csv::{CsvFormatter, WriteError, write_records, write_to_path};
pub use record::{Record, RecordError};
pub use resource::ResourceName;
pub use session::{Backend, ConnectOptions, Connected, Session, SessionError};
