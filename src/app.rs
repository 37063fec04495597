//! Core application runner for `daq-recorder`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit
//! codes so it can be tested deterministically with an injected session
//! opener and injected output streams.

use crate::acquisition::{self, AcquireError, CancelToken, PROGRESS_CHANNEL_BUFFER_SIZE};
use crate::output::csv::{self, CsvFormatter, DEFAULT_OUTPUT, WriteError};
use crate::resource::ResourceName;
use crate::session::{self, Backend, ConnectOptions, Connected, SessionError, USB_FILTER};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task;

/// Configuration for one recording run.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Open this VISA resource directly instead of discovering one.
    #[arg(long, value_parser = crate::resource::parse_resource, value_name = "RESOURCE")]
    pub resource: Option<ResourceName>,

    /// Discovery filter pattern handed to the resource manager.
    #[arg(long, default_value = USB_FILTER)]
    pub filter: String,

    /// Only accept instruments whose *IDN? reply contains this substring.
    /// Example: --expect-idn DAQ970A
    #[arg(long, value_name = "SUBSTRING")]
    pub expect_idn: Option<String>,

    /// Number of readings to acquire.
    #[arg(long, default_value_t = 100)]
    pub count: u32,

    /// DAQ channel to configure and scan.
    #[arg(long, default_value_t = 301)]
    pub channel: u16,

    /// Output file, replaced if it already exists.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Per-I/O timeout.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = acquisition::parse_duration, default_value = "5s")]
    pub timeout: Duration,

    /// Pause between read round-trips.
    #[arg(long, value_parser = acquisition::parse_duration)]
    pub interval: Option<Duration>,

    /// Terminate each record with a newline. Legacy capture files are
    /// written back-to-back without a delimiter; this opts out of that.
    #[arg(long)]
    pub line_delimited: bool,

    /// Session backend to use
    #[arg(long, default_value_t, value_enum)]
    pub backend: Backend,

    /// Verbose output: connection info and per-reading progress on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("acquisition task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Session-opening abstraction to enable deterministic unit tests without
/// instrument hardware.
pub trait SessionOpener: Send + Sync {
    /// Open, clear and probe a session on the given backend.
    fn open(
        &self,
        backend: Backend,
        options: &ConnectOptions,
    ) -> Result<Connected, SessionError>;
}

/// Real opener that delegates to the compiled-in backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealOpener;

impl SessionOpener for RealOpener {
    fn open(
        &self,
        backend: Backend,
        options: &ConnectOptions,
    ) -> Result<Connected, SessionError> {
        session::connect(backend, options)
    }
}

/// Run one recording pass, writing the status line to `out` and verbose
/// diagnostics to `err`.
///
/// The session is driven on a blocking worker task; progress events cross
/// back over a channel and are reported per reading when
/// `options.verbose` is set. After the acquisition completes, the buffered
/// readings are handed to the CSV writer in one pass.
pub async fn run_with_io(
    options: Options,
    opener: &dyn SessionOpener,
    cancel: CancelToken,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let connect = ConnectOptions {
        resource: options.resource.clone(),
        filter: options.filter.clone(),
        expect_idn: options.expect_idn.clone(),
        timeout: options.timeout,
    };

    let Connected {
        mut session,
        resource,
        identity,
    } = opener.open(options.backend, &connect)?;

    if options.verbose {
        writeln!(err, "connected to {resource}: {identity}")?;
    }

    session::configure(session.as_mut(), options.channel)?;

    let count = options.count;
    let pacing = options.interval;
    let (tx, mut rx) = mpsc::channel::<u32>(PROGRESS_CHANNEL_BUFFER_SIZE);
    let worker_cancel = cancel.clone();

    let worker = task::spawn_blocking(move || {
        let readings =
            acquisition::acquire(session.as_mut(), count, pacing, &worker_cancel, |done| {
                // The observer may already be gone; progress is best-effort.
                let _ = tx.blocking_send(done);
            })?;
        session.close()?;
        Ok::<_, RunError>(readings)
    });

    while let Some(done) = rx.recv().await {
        if options.verbose {
            writeln!(err, "reading {done}/{count}")?;
        }
    }

    let readings = worker.await??;

    let formatter = CsvFormatter::new(options.line_delimited);
    csv::write_to_path(&readings, &options.output, &formatter)?;
    writeln!(
        out,
        "wrote {} records to {}",
        readings.len(),
        options.output.display()
    )?;

    Ok(())
}
