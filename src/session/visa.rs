//! VISA backend.
//!
//! Real instrument I/O through a native VISA installation via the
//! `visa-rs` crate. Discovery walks the resource manager's match list for
//! the filter pattern; each candidate is opened and probed with `*IDN?`
//! until one passes.

use super::{ConnectOptions, Connected, Session, SessionError, probe};
use crate::resource::ResourceName;
use std::ffi::CString;
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;
use visa_rs::flags::AccessMode;
use visa_rs::{DefaultRM, Instrument};

/// A session backed by an open VISA instrument handle.
pub struct VisaSession {
    instrument: Instrument,
}

impl Session for VisaSession {
    fn clear(&mut self) -> Result<(), SessionError> {
        self.instrument
            .clear()
            .map_err(|e| SessionError::Clear(e.to_string()))
    }

    fn write_command(&mut self, command: &str) -> Result<(), SessionError> {
        (&self.instrument)
            .write_all(format!("{command}\n").as_bytes())
            .map_err(|e| SessionError::Write(e.to_string()))
    }

    fn read_response(&mut self) -> Result<String, SessionError> {
        let mut reader = BufReader::new(&self.instrument);
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| SessionError::Read(e.to_string()))?;
        Ok(line.trim_end().to_string())
    }

    fn close(&mut self) -> Result<(), SessionError> {
        // The VISA session is released when the instrument handle drops.
        Ok(())
    }
}

/// Discover, open and probe an instrument.
///
/// With an explicit resource the discovery step is skipped. Candidates that
/// fail to open or whose identity does not match are skipped; only when no
/// candidate passes does the whole connect fail.
pub fn connect(options: &ConnectOptions) -> Result<Connected, SessionError> {
    let rm = DefaultRM::new().map_err(|e| SessionError::Open {
        resource: options.filter.clone(),
        reason: e.to_string(),
    })?;

    let candidates = match &options.resource {
        Some(resource) => vec![resource.clone()],
        None => discover(&rm, &options.filter),
    };

    for resource in candidates {
        let Ok(mut session) = open(&rm, &resource, options.timeout) else {
            continue;
        };
        if let Ok(Some(identity)) = probe(&mut session, options.expect_idn.as_deref()) {
            return Ok(Connected {
                session: Box::new(session),
                resource,
                identity,
            });
        }
    }

    Err(SessionError::NoDeviceFound(options.filter.clone()))
}

/// List resources matching the filter pattern.
///
/// The VISA layer reports an empty match set as an error; both that and
/// resource names the manager cannot represent are treated as no devices.
fn discover(rm: &DefaultRM, filter: &str) -> Vec<ResourceName> {
    let Ok(expr) = CString::new(filter) else {
        return Vec::new();
    };
    let Ok(list) = rm.find_res_list(&expr.into()) else {
        return Vec::new();
    };

    list.filter_map(|res| res.ok())
        .filter_map(|res| res.to_string().parse().ok())
        .collect()
}

fn open(
    rm: &DefaultRM,
    resource: &ResourceName,
    timeout: Duration,
) -> Result<VisaSession, SessionError> {
    let name = CString::new(resource.as_str()).map_err(|e| SessionError::Open {
        resource: resource.to_string(),
        reason: e.to_string(),
    })?;
    let instrument = rm
        .open(&name.into(), AccessMode::NO_LOCK, timeout)
        .map_err(|e| SessionError::Open {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;

    Ok(VisaSession { instrument })
}
