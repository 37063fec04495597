//! VISA resource names.
//!
//! This module provides a validated resource-name type that is decoupled
//! from any specific instrument-I/O library, so the rest of the crate can
//! pass device addresses around without pulling in a backend.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A VISA resource name such as `USB0::0x0957::0x5707::MY12345678::INSTR`.
///
/// Validation is structural only: the string must consist of at least two
/// non-empty segments separated by `::`. Whether the resource actually
/// exists is the backend's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    /// The resource name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors returned when parsing a resource name string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseResourceError {
    #[error("invalid resource name: empty string")]
    Empty,
    #[error("invalid resource name: expected '::'-separated segments")]
    MissingSeparator,
    #[error("invalid resource name: segment {0} is empty")]
    EmptySegment(usize),
}

impl FromStr for ResourceName {
    type Err = ParseResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseResourceError::Empty);
        }

        let segments: Vec<&str> = s.split("::").collect();
        if segments.len() < 2 {
            return Err(ParseResourceError::MissingSeparator);
        }
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(ParseResourceError::EmptySegment(i));
            }
        }

        Ok(ResourceName(s.to_string()))
    }
}

/// Parse a resource name from CLI input.
///
/// # Example
/// ```
/// use daq_recorder::resource::parse_resource;
///
/// let name = parse_resource("USB0::0x0957::0x5707::MY12345678::INSTR").unwrap();
/// assert_eq!(name.as_str(), "USB0::0x0957::0x5707::MY12345678::INSTR");
/// ```
pub fn parse_resource(src: &str) -> Result<ResourceName, String> {
    src.parse()
        .map_err(|e: ParseResourceError| e.to_string())
}
