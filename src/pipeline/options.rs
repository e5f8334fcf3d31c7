// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Per-call options

use std::time::Duration;

use crate::errors::{PipeError, PipeResult};
use crate::process::DEFAULT_CAPACITY;

/// Options for one call on a pipeline
///
/// Setting a delimiter or a capacity selects streaming mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Record delimiter (streaming mode)
    pub delimiter: Option<u8>,
    /// Maximum bytes per read (streaming mode)
    pub capacity: Option<usize>,
    /// Deadline for the whole call
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// Whether these options select streaming mode
    pub fn is_streaming(&self) -> bool {
        self.delimiter.is_some() || self.capacity.is_some()
    }

    /// Delimiter to split records on
    pub fn delimiter_or_default(&self) -> u8 {
        self.delimiter.unwrap_or(b'\n')
    }

    /// Read chunk size
    pub fn capacity_or_default(&self) -> usize {
        self.capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    /// Check the options before anything is spawned
    pub fn validate(&self) -> PipeResult<()> {
        if self.capacity == Some(0) {
            return Err(PipeError::InvalidOption {
                option: "capacity".into(),
                reason: "must be a positive number of bytes".into(),
            });
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(PipeError::InvalidOption {
                option: "timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Fill unset fields from `defaults`
    pub fn or(self, defaults: CallOptions) -> Self {
        Self {
            delimiter: self.delimiter.or(defaults.delimiter),
            capacity: self.capacity.or(defaults.capacity),
            timeout: self.timeout.or(defaults.timeout),
        }
    }
}

/// Parse a delimiter given as text
///
/// Accepts a single ASCII character or one of the escapes `\n`, `\t`, `\r`,
/// `\0` and `\\`.
pub fn parse_delimiter(text: &str) -> PipeResult<u8> {
    let byte = match text {
        "\\n" => Some(b'\n'),
        "\\t" => Some(b'\t'),
        "\\r" => Some(b'\r'),
        "\\0" => Some(b'\0'),
        "\\\\" => Some(b'\\'),
        _ => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Some(c as u8),
                _ => None,
            }
        }
    };

    byte.ok_or_else(|| PipeError::InvalidOption {
        option: "delimiter".into(),
        reason: format!("'{}' must represent a single byte character", text.escape_default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_selection() {
        assert!(!CallOptions::default().is_streaming());

        let options = CallOptions {
            capacity: Some(15),
            ..Default::default()
        };
        assert!(options.is_streaming());
        assert_eq!(options.delimiter_or_default(), b'\n');
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let options = CallOptions {
            capacity: Some(0),
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(PipeError::InvalidOption { .. })));
    }

    #[test]
    fn test_or_keeps_explicit_values() {
        let explicit = CallOptions {
            delimiter: Some(b','),
            ..Default::default()
        };
        let defaults = CallOptions {
            delimiter: Some(b'\n'),
            capacity: Some(64),
            timeout: None,
        };

        let merged = explicit.or(defaults);
        assert_eq!(merged.delimiter, Some(b','));
        assert_eq!(merged.capacity, Some(64));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("\n").unwrap(), b'\n');
        assert_eq!(parse_delimiter("\\n").unwrap(), b'\n');
        assert_eq!(parse_delimiter("\\0").unwrap(), 0);
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
