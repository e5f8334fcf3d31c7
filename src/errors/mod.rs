// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Error types
//!
//! Every failure a pipeline can report, from malformed command
//! descriptions at build time to spawn and I/O failures while a chain is
//! running. A broken pipe on the input side is not an error: the feeder
//! absorbs it.

use miette::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for pipelay operations
pub type PipeResult<T> = Result<T, PipeError>;

/// Main error type for pipelay
#[derive(Error, Debug, Diagnostic)]
pub enum PipeError {
    // ─────────────────────────────────────────────────────────────────────────
    // Build-time Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid command description for stage {stage}: {reason}")]
    #[diagnostic(
        code(pipelay::invalid_command_spec),
        help("A command is a non-empty list of strings: the program followed by its arguments")
    )]
    InvalidCommandSpec { stage: usize, reason: String },

    #[error("Pipeline requires at least one command")]
    #[diagnostic(code(pipelay::empty_pipeline))]
    EmptyPipeline,

    #[error("Invalid option '{option}': {reason}")]
    #[diagnostic(code(pipelay::invalid_option))]
    InvalidOption { option: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Call-time Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to spawn stage {stage} ('{program}'): {source}")]
    #[diagnostic(code(pipelay::spawn_failure))]
    SpawnFailure {
        stage: usize,
        program: String,
        #[source]
        source: std::io::Error,
        #[help]
        help: Option<String>,
    },

    #[error("I/O error at stage {stage} while {context}: {source}")]
    #[diagnostic(code(pipelay::io_error))]
    Io {
        stage: usize,
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline output is not valid UTF-8")]
    #[diagnostic(
        code(pipelay::invalid_utf8),
        help("Read the raw bytes instead of decoding the output as text")
    )]
    InvalidUtf8 {
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Pipeline timed out after {after:?}")]
    #[diagnostic(
        code(pipelay::timeout),
        help("All stages were killed; raise the timeout or check for a stage waiting on input")
    )]
    Timeout { after: Duration },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to load pipeline file '{}': {message}", path.display())]
    #[diagnostic(code(pipelay::config_error))]
    Config { path: PathBuf, message: String },
}

impl PipeError {
    /// Create a spawn failure, adding a hint when the program is not on PATH
    pub fn spawn_failed(stage: usize, program: &str, source: std::io::Error) -> Self {
        let help = match source.kind() {
            std::io::ErrorKind::NotFound if which::which(program).is_err() => Some(format!(
                "'{}' was not found; install it or check that it is in your PATH",
                program
            )),
            std::io::ErrorKind::PermissionDenied => {
                Some(format!("'{}' exists but is not executable", program))
            }
            _ => None,
        };

        Self::SpawnFailure {
            stage,
            program: program.to_string(),
            source,
            help,
        }
    }

    /// Create an I/O error for a stage
    pub fn io(stage: usize, context: &str, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            context: context.to_string(),
            source,
        }
    }

    /// Re-attribute a command description error to its position in a pipeline
    pub fn with_stage(self, index: usize) -> Self {
        match self {
            Self::InvalidCommandSpec { reason, .. } => Self::InvalidCommandSpec {
                stage: index,
                reason,
            },
            other => other,
        }
    }

    /// Whether the error was raised before any process was spawned
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCommandSpec { .. }
                | Self::EmptyPipeline
                | Self::InvalidOption { .. }
                | Self::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_stage_rewrites_invalid_spec() {
        let err = PipeError::InvalidCommandSpec {
            stage: 0,
            reason: "empty".into(),
        }
        .with_stage(3);

        assert!(matches!(err, PipeError::InvalidCommandSpec { stage: 3, .. }));
        assert_eq!(
            err.to_string(),
            "Invalid command description for stage 3: empty"
        );
    }

    #[test]
    fn test_with_stage_leaves_other_errors() {
        let err = PipeError::EmptyPipeline.with_stage(2);
        assert!(matches!(err, PipeError::EmptyPipeline));
    }

    #[test]
    fn test_spawn_failed_hints_missing_program() {
        let source = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = PipeError::spawn_failed(1, "pipelay-no-such-program", source);

        match err {
            PipeError::SpawnFailure { stage, help, .. } => {
                assert_eq!(stage, 1);
                assert!(help.unwrap().contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_error_classification() {
        assert!(PipeError::EmptyPipeline.is_build_error());
        assert!(!PipeError::Timeout {
            after: Duration::from_secs(1)
        }
        .is_build_error());
    }
}
