// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Pipeline files
//!
//! A pipeline and its default call options, stored as YAML, JSON or TOML:
//!
//! ```yaml
//! commands:
//!   - [sed, "s/a/A/"]
//!   - [sed, "s/b/B/g"]
//! delimiter: "\n"
//! capacity: 4096
//! timeout_ms: 5000
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::definition::Pipeline;
use super::options::{parse_delimiter, CallOptions};
use crate::errors::{PipeError, PipeResult};

/// File format of a pipeline file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
    Toml,
}

impl FileFormat {
    /// Pick the format from a file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Contents of a pipeline file
///
/// Commands stay untyped until [`pipeline`](Self::pipeline) validates them,
/// so a stray number in an argument list is reported as an invalid command
/// rather than a parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    /// Command descriptions, in stage order
    pub commands: Vec<Value>,

    /// Default record delimiter
    #[serde(default)]
    pub delimiter: Option<String>,

    /// Default read chunk size
    #[serde(default)]
    pub capacity: Option<usize>,

    /// Default deadline in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PipelineFile {
    /// Load a pipeline file, choosing the format from its extension
    pub fn from_file(path: &Path) -> PipeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipeError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::parse(&content, FileFormat::from_path(path)).map_err(|message| PipeError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse YAML content
    pub fn from_yaml(content: &str) -> PipeResult<Self> {
        Self::parse_inline(content, FileFormat::Yaml)
    }

    /// Parse JSON content
    pub fn from_json(content: &str) -> PipeResult<Self> {
        Self::parse_inline(content, FileFormat::Json)
    }

    /// Parse TOML content
    pub fn from_toml(content: &str) -> PipeResult<Self> {
        Self::parse_inline(content, FileFormat::Toml)
    }

    /// Validate the commands and build the pipeline
    pub fn pipeline(&self) -> PipeResult<Pipeline> {
        Pipeline::from_values(&self.commands)
    }

    /// Default call options declared in the file
    pub fn call_options(&self) -> PipeResult<CallOptions> {
        let delimiter = self
            .delimiter
            .as_deref()
            .map(parse_delimiter)
            .transpose()?;

        let options = CallOptions {
            delimiter,
            capacity: self.capacity,
            timeout: self.timeout_ms.map(Duration::from_millis),
        };
        options.validate()?;
        Ok(options)
    }

    fn parse(content: &str, format: FileFormat) -> Result<Self, String> {
        match format {
            FileFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            FileFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            FileFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn parse_inline(content: &str, format: FileFormat) -> PipeResult<Self> {
        Self::parse(content, format).map_err(|message| PipeError::Config {
            path: PathBuf::from("<inline>"),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_pipeline() {
        let file = PipelineFile::from_yaml(
            r#"
commands:
  - [sed, "s/a/A/"]
  - [sed, "s/b/B/g"]
delimiter: "\n"
capacity: 15
"#,
        )
        .unwrap();

        let pipeline = file.pipeline().unwrap();
        assert_eq!(pipeline.to_string(), "sed s/a/A/ | sed s/b/B/g");

        let options = file.call_options().unwrap();
        assert_eq!(options.delimiter, Some(b'\n'));
        assert_eq!(options.capacity, Some(15));
        assert!(options.timeout.is_none());
    }

    #[test]
    fn test_numeric_argument_is_invalid_command() {
        let file = PipelineFile::from_yaml("commands:\n  - [exe, -v, 1]\n").unwrap();
        let err = file.pipeline().unwrap_err();
        assert!(matches!(err, PipeError::InvalidCommandSpec { stage: 0, .. }));
    }

    #[test]
    fn test_null_command_is_invalid() {
        let file = PipelineFile::from_json(r#"{"commands": [["cat"], null]}"#).unwrap();
        let err = file.pipeline().unwrap_err();
        assert!(matches!(err, PipeError::InvalidCommandSpec { stage: 1, .. }));
    }

    #[test]
    fn test_empty_commands_is_empty_pipeline() {
        let file = PipelineFile::from_json(r#"{"commands": []}"#).unwrap();
        assert!(matches!(file.pipeline(), Err(PipeError::EmptyPipeline)));
    }

    #[test]
    fn test_toml_file_from_disk() {
        let mut tmp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(tmp, "commands = [[\"seq\", \"5\"], [\"head\", \"-n\", \"2\"]]").unwrap();
        writeln!(tmp, "timeout_ms = 250").unwrap();

        let file = PipelineFile::from_file(tmp.path()).unwrap();
        assert_eq!(file.pipeline().unwrap().len(), 2);
        assert_eq!(
            file.call_options().unwrap().timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("missing");
        assert!(matches!(
            PipelineFile::from_file(&path),
            Err(PipeError::Config { .. })
        ));
    }

    #[test]
    fn test_bad_delimiter_rejected() {
        let file = PipelineFile::from_yaml("commands: [[cat]]\ndelimiter: ab\n").unwrap();
        assert!(matches!(
            file.call_options(),
            Err(PipeError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("p.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("p.toml")), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("p.yml")), FileFormat::Yaml);
    }
}
