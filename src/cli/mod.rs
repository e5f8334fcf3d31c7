// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for pipelay.

pub mod check;
pub mod run;

use clap::{Args, Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::pipeline::{CallOptions, Pipeline, PipelineFile};

/// Token separating stages in a pipeline given on the command line
pub const STAGE_SEPARATOR: &str = "|";

/// Lay Unix pipes
///
/// Run chains of processes connected by OS pipes.
#[derive(Parser, Debug)]
#[clap(
    name = "pipelay",
    version,
    about = "Run chains of processes connected by OS pipes",
    long_about = None,
    after_help = "Examples:\n\
        pipelay run -- seq 5 '|' head -n 2            Print the first two numbers\n\
        pipelay run --stdin -- sed s/a/A/ < in.txt     Feed stdin into the chain\n\
        pipelay run -d '\\n' -c 15 -- seq 5000         Stream newline-delimited records\n\
        pipelay check -f pipeline.yaml                 Check that every program exists\n\n\
        See 'pipelay <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline and print its output
    Run(RunArgs),

    /// Check a pipeline without running it
    Check(SourceArgs),
}

/// Where the pipeline comes from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Pipeline file (YAML, JSON or TOML)
    #[clap(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Commands separated by a literal '|' argument
    #[clap(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Arguments of the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[clap(flatten)]
    pub source: SourceArgs,

    /// Record delimiter; streams output record by record
    #[clap(short, long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Read chunk size in bytes; streams output record by record
    #[clap(short, long, value_name = "BYTES")]
    pub capacity: Option<usize>,

    /// Kill the pipeline after this many milliseconds
    #[clap(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Feed this process's stdin into the first stage
    #[clap(long)]
    pub stdin: bool,
}

/// Split command-line tokens into per-stage token lists
pub fn split_stages(tokens: &[String]) -> Vec<Vec<String>> {
    tokens
        .split(|t| t.as_str() == STAGE_SEPARATOR)
        .map(<[String]>::to_vec)
        .collect()
}

/// Build the pipeline and its default options from a file or the command line
pub fn load_pipeline(source: &SourceArgs) -> Result<(Pipeline, CallOptions)> {
    match (&source.file, source.command.is_empty()) {
        (Some(_), false) => Err(miette::miette!(
            "Give either a pipeline file or commands after '--', not both"
        )),
        (Some(path), true) => load_file(path),
        (None, false) => {
            let pipeline = Pipeline::from_commands(split_stages(&source.command))?;
            Ok((pipeline, CallOptions::default()))
        }
        (None, true) => Err(miette::miette!(
            "No pipeline given\n\n\
             Pass commands after '--' (e.g. pipelay run -- seq 5 '|' head -n 2) or use --file."
        )),
    }
}

fn load_file(path: &Path) -> Result<(Pipeline, CallOptions)> {
    if !path.exists() {
        return Err(miette::miette!("Pipeline file not found: {}", path.display()));
    }

    let file = PipelineFile::from_file(path)?;
    Ok((file.pipeline()?, file.call_options()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_split_stages() {
        let stages = split_stages(&tokens(&["seq", "5", "|", "head", "-n", "2"]));
        assert_eq!(stages, vec![tokens(&["seq", "5"]), tokens(&["head", "-n", "2"])]);
    }

    #[test]
    fn test_split_keeps_empty_arguments() {
        let stages = split_stages(&tokens(&["printf", "%s-%s\n", "", "x"]));
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0][2], "");
    }

    #[test]
    fn test_dangling_separator_is_rejected() {
        let source = SourceArgs {
            file: None,
            command: tokens(&["cat", "|"]),
        };
        assert!(load_pipeline(&source).is_err());
    }

    #[test]
    fn test_no_source_is_rejected() {
        assert!(load_pipeline(&SourceArgs::default()).is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["pipelay", "run", "-d", ",", "--", "seq", "3", "|", "cat"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.delimiter.as_deref(), Some(","));
                assert_eq!(args.source.command.len(), 4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
