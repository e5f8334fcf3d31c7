// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Check command - validate a pipeline without running it

use colored::Colorize;
use miette::Result;

use super::{load_pipeline, SourceArgs};
use crate::pipeline::PipelineValidator;
use crate::utils;

/// Run the check command
pub async fn run(source: SourceArgs, verbose: bool) -> Result<()> {
    eprintln!("{}", "Checking pipeline...".bold());
    eprintln!();

    let (pipeline, options) = load_pipeline(&source)?;
    utils::print_success(&format!("Pipeline parsed: {}", pipeline.to_string().cyan()));

    let validation = PipelineValidator::validate(&pipeline);

    if !validation.errors.is_empty() {
        utils::print_section("Errors");
        for error in &validation.errors {
            utils::print_error(error);
        }
    }

    if !validation.warnings.is_empty() {
        utils::print_section("Warnings");
        for warning in &validation.warnings {
            utils::print_warning(warning);
        }
    }

    if verbose {
        utils::print_section("Pipeline summary");
        eprintln!("  Stages: {}", pipeline.len());
        for (index, stage) in pipeline.stages().iter().enumerate() {
            eprintln!("    {}. {}", index, stage);
        }
        if options.is_streaming() {
            eprintln!(
                "  Streaming: delimiter {:?}, capacity {}",
                options.delimiter_or_default() as char,
                options.capacity_or_default()
            );
        }
        if let Some(timeout) = options.timeout {
            eprintln!("  Timeout: {:?}", timeout);
        }
    }

    eprintln!();

    if validation.is_valid() {
        eprintln!("{}", "Pipeline is valid!".green().bold());
        Ok(())
    } else {
        Err(miette::miette!("Pipeline validation failed"))
    }
}
