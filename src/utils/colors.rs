// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Terminal color utilities
//!
//! Provides consistent color schemes across the CLI. Everything here writes
//! to stderr so it never mixes with pipeline output on stdout.

use colored::Colorize;
use std::process::ExitStatus;

use crate::process::PipelineExitStatus;

/// Check if colors should be disabled
pub fn should_use_colors() -> bool {
    // Respect NO_COLOR environment variable
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::env::var("TERM").is_ok()
}

/// Style one stage's exit status
pub fn stage_status(status: &ExitStatus) -> colored::ColoredString {
    match status.code() {
        Some(0) => "0".green(),
        Some(code) => code.to_string().red(),
        None => "signal".yellow(),
    }
}

/// Print a styled section
pub fn print_section(title: &str) {
    eprintln!();
    eprintln!("{}:", title.bold());
}

/// Print a success check
pub fn print_success(msg: &str) {
    eprintln!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow(), msg);
}

/// Print an info item
pub fn print_info(msg: &str) {
    eprintln!("  {} {}", "→".blue(), msg);
}

/// Print every stage's exit status next to its command
pub fn print_exit_status(pipeline: &crate::Pipeline, status: &PipelineExitStatus) {
    print_section("Exit status");
    for (stage, exit) in pipeline.stages().iter().zip(status.stages()) {
        eprintln!("  [{}] {}", stage_status(exit), stage.to_string().dimmed());
    }
}
