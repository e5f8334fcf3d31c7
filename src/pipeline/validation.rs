// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Pipeline validation
//!
//! Pre-flight checks that look up each stage's program without spawning
//! anything.

use std::path::Path;

use crate::pipeline::{CommandSpec, Pipeline};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Check that every stage's program can be found
    pub fn validate(pipeline: &Pipeline) -> ValidationResult {
        let mut result = ValidationResult::new();

        for (index, stage) in pipeline.stages().iter().enumerate() {
            Self::validate_stage(index, stage, &mut result);
        }

        result
    }

    fn validate_stage(index: usize, stage: &CommandSpec, result: &mut ValidationResult) {
        let program = stage.program();
        let path = Path::new(program);

        if path.components().count() > 1 {
            // Explicit path: PATH lookup does not apply
            if path.is_relative() {
                result.add_warning(&format!(
                    "Stage {} ('{}'): relative program path depends on the working directory",
                    index, program
                ));
            }
            if !path.exists() {
                result.add_error(&format!(
                    "Stage {} ('{}'): program does not exist",
                    index, program
                ));
            }
            return;
        }

        if which::which(program).is_err() {
            result.add_error(&format!(
                "Stage {} ('{}'): program not found in PATH",
                index, program
            ));
        }
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
