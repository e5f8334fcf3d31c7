// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Aggregate exit status of a chain

use std::fmt;
use std::process::ExitStatus;

/// Exit status of every stage, in stage order
///
/// Like a shell pipe, the chain's status is the status of its last stage.
/// A non-zero exit earlier in the chain is not fatal, but it stays visible
/// through [`codes`](Self::codes) and [`failed_stages`](Self::failed_stages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExitStatus {
    stages: Vec<ExitStatus>,
}

impl PipelineExitStatus {
    pub(crate) fn new(stages: Vec<ExitStatus>) -> Self {
        Self { stages }
    }

    /// Exit code of the last stage (`None` if it was killed by a signal)
    pub fn code(&self) -> Option<i32> {
        self.last().and_then(ExitStatus::code)
    }

    /// Whether the last stage exited successfully
    pub fn success(&self) -> bool {
        self.last().is_some_and(ExitStatus::success)
    }

    /// Whether every stage exited successfully
    pub fn all_succeeded(&self) -> bool {
        self.stages.iter().all(ExitStatus::success)
    }

    /// Exit code of every stage
    pub fn codes(&self) -> Vec<Option<i32>> {
        self.stages.iter().map(ExitStatus::code).collect()
    }

    /// Indices of stages that did not exit successfully
    pub fn failed_stages(&self) -> Vec<usize> {
        self.stages
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.success())
            .map(|(i, _)| i)
            .collect()
    }

    /// Raw per-stage statuses
    pub fn stages(&self) -> &[ExitStatus] {
        &self.stages
    }

    fn last(&self) -> Option<&ExitStatus> {
        self.stages.last()
    }
}

impl fmt::Display for PipelineExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self
            .stages
            .iter()
            .map(|s| match s.code() {
                Some(code) => code.to_string(),
                None => "signal".to_string(),
            })
            .collect();
        write!(f, "[{}]", codes.join(" | "))
    }
}
