// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Pipeline definition
//!
//! An immutable, ordered list of validated commands. Building never spawns
//! anything; every call on the pipeline launches a fresh chain.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::command::CommandSpec;
use super::invocation::Call;
use super::open::OpenPipeline;
use crate::errors::{PipeError, PipeResult};
use crate::process::{Input, PipelineOutput};

/// Reusable pipeline definition
///
/// Cloning is cheap; clones share the same stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Arc<[CommandSpec]>,
}

impl Pipeline {
    /// Build a pipeline from validated commands
    pub fn new<I>(stages: I) -> PipeResult<Self>
    where
        I: IntoIterator<Item = CommandSpec>,
    {
        let stages: Vec<CommandSpec> = stages.into_iter().collect();
        if stages.is_empty() {
            return Err(PipeError::EmptyPipeline);
        }

        Ok(Self {
            stages: stages.into(),
        })
    }

    /// Build a pipeline from raw token lists, validating each one
    pub fn from_commands<I, C, S>(commands: I) -> PipeResult<Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stages = commands
            .into_iter()
            .enumerate()
            .map(|(index, tokens)| CommandSpec::new(tokens).map_err(|e| e.with_stage(index)))
            .collect::<PipeResult<Vec<_>>>()?;

        Self::new(stages)
    }

    /// Build a pipeline from untyped command descriptions
    pub fn from_values(values: &[Value]) -> PipeResult<Self> {
        let stages = values
            .iter()
            .enumerate()
            .map(|(index, value)| CommandSpec::from_value(value).map_err(|e| e.with_stage(index)))
            .collect::<PipeResult<Vec<_>>>()?;

        Self::new(stages)
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[CommandSpec] {
        &self.stages
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false: a pipeline has at least one stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Start configuring a call
    pub fn call(&self) -> Call {
        Call::new(self.clone())
    }

    /// Run with no input and capture the output
    pub async fn run(&self) -> PipeResult<PipelineOutput> {
        self.call().output().await
    }

    /// Run with `input` and capture the output
    pub async fn run_with(&self, input: impl Into<Input>) -> PipeResult<PipelineOutput> {
        self.call().input(input).output().await
    }

    /// Launch the chain and hand its boundary pipes to the caller
    pub async fn open(&self) -> PipeResult<OpenPipeline> {
        OpenPipeline::launch(self).await
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

/// Build a [`Pipeline`] from string-array literals
///
/// ```
/// let pipeline = pipelay::pipeline!(["seq", "5"], ["head", "-n", "2"]).unwrap();
/// assert_eq!(pipeline.to_string(), "seq 5 | head -n 2");
/// ```
#[macro_export]
macro_rules! pipeline {
    () => {
        $crate::Pipeline::new(::std::iter::empty::<$crate::CommandSpec>())
    };
    ($([$($token:expr),* $(,)?]),+ $(,)?) => {
        $crate::Pipeline::from_commands(::std::vec![
            $(::std::vec![$(::std::string::String::from($token)),*]),+
        ])
    };
}
