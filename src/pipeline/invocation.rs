// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Pipeline invocation
//!
//! A [`Call`] configures one run of a pipeline. Every terminal operation
//! launches a fresh chain; nothing is shared between calls.

use std::time::Duration;

use tracing::{debug, info_span, Instrument};

use super::definition::Pipeline;
use super::options::CallOptions;
use crate::errors::PipeResult;
use crate::process::{self, Input, PipelineOutput, RecordStream};

/// Result of [`Call::run`], depending on the selected mode
#[derive(Debug)]
pub enum CallOutcome {
    /// Buffered mode: the whole output
    Captured(PipelineOutput),
    /// Streaming mode: records read lazily
    Streaming(RecordStream),
}

impl CallOutcome {
    /// The captured output, if the call ran in buffered mode
    pub fn into_captured(self) -> Option<PipelineOutput> {
        match self {
            Self::Captured(output) => Some(output),
            Self::Streaming(_) => None,
        }
    }

    /// The record stream, if the call ran in streaming mode
    pub fn into_stream(self) -> Option<RecordStream> {
        match self {
            Self::Captured(_) => None,
            Self::Streaming(stream) => Some(stream),
        }
    }
}

/// One configured call on a pipeline
#[derive(Debug)]
pub struct Call {
    pipeline: Pipeline,
    input: Input,
    options: CallOptions,
}

impl Call {
    pub(crate) fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            input: Input::None,
            options: CallOptions::default(),
        }
    }

    /// Payload written to the head stage
    pub fn input(mut self, input: impl Into<Input>) -> Self {
        self.input = input.into();
        self
    }

    /// Split output into records on `delimiter` (selects streaming mode)
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.options.delimiter = Some(delimiter);
        self
    }

    /// Read at most `capacity` bytes at a time (selects streaming mode)
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options.capacity = Some(capacity);
        self
    }

    /// Kill the chain and fail if the call takes longer than `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Replace all options at once
    pub fn options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Run in the mode selected by the options
    pub async fn run(self) -> PipeResult<CallOutcome> {
        if self.options.is_streaming() {
            self.stream().await.map(CallOutcome::Streaming)
        } else {
            self.output().await.map(CallOutcome::Captured)
        }
    }

    /// Run in buffered mode and return the whole output
    pub async fn output(self) -> PipeResult<PipelineOutput> {
        self.options.validate()?;
        let span = info_span!("pipeline", stages = self.pipeline.len(), mode = "buffered");

        async move {
            debug!(pipeline = %self.pipeline, input = ?self.input, "launching");
            let chain = process::launch(&self.pipeline).await?;
            process::capture(chain, self.input, self.options.timeout).await
        }
        .instrument(span)
        .await
    }

    /// Run in streaming mode and return the lazy record sequence
    pub async fn stream(self) -> PipeResult<RecordStream> {
        self.options.validate()?;
        let delimiter = self.options.delimiter_or_default();
        let capacity = self.options.capacity_or_default();
        let span = info_span!("pipeline", stages = self.pipeline.len(), mode = "streaming");

        async move {
            debug!(pipeline = %self.pipeline, delimiter, capacity, "launching");
            let chain = process::launch(&self.pipeline).await?;
            Ok(RecordStream::start(
                chain,
                self.input,
                delimiter,
                capacity,
                self.options.timeout,
            ))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::PipeError;

    #[tokio::test]
    async fn test_cat_round_trips_input() {
        let pipeline = crate::pipeline!(["cat"]).unwrap();
        let output = pipeline.run_with("hello world\n").await.unwrap();
        assert_eq!(output.text().unwrap(), "hello world\n");
        assert!(output.status.success());
    }

    #[tokio::test]
    async fn test_run_selects_streaming_mode() {
        let pipeline = crate::pipeline!(["seq", "3"]).unwrap();

        let outcome = pipeline.call().delimiter(b'\n').run().await.unwrap();
        let records = outcome.into_stream().unwrap().collect_records().await.unwrap();
        assert_eq!(records, vec!["1", "2", "3"]);

        let outcome = pipeline.call().run().await.unwrap();
        assert_eq!(outcome.into_captured().unwrap().text().unwrap(), "1\n2\n3\n");
    }

    #[tokio::test]
    async fn test_invalid_capacity_fails_before_spawning() {
        let pipeline = crate::pipeline!(["pipelay-no-such-program"]).unwrap();
        let err = pipeline.call().capacity(0).run().await.unwrap_err();
        assert!(matches!(err, PipeError::InvalidOption { .. }));
    }
}
