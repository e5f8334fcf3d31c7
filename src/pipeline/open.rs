// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Open pipelines
//!
//! A launched chain whose boundary pipes are driven by the caller, for
//! interactive use where input depends on output already read.

use tokio::process::{ChildStdin, ChildStdout};

use super::definition::Pipeline;
use crate::errors::PipeResult;
use crate::process::{self, Chain, PipelineExitStatus};

/// A running pipeline with caller-owned input and output
///
/// Reading the output to its end requires closing the input first, since
/// the head stage only finishes once it sees end of input.
#[derive(Debug)]
pub struct OpenPipeline {
    chain: Option<Chain>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

impl OpenPipeline {
    pub(crate) async fn launch(pipeline: &Pipeline) -> PipeResult<Self> {
        let mut chain = process::launch(pipeline).await?;
        let stdin = chain.take_stdin();
        let stdout = chain.take_stdout();

        Ok(Self {
            chain: Some(chain),
            stdin,
            stdout,
        })
    }

    /// Write end of the head stage, until closed
    pub fn stdin(&mut self) -> Option<&mut ChildStdin> {
        self.stdin.as_mut()
    }

    /// Read end of the tail stage
    pub fn stdout(&mut self) -> Option<&mut ChildStdout> {
        self.stdout.as_mut()
    }

    /// Take ownership of the read end, e.g. to wrap it in a buffered reader
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Send end of input to the head stage
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Close both ends and wait for every stage to exit
    pub async fn finish(mut self) -> PipeResult<PipelineExitStatus> {
        self.stdin = None;
        self.stdout = None;
        match self.chain.take() {
            Some(mut chain) => chain.wait().await,
            None => Ok(PipelineExitStatus::new(Vec::new())),
        }
    }
}

impl Drop for OpenPipeline {
    fn drop(&mut self) {
        self.stdin = None;
        self.stdout = None;
        if let Some(chain) = self.chain.take() {
            chain.reap_in_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_interactive_round_trip() {
        let pipeline = crate::pipeline!(["cat"]).unwrap();
        let mut open = pipeline.open().await.unwrap();

        open.stdin().unwrap().write_all(b"ping\n").await.unwrap();
        open.stdin().unwrap().flush().await.unwrap();

        let mut lines = BufReader::new(open.take_stdout().unwrap()).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ping"));

        open.close_stdin();
        assert_eq!(lines.next_line().await.unwrap(), None);

        let status = open.finish().await.unwrap();
        assert!(status.success());
    }
}
