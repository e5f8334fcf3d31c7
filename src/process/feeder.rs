// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Input feeder
//!
//! Writes the caller's payload into the head stage on its own task, then
//! closes the pipe so the head sees end of input.

use std::fmt;
use std::io::ErrorKind;

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::{PipeError, PipeResult};

/// Input source for the head of a pipeline
#[derive(Default)]
pub enum Input {
    /// No input; the head's stdin is closed immediately
    #[default]
    None,
    /// A single payload
    Bytes(Vec<u8>),
    /// A lazily produced sequence of chunks, written in order
    Chunks(Box<dyn Iterator<Item = Vec<u8>> + Send>),
}

impl Input {
    /// Input produced chunk by chunk
    ///
    /// An empty sequence is valid: nothing is written and the head's stdin
    /// is closed right away.
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        I::IntoIter: Send + 'static,
        C: Into<Vec<u8>> + 'static,
    {
        Self::Chunks(Box::new(chunks.into_iter().map(Into::into)))
    }

    /// Whether no input source was given
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Chunks(_) => f.write_str("Chunks(..)"),
        }
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Self::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Self::Bytes(s.into_bytes())
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(input: Option<T>) -> Self {
        input.map(Into::into).unwrap_or_default()
    }
}

/// Start feeding `input` on a separate task
pub(crate) fn spawn_feeder(stdin: Option<ChildStdin>, input: Input) -> JoinHandle<PipeResult<u64>> {
    tokio::spawn(feed(stdin, input))
}

/// Write `input` into `stdin` and close it
///
/// Returns the number of bytes the head accepted. A broken pipe means some
/// stage stopped reading early (`yes | head -n 1`); feeding stops there and
/// the remaining input is dropped without an error.
pub(crate) async fn feed(stdin: Option<ChildStdin>, input: Input) -> PipeResult<u64> {
    let Some(mut stdin) = stdin else {
        return Ok(0);
    };

    let mut written = 0u64;
    let result = write_input(&mut stdin, input, &mut written).await;
    drop(stdin);

    match result {
        Ok(()) => {
            debug!(bytes = written, "input fed");
            Ok(written)
        }
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!(bytes = written, "pipeline closed its input early");
            Ok(written)
        }
        Err(e) => Err(PipeError::io(0, "writing input", e)),
    }
}

async fn write_input(stdin: &mut ChildStdin, input: Input, written: &mut u64) -> std::io::Result<()> {
    match input {
        Input::None => {}
        Input::Bytes(bytes) => {
            stdin.write_all(&bytes).await?;
            *written += bytes.len() as u64;
        }
        Input::Chunks(chunks) => {
            for chunk in chunks {
                stdin.write_all(&chunk).await?;
                *written += chunk.len() as u64;
            }
        }
    }
    stdin.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert!(matches!(Input::from("abc"), Input::Bytes(b) if b == b"abc"));
        assert!(matches!(Input::from(vec![1u8, 2]), Input::Bytes(b) if b == [1, 2]));
        assert!(Input::from(None::<String>).is_none());
        assert!(!Input::chunks(Vec::<String>::new()).is_none());
    }

    #[tokio::test]
    async fn test_feed_without_stdin() {
        assert_eq!(feed(None, Input::from("ignored")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_feed_counts_chunks() {
        let pipeline = crate::pipeline!(["cat"]).unwrap();
        let mut chain = crate::process::launch(&pipeline).await.unwrap();
        let stdin = chain.take_stdin();
        let _stdout = chain.take_stdout();

        let written = feed(stdin, Input::chunks(["ab", "cde"])).await.unwrap();
        assert_eq!(written, 5);
        chain.kill_all().await;
    }

    #[tokio::test]
    async fn test_broken_pipe_is_not_an_error() {
        // `true` never reads its input and exits at once
        let pipeline = crate::pipeline!(["true"]).unwrap();
        let mut chain = crate::process::launch(&pipeline).await.unwrap();
        let stdin = chain.take_stdin();
        chain.wait().await.unwrap();

        let payload = vec![b'x'; 1 << 20];
        assert!(feed(stdin, Input::from(payload)).await.is_ok());
    }
}
