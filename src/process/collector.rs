// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Output collector
//!
//! Drains the tail stage either to completion ([`capture`]) or record by
//! record ([`RecordStream`]). Both run concurrently with the input feeder,
//! otherwise a payload larger than the pipe buffers would stall the chain.

use std::time::Duration;

use futures::Stream;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::feeder::{spawn_feeder, Input};
use super::launcher::Chain;
use super::status::PipelineExitStatus;
use crate::errors::{PipeError, PipeResult};

/// Read chunk size used when none is configured
pub const DEFAULT_CAPACITY: usize = 4096;

/// Full output of a buffered call
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Everything the tail stage wrote to stdout
    pub stdout: Vec<u8>,
    /// Exit status of every stage
    pub status: PipelineExitStatus,
}

impl PipelineOutput {
    /// Output decoded as UTF-8
    pub fn text(&self) -> PipeResult<String> {
        String::from_utf8(self.stdout.clone()).map_err(|source| PipeError::InvalidUtf8 { source })
    }

    /// Output decoded as UTF-8, replacing invalid sequences
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Consume the output, keeping only the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.stdout
    }
}

/// Run `chain` to completion, feeding `input` and capturing all output
///
/// On any failure the whole chain is killed and reaped and partial output
/// is discarded.
pub(crate) async fn capture(
    mut chain: Chain,
    input: Input,
    timeout: Option<Duration>,
) -> PipeResult<PipelineOutput> {
    let stdout = chain.take_stdout();
    let mut feeder = spawn_feeder(chain.take_stdin(), input);
    let tail = chain.len().saturating_sub(1);

    let drained = with_deadline(timeout.map(|t| Instant::now() + t), timeout, async {
        let mut buf = Vec::new();
        if let Some(mut stdout) = stdout {
            stdout
                .read_to_end(&mut buf)
                .await
                .map_err(|e| PipeError::io(tail, "reading output", e))?;
        }
        join_feeder(&mut feeder).await?;
        let status = chain.wait().await?;
        Ok(PipelineOutput { stdout: buf, status })
    })
    .await;

    match drained {
        Ok(output) => {
            debug!(bytes = output.stdout.len(), status = %output.status, "pipeline completed");
            Ok(output)
        }
        Err(e) => {
            debug!(error = %e, "pipeline failed, killing chain");
            feeder.abort();
            chain.kill_all().await;
            Err(e)
        }
    }
}

async fn join_feeder(feeder: &mut JoinHandle<PipeResult<u64>>) -> PipeResult<u64> {
    match feeder.await {
        Ok(result) => result,
        Err(e) => Err(PipeError::io(
            0,
            "feeding input",
            std::io::Error::new(std::io::ErrorKind::Other, e),
        )),
    }
}

async fn with_deadline<T, F>(deadline: Option<Instant>, timeout: Option<Duration>, fut: F) -> PipeResult<T>
where
    F: std::future::Future<Output = PipeResult<T>>,
{
    match (deadline, timeout) {
        (Some(deadline), Some(after)) => tokio::time::timeout_at(deadline, fut)
            .await
            .unwrap_or(Err(PipeError::Timeout { after })),
        _ => fut.await,
    }
}

/// Bounded read buffer that splits bytes into delimited records
///
/// Reads land in a buffer of `capacity` bytes. Consumed records are
/// compacted away before the buffer is allowed to grow, and it only grows
/// (doubling) when a single pending record no longer fits.
#[derive(Debug)]
pub struct StreamBuffer {
    data: Vec<u8>,
    start: usize,
    end: usize,
    // bytes in start..scanned hold no delimiter
    scanned: usize,
    chunk: usize,
    delimiter: u8,
}

impl StreamBuffer {
    /// Create a buffer reading at most `capacity` bytes at a time
    pub fn new(delimiter: u8, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0; capacity],
            start: 0,
            end: 0,
            scanned: 0,
            chunk: capacity,
            delimiter,
        }
    }

    /// Pop the next complete record, without its delimiter
    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        let from = self.scanned.max(self.start);
        match self.data[from..self.end].iter().position(|&b| b == self.delimiter) {
            Some(offset) => {
                let at = from + offset;
                let record = self.data[self.start..at].to_vec();
                self.start = at + 1;
                self.scanned = self.start;
                if self.start == self.end {
                    self.start = 0;
                    self.end = 0;
                    self.scanned = 0;
                }
                Some(record)
            }
            None => {
                self.scanned = self.end;
                None
            }
        }
    }

    /// Space for the next read, at most one chunk long
    pub fn writable(&mut self) -> &mut [u8] {
        if self.end == self.data.len() {
            if self.start > 0 {
                self.data.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.scanned -= self.start;
                self.start = 0;
            } else {
                let grown = self.data.len() * 2;
                self.data.resize(grown, 0);
            }
        }
        let limit = (self.end + self.chunk).min(self.data.len());
        &mut self.data[self.end..limit]
    }

    /// Mark `n` bytes of [`writable`](Self::writable) as filled
    pub fn commit(&mut self, n: usize) {
        self.end += n;
    }

    /// Take whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.start == self.end {
            return None;
        }
        let rest = self.data[self.start..self.end].to_vec();
        self.start = 0;
        self.end = 0;
        self.scanned = 0;
        Some(rest)
    }

    /// Bytes buffered but not yet returned
    pub fn pending(&self) -> usize {
        self.end - self.start
    }

    /// Current allocation size
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

/// Lazy sequence of delimited records read from the tail stage
///
/// Single pass: once exhausted it stays exhausted, and a new call on the
/// pipeline starts a fresh chain. Dropping the stream early closes the read
/// end, so upstream stages see a broken pipe, and reaps every child in the
/// background.
#[derive(Debug)]
pub struct RecordStream {
    reader: Option<ChildStdout>,
    buffer: StreamBuffer,
    chain: Option<Chain>,
    feeder: Option<JoinHandle<PipeResult<u64>>>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    status: Option<PipelineExitStatus>,
    // error held back until the final record has been yielded
    failure: Option<PipeError>,
    tail: usize,
}

impl RecordStream {
    pub(crate) fn start(
        mut chain: Chain,
        input: Input,
        delimiter: u8,
        capacity: usize,
        timeout: Option<Duration>,
    ) -> Self {
        let reader = chain.take_stdout();
        let feeder = spawn_feeder(chain.take_stdin(), input);
        let tail = chain.len().saturating_sub(1);

        Self {
            reader,
            buffer: StreamBuffer::new(delimiter, capacity),
            chain: Some(chain),
            feeder: Some(feeder),
            deadline: timeout.map(|t| Instant::now() + t),
            timeout,
            status: None,
            failure: None,
            tail,
        }
    }

    /// Next record as raw bytes, or `None` once the output is exhausted
    ///
    /// A timeout or read failure kills and reaps every stage before the
    /// error is returned. If waiting for the chain fails after the last
    /// partial record was read, that record is yielded first and the error
    /// on the following call.
    pub async fn next_bytes(&mut self) -> Option<PipeResult<Vec<u8>>> {
        loop {
            if let Some(record) = self.buffer.next_record() {
                return Some(Ok(record));
            }
            if let Some(e) = self.failure.take() {
                return Some(Err(e));
            }
            if self.reader.is_none() {
                return None;
            }

            match self.read_chunk().await {
                Ok(0) => {
                    self.reader = None;
                    let rest = self.buffer.finish();
                    if let Err(e) = self.complete().await {
                        match rest {
                            Some(record) => {
                                self.failure = Some(e);
                                return Some(Ok(record));
                            }
                            None => return Some(Err(e)),
                        }
                    }
                    return rest.map(Ok);
                }
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "record stream failed, killing chain");
                    self.terminate().await;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Next record decoded as UTF-8
    pub async fn next_record(&mut self) -> Option<PipeResult<String>> {
        let record = match self.next_bytes().await? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        Some(String::from_utf8(record).map_err(|source| PipeError::InvalidUtf8 { source }))
    }

    /// Drain the remaining records into a vector
    pub async fn collect_records(mut self) -> PipeResult<Vec<String>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// Adapt into a [`futures::Stream`] of decoded records
    pub fn into_stream(self) -> impl Stream<Item = PipeResult<String>> + Send {
        futures::stream::unfold(self, |mut records| async move {
            records.next_record().await.map(|record| (record, records))
        })
    }

    /// Exit status of the chain, available once the stream is exhausted
    pub fn exit_status(&self) -> Option<&PipelineExitStatus> {
        self.status.as_ref()
    }

    async fn read_chunk(&mut self) -> PipeResult<usize> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(0);
        };
        let tail = self.tail;
        let buf = self.buffer.writable();
        let read = async {
            reader
                .read(buf)
                .await
                .map_err(|e| PipeError::io(tail, "reading output", e))
        };

        let n = with_deadline(self.deadline, self.timeout, read).await?;
        self.buffer.commit(n);
        Ok(n)
    }

    async fn complete(&mut self) -> PipeResult<()> {
        let deadline = self.deadline;
        let timeout = self.timeout;
        let Some(mut chain) = self.chain.take() else {
            return Ok(());
        };
        let mut feeder = self.feeder.take();

        let finished = with_deadline(deadline, timeout, async {
            if let Some(feeder) = feeder.as_mut() {
                join_feeder(feeder).await?;
            }
            chain.wait().await
        })
        .await;

        match finished {
            Ok(status) => {
                debug!(status = %status, "record stream completed");
                self.status = Some(status);
                Ok(())
            }
            Err(e) => {
                if let Some(feeder) = feeder {
                    feeder.abort();
                }
                chain.kill_all().await;
                Err(e)
            }
        }
    }

    async fn terminate(&mut self) {
        self.reader = None;
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        if let Some(mut chain) = self.chain.take() {
            chain.kill_all().await;
        }
    }

    fn abandon(&mut self) {
        self.reader = None;
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        if let Some(chain) = self.chain.take() {
            chain.reap_in_background();
        }
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        if self.chain.is_some() {
            debug!("record stream dropped before completion");
        }
        self.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &[u8], delimiter: u8, capacity: usize, read_size: usize) -> Vec<Vec<u8>> {
        let mut buffer = StreamBuffer::new(delimiter, capacity);
        let mut records = Vec::new();
        let mut rest = input;

        while !rest.is_empty() {
            let space = buffer.writable();
            let n = space.len().min(read_size).min(rest.len());
            space[..n].copy_from_slice(&rest[..n]);
            buffer.commit(n);
            rest = &rest[n..];
            while let Some(record) = buffer.next_record() {
                records.push(record);
            }
        }
        records.extend(buffer.finish());
        records
    }

    #[test]
    fn test_records_spanning_chunks() {
        let records = split(b"alpha\nbeta\ngamma\n", b'\n', 4, 4);
        assert_eq!(records, vec![b"alpha".to_vec(), b"beta".to_vec(), b"gamma".to_vec()]);
    }

    #[test]
    fn test_trailing_partial_record() {
        let records = split(b"a,b,c", b',', 16, 16);
        assert_eq!(records, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_consecutive_delimiters_yield_empty_records() {
        let records = split(b"a\n\nb\n", b'\n', 8, 8);
        assert_eq!(records, vec![b"a".to_vec(), Vec::new(), b"b".to_vec()]);
    }

    #[test]
    fn test_record_larger_than_capacity_grows_buffer() {
        let long = vec![b'x'; 50];
        let mut input = long.clone();
        input.extend_from_slice(b"\nshort\n");

        let mut buffer = StreamBuffer::new(b'\n', 8);
        let mut rest = &input[..];
        let mut records = Vec::new();
        while !rest.is_empty() {
            let space = buffer.writable();
            assert!(space.len() <= 8);
            let n = space.len().min(rest.len());
            space[..n].copy_from_slice(&rest[..n]);
            buffer.commit(n);
            rest = &rest[n..];
            while let Some(record) = buffer.next_record() {
                records.push(record);
            }
        }

        assert_eq!(records, vec![long, b"short".to_vec()]);
        assert!(buffer.capacity() >= 50);
    }

    #[test]
    fn test_buffer_compacts_before_growing() {
        let mut buffer = StreamBuffer::new(b'\n', 4);
        buffer.writable()[..4].copy_from_slice(b"ab\nc");
        buffer.commit(4);
        assert_eq!(buffer.next_record(), Some(b"ab".to_vec()));
        assert_eq!(buffer.next_record(), None);

        // "c" is shifted to the front instead of doubling the allocation
        let space = buffer.writable();
        assert_eq!(space.len(), 3);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.pending(), 1);
    }

    #[test]
    fn test_trailing_delimiter_has_no_empty_tail() {
        let records = split(b"1\n2\n", b'\n', 2, 1);
        assert_eq!(records, vec![b"1".to_vec(), b"2".to_vec()]);
    }
}
