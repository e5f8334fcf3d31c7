// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Process chain launcher
//!
//! Spawns one child per stage. The stdout pipe of each stage is handed
//! straight to the next stage as its stdin, so bytes move between stages
//! through the kernel without passing through this process. Only the head's
//! stdin and the tail's stdout stay with the caller.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use super::status::PipelineExitStatus;
use crate::errors::{PipeError, PipeResult};
use crate::pipeline::Pipeline;

/// How long an abandoned chain gets to exit on its own before it is killed
pub(crate) const REAP_GRACE: Duration = Duration::from_millis(100);

/// A running chain of processes
///
/// Owns every child handle plus the two boundary pipe ends. Children are
/// spawned with kill-on-drop, so dropping a chain without reaping it kills
/// whatever is still running.
#[derive(Debug)]
pub struct Chain {
    children: Vec<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

/// Spawn every stage of `pipeline`, wiring stdout(i) to stdin(i + 1)
///
/// Stderr of every stage is inherited. If a stage fails to spawn, the stages
/// already running are killed and reaped before the error is returned.
pub async fn launch(pipeline: &Pipeline) -> PipeResult<Chain> {
    let mut children: Vec<Child> = Vec::with_capacity(pipeline.len());
    let mut head_stdin = None;
    let mut upstream: Option<ChildStdout> = None;

    for (index, spec) in pipeline.stages().iter().enumerate() {
        let stdin: Stdio = match upstream.take() {
            Some(stdout) => match stdout.try_into() {
                Ok(stdio) => stdio,
                Err(source) => {
                    kill_children(&mut children).await;
                    return Err(PipeError::io(index, "connecting to the previous stage", source));
                }
            },
            None => Stdio::piped(),
        };

        let mut command = Command::new(spec.program());
        command
            .args(spec.args())
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                debug!(stage = index, program = spec.program(), error = %source, "spawn failed");
                kill_children(&mut children).await;
                return Err(PipeError::spawn_failed(index, spec.program(), source));
            }
        };

        debug!(stage = index, program = spec.program(), pid = ?child.id(), "spawned stage");

        if index == 0 {
            head_stdin = child.stdin.take();
        }
        upstream = child.stdout.take();
        children.push(child);
    }

    Ok(Chain {
        children,
        stdin: head_stdin,
        stdout: upstream,
    })
}

impl Chain {
    /// Number of stages in the chain
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the chain has no stages
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Take the write end feeding the head stage
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Take the read end draining the tail stage
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Close both boundary pipe ends still held by the chain
    pub fn close_pipes(&mut self) {
        self.stdin = None;
        self.stdout = None;
    }

    /// Wait for every stage to exit, in stage order
    pub async fn wait(&mut self) -> PipeResult<PipelineExitStatus> {
        self.close_pipes();

        let mut statuses = Vec::with_capacity(self.children.len());
        for (index, child) in self.children.iter_mut().enumerate() {
            let status = child
                .wait()
                .await
                .map_err(|e| PipeError::io(index, "waiting for the process", e))?;
            debug!(stage = index, %status, "stage exited");
            statuses.push(status);
        }

        Ok(PipelineExitStatus::new(statuses))
    }

    /// Force-terminate and reap every stage
    pub async fn kill_all(&mut self) {
        self.close_pipes();
        kill_children(&mut self.children).await;
    }

    /// Give the stages a short grace period to exit, then kill stragglers
    pub(crate) async fn reap(mut self, grace: Duration) {
        self.close_pipes();
        let deadline = tokio::time::Instant::now() + grace;

        for (index, child) in self.children.iter_mut().enumerate() {
            if tokio::time::timeout_at(deadline, child.wait()).await.is_err() {
                debug!(stage = index, "stage still running after grace period, killing");
                if let Err(e) = child.kill().await {
                    warn!(stage = index, error = %e, "failed to kill stage");
                }
            }
        }
    }

    /// Reap the chain on a background task
    ///
    /// Used when the owner is dropped before the chain completed. Without a
    /// runtime the children are killed on drop and left to tokio's orphan
    /// reaper.
    pub(crate) fn reap_in_background(self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.reap(REAP_GRACE));
            }
            Err(_) => {
                debug!("no runtime available, dropping chain");
            }
        }
    }
}

async fn kill_children(children: &mut [Child]) {
    for (index, child) in children.iter_mut().enumerate() {
        if let Ok(Some(_)) = child.try_wait() {
            continue;
        }
        // kill() also waits, so the child is reaped here
        if let Err(e) = child.kill().await {
            warn!(stage = index, error = %e, "failed to kill stage");
        }
    }
}
