// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Process chains
//!
//! Spawning a chain of OS processes, feeding its head, and draining its
//! tail in buffered or streaming mode.

mod collector;
mod feeder;
mod launcher;
mod status;

pub use collector::{PipelineOutput, RecordStream, StreamBuffer, DEFAULT_CAPACITY};
pub use feeder::Input;
pub use launcher::{launch, Chain};
pub use status::PipelineExitStatus;

pub(crate) use collector::capture;
