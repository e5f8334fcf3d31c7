// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! # pipelay - Lay Unix pipes
//!
//! `pipelay` runs chains of external processes connected by OS pipes, the
//! way a shell runs `a | b | c`, but under explicit programmatic control.
//!
//! ## Features
//!
//! - **Kernel pipes between stages** - stdout of each stage is wired
//!   straight into the next stage's stdin
//! - **Concurrent feed and drain** - large payloads never deadlock the chain
//! - **Buffered or streaming output** - capture everything, or read
//!   delimited records lazily through a bounded buffer
//! - **Shell-like exit semantics** - early readers do not turn into
//!   broken-pipe errors; every stage's status stays available
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn demo() -> pipelay::PipeResult<()> {
//! let upper = pipelay::pipeline!(["sed", "s/a/A/"], ["sed", "s/b/B/g"])?;
//! let output = upper.run_with("abc\n").await?;
//! assert_eq!(output.text()?, "ABc\n");
//!
//! let mut records = pipelay::pipeline!(["seq", "5000"])?
//!     .call()
//!     .delimiter(b'\n')
//!     .capacity(15)
//!     .stream()
//!     .await?;
//! while let Some(record) = records.next_record().await {
//!     println!("{}", record?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod errors;
pub mod pipeline;
pub mod process;
pub mod utils;

// Re-export commonly used types
pub use errors::{PipeError, PipeResult};
pub use pipeline::{Call, CallOptions, CallOutcome, CommandSpec, OpenPipeline, Pipeline, PipelineFile};
pub use process::{Input, PipelineExitStatus, PipelineOutput, RecordStream};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
