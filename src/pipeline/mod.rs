// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Pipeline definitions and invocation
//!
//! This module defines how pipelines are described, validated, loaded from
//! files and called.

mod command;
mod config;
mod definition;
mod invocation;
mod open;
mod options;
mod validation;

pub use command::CommandSpec;
pub use config::{FileFormat, PipelineFile};
pub use definition::Pipeline;
pub use invocation::{Call, CallOutcome};
pub use open::OpenPipeline;
pub use options::{parse_delimiter, CallOptions};
pub use validation::{PipelineValidator, ValidationResult};
