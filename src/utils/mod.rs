// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Utility modules
//!
//! Common utilities for the pipelay CLI.

pub mod colors;

pub use colors::*;
