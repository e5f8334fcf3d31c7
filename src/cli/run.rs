// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Run command - execute a pipeline and print its output

use miette::Result;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{load_pipeline, RunArgs};
use crate::pipeline::{parse_delimiter, CallOptions, CallOutcome};
use crate::process::{Input, PipelineExitStatus};
use crate::utils;

/// Run the pipeline, returning the exit code of its last stage
pub async fn run(args: RunArgs, verbose: bool) -> Result<i32> {
    let (pipeline, defaults) = load_pipeline(&args.source)?;

    let options = CallOptions {
        delimiter: args.delimiter.as_deref().map(parse_delimiter).transpose()?,
        capacity: args.capacity,
        timeout: args.timeout_ms.map(Duration::from_millis),
    }
    .or(defaults);

    let input = if args.stdin {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .map_err(|e| miette::miette!("Failed to read stdin: {}", e))?;
        Input::Bytes(buf)
    } else {
        Input::None
    };

    if verbose {
        utils::print_info(&pipeline.to_string());
    }

    let mut stdout = tokio::io::stdout();
    let outcome = pipeline.call().input(input).options(options).run().await?;

    let status = match outcome {
        CallOutcome::Captured(output) => {
            stdout
                .write_all(&output.stdout)
                .await
                .map_err(|e| miette::miette!("Failed to write output: {}", e))?;
            output.status
        }
        CallOutcome::Streaming(mut records) => {
            while let Some(record) = records.next_bytes().await {
                let mut line = record?;
                line.push(b'\n');
                stdout
                    .write_all(&line)
                    .await
                    .map_err(|e| miette::miette!("Failed to write output: {}", e))?;
            }
            records
                .exit_status()
                .cloned()
                .ok_or_else(|| miette::miette!("Pipeline ended without an exit status"))?
        }
    };

    stdout
        .flush()
        .await
        .map_err(|e| miette::miette!("Failed to write output: {}", e))?;

    if verbose {
        utils::print_exit_status(&pipeline, &status);
    }

    Ok(exit_code(&status))
}

/// Exit code a shell would report for the pipeline: the tail's code, or
/// 128 plus the signal number when the tail was killed by a signal
fn exit_code(status: &PipelineExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.stages().last().and_then(|s| s.signal()) {
            return 128 + signal;
        }
    }

    1
}
