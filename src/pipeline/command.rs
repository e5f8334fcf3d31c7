// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipelay contributors

//! Command descriptions
//!
//! A [`CommandSpec`] is one stage of a pipeline: the program to execute
//! followed by its arguments, each passed to the process verbatim.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::errors::{PipeError, PipeResult};

/// A validated command: program plus arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandSpec {
    tokens: Vec<String>,
}

impl CommandSpec {
    /// Build a command from its tokens
    ///
    /// The first token is the program. Empty arguments are kept as-is;
    /// an empty token list, an empty program name, or a token containing a
    /// NUL byte is rejected.
    pub fn new<I, S>(tokens: I) -> PipeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();

        let Some(program) = tokens.first() else {
            return Err(invalid("command has no program"));
        };
        if program.is_empty() {
            return Err(invalid("program name is empty"));
        }
        if let Some(index) = tokens.iter().position(|t| t.contains('\0')) {
            return Err(invalid(&format!("element {} contains a NUL byte", index)));
        }

        Ok(Self { tokens })
    }

    /// Validate an untyped command description
    ///
    /// Accepts only an array of strings. `null`, scalars, objects, and arrays
    /// holding anything other than strings are rejected.
    pub fn from_value(value: &Value) -> PipeResult<Self> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(invalid(&format!(
                    "expected a list of strings, found {}",
                    kind_of(other)
                )))
            }
        };

        let mut tokens = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => tokens.push(s.clone()),
                other => {
                    return Err(invalid(&format!(
                        "element {} is {}, all exec args must be strings",
                        index,
                        kind_of(other)
                    )))
                }
            }
        }

        Self::new(tokens)
    }

    /// Program name (first token)
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Arguments after the program
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// All tokens, program first
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl TryFrom<&Value> for CommandSpec {
    type Error = PipeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if needs_quotes(token) {
                write!(f, "'{}'", token)?;
            } else {
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

fn needs_quotes(token: &str) -> bool {
    token.is_empty() || token.contains([' ', '\t', '\n', '\r'])
}

fn invalid(reason: &str) -> PipeError {
    PipeError::InvalidCommandSpec {
        stage: 0,
        reason: reason.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
