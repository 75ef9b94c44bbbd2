// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed automation command references
//!
//! A command names a registered action as `<system>.<action>` plus
//! whitespace-separated arguments. Resolution happens against the runtime's
//! fixed dispatch table; there is no expression evaluation of any kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing or dispatching a command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command must be '<system>.<action> [args...]': '{0}'")]
    Malformed(String),
    #[error("unknown system '{0}'")]
    UnknownSystem(String),
    #[error("unknown action '{0}.{1}'")]
    UnknownAction(String, String),
    #[error("bad argument for '{command}': {reason}")]
    BadArgument { command: String, reason: String },
}

/// A reference to a registered action, e.g. `security.arm`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Command {
    pub system: String,
    pub action: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(system: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            action: action.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let reference = parts.next().ok_or_else(|| CommandError::Malformed(s.to_string()))?;
        let (system, action) = reference
            .split_once('.')
            .ok_or_else(|| CommandError::Malformed(s.to_string()))?;
        if system.is_empty() || action.is_empty() {
            return Err(CommandError::Malformed(s.to_string()));
        }
        Ok(Self {
            system: system.to_string(),
            action: action.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl TryFrom<String> for Command {
    type Error = CommandError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.system, self.action)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
