// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Threshold rules evaluated against incoming readings

use crate::timeseries::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from parsing an alert rule expression
#[derive(Debug, Error, PartialEq)]
pub enum AlertRuleError {
    #[error("empty rule for '{0}'")]
    Empty(String),
    #[error("invalid threshold in rule '{0}': {1}")]
    Threshold(String, String),
}

/// Comparison operator of a threshold rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Greater,
    Less,
    Equal,
}

/// A rule matching a subchannel by name or prefix against a threshold
///
/// The key side is a subchannel name, or a prefix when it starts with `*`
/// (`*Temp` matches `Temperature`). The expression side is an optional
/// operator (`>`, `<`, `=`; default `>`) followed by a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub pattern: String,
    pub prefix: bool,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl AlertRule {
    pub fn parse(key: &str, expr: &str) -> Result<Self, AlertRuleError> {
        let (pattern, prefix) = match key.strip_prefix('*') {
            Some(rest) => (rest.to_string(), true),
            None => (key.to_string(), false),
        };

        let expr = expr.trim();
        if expr.is_empty() {
            return Err(AlertRuleError::Empty(key.to_string()));
        }
        let (comparison, number) = if let Some(rest) = expr.strip_prefix('>') {
            (Comparison::Greater, rest)
        } else if let Some(rest) = expr.strip_prefix('<') {
            (Comparison::Less, rest)
        } else if let Some(rest) = expr.strip_prefix('=') {
            (Comparison::Equal, rest)
        } else {
            (Comparison::Greater, expr)
        };
        let threshold = number
            .trim()
            .parse()
            .map_err(|e: std::num::ParseFloatError| {
                AlertRuleError::Threshold(key.to_string(), e.to_string())
            })?;

        Ok(Self {
            pattern,
            prefix,
            comparison,
            threshold,
        })
    }

    pub fn matches_name(&self, name: &str) -> bool {
        if self.prefix {
            name.starts_with(&self.pattern)
        } else {
            name == self.pattern
        }
    }

    pub fn exceeded(&self, value: Value) -> bool {
        let value = value.as_f64();
        match self.comparison {
            Comparison::Greater => value > self.threshold,
            Comparison::Less => value < self.threshold,
            Comparison::Equal => value == self.threshold,
        }
    }
}

/// Evaluate rules against one reading bucket, returning a human-readable
/// fragment per violated rule
pub fn violations(rules: &[AlertRule], bucket: &BTreeMap<String, Value>) -> Vec<String> {
    let mut found = Vec::new();
    for (name, value) in bucket {
        for rule in rules.iter().filter(|r| r.matches_name(name)) {
            if rule.exceeded(*value) {
                let op = match rule.comparison {
                    Comparison::Greater => '>',
                    Comparison::Less => '<',
                    Comparison::Equal => '=',
                };
                found.push(format!("{name} {} ({op} {})", value.as_f64(), rule.threshold));
            }
        }
    }
    found
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
