// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push sensor readings on behalf of a device

use anyhow::Result;
use hearth_core::{ReadingSample, Value};

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct PushArgs {
    /// Device push token
    pub token: String,

    /// Readings as name=value (value is a number, or true/false)
    #[arg(required = true, value_parser = parse_reading)]
    pub readings: Vec<ReadingSample>,
}

pub async fn handle(client: &DaemonClient, args: PushArgs) -> Result<()> {
    let changed = client.push(&args.token, args.readings).await?;
    if changed {
        println!("Accepted");
    } else {
        println!("Accepted (no new data)");
    }
    Ok(())
}

fn parse_reading(s: &str) -> Result<ReadingSample, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value: '{}'", s))?;
    if name.is_empty() {
        return Err(format!("reading name is empty: '{}'", s));
    }
    let value = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::Number(
            other
                .parse::<f64>()
                .map_err(|_| format!("value must be a number or true/false: '{}'", other))?,
        ),
    };
    Ok(ReadingSample::new(name, value))
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
