// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial line protocol: send `getdata`, read one JSON line
//!
//! Microcontroller firmware replies with a JSON array of samples, sometimes
//! single-quoted, and may interleave `//` debug lines which are skipped.

use super::ProbeError;
use hearth_core::ReadingSample;
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

const BAUD_RATE: u32 = 9600;
const IO_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_SKIPPED_LINES: usize = 16;

pub(super) fn exchange(address: &str) -> Result<Vec<ReadingSample>, ProbeError> {
    let mut port = serialport::new(address, BAUD_RATE)
        .timeout(IO_TIMEOUT)
        .open()
        .map_err(|e| ProbeError::Serial(e.to_string()))?;

    port.clear(serialport::ClearBuffer::Input)
        .map_err(|e| ProbeError::Serial(e.to_string()))?;
    port.write_all(b"getdata\n")
        .map_err(|e| ProbeError::Serial(e.to_string()))?;

    let mut reader = BufReader::new(port);
    for _ in 0..MAX_SKIPPED_LINES {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| ProbeError::Serial(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        // some firmware single-quotes its JSON
        return Ok(serde_json::from_str(&line.replace('\'', "\""))?);
    }
    Err(ProbeError::Serial(format!(
        "no data line from {address} within {MAX_SKIPPED_LINES} lines"
    )))
}
