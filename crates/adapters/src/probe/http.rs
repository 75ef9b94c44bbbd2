// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP pull: WiFi sensors expose their readings at `http://{addr}/data`

use super::ProbeError;
use hearth_core::ReadingSample;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const OVERALL_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) fn fetch(address: &str) -> Result<Vec<ReadingSample>, ProbeError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_global(Some(OVERALL_TIMEOUT))
        .build()
        .into();

    let url = format!("http://{address}/data");
    tracing::debug!(%url, "fetching sensor data");

    let mut response = agent
        .get(&url)
        .call()
        .map_err(|e| ProbeError::Http(e.to_string()))?;
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ProbeError::Http(e.to_string()))?;

    Ok(serde_json::from_str(&body)?)
}
