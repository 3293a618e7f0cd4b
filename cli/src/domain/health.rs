//! Health check domain types and pure parsing functions.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use serde::Deserialize;

use crate::domain::error::HealthCheckError;

/// Path every app serves its liveness probe on.
pub const PING_PATH: &str = "/_ping";

#[derive(Debug, Deserialize)]
struct PingResponse {
    status: String,
}

/// Shell command issued on the host to probe the app on `port`.
#[must_use]
pub fn ping_command(port: u16) -> String {
    format!("curl -s http://localhost:{port}{PING_PATH}")
}

/// Check a `_ping` response body.
///
/// # Errors
///
/// `Malformed` if the body is not a JSON object with a string `status`,
/// `NotOk` if the status is anything but `"ok"`. Both carry the raw body.
pub fn check_ping(body: &str) -> Result<(), HealthCheckError> {
    let raw = body.trim();
    let parsed: PingResponse =
        serde_json::from_str(raw).map_err(|_| HealthCheckError::Malformed {
            raw: raw.to_string(),
        })?;
    if parsed.status == "ok" {
        Ok(())
    } else {
        Err(HealthCheckError::NotOk {
            status: parsed.status,
            raw: raw.to_string(),
        })
    }
}
