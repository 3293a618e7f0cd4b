//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Registry errors ───────────────────────────────────────────────────────────

/// Problems with the static app registry. Fatal at load time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{app}: duplicate port {port} (already used by '{other}')")]
    DuplicatePort { app: String, port: u16, other: String },

    #[error("{app}: invalid {environment} server: {host}")]
    UnknownHost {
        app: String,
        environment: String,
        host: String,
    },

    #[error("invalid app name '{0}': must match ^[a-z][a-z0-9_]*$")]
    InvalidName(String),

    #[error("cannot parse registry {path}: {message}")]
    Parse { path: String, message: String },

    #[error("registry is invalid:\n  {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  "))]
    Invalid(Vec<ConfigError>),
}

// ── App errors ────────────────────────────────────────────────────────────────

/// Errors resolving an app by name.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("App '{name}' not found in registry. Known apps: {known}")]
    NotFound { name: String, known: String },
}

// ── Environment errors ────────────────────────────────────────────────────────

/// Errors selecting a deployment environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("invalid environment '{0}': expected 'test' or 'production'")]
    Invalid(String),

    #[error("no host configured for {app} ({environment})")]
    NoHost { app: String, environment: String },
}

// ── Platform errors ───────────────────────────────────────────────────────────

/// The target host runs something the deploy procedure does not support.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("unsupported platform: distribution '{0}' (expected Ubuntu)")]
    UnsupportedDistribution(String),

    #[error("unsupported platform: release codename '{0}'")]
    UnsupportedRelease(String),
}

// ── Remote errors ─────────────────────────────────────────────────────────────

/// A remote command exited non-zero.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("[{host}] command failed (exit {code}): {command}\n{stderr}")]
    CommandFailed {
        host: String,
        command: String,
        code: i32,
        stderr: String,
    },
}

// ── Health check errors ───────────────────────────────────────────────────────

/// The restarted app did not answer its health check with `{"status": "ok"}`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HealthCheckError {
    #[error("health check returned malformed response: {raw}")]
    Malformed { raw: String },

    #[error("health check returned status '{status}': {raw}")]
    NotOk { status: String, raw: String },
}
