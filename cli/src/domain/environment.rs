//! Deployment environments and host binding.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::app::AppDescriptor;
use crate::domain::error::EnvironmentError;

/// Worker ceiling applied when deploying to `test`.
pub const TEST_WORKER_CEILING: u32 = 3;

/// Logical deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// The host alias `app` is deployed to in this environment.
    #[must_use]
    pub fn host_of(self, app: &AppDescriptor) -> &str {
        match self {
            Self::Test => &app.test,
            Self::Production => &app.production,
        }
    }

    /// Upper bound for the worker count, if any.
    #[must_use]
    pub fn worker_ceiling(self) -> Option<u32> {
        match self {
            Self::Test => Some(TEST_WORKER_CEILING),
            Self::Production => None,
        }
    }

    /// Whether monitoring hooks are switched on in rendered configs.
    #[must_use]
    pub fn monitor_mode(self) -> bool {
        self == Self::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            other => Err(EnvironmentError::Invalid(other.to_string())),
        }
    }
}

/// Resolve the hosts a task runs on.
///
/// A non-empty `pinned` list (explicit `--hosts` override) wins; otherwise
/// the app's host for `environment` is used.
///
/// # Errors
///
/// Returns `EnvironmentError::NoHost` if neither source yields a host.
pub fn bind(
    app: &AppDescriptor,
    environment: Environment,
    pinned: &[String],
) -> Result<Vec<String>, EnvironmentError> {
    if !pinned.is_empty() {
        return Ok(pinned.to_vec());
    }
    let host = environment.host_of(app);
    if host.is_empty() {
        return Err(EnvironmentError::NoHost {
            app: app.name.clone(),
            environment: environment.to_string(),
        });
    }
    Ok(vec![host.to_string()])
}

/// Apply the environment's worker ceiling, returning a derived descriptor.
#[must_use]
pub fn limit_resources(app: &AppDescriptor, environment: Environment) -> AppDescriptor {
    match environment.worker_ceiling() {
        Some(ceiling) if app.workers > ceiling => app.with_workers(ceiling),
        _ => app.clone(),
    }
}
