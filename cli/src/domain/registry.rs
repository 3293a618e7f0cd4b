//! The app registry: every deployable app plus the set of known hosts.
//!
//! Pure validation and lookup. Reading the registry file lives in
//! `crate::infra::registry`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::app::AppDescriptor;
use crate::domain::error::{AppError, ConfigError};

#[allow(clippy::expect_used)] // compile-time constant pattern
static APP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z][a-z0-9_]*$").expect("valid regex"));

/// On-disk shape of the registry file.
///
/// ```yaml
/// hosts: [h1, h2]
/// apps:
///   demo:
///     port: 6080
///     domain: demo.example.org
///     test: h1
///     production: h2
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub hosts: BTreeSet<String>,
    #[serde(default)]
    pub apps: BTreeMap<String, AppDescriptor>,
}

/// Validated, immutable registry of app descriptors.
#[derive(Debug, Clone)]
pub struct AppRegistry {
    hosts: BTreeSet<String>,
    apps: BTreeMap<String, AppDescriptor>,
}

impl AppRegistry {
    /// Build a registry, rejecting it as a whole if any invariant is broken.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` listing every duplicate port, unknown
    /// host reference, and malformed app name.
    pub fn from_file(file: RegistryFile) -> Result<Self, ConfigError> {
        let issues = issues(&file);
        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }
        Ok(Self::unchecked(file))
    }

    fn unchecked(file: RegistryFile) -> Self {
        let apps = file
            .apps
            .into_iter()
            .map(|(name, mut app)| {
                app.name.clone_from(&name);
                (name, app)
            })
            .collect();
        Self {
            hosts: file.hosts,
            apps,
        }
    }

    /// Look up an app by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no app has that name.
    pub fn resolve(&self, name: &str) -> Result<&AppDescriptor, AppError> {
        self.apps.get(name).ok_or_else(|| AppError::NotFound {
            name: name.to_string(),
            known: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    /// App names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    /// All apps in name order.
    pub fn apps(&self) -> impl Iterator<Item = &AppDescriptor> {
        self.apps.values()
    }

    #[must_use]
    pub fn is_known_host(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Every invariant violation in `file`, in app-name order.
///
/// Ports are checked in name order, so the error names the later app and
/// the earlier one it collides with.
#[must_use]
pub fn issues(file: &RegistryFile) -> Vec<ConfigError> {
    let mut found = Vec::new();
    let mut ports: BTreeMap<u16, &str> = BTreeMap::new();

    for (name, app) in &file.apps {
        if !APP_NAME.is_match(name) {
            found.push(ConfigError::InvalidName(name.clone()));
        }
        if let Some(other) = ports.get(&app.port) {
            found.push(ConfigError::DuplicatePort {
                app: name.clone(),
                port: app.port,
                other: (*other).to_string(),
            });
        } else {
            ports.insert(app.port, name);
        }
        for (environment, host) in [("test", &app.test), ("production", &app.production)] {
            if !file.hosts.contains(host) {
                found.push(ConfigError::UnknownHost {
                    app: name.clone(),
                    environment: environment.to_string(),
                    host: host.clone(),
                });
            }
        }
    }
    found
}

/// Result of `check`: hard errors plus advisory warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub apps: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Audit `file` without rejecting it. `has_config_dir` tells whether an
/// app's per-app configuration directory exists; a missing one is a warning.
#[must_use]
pub fn check(file: &RegistryFile, has_config_dir: impl Fn(&str) -> bool) -> CheckReport {
    CheckReport {
        apps: file.apps.len(),
        errors: issues(file).iter().map(ToString::to_string).collect(),
        warnings: file
            .apps
            .keys()
            .filter(|name| !has_config_dir(name))
            .map(|name| format!("{name}: missing config dir"))
            .collect(),
    }
}
