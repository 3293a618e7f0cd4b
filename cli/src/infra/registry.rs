//! Loading the app registry from a YAML file on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::error::ConfigError;
use crate::domain::registry::{AppRegistry, RegistryFile};

/// Env var overriding the registry location.
pub const REGISTRY_ENV: &str = "APPCONFIG_REGISTRY";

/// Env var naming the app when `--app` is absent.
pub const APP_ENV: &str = "APPCONFIG_APP";

const REGISTRY_FILE: &str = "apps.yaml";

/// Where to read the registry from.
///
/// `--registry` wins, then `APPCONFIG_REGISTRY`, then `./apps.yaml` if it
/// exists, then `~/.appconfig/apps.yaml`.
///
/// # Errors
///
/// Returns an error if no explicit path is given and the home directory
/// cannot be determined.
pub fn registry_path(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Ok(val) = std::env::var(REGISTRY_ENV) {
        return Ok(PathBuf::from(val));
    }
    let local = PathBuf::from(REGISTRY_FILE);
    if local.is_file() {
        return Ok(local);
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".appconfig").join(REGISTRY_FILE))
}

/// The app to operate on: `--app`, then `APPCONFIG_APP`, then the name of
/// the current directory.
///
/// # Errors
///
/// Returns an error if the current directory has no usable name.
pub fn app_name(flag: Option<&str>) -> Result<String> {
    if let Some(name) = flag {
        return Ok(name.to_string());
    }
    match std::env::var(APP_ENV) {
        Ok(name) if !name.is_empty() => return Ok(name),
        _ => {}
    }
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    cwd.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("cannot infer app name from {}; use --app", cwd.display()))
}

/// Read and parse the registry without validating it.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or `ConfigError::Parse` if
/// it is not a valid registry document.
pub fn read_registry_file(path: &Path) -> Result<RegistryFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).map_err(|e| {
        ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Read, parse and validate the registry.
///
/// # Errors
///
/// Returns an error if reading or parsing fails, or `ConfigError::Invalid`
/// listing every broken invariant.
pub fn load_registry(path: &Path) -> Result<AppRegistry> {
    let file = read_registry_file(path)?;
    let registry = AppRegistry::from_file(file)?;
    tracing::debug!(path = %path.display(), apps = registry.len(), "registry loaded");
    Ok(registry)
}

/// Directory holding per-app configuration next to the registry file.
#[must_use]
pub fn app_config_dir(registry: &Path, app: &str) -> PathBuf {
    registry
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(app)
}

/// Default location of build sources: `<registry dir>/assets`.
#[must_use]
pub fn default_assets_dir(registry: &Path) -> PathBuf {
    registry
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("assets")
}
