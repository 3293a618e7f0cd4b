//! `appconfig check` — audit the registry without touching any host.

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::registry::check;
use crate::infra::registry::{app_config_dir, read_registry_file};

/// Run `appconfig check`.
///
/// # Errors
///
/// Returns an error if the registry cannot be read, or if it has any
/// invariant violation (after all of them were reported).
pub fn run(app: &AppContext) -> Result<()> {
    let file = read_registry_file(&app.registry_path)?;
    let report = check(&file, |name| {
        app_config_dir(&app.registry_path, name).is_dir()
    });
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }
    app.renderer().render_check(&report)?;
    if !report.is_ok() {
        anyhow::bail!("registry has {} error(s)", report.errors.len());
    }
    Ok(())
}
