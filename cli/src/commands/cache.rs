//! `appconfig cache` / `appconfig uncache` — varnish on the production host.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::cache::{Cache, Uncache};
use crate::domain::environment::Environment;
use crate::output::TerminalReporter;

/// Run `appconfig cache`.
///
/// # Errors
///
/// Returns an error if the app is unknown or varnish cannot be configured.
pub async fn enable(app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    app.dispatcher(&reporter)
        .dispatch(&Cache, target, Environment::Production)
        .await?;
    Ok(())
}

/// Run `appconfig uncache`.
///
/// # Errors
///
/// Returns an error if the app is unknown or nginx cannot be reconfigured.
pub async fn disable(app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    app.dispatcher(&reporter)
        .dispatch(&Uncache, target, Environment::Production)
        .await?;
    Ok(())
}
