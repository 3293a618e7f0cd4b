//! `appconfig stop <env>` — pause the app, keeping everything installed.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::lifecycle::Stop;
use crate::commands::EnvArgs;
use crate::output::TerminalReporter;

/// Run `appconfig stop`.
///
/// # Errors
///
/// Returns an error if the app is unknown or supervisord cannot be updated.
pub async fn run(args: &EnvArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    app.dispatcher(&reporter)
        .dispatch(&Stop, target, args.environment)
        .await?;
    Ok(())
}
