//! `appconfig create-downloads <env>` — regenerate the app's downloads.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::scripts::CreateDownloads;
use crate::commands::EnvArgs;
use crate::output::TerminalReporter;

/// Run `appconfig create-downloads`.
///
/// # Errors
///
/// Returns an error if the app is unknown or the script fails.
pub async fn run(args: &EnvArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    app.dispatcher(&reporter)
        .dispatch(&CreateDownloads, target, args.environment)
        .await?;
    Ok(())
}
