//! `appconfig start <env>` — let supervisord run the app.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::lifecycle::Start;
use crate::commands::EnvArgs;
use crate::output::TerminalReporter;

/// Run `appconfig start`.
///
/// # Errors
///
/// Returns an error if the app is unknown or supervisord cannot be updated.
pub async fn run(args: &EnvArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    app.dispatcher(&reporter)
        .dispatch(&Start, target, args.environment)
        .await?;
    Ok(())
}
