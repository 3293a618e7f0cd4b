//! `appconfig uninstall <env>` — take the app off its host.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::lifecycle::Uninstall;
use crate::commands::EnvArgs;
use crate::output::TerminalReporter;

/// Run `appconfig uninstall`.
///
/// # Errors
///
/// Returns an error if the operator declines, the app is unknown, or a
/// remote command fails.
pub async fn run(args: &EnvArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;

    let prompt = format!("Uninstall {} from {}?", target.name, args.environment);
    if !confirm(app, &prompt)? {
        app.output.info("Uninstall cancelled.");
        return Ok(());
    }

    let reporter = TerminalReporter::new(&app.output);
    let removed = app
        .dispatcher(&reporter)
        .dispatch(&Uninstall, target, args.environment)
        .await?;
    app.renderer().render_removed(&removed)
}

/// `--yes` answers yes here; the prompter's non-interactive default is "no"
/// for destructive questions asked mid-deploy.
fn confirm(app: &AppContext, prompt: &str) -> Result<bool> {
    if app.non_interactive {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
