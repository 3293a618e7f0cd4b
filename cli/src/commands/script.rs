//! `appconfig run-script <env> <name> [args…]`.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::scripts::RunScript;
use crate::commands::EnvArgs;
use crate::output::TerminalReporter;

/// Arguments for the run-script command.
#[derive(Args)]
pub struct RunScriptArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Script name under `<app>/scripts/`, without `.py`
    pub script: String,

    /// Arguments passed through to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Run `appconfig run-script`.
///
/// # Errors
///
/// Returns an error if the app is unknown or the script exits non-zero.
pub async fn run(args: &RunScriptArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    let task = RunScript {
        script: args.script.clone(),
        args: args.args.clone(),
    };
    let outputs = app
        .dispatcher(&reporter)
        .dispatch(&task, target, args.env.environment)
        .await?;
    app.renderer().render_script_output(&outputs)
}
