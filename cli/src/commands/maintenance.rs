//! `appconfig maintenance <env>` — stage the maintenance page.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::maintenance::Maintenance;
use crate::commands::EnvArgs;
use crate::output::TerminalReporter;

/// Arguments for the maintenance command.
#[derive(Args)]
pub struct MaintenanceArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Expected downtime in hours [default: 2]
    #[arg(long)]
    pub hours: Option<u32>,
}

/// Run `appconfig maintenance`.
///
/// # Errors
///
/// Returns an error if the app is unknown or the page cannot be uploaded.
pub async fn run(args: &MaintenanceArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    let task = Maintenance { hours: args.hours };
    app.dispatcher(&reporter)
        .dispatch(&task, target, args.env.environment)
        .await?;
    Ok(())
}
