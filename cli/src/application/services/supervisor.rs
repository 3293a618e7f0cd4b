//! Pausing and running an app under supervisord.
//!
//! The program config is rewritten on every state change so a paused app
//! stays paused across supervisord restarts.

use anyhow::Result;

use crate::application::dispatch::TaskContext;
use crate::application::ports::{RemoteHost, UploadOptions, Workstation};
use crate::application::services::render::upload_template;
use crate::domain::app::AppDescriptor;
use crate::domain::shell::quote;
use crate::domain::template::ProvisioningContext;

/// Desired supervisord state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCommand {
    Run,
    Pause,
}

/// Put `app` into `command`'s state.
///
/// # Errors
///
/// Returns an error if rendering the program config or any `supervisorctl`
/// call fails.
pub async fn supervisor<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    command: SupervisorCommand,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    vars.set("PAUSE", command == SupervisorCommand::Pause);
    upload_template(
        ctx,
        &app.supervisor(),
        "supervisor.conf",
        vars,
        &UploadOptions::mode(0o644),
    )
    .await?;

    let name = quote(&app.name);
    match command {
        SupervisorCommand::Run => {
            ctx.remote.sudo("supervisorctl reread").await?;
            ctx.remote.sudo(&format!("supervisorctl update {name}")).await?;
            ctx.remote.sudo(&format!("supervisorctl restart {name}")).await?;
        }
        SupervisorCommand::Pause => {
            ctx.remote.sudo(&format!("supervisorctl stop {name}")).await?;
        }
    }
    ctx.local.sleep(ctx.with.settings.supervisor_settle).await;
    Ok(())
}
