//! Starting, stopping and removing an installed app.

use anyhow::Result;

use crate::application::dispatch::{Task, TaskContext};
use crate::application::ports::{Ensure, RemoteHost, Workstation};
use crate::application::services::render::template_variables;
use crate::application::services::supervisor::{SupervisorCommand, supervisor};
use crate::domain::shell::quote;

/// `start <env>`: let supervisord run the app again.
#[derive(Debug, Clone, Copy, Default)]
pub struct Start;

/// `stop <env>`: pause the app under supervisord.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stop;

impl Task for Start {
    type Output = ();

    fn name(&self) -> &'static str {
        "start"
    }

    async fn run<H: RemoteHost, W: Workstation>(&self, ctx: &TaskContext<'_, H, W>) -> Result<()> {
        let mut vars = template_variables(ctx, ctx.app);
        supervisor(ctx, ctx.app, SupervisorCommand::Run, &mut vars).await?;
        ctx.with
            .reporter
            .success(&format!("{} started on {}", ctx.app.name, ctx.host()));
        Ok(())
    }
}

impl Task for Stop {
    type Output = ();

    fn name(&self) -> &'static str {
        "stop"
    }

    async fn run<H: RemoteHost, W: Workstation>(&self, ctx: &TaskContext<'_, H, W>) -> Result<()> {
        let mut vars = template_variables(ctx, ctx.app);
        supervisor(ctx, ctx.app, SupervisorCommand::Pause, &mut vars).await?;
        ctx.with
            .reporter
            .success(&format!("{} stopped on {}", ctx.app.name, ctx.host()));
        Ok(())
    }
}

/// `uninstall <env>`: drop the app's supervisor and nginx config.
///
/// Virtualenv, database and user are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uninstall;

impl Task for Uninstall {
    /// Paths that were actually removed.
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "uninstall"
    }

    async fn run<H: RemoteHost, W: Workstation>(
        &self,
        ctx: &TaskContext<'_, H, W>,
    ) -> Result<Vec<String>> {
        let app = ctx.app;
        let mut removed = Vec::new();
        for path in [app.supervisor(), app.nginx_location(), app.nginx_site()] {
            if ctx.remote.remove_file(&path).await? {
                removed.push(path);
            }
        }
        ctx.remote.service_reload("nginx").await?;
        ctx.remote
            .sudo(&format!("supervisorctl stop {}", quote(&app.name)))
            .await?;
        ctx.with.reporter.success(&format!(
            "{} uninstalled from {} ({} files removed)",
            app.name,
            ctx.host(),
            removed.len()
        ));
        Ok(removed)
    }
}
