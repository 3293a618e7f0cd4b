//! Running the app's own maintenance scripts on the host.

use anyhow::{Context, Result};

use crate::application::dispatch::{Task, TaskContext};
use crate::application::ports::{DirOptions, Ensure, RemoteHost, RunAs, Workstation};
use crate::domain::app::AppDescriptor;
use crate::domain::shell::{in_dir, quote};

/// Command line for `{src}/{name}/scripts/{script}.py`, run from the app's
/// home with its `config.ini`.
#[must_use]
pub fn script_command(app: &AppDescriptor, script: &str, args: &[String]) -> String {
    let mut command = format!(
        "{} {} {}",
        quote(&app.bin("python")),
        quote(&format!("{}/{}/scripts/{script}.py", app.src(), app.name)),
        quote(&format!("config.ini#{}", app.name)),
    );
    for arg in args {
        command.push(' ');
        command.push_str(&quote(arg));
    }
    in_dir(&app.home(), &command)
}

/// Run `script` as the app user and return its stdout.
///
/// # Errors
///
/// Returns an error if the script exits non-zero.
pub async fn run_script<H: RemoteHost, W>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    script: &str,
    args: &[String],
) -> Result<String> {
    tracing::info!(host = ctx.host(), app = %app.name, script, "running script");
    ctx.remote
        .run_as(&script_command(app, script, args), RunAs::User(&app.name))
        .await
        .with_context(|| format!("script {script} failed"))
}

/// `run-script <env> <name> [args…]`.
#[derive(Debug, Clone, Default)]
pub struct RunScript {
    pub script: String,
    pub args: Vec<String>,
}

impl Task for RunScript {
    type Output = String;

    fn name(&self) -> &'static str {
        "run-script"
    }

    async fn run<H: RemoteHost, W: Workstation>(
        &self,
        ctx: &TaskContext<'_, H, W>,
    ) -> Result<String> {
        run_script(ctx, ctx.app, &self.script, &self.args).await
    }
}

/// `create-downloads <env>`: regenerate the app's download files.
///
/// The download directory is world-writable only while the script runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateDownloads;

impl Task for CreateDownloads {
    type Output = ();

    fn name(&self) -> &'static str {
        "create-downloads"
    }

    async fn run<H: RemoteHost, W: Workstation>(&self, ctx: &TaskContext<'_, H, W>) -> Result<()> {
        let app = ctx.app;
        let dir = app.downloads();
        let open = DirOptions {
            owner: None,
            mode: Some(0o777),
        };
        let closed = DirOptions {
            owner: None,
            mode: Some(0o755),
        };

        ctx.remote.ensure_directory(&dir, &open).await?;
        let result = run_script(ctx, app, "create_downloads", &[]).await;
        // Close the directory again even when the script failed.
        ctx.remote.ensure_directory(&dir, &closed).await?;
        result?;

        ctx.with
            .reporter
            .success(&format!("downloads created in {dir}"));
        Ok(())
    }
}
