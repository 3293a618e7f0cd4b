//! Rendering templates onto the bound host.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::dispatch::TaskContext;
use crate::application::ports::{RemoteHost, UploadOptions, Workstation};
use crate::domain::app::AppDescriptor;
use crate::domain::template::ProvisioningContext;

#[derive(Serialize)]
struct EnvView<'a> {
    environment: &'a str,
    host: &'a str,
}

/// Variables every template can rely on.
#[must_use]
pub fn template_variables<H: RemoteHost, W>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> ProvisioningContext {
    let mut vars = ProvisioningContext::new();
    vars.set("app", app.view())
        .set(
            "env",
            EnvView {
                environment: ctx.environment.as_str(),
                host: ctx.host(),
            },
        )
        .set("gunicorn", app.bin("gunicorn_paster"))
        .set("monitor_mode", ctx.environment.monitor_mode())
        .set("auth", "")
        .set("admin_auth", "")
        .set("bloghost", "")
        .set("bloguser", "")
        .set("blogpassword", "");
    vars
}

/// Render `template` and upload it to `dest` as root.
///
/// Rendering happens before anything is sent, so a template error leaves
/// the host untouched.
///
/// # Errors
///
/// Returns an error if rendering or the upload fails.
pub async fn upload_template<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    dest: &str,
    template: &str,
    vars: &ProvisioningContext,
    opts: &UploadOptions<'_>,
) -> Result<()> {
    let rendered = ctx
        .with
        .templates
        .render(template, vars)
        .with_context(|| format!("rendering {template} for {dest}"))?;
    tracing::debug!(host = ctx.host(), template, dest, "uploading rendered template");
    ctx.remote
        .upload(rendered.as_bytes(), dest, opts)
        .await
        .with_context(|| format!("uploading {dest}"))
}

/// Run a program on the operator's machine, failing on non-zero exit.
///
/// # Errors
///
/// Returns an error if the program cannot run or exits non-zero.
pub async fn local_checked(local: &impl Workstation, program: &str, args: &[&str]) -> Result<()> {
    let output = local
        .local(program, args)
        .await
        .with_context(|| format!("running {program} locally"))?;
    if !output.status.success() {
        anyhow::bail!(
            "{program} failed locally:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}
