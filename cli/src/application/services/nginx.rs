//! nginx site configuration for an app.

use anyhow::Result;

use crate::application::dispatch::TaskContext;
use crate::application::ports::{DirOptions, Ensure, RemoteHost, RunAs, UploadOptions, Workstation};
use crate::application::services::render::upload_template;
use crate::domain::app::AppDescriptor;
use crate::domain::credentials::auth_directives;
use crate::domain::shell::quote;
use crate::domain::template::ProvisioningContext;

const DEFAULT_SITE: &str = "/etc/nginx/sites-available/default";

/// Render the app's nginx config for the bound environment.
///
/// On `test` the app is mounted as a location of the default site; on
/// `production` it gets its own server block plus log rotation.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or an upload fails.
pub async fn require_nginx<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    let location = app.nginx_location();
    if let Some((dir, _)) = location.rsplit_once('/') {
        ctx.remote
            .ensure_directory(
                dir,
                &DirOptions {
                    owner: Some("root"),
                    mode: None,
                },
            )
            .await?;
    }

    let opts = UploadOptions::default();
    if ctx.is_production() {
        vars.set("SITE", true);
        upload_template(ctx, &app.nginx_site(), "nginx-app.conf", vars, &opts).await?;
        upload_template(
            ctx,
            &format!("/etc/logrotate.d/{}", app.name),
            "logrotate.conf",
            vars,
            &opts,
        )
        .await?;
    } else {
        upload_template(ctx, DEFAULT_SITE, "nginx-default.conf", vars, &opts).await?;
        vars.set("SITE", false);
        upload_template(ctx, &location, "nginx-app.conf", vars, &opts).await?;
    }
    Ok(())
}

/// Restore the auth variables from an existing htpasswd file, so configs
/// regenerated outside `deploy` keep the protection `deploy` set up.
///
/// # Errors
///
/// Returns an error only on transport failure.
pub async fn existing_auth<H: RemoteHost, W>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    let htpasswd = app.nginx_htpasswd();
    if !ctx.remote.exists(&htpasswd).await? {
        return Ok(());
    }
    let auth = auth_directives(&app.name, &htpasswd);
    let restricted = ctx
        .remote
        .exec(
            &format!("grep -q {} {}", quote(&format!("^{}:", app.name)), quote(&htpasswd)),
            RunAs::Root,
        )
        .await?
        .status
        .success();
    if restricted {
        vars.set("auth", &auth);
    }
    vars.set("admin_auth", auth);
    Ok(())
}
