//! Varnish in front of an app's nginx site.

use anyhow::{Context, Result};

use crate::application::dispatch::{Task, TaskContext};
use crate::application::ports::{DirOptions, Ensure, RemoteHost, UploadOptions, Workstation};
use crate::application::services::nginx::{existing_auth, require_nginx};
use crate::application::services::render::{template_variables, upload_template};
use crate::domain::app::AppDescriptor;
use crate::domain::shell::quote;
use crate::domain::varnish::{SITES_DIR, SITES_INCLUDE, VARNISH_PORT, render_sites_include};

/// `cache`: route the app's nginx site through varnish.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cache;

/// `uncache`: route the app's nginx site straight to the app again.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncache;

impl Task for Cache {
    type Output = ();

    fn name(&self) -> &'static str {
        "cache"
    }

    async fn run<H: RemoteHost, W: Workstation>(&self, ctx: &TaskContext<'_, H, W>) -> Result<()> {
        enable(ctx, ctx.app).await
    }
}

impl Task for Uncache {
    type Output = ();

    fn name(&self) -> &'static str {
        "uncache"
    }

    async fn run<H: RemoteHost, W: Workstation>(&self, ctx: &TaskContext<'_, H, W>) -> Result<()> {
        disable(ctx, ctx.app).await
    }
}

/// Put varnish in front of `app`.
///
/// # Errors
///
/// Returns an error if any package, upload or service command fails.
pub async fn enable<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> Result<()> {
    let remote = &ctx.remote;
    let reporter = ctx.with.reporter;

    reporter.step("configuring varnish...");
    remote.ensure_package("varnish").await?;
    let vars = template_variables(ctx, app);
    let opts = UploadOptions::default();
    upload_template(ctx, "/etc/default/varnish", "varnish", &vars, &opts).await?;
    upload_template(ctx, "/etc/varnish/main.vcl", "varnish_main.vcl", &vars, &opts).await?;
    remote
        .ensure_directory(SITES_DIR, &DirOptions::default())
        .await?;
    upload_template(ctx, &app.varnish_site(), "varnish_site.vcl", &vars, &opts).await?;
    refresh_sites(ctx).await?;

    reporter.step("pointing nginx at varnish...");
    point_nginx(ctx, &app.with_port(VARNISH_PORT)).await?;
    reporter.success(&format!("{} is cached", app.name));
    Ok(())
}

/// Take varnish out of the path for `app`.
///
/// # Errors
///
/// Returns an error if regenerating the includes or nginx fails. A site
/// file that cannot be removed is only reported.
pub async fn disable<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> Result<()> {
    let reporter = ctx.with.reporter;
    if let Err(e) = ctx.remote.remove_file(&app.varnish_site()).await {
        tracing::warn!(host = ctx.host(), error = %e, "could not remove varnish site");
        reporter.warn(&format!("could not remove {}: {e:#}", app.varnish_site()));
    }
    refresh_sites(ctx).await?;
    point_nginx(ctx, app).await?;
    reporter.success(&format!("{} is no longer cached", app.name));
    Ok(())
}

/// Rewrite `sites.vcl` from what is in the sites directory right now and
/// restart varnish so it loads the new include set.
///
/// # Errors
///
/// Returns an error if listing the directory, writing the file or the
/// restart fails.
pub async fn refresh_sites<H: RemoteHost, W>(ctx: &TaskContext<'_, H, W>) -> Result<bool> {
    ctx.remote
        .ensure_directory(SITES_DIR, &DirOptions::default())
        .await?;
    let listing = ctx
        .remote
        .sudo(&format!(
            "find {} -mindepth 1 -maxdepth 1 -type f",
            quote(SITES_DIR)
        ))
        .await
        .context("listing varnish sites")?;
    let include = render_sites_include(&listing);
    let changed = ctx
        .remote
        .ensure_file(SITES_INCLUDE, include.as_bytes(), &UploadOptions::mode(0o644))
        .await?;
    ctx.remote.service_restart("varnish").await?;
    Ok(changed)
}

async fn point_nginx<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> Result<()> {
    let mut vars = template_variables(ctx, app);
    existing_auth(ctx, app, &mut vars).await?;
    require_nginx(ctx, app, &mut vars).await?;
    ctx.remote.service_reload("nginx").await
}
