//! Application service — the `deploy` procedure.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! Stages run strictly in order; every stage except the reseed and the
//! restart converges state and can be re-run after a failure.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::dispatch::{Task, TaskContext};
use crate::application::ports::{
    DirOptions, Ensure, RemoteHost, RunAs, UploadOptions, Workstation,
};
use crate::application::services::credentials::{BlogOverrides, blog_settings, http_auth};
use crate::application::services::maintenance::render_maintenance;
use crate::application::services::nginx::require_nginx;
use crate::application::services::render::{local_checked, template_variables, upload_template};
use crate::application::services::supervisor::{SupervisorCommand, supervisor};
use crate::domain::app::AppDescriptor;
use crate::domain::environment::limit_resources;
use crate::domain::health::{check_ping, ping_command};
use crate::domain::platform::{self, Release};
use crate::domain::shell::{in_dir, in_virtualenv, quote};
use crate::domain::template::ProvisioningContext;

const POSTGRES: RunAs<'static> = RunAs::User("postgres");

/// Options for one `deploy` run.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Skip the reseed question and go straight to migrations.
    pub with_alembic: bool,
    /// Configure the blog proxy even if the app does not ask for it.
    pub with_blog: bool,
    pub blog: BlogOverrides,
}

/// What a finished deploy did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub host: String,
    pub release: Release,
    pub workers: u32,
    pub reseeded: bool,
    pub migrated: bool,
}

/// `deploy <env>` as a dispatchable task.
#[derive(Debug, Clone, Default)]
pub struct Deploy {
    pub opts: DeployOptions,
}

impl Task for Deploy {
    type Output = DeployReport;

    fn name(&self) -> &'static str {
        "deploy"
    }

    async fn run<H: RemoteHost, W: Workstation>(
        &self,
        ctx: &TaskContext<'_, H, W>,
    ) -> Result<DeployReport> {
        deploy(ctx, &self.opts).await
    }
}

/// Deploy the bound app to the bound host.
///
/// # Errors
///
/// Fails on an unsupported platform (before anything is changed), on any
/// failed remote command, and when the restarted app does not report
/// `{"status": "ok"}`. Nothing is rolled back; re-running is the recovery.
pub async fn deploy<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    opts: &DeployOptions,
) -> Result<DeployReport> {
    let reporter = ctx.with.reporter;
    let prompter = ctx.with.prompter;

    reporter.step("detecting platform...");
    let release = detect_platform(&ctx.remote).await?;
    tracing::info!(host = ctx.host(), release = release.codename(), "platform detected");

    let app = limit_resources(ctx.app, ctx.environment);
    let mut vars = template_variables(ctx, &app);
    if opts.with_blog || app.with_blog {
        let blog = blog_settings(prompter, &app, &opts.blog)?;
        vars.set("bloghost", blog.host)
            .set("bloguser", blog.user)
            .set("blogpassword", blog.password);
    }

    reporter.step("provisioning system packages...");
    provision_system(ctx, &app, release).await?;

    reporter.step("provisioning database extensions...");
    provision_extensions(ctx, &app, release).await?;

    reporter.step("provisioning python environment...");
    let framework_dir = provision_runtime(ctx, &app, release).await?;
    vars.set("clld_dir", framework_dir);

    reporter.step("configuring nginx...");
    configure_site(ctx, &app, &mut vars).await?;

    let mut reseeded = false;
    let mut migrated = false;
    if !opts.with_alembic && prompter.confirm("Recreate database?", false)? {
        reseed(ctx, &app, &mut vars).await.context("recreating database")?;
        reseeded = true;
    } else if ctx.remote.exists(&format!("{}/alembic.ini", app.src())).await?
        && prompter.confirm("Upgrade database?", false)?
    {
        migrate(ctx, &app, &mut vars).await.context("upgrading database")?;
        migrated = true;
    }

    reporter.step("restarting app...");
    restart_and_check(ctx, &app, &mut vars).await?;
    reporter.success(&format!("{} deployed to {}", app.name, ctx.host()));

    Ok(DeployReport {
        host: ctx.host().to_string(),
        release,
        workers: app.workers,
        reseeded,
        migrated,
    })
}

/// Stage 1: read-only platform detection.
///
/// # Errors
///
/// Returns an unsupported-platform error for anything but a supported
/// Ubuntu release.
pub async fn detect_platform(remote: &impl RemoteHost) -> Result<Release> {
    let distribution = remote.run("lsb_release -si").await?;
    let codename = remote.run("lsb_release -sc").await?;
    Ok(platform::detect(&distribution, &codename)?)
}

async fn provision_system<H: RemoteHost, W>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    release: Release,
) -> Result<()> {
    let remote = &ctx.remote;
    remote.ensure_user(&app.name, "/bin/bash").await?;
    remote.ensure_package("postgresql").await?;
    remote.ensure_package(release.java_package()).await?;
    remote.ensure_packages(&app.require_deb).await?;
    remote.ensure_pg_role(&app.name, &app.name).await?;
    remote.ensure_pg_database(&app.name, &app.name).await?;
    remote
        .ensure_directory(&app.venv(), &DirOptions::default())
        .await?;
    Ok(())
}

async fn provision_extensions<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    release: Release,
) -> Result<()> {
    let remote = &ctx.remote;
    let assets_dir = &ctx.with.settings.assets_dir;

    if app.pg_unaccent {
        remote.ensure_package("postgresql-contrib").await?;
        let sql = "CREATE EXTENSION IF NOT EXISTS unaccent WITH SCHEMA public;";
        remote
            .run_as(
                &format!("psql -c {} -d {}", quote(sql), quote(&app.name)),
                POSTGRES,
            )
            .await?;
    }

    if app.pg_collkey {
        let pg_version = release.postgres_version();
        let library = format!("/usr/lib/postgresql/{pg_version}/lib/collkey_icu.so");
        if remote.exists(&library).await? {
            tracing::debug!(host = ctx.host(), "collkey_icu already built");
        } else {
            remote
                .ensure_packages(&[
                    format!("postgresql-server-dev-{pg_version}"),
                    "libicu-dev".to_string(),
                ])
                .await?;
            let makefile_vars = ProvisioningContext::new().with("pg_version", pg_version);
            upload_template(
                ctx,
                "/tmp/Makefile",
                "pg_collkey_Makefile",
                &makefile_vars,
                &UploadOptions::default(),
            )
            .await?;
            let source = ctx
                .local
                .read_local(&assets_dir.join("pg_collkey").join("collkey_icu.c"))?;
            remote
                .ensure_file("/tmp/collkey_icu.c", &source, &UploadOptions::default())
                .await?;
            remote.sudo(&in_dir("/tmp", "make")).await?;
            remote.sudo(&in_dir("/tmp", "make install")).await?;
        }
        init_pg_collkey(ctx, app).await?;
    }

    if app.bibutils {
        require_bibutils(ctx, app).await?;
    }
    Ok(())
}

/// Load the collkey SQL functions into the app's database.
async fn init_pg_collkey<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> Result<()> {
    let sql = ctx
        .local
        .read_local(&ctx.with.settings.assets_dir.join("pg_collkey").join("collkey_icu.sql"))?;
    ctx.remote
        .ensure_file("/tmp/collkey_icu.sql", &sql, &UploadOptions::default())
        .await?;
    ctx.remote
        .run_as(
            &format!("psql -f /tmp/collkey_icu.sql -d {}", quote(&app.name)),
            POSTGRES,
        )
        .await?;
    Ok(())
}

async fn require_bibutils<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> Result<()> {
    let remote = &ctx.remote;
    let assets_dir = &ctx.with.settings.assets_dir;
    if remote.exists("/usr/local/bin/bib2xml").await? {
        return Ok(());
    }
    let tarball = "/tmp/bibutils_5.0_src.tgz";
    let source = ctx
        .local
        .read_local(&assets_dir.join("bibutils").join("bibutils_5.0_src.tgz"))?;
    remote
        .ensure_file(tarball, &source, &UploadOptions::default())
        .await?;
    remote
        .sudo(&format!("tar -xzf {tarball} -C {}", quote(&app.home())))
        .await?;
    let build_dir = format!("{}/bibutils_5.0", app.home());
    for step in ["./configure", "make", "make install"] {
        remote.sudo(&in_dir(&build_dir, step)).await?;
    }
    Ok(())
}

/// Stage 5. Returns the directory of the installed web framework package.
async fn provision_runtime<H: RemoteHost, W>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    release: Release,
) -> Result<String> {
    let remote = &ctx.remote;
    let settings = ctx.with.settings;
    let venv = app.venv();
    let venv_bin = format!("{venv}/bin");

    if release.has_python3() {
        remote.ensure_package("python3-dev").await?;
        remote.ensure_package("python-virtualenv").await?;
        if !remote.exists(&venv_bin).await? {
            remote
                .sudo(&format!("virtualenv -q --python=python3 {}", quote(&venv)))
                .await?;
        }
    } else {
        remote.ensure_package("python-dev").await?;
        remote.ensure_package("python-virtualenv").await?;
        if !remote.exists(&venv_bin).await? {
            remote.sudo(&format!("virtualenv -q {}", quote(&venv))).await?;
        }
    }

    remote
        .ensure_directory(&app.logs(), &DirOptions::default())
        .await?;

    remote
        .ensure_pip_packages(&venv, &[format!("pip=={}", settings.pip_version)])
        .await?;
    remote.ensure_pip_packages(&venv, &app.require_pip).await?;
    let editable: Vec<String> = std::iter::once(&app.name)
        .chain(&app.dependencies)
        .map(|name| format!("-e {}/{name}.git#egg={name}", settings.source_base))
        .collect();
    remote.ensure_pip_packages(&venv, &editable).await?;

    remote
        .sudo(&in_virtualenv(
            &venv,
            &format!("webassets -m {}.assets build", app.name),
        ))
        .await?;

    let location = remote
        .sudo(&in_virtualenv(
            &venv,
            "python -c 'import clld; print(clld.__file__)'",
        ))
        .await?;
    framework_dir(&location)
}

/// Directory of a package given its `__init__.py` path inside a venv.
fn framework_dir(location: &str) -> Result<String> {
    let location = location.trim();
    anyhow::ensure!(
        location.starts_with("/usr/venvs") && location.contains("__init__.py"),
        "unexpected framework location: {location}"
    );
    let (dir, _) = location
        .rsplit_once('/')
        .with_context(|| format!("unexpected framework location: {location}"))?;
    Ok(dir.to_string())
}

/// Stage 6: nginx, basic auth and the maintenance page.
async fn configure_site<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    let auth = http_auth(ctx, app).await?;
    if auth.restricted {
        vars.set("auth", &auth.directives);
    }
    vars.set("admin_auth", &auth.directives);

    require_nginx(ctx, app, vars).await?;
    render_maintenance(ctx, app, app.deploy_duration, vars).await?;
    ctx.remote.service_reload("nginx").await
}

/// Stage 7: replace the app's database with a dump of a local one.
///
/// The app is paused before the drop and stays paused; the restart stage
/// resumes it.
async fn reseed<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    let remote = &ctx.remote;
    let source = ctx
        .with
        .prompter
        .input(&format!("from db [{}]: ", app.name), Some(&app.name))?;

    let dump = std::env::temp_dir().join(format!("{}.sql", app.name));
    let dump_str = dump.to_string_lossy().into_owned();
    local_checked(ctx.local, "pg_dump", &["-x", "-O", "-f", &dump_str, &source]).await?;
    local_checked(ctx.local, "gzip", &["-f", &dump_str]).await?;
    let compressed = ctx.local.read_local(&PathBuf::from(format!("{dump_str}.gz")))?;

    let remote_dump = format!("/tmp/{}.sql", app.name);
    remote
        .upload(&compressed, &format!("{remote_dump}.gz"), &UploadOptions::default())
        .await?;
    remote
        .sudo(&format!("gunzip -f {}", quote(&format!("{remote_dump}.gz"))))
        .await?;

    supervisor(ctx, app, SupervisorCommand::Pause, vars).await?;

    if remote.pg_database_exists(&app.name).await? {
        remote
            .run_as(
                &in_dir("/var/lib/postgresql", &format!("dropdb {}", quote(&app.name))),
                POSTGRES,
            )
            .await?;
    }
    remote.ensure_pg_database(&app.name, &app.name).await?;
    if app.pg_collkey {
        // pg_collkey functions lived in the database that was just dropped.
        init_pg_collkey(ctx, app).await?;
    }

    remote
        .run_as(
            &format!("psql -f {} -d {}", quote(&remote_dump), quote(&app.name)),
            RunAs::User(&app.name),
        )
        .await?;
    Ok(())
}

/// Stage 8: alembic upgrade, optionally followed by a vacuum.
async fn migrate<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    let prompter = ctx.with.prompter;
    supervisor(ctx, app, SupervisorCommand::Pause, vars).await?;
    ctx.remote
        .run_as(
            &in_dir(
                &app.src(),
                &format!("{} -n production upgrade head", app.bin("alembic")),
            ),
            RunAs::User(&app.name),
        )
        .await?;

    if prompter.confirm("Vacuum database?", false)? {
        let flags = if prompter.confirm("VACUUM FULL?", false)? {
            "-f -z"
        } else {
            "-z"
        };
        ctx.remote
            .run_as(
                &format!("vacuumdb {flags} -d {}", quote(&app.name)),
                POSTGRES,
            )
            .await?;
    }
    Ok(())
}

/// Stage 9: final config, restart, health check.
async fn restart_and_check<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    vars.set("TEST", !ctx.is_production());
    // The app refuses to start if clld.files points at a missing directory.
    let files = format!("{}/files", app.www());
    let files = ctx.remote.exists(&files).await?.then_some(files);
    vars.set("files", files);
    upload_template(ctx, &app.config(), "config.ini", vars, &UploadOptions::default()).await?;

    supervisor(ctx, app, SupervisorCommand::Run, vars).await?;

    ctx.local.sleep(ctx.with.settings.settle).await;
    let body = ctx.remote.run(&ping_command(app.port)).await?;
    check_ping(&body)?;
    Ok(())
}
