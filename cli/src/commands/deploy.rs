//! `appconfig deploy <env>` — provision, configure and (re)start an app.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::credentials::BlogOverrides;
use crate::application::services::deploy::{Deploy, DeployOptions};
use crate::commands::EnvArgs;
use crate::domain::app::AppDescriptor;
use crate::output::TerminalReporter;

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Skip the database reseed question and only run migrations
    #[arg(long)]
    pub with_alembic: bool,

    /// Configure the blog proxy even if the app does not ask for it
    #[arg(long)]
    pub with_blog: bool,
}

/// Blog settings from `{NAME}_BLOGHOST`, `{NAME}_BLOGUSER` and
/// `{NAME}_BLOGPASSWORD`.
#[must_use]
pub fn blog_overrides(target: &AppDescriptor) -> BlogOverrides {
    let var = |key: &str| std::env::var(format!("{}_{key}", target.name.to_uppercase())).ok();
    BlogOverrides {
        host: var("BLOGHOST"),
        user: var("BLOGUSER"),
        password: var("BLOGPASSWORD"),
    }
}

/// Run `appconfig deploy`.
///
/// # Errors
///
/// Returns an error if the app is unknown or any deploy stage fails.
pub async fn run(args: &DeployArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    let task = Deploy {
        opts: DeployOptions {
            with_alembic: args.with_alembic,
            with_blog: args.with_blog,
            blog: blog_overrides(target),
        },
    };
    let reports = app
        .dispatcher(&reporter)
        .dispatch(&task, target, args.env.environment)
        .await?;
    app.renderer().render_deploy(&reports)
}
