//! `appconfig pip-freeze <env>` and `appconfig pip-freeze-all`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::pip_freeze::{PipFreeze, pip_freeze_all};
use crate::commands::EnvArgs;
use crate::output::{TerminalReporter, progress};

/// Arguments for the pip-freeze command.
#[derive(Args)]
pub struct PipFreezeArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Where to write the requirements
    #[arg(long, short, default_value = "requirements.txt")]
    pub output: PathBuf,
}

/// Arguments for the pip-freeze-all command.
#[derive(Args)]
pub struct PipFreezeAllArgs {
    /// Directory receiving `<app>/requirements.txt` per app
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
}

/// Run `appconfig pip-freeze`.
///
/// # Errors
///
/// Returns an error if the app is unknown, `pip freeze` fails, or the file
/// cannot be written.
pub async fn run(args: &PipFreezeArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let target = app.resolve_app(&registry)?;
    let reporter = TerminalReporter::new(&app.output);
    let task = PipFreeze {
        out: args.output.clone(),
    };
    let lines = app
        .dispatcher(&reporter)
        .dispatch(&task, target, args.env.environment)
        .await?;
    app.renderer().render_freeze(&args.output, &lines)
}

/// Run `appconfig pip-freeze-all`. Individual failures are reported, not
/// fatal.
///
/// # Errors
///
/// Returns an error only if the registry cannot be loaded.
pub async fn run_all(args: &PipFreezeAllArgs, app: &AppContext) -> Result<()> {
    let registry = app.registry()?;
    let reporter = TerminalReporter::new(&app.output);
    let dispatcher = app.dispatcher(&reporter);

    let pb = progress::bar(
        u64::try_from(registry.len()).unwrap_or(u64::MAX),
        "freezing production apps",
        app.output.show_progress(),
    );
    let summary = pip_freeze_all(&dispatcher, registry.apps(), &args.output, |name| {
        progress::tick(&pb, name);
    })
    .await;
    if summary.failed.is_empty() {
        progress::finish_success(&pb, "all apps frozen");
    } else {
        progress::finish_error(&pb, &format!("{} apps failed", summary.failed.len()));
    }
    app.renderer().render_freeze_summary(&summary)
}
