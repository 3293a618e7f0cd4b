//! Recording the exact python requirements an app runs with.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::dispatch::{Task, TaskContext, TaskDispatcher};
use crate::application::ports::{Connector, RemoteHost, Workstation};
use crate::domain::app::AppDescriptor;
use crate::domain::environment::Environment;
use crate::domain::requirements::filter_freeze;
use crate::domain::shell::in_virtualenv;

/// `pip-freeze <env>`: write the filtered `pip freeze` of the bound host.
#[derive(Debug, Clone)]
pub struct PipFreeze {
    /// Local file to write, usually `requirements.txt`.
    pub out: PathBuf,
}

impl Default for PipFreeze {
    fn default() -> Self {
        Self {
            out: PathBuf::from("requirements.txt"),
        }
    }
}

impl Task for PipFreeze {
    /// Number of requirement lines written.
    type Output = usize;

    fn name(&self) -> &'static str {
        "pip-freeze"
    }

    async fn run<H: RemoteHost, W: Workstation>(
        &self,
        ctx: &TaskContext<'_, H, W>,
    ) -> Result<usize> {
        let stdout = ctx
            .remote
            .run(&in_virtualenv(&ctx.app.venv(), "pip freeze"))
            .await?;
        let requirements = filter_freeze(&stdout, &ctx.app.name);
        ctx.local
            .write_local(&self.out, requirements.as_bytes())
            .with_context(|| format!("writing {}", self.out.display()))?;
        Ok(requirements.lines().count())
    }
}

/// Outcome of freezing a whole fleet.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct FreezeSummary {
    /// Apps whose requirements were written.
    pub written: Vec<String>,
    /// Apps that failed, with the rendered error.
    pub failed: Vec<(String, String)>,
}

/// Freeze every app on its production host into `<out_dir>/<name>/requirements.txt`.
///
/// A failing app is reported and skipped; the run always continues.
/// `on_done` is called once per app, after it was attempted.
pub async fn pip_freeze_all<'a, C, W>(
    dispatcher: &TaskDispatcher<'_, C, W>,
    apps: impl IntoIterator<Item = &'a AppDescriptor>,
    out_dir: &Path,
    mut on_done: impl FnMut(&str),
) -> FreezeSummary
where
    C: Connector,
    W: Workstation,
{
    let reporter = dispatcher.collaborators().reporter;
    let mut summary = FreezeSummary::default();
    for app in apps {
        let task = PipFreeze {
            out: out_dir.join(&app.name).join("requirements.txt"),
        };
        match dispatcher.dispatch(&task, app, Environment::Production).await {
            Ok(_) => summary.written.push(app.name.clone()),
            Err(e) => {
                tracing::warn!(app = %app.name, error = %format!("{e:#}"), "pip freeze failed");
                reporter.warn(&format!("{}: {e:#}", app.name));
                summary.failed.push((app.name.clone(), format!("{e:#}")));
            }
        }
        on_done(&app.name);
    }
    summary
}
