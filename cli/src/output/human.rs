//! Human-readable terminal renderer.

use std::path::Path;

use crate::application::services::deploy::DeployReport;
use crate::application::services::pip_freeze::FreezeSummary;
use crate::domain::registry::CheckReport;
use crate::output::OutputContext;

/// Renders command results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        self.ctx.info(&format!("appconfig v{version}"));
    }

    /// Render the registry audit. Errors always print; the rest obeys `quiet`.
    pub fn render_check(&self, report: &CheckReport) {
        for error in &report.errors {
            self.ctx.error(error);
        }
        for warning in &report.warnings {
            self.ctx.warn(warning);
        }
        if report.is_ok() {
            self.ctx
                .success(&format!("{} apps, registry is consistent", report.apps));
        }
    }

    /// Render per-host deploy results.
    pub fn render_deploy(&self, reports: &[DeployReport]) {
        for report in reports {
            self.ctx.header(&format!("{}:", report.host));
            self.ctx.kv("release:", report.release.codename());
            self.ctx.kv("workers:", &report.workers.to_string());
            let database = match (report.reseeded, report.migrated) {
                (true, _) => "recreated",
                (false, true) => "upgraded",
                (false, false) => "unchanged",
            };
            self.ctx.kv("database:", database);
        }
    }

    /// Render where `pip-freeze` wrote its output.
    pub fn render_freeze(&self, path: &Path, lines: &[usize]) {
        let total: usize = lines.iter().sum();
        self.ctx
            .success(&format!("{total} requirements written to {}", path.display()));
    }

    /// Render the outcome of `pip-freeze-all`.
    pub fn render_freeze_summary(&self, summary: &FreezeSummary) {
        for (app, error) in &summary.failed {
            self.ctx.warn(&format!("{app}: {error}"));
        }
        self.ctx.success(&format!(
            "{} apps frozen, {} failed",
            summary.written.len(),
            summary.failed.len()
        ));
    }

    /// Render files removed by `uninstall`.
    pub fn render_removed(&self, removed: &[Vec<String>]) {
        for path in removed.iter().flatten() {
            self.ctx.kv("removed:", path);
        }
    }

    /// Print raw script output verbatim.
    pub fn render_script_output(&self, outputs: &[String]) {
        if self.ctx.quiet {
            return;
        }
        for out in outputs {
            print!("{out}");
        }
    }
}
