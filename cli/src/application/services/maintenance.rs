//! Maintenance page shown by nginx while the app is down.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Europe::Berlin;

use crate::application::dispatch::{Task, TaskContext};
use crate::application::ports::{DirOptions, Ensure, RemoteHost, UploadOptions, Workstation};
use crate::application::services::render::{template_variables, upload_template};
use crate::domain::app::AppDescriptor;
use crate::domain::template::ProvisioningContext;

/// Format of the "back online at" timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M %Z%z";

/// Downtime announced by a standalone `maintenance` run.
pub const DEFAULT_HOURS: u32 = 2;

/// Timestamp `hours` after `now`, shown in Europe/Berlin.
#[must_use]
pub fn back_online_at(now: DateTime<Utc>, hours: u32) -> String {
    (now + Duration::hours(i64::from(hours)))
        .with_timezone(&Berlin)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Upload `503.html` announcing the app is back in `hours` hours.
///
/// # Errors
///
/// Returns an error if the www directory or the upload fails.
pub async fn render_maintenance<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
    hours: u32,
    vars: &mut ProvisioningContext,
) -> Result<()> {
    vars.set("timestamp", back_online_at(Utc::now(), hours));
    ctx.remote
        .ensure_directory(&app.www(), &DirOptions::default())
        .await?;
    upload_template(
        ctx,
        &format!("{}/503.html", app.www()),
        "503.html",
        vars,
        &UploadOptions::default(),
    )
    .await
}

/// `maintenance <env>`: stage the maintenance page on its own.
#[derive(Debug, Clone, Default)]
pub struct Maintenance {
    /// Expected downtime; defaults to [`DEFAULT_HOURS`].
    pub hours: Option<u32>,
}

impl Task for Maintenance {
    type Output = ();

    fn name(&self) -> &'static str {
        "maintenance"
    }

    async fn run<H: RemoteHost, W: Workstation>(&self, ctx: &TaskContext<'_, H, W>) -> Result<()> {
        let mut vars = template_variables(ctx, ctx.app);
        let hours = self.hours.unwrap_or(DEFAULT_HOURS);
        render_maintenance(ctx, ctx.app, hours, &mut vars).await?;
        ctx.with
            .reporter
            .success(&format!("maintenance page staged ({hours}h)"));
        Ok(())
    }
}
