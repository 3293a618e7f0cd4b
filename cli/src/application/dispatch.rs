//! Task dispatch: bind a task to an app's host(s) and run it there.
//!
//! The "currently bound host list" is the one piece of shared mutable state
//! in the tool. It is only ever changed through [`HostList::bind`], whose
//! guard puts the previous list back when dropped, on success and on error.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{
    Connector, ProgressReporter, Prompter, RemoteHost, TemplateRenderer, Workstation,
};
use crate::domain::app::AppDescriptor;
use crate::domain::environment::{self, Environment};

/// Pinned pip version installed into every virtualenv.
pub const PIP_VERSION: &str = "6.0.6";

/// Where editable app checkouts are cloned from.
pub const SOURCE_BASE: &str = "git+https://github.com/clld";

/// Tunables for remote work that tests want to shrink.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Wait between restarting the app and probing its health.
    pub settle: Duration,
    /// Wait after each supervisor state change.
    pub supervisor_settle: Duration,
    pub pip_version: String,
    /// Prefix for `-e <base>/<name>.git#egg=<name>` checkouts.
    pub source_base: String,
    /// Local directory holding build sources (pg_collkey, bibutils).
    pub assets_dir: PathBuf,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(5),
            supervisor_settle: Duration::from_secs(1),
            pip_version: PIP_VERSION.to_string(),
            source_base: SOURCE_BASE.to_string(),
            assets_dir: PathBuf::from("assets"),
        }
    }
}

/// Collaborators that are not bound to a host.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub prompter: &'a dyn Prompter,
    pub reporter: &'a dyn ProgressReporter,
    pub templates: &'a dyn TemplateRenderer,
    pub settings: &'a DeploySettings,
}

/// Everything a task needs for one run against one host.
pub struct TaskContext<'a, H, W> {
    /// The app the task operates on.
    pub app: &'a AppDescriptor,
    /// The environment the host was chosen for.
    pub environment: Environment,
    /// Connection to the bound host.
    pub remote: H,
    /// The operator's machine.
    pub local: &'a W,
    pub with: Collaborators<'a>,
}

impl<H: RemoteHost, W> TaskContext<'_, H, W> {
    #[must_use]
    pub fn host(&self) -> &str {
        self.remote.host()
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// A unit of remote work that can be dispatched against an app.
#[allow(async_fn_in_trait)]
pub trait Task {
    type Output;

    /// Name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Run against the host bound in `ctx`.
    async fn run<H: RemoteHost, W: Workstation>(
        &self,
        ctx: &TaskContext<'_, H, W>,
    ) -> Result<Self::Output>;
}

/// The process-wide list of hosts tasks are bound to.
///
/// Starts as the operator's explicit `--hosts` override (usually empty).
#[derive(Debug, Default)]
pub struct HostList {
    current: Mutex<Vec<String>>,
}

impl HostList {
    #[must_use]
    pub fn new(pinned: Vec<String>) -> Self {
        Self {
            current: Mutex::new(pinned),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the bound hosts.
    #[must_use]
    pub fn current(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Bind `hosts` until the returned guard is dropped.
    #[must_use = "the binding is released as soon as the guard is dropped"]
    pub fn bind(&self, hosts: Vec<String>) -> HostBinding<'_> {
        let previous = std::mem::replace(&mut *self.lock(), hosts);
        HostBinding {
            list: self,
            previous: Some(previous),
        }
    }
}

/// Restores the previous host list on drop.
pub struct HostBinding<'a> {
    list: &'a HostList,
    previous: Option<Vec<String>>,
}

impl Drop for HostBinding<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.list.lock() = previous;
        }
    }
}

/// Runs tasks against apps on their environment's hosts.
pub struct TaskDispatcher<'a, C, W> {
    connector: C,
    local: W,
    hosts: HostList,
    with: Collaborators<'a>,
}

impl<'a, C: Connector, W: Workstation> TaskDispatcher<'a, C, W> {
    #[must_use]
    pub fn new(connector: C, local: W, pinned: Vec<String>, with: Collaborators<'a>) -> Self {
        Self {
            connector,
            local,
            hosts: HostList::new(pinned),
            with,
        }
    }

    /// The host list as seen right now (outside a dispatch: the pinned list).
    #[must_use]
    pub fn hosts(&self) -> Vec<String> {
        self.hosts.current()
    }

    #[must_use]
    pub fn collaborators(&self) -> Collaborators<'a> {
        self.with
    }

    #[must_use]
    pub fn workstation(&self) -> &W {
        &self.local
    }

    /// Run `task` for `app` on every host bound for `environment`, in order.
    ///
    /// An explicitly pinned host list wins over the app's configured host.
    /// The first failing host aborts the dispatch.
    ///
    /// # Errors
    ///
    /// Returns an error if no host can be bound or the task fails.
    pub async fn dispatch<T: Task>(
        &self,
        task: &T,
        app: &AppDescriptor,
        environment: Environment,
    ) -> Result<Vec<T::Output>> {
        let hosts = environment::bind(app, environment, &self.hosts.current())?;
        let _binding = self.hosts.bind(hosts.clone());

        let mut outputs = Vec::with_capacity(hosts.len());
        for host in &hosts {
            tracing::info!(
                task = task.name(),
                app = %app.name,
                %host,
                %environment,
                "dispatching task"
            );
            let ctx = TaskContext {
                app,
                environment,
                remote: self.connector.connect(host),
                local: &self.local,
                with: self.with,
            };
            let output = task
                .run(&ctx)
                .await
                .with_context(|| format!("{} failed for {} on {host}", task.name(), app.name))?;
            outputs.push(output);
        }
        Ok(outputs)
    }
}
