//! Application context — unified state passed to every command handler.
//!
//! `AppContext` bundles output settings, registry location, operator
//! overrides and the long-lived collaborators (prompter, templates). Adding
//! a new cross-cutting concern requires only one field change here; zero
//! command signatures change.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::dispatch::{Collaborators, DeploySettings, TaskDispatcher};
use crate::application::ports::ProgressReporter;
use crate::domain::app::AppDescriptor;
use crate::domain::registry::AppRegistry;
use crate::infra::command_runner::{DEFAULT_REMOTE_TIMEOUT, TokioCommandRunner};
use crate::infra::prompter::DialoguerPrompter;
use crate::infra::registry::{app_name, default_assets_dir, load_registry, registry_path};
use crate::infra::ssh::SshConnector;
use crate::infra::templates::EmbeddedTemplates;
use crate::infra::workstation::LocalWorkstation;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Env var that, like `CI`, turns off interactive prompts.
pub const YES_ENV: &str = "APPCONFIG_YES";

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `APPCONFIG_YES` env vars).
    pub yes: bool,
}

/// Where the registry and app come from, and which hosts are pinned.
#[derive(Default)]
pub struct TargetFlags {
    pub app: Option<String>,
    pub registry: Option<PathBuf>,
    pub hosts: Vec<String>,
    pub assets_dir: Option<PathBuf>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
    /// Target selection options.
    pub target: TargetFlags,
}

/// The dispatcher used by every remote command.
pub type SshDispatcher<'a> =
    TaskDispatcher<'a, SshConnector<TokioCommandRunner>, LocalWorkstation<TokioCommandRunner>>;

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` and passed as `&AppContext` to all
/// command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `APPCONFIG_YES`
    /// environment variables are present.
    pub non_interactive: bool,
    /// Resolved registry file location.
    pub registry_path: PathBuf,
    app_flag: Option<String>,
    pinned_hosts: Vec<String>,
    prompter: DialoguerPrompter,
    templates: EmbeddedTemplates,
    settings: DeploySettings,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry location cannot be determined or the
    /// embedded templates fail to compile.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var(YES_ENV).is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let registry_path = registry_path(flags.target.registry.as_deref())?;
        let settings = DeploySettings {
            assets_dir: flags
                .target
                .assets_dir
                .unwrap_or_else(|| default_assets_dir(&registry_path)),
            ..DeploySettings::default()
        };

        Ok(Self {
            // Progress lines would corrupt JSON on stdout.
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            non_interactive,
            registry_path,
            app_flag: flags.target.app,
            pinned_hosts: flags.target.hosts,
            prompter: DialoguerPrompter::new(non_interactive),
            templates: EmbeddedTemplates::load()?,
            settings,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Load and validate the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read or is invalid.
    pub fn registry(&self) -> Result<AppRegistry> {
        load_registry(&self.registry_path)
    }

    /// Resolve the target app from `--app`, `APPCONFIG_APP` or the current
    /// directory name.
    ///
    /// # Errors
    ///
    /// Returns an error if no name can be inferred or the app is unknown.
    pub fn resolve_app<'r>(&self, registry: &'r AppRegistry) -> Result<&'r AppDescriptor> {
        let name = app_name(self.app_flag.as_deref())?;
        Ok(registry.resolve(&name)?)
    }

    /// Build the SSH dispatcher, reporting progress through `reporter`.
    #[must_use]
    pub fn dispatcher<'a>(&'a self, reporter: &'a dyn ProgressReporter) -> SshDispatcher<'a> {
        let with = Collaborators {
            prompter: &self.prompter,
            reporter,
            templates: &self.templates,
            settings: &self.settings,
        };
        TaskDispatcher::new(
            SshConnector::new(TokioCommandRunner::new(DEFAULT_REMOTE_TIMEOUT)),
            LocalWorkstation::new(TokioCommandRunner::default()),
            self.pinned_hosts.clone(),
            with,
        )
    }
}
