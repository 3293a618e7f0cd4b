//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags, TargetFlags};
use crate::commands;

/// Deploy and operate registered web apps on their test and production hosts
#[derive(Parser)]
#[command(
    name = "appconfig",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// App to operate on (default: name of the current directory)
    #[arg(long, global = true, env = "APPCONFIG_APP")]
    pub app: Option<String>,

    /// Registry file (default: ./apps.yaml, then ~/.appconfig/apps.yaml)
    #[arg(long, global = true, env = "APPCONFIG_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Run on these hosts instead of the app's configured host
    #[arg(short = 'H', long, global = true, value_delimiter = ',')]
    pub hosts: Vec<String>,

    /// Answer prompts with their defaults
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Directory with build sources (default: <registry dir>/assets)
    #[arg(long, global = true)]
    pub assets_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision, configure and restart the app
    Deploy(commands::deploy::DeployArgs),

    /// Start the app under supervisord
    Start(commands::EnvArgs),

    /// Pause the app under supervisord
    Stop(commands::EnvArgs),

    /// Upload the maintenance page
    Maintenance(commands::maintenance::MaintenanceArgs),

    /// Put varnish in front of the app (production)
    Cache,

    /// Take varnish out of the app's path (production)
    Uncache,

    /// Regenerate the app's download files
    CreateDownloads(commands::EnvArgs),

    /// Run one of the app's scripts on its host
    RunScript(commands::script::RunScriptArgs),

    /// Write the app's installed python requirements
    PipFreeze(commands::freeze::PipFreezeArgs),

    /// Write requirements for every app on its production host
    PipFreezeAll(commands::freeze::PipFreezeAllArgs),

    /// Remove the app's supervisor and nginx config
    Uninstall(commands::EnvArgs),

    /// Check the registry for conflicts
    Check,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            app,
            registry,
            hosts,
            yes,
            assets_dir,
            json,
            quiet,
            no_color,
            command,
        } = self;

        let ctx = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
            target: TargetFlags {
                app,
                registry,
                hosts,
                assets_dir,
            },
        })?;

        match command {
            Command::Deploy(args) => commands::deploy::run(&args, &ctx).await,
            Command::Start(args) => commands::start::run(&args, &ctx).await,
            Command::Stop(args) => commands::stop::run(&args, &ctx).await,
            Command::Maintenance(args) => commands::maintenance::run(&args, &ctx).await,
            Command::Cache => commands::cache::enable(&ctx).await,
            Command::Uncache => commands::cache::disable(&ctx).await,
            Command::CreateDownloads(args) => commands::downloads::run(&args, &ctx).await,
            Command::RunScript(args) => commands::script::run(&args, &ctx).await,
            Command::PipFreeze(args) => commands::freeze::run(&args, &ctx).await,
            Command::PipFreezeAll(args) => commands::freeze::run_all(&args, &ctx).await,
            Command::Uninstall(args) => commands::uninstall::run(&args, &ctx).await,
            Command::Check => commands::check::run(&ctx),
            Command::Version => commands::version::run(&ctx),
        }
    }
}
