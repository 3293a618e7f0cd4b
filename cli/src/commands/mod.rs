//! Command implementations

pub mod cache;
pub mod check;
pub mod deploy;
pub mod downloads;
pub mod freeze;
pub mod maintenance;
pub mod script;
pub mod start;
pub mod stop;
pub mod uninstall;
pub mod version;

use clap::Args;

use crate::domain::environment::Environment;

/// The environment argument shared by host-bound commands.
#[derive(Args, Debug, Clone)]
pub struct EnvArgs {
    /// Target environment: `test` or `production`
    pub environment: Environment,
}
