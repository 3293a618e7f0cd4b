//! Application layer — port trait definitions, task dispatch and use-case
//! orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod dispatch;
pub mod ports;
pub mod services;

pub use dispatch::{Collaborators, DeploySettings, Task, TaskContext, TaskDispatcher};
pub use ports::{
    CommandRunner, Connector, Ensure, ProgressReporter, Prompter, RemoteHost, RunAs,
    TemplateRenderer, UploadOptions, Workstation,
};
