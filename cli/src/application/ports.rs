//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::error::RemoteError;
use crate::domain::shell::quote;
use crate::domain::template::ProvisioningContext;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Identity a remote command runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAs<'a> {
    /// The SSH login user, no privilege escalation.
    Login,
    /// `sudo` as root.
    Root,
    /// `sudo -u <user>`.
    User(&'a str),
}

/// File attributes applied after an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions<'a> {
    /// Octal permission bits, e.g. `0o644`.
    pub mode: Option<u32>,
    /// Owner (and group) of the uploaded file. Defaults to root.
    pub owner: Option<&'a str>,
}

impl<'a> UploadOptions<'a> {
    #[must_use]
    pub fn mode(mode: u32) -> Self {
        Self {
            mode: Some(mode),
            owner: None,
        }
    }

    #[must_use]
    pub fn owned_by(mut self, owner: &'a str) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Directory attributes for [`Ensure::ensure_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirOptions<'a> {
    pub owner: Option<&'a str>,
    pub mode: Option<u32>,
}

// ── Remote Execution Ports ────────────────────────────────────────────────────

/// A connection to one remote host.
///
/// Implementations only provide `host`, the two `exec` variants, and
/// `upload`; the checked helpers are built on top of them.
#[allow(async_fn_in_trait)]
pub trait RemoteHost {
    /// The host alias every command is attributed to.
    fn host(&self) -> &str;

    /// Run a shell command and capture its output. Never fails on a
    /// non-zero exit status; only on transport errors.
    async fn exec(&self, command: &str, run_as: RunAs<'_>) -> Result<Output>;

    /// Write `content` to `remote_path` as root.
    ///
    /// Implementations must never leave a partially written file at
    /// `remote_path`.
    async fn upload(&self, content: &[u8], remote_path: &str, opts: &UploadOptions<'_>)
    -> Result<()>;

    /// [`exec`](Self::exec) with `stdin` piped to the command.
    ///
    /// `stdin` never reaches logs or error messages; secrets go here.
    async fn exec_with_stdin(&self, command: &str, stdin: &[u8], run_as: RunAs<'_>)
    -> Result<Output>;

    /// Run `command` and return stdout, failing on a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::CommandFailed` on a non-zero exit status.
    async fn run_as(&self, command: &str, run_as: RunAs<'_>) -> Result<String> {
        let output = self.exec(command, run_as).await?;
        checked_stdout(self.host(), command, output)
    }

    /// Run as root with `stdin` piped in, failing on a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::CommandFailed` on a non-zero exit status. The
    /// error names the command but never carries `stdin`.
    async fn sudo_with_stdin(&self, command: &str, stdin: &[u8]) -> Result<String> {
        let output = self.exec_with_stdin(command, stdin, RunAs::Root).await?;
        checked_stdout(self.host(), command, output)
    }

    /// Run as the login user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-zero exit.
    async fn run(&self, command: &str) -> Result<String> {
        self.run_as(command, RunAs::Login).await
    }

    /// Run as root.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-zero exit.
    async fn sudo(&self, command: &str) -> Result<String> {
        self.run_as(command, RunAs::Root).await
    }

    /// Whether `path` exists on the host.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure.
    async fn exists(&self, path: &str) -> Result<bool> {
        let output = self
            .exec(&format!("test -e {}", quote(path)), RunAs::Root)
            .await?;
        Ok(output.status.success())
    }
}

/// Stdout of `output`, or `CommandFailed` on a non-zero exit.
fn checked_stdout(host: &str, command: &str, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(RemoteError::CommandFailed {
            host: host.to_string(),
            command: command.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Declarative "ensure present" capability.
///
/// Each call converges the host to the requested state and reports whether
/// anything had to change. Calling twice is always safe.
#[allow(async_fn_in_trait)]
pub trait Ensure {
    /// Install a Debian package unless already installed.
    async fn ensure_package(&self, name: &str) -> Result<bool>;

    /// [`ensure_package`](Self::ensure_package) for each name; true if any changed.
    async fn ensure_packages(&self, names: &[String]) -> Result<bool> {
        let mut changed = false;
        for name in names {
            changed |= self.ensure_package(name).await?;
        }
        Ok(changed)
    }

    /// Create a login user with `shell` unless it exists.
    async fn ensure_user(&self, name: &str, shell: &str) -> Result<bool>;

    /// Create a directory and apply owner/mode.
    async fn ensure_directory(&self, path: &str, opts: &DirOptions<'_>) -> Result<bool>;

    /// Make `path` hold exactly `contents`; uploads only when they differ.
    async fn ensure_file(&self, path: &str, contents: &[u8], opts: &UploadOptions<'_>)
    -> Result<bool>;

    /// Delete `path` if present.
    async fn remove_file(&self, path: &str) -> Result<bool>;

    /// PostgreSQL login role with the given password.
    async fn ensure_pg_role(&self, name: &str, password: &str) -> Result<bool>;

    async fn pg_database_exists(&self, name: &str) -> Result<bool>;

    /// PostgreSQL database owned by `owner`.
    async fn ensure_pg_database(&self, name: &str, owner: &str) -> Result<bool>;

    /// Install pip requirements into `venv` (as root, with `HOME` set).
    async fn ensure_pip_packages(&self, venv: &str, requirements: &[String]) -> Result<bool>;

    async fn service_restart(&self, name: &str) -> Result<()>;

    async fn service_reload(&self, name: &str) -> Result<()>;
}

/// Opens a [`RemoteHost`] for a host alias.
pub trait Connector {
    type Host: RemoteHost;

    fn connect(&self, host: &str) -> Self::Host;
}

// ── Operator Workstation Port ─────────────────────────────────────────────────

/// Commands and files on the operator's machine.
#[allow(async_fn_in_trait)]
pub trait Workstation {
    /// Run a local program and capture its output.
    async fn local(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Read a local file.
    fn read_local(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a local file, creating parent directories.
    fn write_local(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Pause the control flow, e.g. to let a restarted process settle.
    async fn sleep(&self, duration: Duration);
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Interaction Ports ─────────────────────────────────────────────────────────

/// Operator questions: destructive-action confirmation and credential entry.
///
/// Injected so non-interactive callers can supply recorded answers.
pub trait Prompter {
    /// Yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    /// Free-text answer; an empty answer yields `default` when given.
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String>;
    /// Hidden input; may be empty.
    fn password(&self, prompt: &str) -> Result<String>;
}

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Template Port ─────────────────────────────────────────────────────────────

/// Renders named configuration templates.
pub trait TemplateRenderer {
    /// Render template `name` with `vars`. Fails on unknown templates and on
    /// undefined variables; never returns partial output.
    fn render(&self, name: &str, vars: &ProvisioningContext) -> Result<String>;
}
