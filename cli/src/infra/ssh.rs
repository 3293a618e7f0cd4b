//! Infrastructure implementation of the remote execution ports over `ssh`.
//!
//! `SshHost<R>` routes every remote command through a `CommandRunner`, so
//! tests can inject a recording runner without spawning processes. Host
//! aliases are resolved by the operator's `~/.ssh/config`.

use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, Connector, RemoteHost, RunAs, UploadOptions};
use crate::domain::shell::quote;

/// Options passed to every `ssh` invocation. Prompts would hang the run.
const SSH_OPTIONS: &[&str] = &["-o", "BatchMode=yes", "-o", "ConnectTimeout=15"];

/// Suffix of the staging file an upload writes before moving into place.
const STAGING_SUFFIX: &str = ".appconfig-upload";

/// The remote command line for `command` under `run_as`.
///
/// Commands run in `bash` since some of them `source` virtualenvs.
#[must_use]
pub fn remote_command(command: &str, run_as: RunAs<'_>) -> String {
    let shell = format!("bash -c {}", quote(command));
    match run_as {
        RunAs::Login => shell,
        RunAs::Root => format!("sudo -H {shell}"),
        RunAs::User(user) => format!("sudo -H -u {} {shell}", quote(user)),
    }
}

/// Shell script that stores stdin at `path` atomically.
///
/// The content lands in a sibling staging file first; attributes are set
/// there, and only then is it renamed over `path`. Any failure removes the
/// staging file and leaves `path` untouched.
#[must_use]
pub fn upload_script(path: &str, opts: &UploadOptions<'_>) -> String {
    let staging = quote(&format!("{path}{STAGING_SUFFIX}"));
    let owner = opts.owner.unwrap_or("root");
    let mut steps = vec![
        format!("cat > {staging}"),
        format!("chown {} {staging}", quote(&format!("{owner}:{owner}"))),
    ];
    if let Some(mode) = opts.mode {
        steps.push(format!("chmod {mode:o} {staging}"));
    }
    steps.push(format!("mv -f {staging} {}", quote(path)));
    format!("{{ {}; }} || {{ rm -f {staging}; exit 1; }}", steps.join(" && "))
}

/// A connection to one host alias.
#[derive(Debug, Clone)]
pub struct SshHost<R> {
    host: String,
    runner: R,
}

impl<R: CommandRunner> SshHost<R> {
    #[must_use]
    pub fn new(host: impl Into<String>, runner: R) -> Self {
        Self {
            host: host.into(),
            runner,
        }
    }

    /// ssh reserves exit status 255 for its own failures.
    fn reachable(&self, output: Output) -> Result<Output> {
        if output.status.code() == Some(255) {
            anyhow::bail!(
                "cannot reach {}: {}",
                self.host,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }

    fn argv<'a>(&'a self, remote: &'a str) -> Vec<&'a str> {
        let mut args: Vec<&str> = SSH_OPTIONS.to_vec();
        args.push(&self.host);
        args.push("--");
        args.push(remote);
        args
    }
}

impl<R: CommandRunner> RemoteHost for SshHost<R> {
    fn host(&self) -> &str {
        &self.host
    }

    async fn exec(&self, command: &str, run_as: RunAs<'_>) -> Result<Output> {
        tracing::debug!(host = %self.host, ?run_as, command, "remote exec");
        let remote = remote_command(command, run_as);
        let output = self
            .runner
            .run("ssh", &self.argv(&remote))
            .await
            .with_context(|| format!("ssh to {} failed", self.host))?;
        self.reachable(output)
    }

    async fn exec_with_stdin(
        &self,
        command: &str,
        stdin: &[u8],
        run_as: RunAs<'_>,
    ) -> Result<Output> {
        tracing::debug!(
            host = %self.host,
            ?run_as,
            command,
            stdin_bytes = stdin.len(),
            "remote exec"
        );
        let remote = remote_command(command, run_as);
        let output = self
            .runner
            .run_with_stdin("ssh", &self.argv(&remote), stdin)
            .await
            .with_context(|| format!("ssh to {} failed", self.host))?;
        self.reachable(output)
    }

    async fn upload(
        &self,
        content: &[u8],
        remote_path: &str,
        opts: &UploadOptions<'_>,
    ) -> Result<()> {
        tracing::debug!(host = %self.host, remote_path, bytes = content.len(), "upload");
        let remote = remote_command(&upload_script(remote_path, opts), RunAs::Root);
        let output = self
            .runner
            .run_with_stdin("ssh", &self.argv(&remote), content)
            .await
            .with_context(|| format!("ssh to {} failed", self.host))?;
        if !output.status.success() {
            anyhow::bail!(
                "upload of {remote_path} to {} failed: {}",
                self.host,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Opens [`SshHost`]s sharing one runner configuration.
#[derive(Debug, Clone)]
pub struct SshConnector<R> {
    runner: R,
}

impl<R> SshConnector<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner + Clone> Connector for SshConnector<R> {
    type Host = SshHost<R>;

    fn connect(&self, host: &str) -> SshHost<R> {
        SshHost::new(host, self.runner.clone())
    }
}
