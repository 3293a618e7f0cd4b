//! The operator's own machine: local programs, files and the clock.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, Workstation};

/// [`Workstation`] backed by a `CommandRunner`, `std::fs` and tokio's timer.
#[derive(Debug, Clone)]
pub struct LocalWorkstation<R> {
    runner: R,
}

impl<R: CommandRunner> LocalWorkstation<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> Workstation for LocalWorkstation<R> {
    async fn local(&self, program: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(program, ?args, "local exec");
        self.runner.run(program, args).await
    }

    fn read_local(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
    }

    fn write_local(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(path, contents).with_context(|| format!("cannot write {}", path.display()))
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
