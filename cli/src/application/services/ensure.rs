//! Shell implementation of the [`Ensure`] capability on top of any
//! [`RemoteHost`].
//!
//! Every operation checks first and only mutates when the host differs from
//! the requested state.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::application::ports::{DirOptions, Ensure, RemoteHost, RunAs, UploadOptions};
use crate::domain::shell::{in_virtualenv, quote};

const POSTGRES: RunAs<'static> = RunAs::User("postgres");

/// Escape a value for use inside a single-quoted SQL literal.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

async fn psql_flag(host: &(impl RemoteHost + ?Sized), query: &str) -> Result<bool> {
    let out = host
        .run_as(&format!("psql -tAc {}", quote(query)), POSTGRES)
        .await?;
    Ok(out.trim() == "1")
}

impl<H: RemoteHost> Ensure for H {
    async fn ensure_package(&self, name: &str) -> Result<bool> {
        let probe = self
            .exec(
                &format!("dpkg-query -W -f='${{Status}}' {}", quote(name)),
                RunAs::Root,
            )
            .await?;
        if probe.status.success()
            && String::from_utf8_lossy(&probe.stdout).contains("install ok installed")
        {
            return Ok(false);
        }
        tracing::info!(host = self.host(), package = name, "installing package");
        self.sudo(&format!(
            "DEBIAN_FRONTEND=noninteractive apt-get install -q -y {}",
            quote(name)
        ))
        .await?;
        Ok(true)
    }

    async fn ensure_user(&self, name: &str, shell: &str) -> Result<bool> {
        if self
            .exec(&format!("id -u {}", quote(name)), RunAs::Root)
            .await?
            .status
            .success()
        {
            return Ok(false);
        }
        self.sudo(&format!(
            "useradd --create-home --shell {} {}",
            quote(shell),
            quote(name)
        ))
        .await?;
        Ok(true)
    }

    async fn ensure_directory(&self, path: &str, opts: &DirOptions<'_>) -> Result<bool> {
        let mut changed = false;
        let probe = self
            .exec(&format!("test -d {}", quote(path)), RunAs::Root)
            .await?;
        if !probe.status.success() {
            self.sudo(&format!("mkdir -p {}", quote(path))).await?;
            changed = true;
        }
        if opts.owner.is_none() && opts.mode.is_none() {
            return Ok(changed);
        }

        let stat = self
            .sudo(&format!("stat -c '%U %a' {}", quote(path)))
            .await?;
        let mut parts = stat.split_whitespace();
        let (owner, mode) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));
        if let Some(want) = opts.owner {
            if owner != want {
                self.sudo(&format!("chown {}:{} {}", quote(want), quote(want), quote(path)))
                    .await?;
                changed = true;
            }
        }
        if let Some(want) = opts.mode {
            if mode != format!("{want:o}") {
                self.sudo(&format!("chmod {want:o} {}", quote(path))).await?;
                changed = true;
            }
        }
        Ok(changed)
    }

    async fn ensure_file(
        &self,
        path: &str,
        contents: &[u8],
        opts: &UploadOptions<'_>,
    ) -> Result<bool> {
        let want = format!("{:x}", Sha256::digest(contents));
        let probe = self
            .exec(&format!("sha256sum {}", quote(path)), RunAs::Root)
            .await?;
        if probe.status.success() {
            let have = String::from_utf8_lossy(&probe.stdout);
            if have.split_whitespace().next() == Some(want.as_str()) {
                return Ok(false);
            }
        }
        self.upload(contents, path, opts).await?;
        Ok(true)
    }

    async fn remove_file(&self, path: &str) -> Result<bool> {
        if !self.exists(path).await? {
            return Ok(false);
        }
        self.sudo(&format!("rm -f {}", quote(path))).await?;
        Ok(true)
    }

    async fn ensure_pg_role(&self, name: &str, password: &str) -> Result<bool> {
        let query = format!("SELECT 1 FROM pg_roles WHERE rolname={}", sql_literal(name));
        if psql_flag(self, &query).await? {
            return Ok(false);
        }
        let create = format!(
            "CREATE USER \"{name}\" WITH PASSWORD {}",
            sql_literal(password)
        );
        self.run_as(&format!("psql -c {}", quote(&create)), POSTGRES)
            .await?;
        Ok(true)
    }

    async fn pg_database_exists(&self, name: &str) -> Result<bool> {
        let query = format!(
            "SELECT 1 FROM pg_database WHERE datname={}",
            sql_literal(name)
        );
        psql_flag(self, &query).await
    }

    async fn ensure_pg_database(&self, name: &str, owner: &str) -> Result<bool> {
        if self.pg_database_exists(name).await? {
            return Ok(false);
        }
        self.run_as(
            &format!(
                "createdb --owner={} --template=template0 --encoding=UTF8 {}",
                quote(owner),
                quote(name)
            ),
            POSTGRES,
        )
        .await?;
        Ok(true)
    }

    async fn ensure_pip_packages(&self, venv: &str, requirements: &[String]) -> Result<bool> {
        if requirements.is_empty() {
            return Ok(false);
        }
        let freeze = in_virtualenv(venv, "pip freeze");
        let before = self.sudo(&freeze).await?;
        let args: Vec<String> = requirements
            .iter()
            .map(|r| match r.strip_prefix("-e ") {
                Some(url) => format!("-e {}", quote(url.trim())),
                None => quote(r),
            })
            .collect();
        self.sudo(&in_virtualenv(
            venv,
            &format!("pip install -q {}", args.join(" ")),
        ))
        .await?;
        let after = self.sudo(&freeze).await?;
        Ok(before != after)
    }

    async fn service_restart(&self, name: &str) -> Result<()> {
        self.sudo(&format!("service {} restart", quote(name))).await?;
        Ok(())
    }

    async fn service_reload(&self, name: &str) -> Result<()> {
        self.sudo(&format!("service {} reload", quote(name))).await?;
        Ok(())
    }
}
