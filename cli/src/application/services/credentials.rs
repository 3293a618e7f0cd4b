//! Interactive credential collection.

use anyhow::Result;

use crate::application::dispatch::TaskContext;
use crate::application::ports::{DirOptions, Ensure, Prompter, RemoteHost, Workstation};
use crate::domain::app::AppDescriptor;
use crate::domain::credentials::{Credential, auth_directives, htpasswd_writes};

/// Ask for a secret until a non-empty one is given.
///
/// # Errors
///
/// Returns an error if the prompt itself fails (e.g. no TTY).
pub fn require_secret(prompter: &dyn Prompter, prompt: &str) -> Result<String> {
    loop {
        let secret = prompter.password(prompt)?;
        if !secret.is_empty() {
            return Ok(secret);
        }
    }
}

/// Result of setting up nginx basic auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpAuth {
    /// Whether the public site requires the app user's password.
    pub restricted: bool,
    /// nginx directives enabling basic auth.
    pub directives: String,
}

/// Collect passwords for the app user (optional) and `admin` (required) and
/// write them to the app's htpasswd file.
///
/// # Errors
///
/// Returns an error if prompting or writing the htpasswd file fails.
pub async fn http_auth<H: RemoteHost, W: Workstation>(
    ctx: &TaskContext<'_, H, W>,
    app: &AppDescriptor,
) -> Result<HttpAuth> {
    let prompter = ctx.with.prompter;
    let app_secret =
        prompter.password(&format!("HTTP Basic Auth password for user {}: ", app.name))?;
    let admin_secret = require_secret(prompter, "HTTP Basic Auth password for user admin: ")?;

    let path = app.nginx_htpasswd();
    if let Some((dir, _)) = path.rsplit_once('/') {
        ctx.remote.ensure_directory(dir, &DirOptions::default()).await?;
    }
    let credentials = [
        Credential::new(app.name.as_str(), app_secret),
        Credential::new("admin", admin_secret),
    ];
    for write in htpasswd_writes(&path, &credentials) {
        ctx.remote
            .sudo_with_stdin(&write.command, write.secret.as_bytes())
            .await?;
    }

    Ok(HttpAuth {
        restricted: !credentials[0].secret.is_empty(),
        directives: auth_directives(&app.name, &path),
    })
}

/// Blog settings taken from the environment before prompting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Resolved blog settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogSettings {
    pub host: String,
    pub user: String,
    pub password: String,
}

/// Fill in blog settings: overrides first, then prompts with defaults.
///
/// # Errors
///
/// Returns an error if prompting fails.
pub fn blog_settings(
    prompter: &dyn Prompter,
    app: &AppDescriptor,
    overrides: &BlogOverrides,
) -> Result<BlogSettings> {
    let given = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

    let host = match given(&overrides.host) {
        Some(host) => host,
        None => {
            let default = format!("blog.{}", app.domain);
            prompter.input(&format!("Blog host [{default}]: "), Some(&default))?
        }
    };
    let user = match given(&overrides.user) {
        Some(user) => user,
        None => prompter.input(&format!("Blog user [{}]: ", app.name), Some(&app.name))?,
    };
    let password = match given(&overrides.password) {
        Some(password) => password,
        None => require_secret(prompter, "Blog password: ")?,
    };
    Ok(BlogSettings {
        host,
        user,
        password,
    })
}
