//! HTTP basic-auth credentials for nginx.
//!
//! Credentials are collected interactively and only ever passed on to
//! `htpasswd` on the target host.

use std::fmt;

use crate::domain::shell::quote;

/// Username/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub secret: String,
}

impl Credential {
    #[must_use]
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

/// One `htpasswd` call; `secret` is fed on stdin, never on the command line.
#[derive(PartialEq, Eq)]
pub struct HtpasswdWrite<'a> {
    pub command: String,
    pub secret: &'a str,
}

impl fmt::Debug for HtpasswdWrite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtpasswdWrite")
            .field("command", &self.command)
            .field("secret", &"***")
            .finish()
    }
}

/// `htpasswd` invocations writing `credentials` to `path`.
///
/// The first invocation creates (truncates) the file; credentials with an
/// empty secret are skipped.
#[must_use]
pub fn htpasswd_writes<'a>(path: &str, credentials: &'a [Credential]) -> Vec<HtpasswdWrite<'a>> {
    credentials
        .iter()
        .filter(|c| !c.secret.is_empty())
        .enumerate()
        .map(|(i, c)| {
            let opts = if i == 0 { "-idc" } else { "-id" };
            HtpasswdWrite {
                command: format!("htpasswd {opts} {} {}", quote(path), quote(&c.username)),
                secret: &c.secret,
            }
        })
        .collect()
}

/// nginx directives requiring basic auth against `htpasswd_path`.
#[must_use]
pub fn auth_directives(realm: &str, htpasswd_path: &str) -> String {
    format!(
        "proxy_set_header Authorization $http_authorization;\n\
         proxy_pass_header  Authorization;\n\
         auth_basic \"{realm}\";\n\
         auth_basic_user_file {htpasswd_path};"
    )
}
