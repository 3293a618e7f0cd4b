//! Application descriptors.
//!
//! Pure data: identity, network facts, host references, and every filesystem
//! path a deployment touches. Paths are derived from `name` only.

use serde::{Deserialize, Serialize};

/// Static record describing one deployable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    /// Registry key; filled in from the map key when loading.
    #[serde(default)]
    pub name: String,
    /// Port the app's web process listens on (localhost only).
    pub port: u16,
    /// Public domain served by nginx.
    pub domain: String,
    /// Host alias used for the `test` environment.
    pub test: String,
    /// Host alias used for the `production` environment.
    pub production: String,
    /// Number of web workers.
    #[serde(default = "default_workers")]
    pub workers: u32,
    /// Expected downtime in hours, shown on the maintenance page.
    #[serde(default = "default_deploy_duration")]
    pub deploy_duration: u32,
    /// Debian packages the app needs on top of the base stack.
    #[serde(default)]
    pub require_deb: Vec<String>,
    /// Python packages installed into the app's virtualenv.
    #[serde(default)]
    pub require_pip: Vec<String>,
    /// Additional source packages checked out next to the app.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub pg_unaccent: bool,
    #[serde(default)]
    pub pg_collkey: bool,
    #[serde(default)]
    pub with_blog: bool,
    /// Build and install bibutils on the host.
    #[serde(default)]
    pub bibutils: bool,
}

fn default_workers() -> u32 {
    3
}

fn default_deploy_duration() -> u32 {
    1
}

impl AppDescriptor {
    /// Copy of this descriptor with a different web port (e.g. when
    /// nginx has to proxy through varnish instead of the app).
    #[must_use]
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    /// Copy of this descriptor with a different worker count.
    #[must_use]
    pub fn with_workers(&self, workers: u32) -> Self {
        Self {
            workers,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn home(&self) -> String {
        format!("/home/{}", self.name)
    }

    #[must_use]
    pub fn venv(&self) -> String {
        format!("/usr/venvs/{}", self.name)
    }

    /// Path of an executable inside the app's virtualenv.
    #[must_use]
    pub fn bin(&self, command: &str) -> String {
        format!("{}/bin/{command}", self.venv())
    }

    /// Editable source checkout of the app itself.
    #[must_use]
    pub fn src(&self) -> String {
        format!("{}/src/{}", self.venv(), self.name)
    }

    #[must_use]
    pub fn logs(&self) -> String {
        format!("/var/log/{}", self.name)
    }

    #[must_use]
    pub fn www(&self) -> String {
        format!("/var/www/{}", self.name)
    }

    /// The paste config file the app is served from.
    #[must_use]
    pub fn config(&self) -> String {
        format!("{}/config.ini", self.home())
    }

    #[must_use]
    pub fn supervisor(&self) -> String {
        format!("/etc/supervisor/conf.d/{}.conf", self.name)
    }

    #[must_use]
    pub fn nginx_location(&self) -> String {
        format!("/etc/nginx/locations.d/{}.conf", self.name)
    }

    #[must_use]
    pub fn nginx_site(&self) -> String {
        format!("/etc/nginx/sites-enabled/{}.conf", self.name)
    }

    #[must_use]
    pub fn nginx_htpasswd(&self) -> String {
        format!("/etc/nginx/htpasswd/{}.htpasswd", self.name)
    }

    #[must_use]
    pub fn varnish_site(&self) -> String {
        format!("/etc/varnish/sites/{}.vcl", self.name)
    }

    #[must_use]
    pub fn downloads(&self) -> String {
        format!("{}/{}/static/download", self.src(), self.name)
    }

    /// Template-facing view: plain fields plus every derived path.
    #[must_use]
    pub fn view(&self) -> AppView {
        AppView {
            name: self.name.clone(),
            port: self.port,
            domain: self.domain.clone(),
            workers: self.workers,
            deploy_duration: self.deploy_duration,
            home: self.home(),
            venv: self.venv(),
            src: self.src(),
            logs: self.logs(),
            www: self.www(),
            config: self.config(),
            supervisor: self.supervisor(),
            nginx_location: self.nginx_location(),
            nginx_site: self.nginx_site(),
            nginx_htpasswd: self.nginx_htpasswd(),
            varnish_site: self.varnish_site(),
        }
    }
}

/// Serializable snapshot of an [`AppDescriptor`] handed to templates.
#[derive(Debug, Clone, Serialize)]
pub struct AppView {
    pub name: String,
    pub port: u16,
    pub domain: String,
    pub workers: u32,
    pub deploy_duration: u32,
    pub home: String,
    pub venv: String,
    pub src: String,
    pub logs: String,
    pub www: String,
    pub config: String,
    pub supervisor: String,
    pub nginx_location: String,
    pub nginx_site: String,
    pub nginx_htpasswd: String,
    pub varnish_site: String,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn sample(name: &str, port: u16) -> AppDescriptor {
    AppDescriptor {
        name: name.to_string(),
        port,
        domain: format!("{name}.example.org"),
        test: "h1".to_string(),
        production: "h2".to_string(),
        workers: 7,
        deploy_duration: 2,
        require_deb: Vec::new(),
        require_pip: Vec::new(),
        dependencies: Vec::new(),
        pg_unaccent: false,
        pg_collkey: false,
        with_blog: false,
        bibutils: false,
    }
}
