//! Embedded configuration templates rendered with `minijinja`.
//!
//! At compile time, `include_dir!` embeds everything under `templates/`:
//!   - `supervisor.conf`, `config.ini`              — the app process
//!   - `nginx-app.conf`, `nginx-default.conf`,
//!     `logrotate.conf`, `503.html`                 — the web front
//!   - `varnish`, `varnish_main.vcl`,
//!     `varnish_site.vcl`                           — cache fronting
//!   - `pg_collkey_Makefile`                        — the collkey build

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};
use minijinja::{Environment, UndefinedBehavior};

use crate::application::ports::TemplateRenderer;
use crate::domain::template::ProvisioningContext;

static EMBEDDED_TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// [`TemplateRenderer`] over the embedded templates.
///
/// Undefined variables are errors, so a template never renders with a hole.
pub struct EmbeddedTemplates {
    env: Environment<'static>,
}

impl EmbeddedTemplates {
    /// Compile every embedded template.
    ///
    /// # Errors
    ///
    /// Returns an error if a template is not UTF-8 or fails to parse.
    pub fn load() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        for file in EMBEDDED_TEMPLATES.files() {
            let name = file
                .path()
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("non UTF-8 template name"))?;
            let source = file
                .contents_utf8()
                .ok_or_else(|| anyhow::anyhow!("template {name} is not UTF-8"))?;
            env.add_template(name, source)
                .with_context(|| format!("parsing template {name}"))?;
        }
        Ok(Self { env })
    }

    /// Names of all loaded templates, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.env.templates().map(|(name, _)| name).collect();
        names.sort_unstable();
        names
    }
}

impl TemplateRenderer for EmbeddedTemplates {
    fn render(&self, name: &str, vars: &ProvisioningContext) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("unknown template {name}"))?;
        template
            .render(vars)
            .with_context(|| format!("cannot render {name}"))
    }
}
