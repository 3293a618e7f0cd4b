//! Terminal implementation of the `Prompter` port.

use anyhow::Result;

use crate::application::ports::Prompter;

/// Prompts on the terminal via `dialoguer`.
///
/// When non-interactive (`--yes`, `CI`, `APPCONFIG_YES`), `confirm` and
/// `input` return their defaults without prompting. Secrets have no
/// default, so `password` fails instead of guessing.
#[derive(Debug, Clone, Copy)]
pub struct DialoguerPrompter {
    non_interactive: bool,
}

impl DialoguerPrompter {
    #[must_use]
    pub fn new(non_interactive: bool) -> Self {
        Self { non_interactive }
    }
}

impl Prompter for DialoguerPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            tracing::debug!(prompt, default, "non-interactive confirm");
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        if self.non_interactive {
            return default
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("no default for '{prompt}' in non-interactive mode"));
        }
        let mut input = dialoguer::Input::<String>::new()
            .with_prompt(prompt.trim_end_matches([' ', ':']))
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string()).show_default(false);
        }
        Ok(input.interact_text()?)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        if self.non_interactive {
            anyhow::bail!("'{prompt}' needs a terminal; run without --yes");
        }
        let secret = dialoguer::Password::new()
            .with_prompt(prompt.trim_end_matches([' ', ':']))
            .allow_empty_password(true)
            .interact()?;
        Ok(secret)
    }
}
