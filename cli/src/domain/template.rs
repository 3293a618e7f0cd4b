//! Per-task template variables.

use std::collections::BTreeMap;

use minijinja::Value;
use serde::Serialize;

/// Key/value set of template variables assembled for one task run.
///
/// Created fresh per task and dropped when the task finishes; nothing in it
/// outlives the invocation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProvisioningContext {
    vars: BTreeMap<String, Value>,
}

impl ProvisioningContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Serialize) -> &mut Self {
        self.vars
            .insert(key.to_string(), Value::from_serialize(&value));
        self
    }

    /// Builder-style [`set`](Self::set) for one-off contexts.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}
