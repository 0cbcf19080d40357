use std::fmt;

use serde::{Deserialize, Serialize};

/// A single environment binding for a runner container.
///
/// Bindings marked `secure` are delivered to the provider as secret values
/// and are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    name: String,
    value: String,
    #[serde(default)]
    secure: bool,
}

impl EnvVar {
    pub fn plain(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            secure: false,
        }
    }

    pub fn secure(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            secure: true,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl fmt::Debug for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.secure { "<redacted>" } else { self.value.as_str() };
        f.debug_struct("EnvVar")
            .field("name", &self.name)
            .field("value", &value)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Ordered set of environment bindings passed to a runner.
///
/// Serialized as a transparent array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunnerEnv(pub Vec<EnvVar>);

impl RunnerEnv {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvVar> {
        self.0.iter()
    }

    /// Get the value bound to `name`; the last matching entry wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|v| v.name() == name)
            .map(|v| v.value())
    }

    /// Get the full binding for `name`; the last matching entry wins.
    pub fn binding(&self, name: &str) -> Option<&EnvVar> {
        self.0.iter().rev().find(|v| v.name() == name)
    }

    pub fn push(&mut self, var: EnvVar) {
        self.0.push(var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_value_is_redacted_in_debug() {
        let var = EnvVar::secure("DB_URL", "postgres://user:hunter2@db/experiments");
        let out = format!("{var:?}");
        assert!(out.contains("DB_URL"));
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn plain_value_is_visible_in_debug() {
        let var = EnvVar::plain("RUNNER_ID", "3");
        assert!(format!("{var:?}").contains("\"3\""));
    }

    #[test]
    fn get_last_entry_wins() {
        let mut env = RunnerEnv::new();
        env.push(EnvVar::plain("TIMEOUT", "10"));
        env.push(EnvVar::plain("RUNNER_ID", "0"));
        env.push(EnvVar::plain("TIMEOUT", "20"));

        assert_eq!(env.get("TIMEOUT"), Some("20"));
        assert_eq!(env.get("RUNNER_ID"), Some("0"));
        assert!(env.get("MISSING").is_none());
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn serde_is_transparent_array() {
        let mut env = RunnerEnv::new();
        env.push(EnvVar::secure("DB_URL", "x"));

        let json = serde_json::to_string(&env).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"secure\":true"));

        let back: RunnerEnv = serde_json::from_str(&json).unwrap();
        assert!(back.binding("DB_URL").unwrap().is_secure());
    }
}
