#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! # Environment
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `RFORM_NAMESPACE` | `namespace` | `rform` |
//! | `RFORM_SCHEMA` | `schema` | `custom_form` |
//! | `RFORM_SCREEN_ID` | `screen_id` | `rform:custom_form` |
//! | `RFORM_CLOSE_LABEL` | `close_label` | `x` |
//! | `RFORM_CATCH_PANICS` | `catch_panics` | `true` |
//!
//! Flags accept `1`, `true`, `yes`, `on` (any case); anything else is false.
//! Empty values fall back to the default.

use std::env;

/// Where documents live on the surface and how the engine treats callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Document namespace on the surface.
    pub namespace: String,
    /// Document schema name.
    pub schema: String,
    /// Screen presented by `show`.
    pub screen_id: String,
    /// Label of the implicit close button.
    pub close_label: String,
    /// Catch panics from user callbacks at the dispatch boundary.
    pub catch_panics: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: "rform".into(),
            schema: "custom_form".into(),
            screen_id: "rform:custom_form".into(),
            close_label: "x".into(),
            catch_panics: true,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Read overrides through `get`, so callers can supply their own source.
    #[must_use]
    pub fn from_env_with<F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut string = |key: &str, slot: &mut String| {
            if let Some(value) = get(key).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        };
        string("RFORM_NAMESPACE", &mut config.namespace);
        string("RFORM_SCHEMA", &mut config.schema);
        string("RFORM_SCREEN_ID", &mut config.screen_id);
        string("RFORM_CLOSE_LABEL", &mut config.close_label);
        if let Some(value) = get("RFORM_CATCH_PANICS").filter(|v| !v.trim().is_empty()) {
            config.catch_panics = env_flag(&value);
        }
        config
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    #[must_use]
    pub fn with_screen_id(mut self, screen_id: impl Into<String>) -> Self {
        self.screen_id = screen_id.into();
        self
    }

    #[must_use]
    pub fn with_close_label(mut self, label: impl Into<String>) -> Self {
        self.close_label = label.into();
        self
    }

    #[must_use]
    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }
}

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> SyncConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SyncConfig::from_env_with(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.namespace, "rform");
        assert_eq!(config.schema, "custom_form");
        assert_eq!(config.screen_id, "rform:custom_form");
        assert_eq!(config.close_label, "x");
        assert!(config.catch_panics);
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(from_map(&[]), SyncConfig::default());
    }

    #[test]
    fn overrides_are_trimmed() {
        let config = from_map(&[
            ("RFORM_NAMESPACE", " lobby "),
            ("RFORM_SCHEMA", "settings"),
            ("RFORM_CLOSE_LABEL", ""),
        ]);
        assert_eq!(config.namespace, "lobby");
        assert_eq!(config.schema, "settings");
        assert_eq!(config.close_label, "x");
    }

    #[test]
    fn flag_parsing() {
        let cases = [
            ("1", true),
            ("YES", true),
            ("On", true),
            ("0", false),
            ("nope", false),
        ];
        for (raw, expected) in cases {
            let config = from_map(&[("RFORM_CATCH_PANICS", raw)]);
            assert_eq!(config.catch_panics, expected, "{raw}");
        }
    }

    #[test]
    fn builder_methods() {
        let config = SyncConfig::new()
            .with_namespace("n")
            .with_schema("s")
            .with_screen_id("n:s")
            .with_close_label("close")
            .with_catch_panics(false);
        assert_eq!(config.screen_id, "n:s");
        assert_eq!(config.close_label, "close");
        assert!(!config.catch_panics);
    }
}
