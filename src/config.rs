//! Board configuration handed over by the page.
//!
//! The server renders a JSON object into a `data-widget-config` attribute;
//! every field is optional and falls back to the defaults below.
//!
//! Fields:
//! - `namespace`: identifier namespace, default `elgg`
//! - `action_base`: URL prefix for actions, default `/action/`
//! - `add_column`: column that receives new widgets, default `1`
//! - `user_guid`: owner sent with add requests
//! - `loading_placeholder`: content shown while settings save, default `loading`
//! - `column_selector`: column container selector, default `.<namespace>-widgets`
//! - `security_tokens`: extra fields posted with every action
//! - `relevel_on_change`: re-run height leveling after add/remove, default off

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::ids::ColumnId;
use crate::util::ident::{ClassMarker, DEFAULT_NAMESPACE, IdCodec};

pub const DEFAULT_ACTION_BASE: &str = "/action/";
pub const DEFAULT_ADD_COLUMN: &str = "1";
pub const DEFAULT_LOADING_PLACEHOLDER: &str = "loading";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid board config JSON: {0}")]
    Parse(String),
    #[error("invalid board config field {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub namespace: String,
    pub action_base: String,
    pub add_column: ColumnId,
    pub user_guid: Option<String>,
    pub loading_placeholder: String,
    pub column_selector: Option<String>,
    pub security_tokens: BTreeMap<String, String>,
    pub relevel_on_change: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            action_base: DEFAULT_ACTION_BASE.to_owned(),
            add_column: ColumnId::new(DEFAULT_ADD_COLUMN),
            user_guid: None,
            loading_placeholder: DEFAULT_LOADING_PLACEHOLDER.to_owned(),
            column_selector: None,
            security_tokens: BTreeMap::new(),
            relevel_on_change: false,
        }
    }
}

impl BoardConfig {
    /// Parse and validate a JSON config blob.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when the add column is blank.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config from the page attribute, or the defaults when it is absent or
    /// unusable. A bad attribute is logged, never fatal.
    #[must_use]
    pub fn from_attribute(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Self::default();
        };
        Self::from_json(raw).unwrap_or_else(|e| {
            leptos::logging::warn!("using default widget config: {e}");
            Self::default()
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.add_column.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid { field: "add_column", reason: "must not be blank" });
        }
        if self.column_selector.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid { field: "column_selector", reason: "must not be blank" });
        }
        Ok(())
    }

    #[must_use]
    pub fn codec(&self) -> IdCodec {
        IdCodec::new(self.namespace.clone())
    }

    #[must_use]
    pub fn column_selector(&self) -> String {
        self.column_selector
            .clone()
            .unwrap_or_else(|| format!(".{}", self.codec().class(ClassMarker::Columns)))
    }

    #[must_use]
    pub fn token_fields(&self) -> Vec<(String, String)> {
        self.security_tokens
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
