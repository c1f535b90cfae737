//! Attribute name conventions.
//!
//! Attribute names encode what the synchronizer does with the value. The
//! prefixes are shared with existing declarative templates, so they are
//! parsed once here into [`AttributeKind`] and never re-tested downstream.
//!
//! | Name                  | Kind                                   |
//! |-----------------------|----------------------------------------|
//! | `config_<file>`       | [`AttributeKind::LocalConfig`]         |
//! | `rest_<path>`         | [`AttributeKind::RestConfig`]          |
//! | `component_config...` | [`AttributeKind::ComponentConfig`]     |
//! | anything else         | [`AttributeKind::RestConfig`] (name is the path) |

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{CoreError, Result};

const LOCAL_CONFIG_PREFIX: &str = "config_";
const REST_CONFIG_PREFIX: &str = "rest_";
const COMPONENT_CONFIG_PREFIX: &str = "component_config";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.+?)>").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// File written next to the controller.
    LocalConfig { file: String },
    /// JSON pushed to a REST sub-path of the controller. The path is kept
    /// as written; [`rest_sub_path`] normalizes it when the url is built.
    RestConfig { path: String },
    /// Per-component settings with `<placeholder>` substitution.
    ComponentConfig,
}

impl AttributeKind {
    pub fn parse(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_attribute(name, "attribute name is empty"));
        }
        if name.starts_with(COMPONENT_CONFIG_PREFIX) {
            return Ok(Self::ComponentConfig);
        }
        if let Some(file) = name.strip_prefix(LOCAL_CONFIG_PREFIX) {
            if !is_plain_file_name(file) {
                return Err(CoreError::invalid_attribute(
                    name,
                    "local config needs a plain file name",
                ));
            }
            return Ok(Self::LocalConfig {
                file: file.to_string(),
            });
        }
        let path = name.strip_prefix(REST_CONFIG_PREFIX).unwrap_or(name);
        Ok(Self::RestConfig {
            path: path.to_string(),
        })
    }
}

/// A single path segment that stays inside the directory it is joined to:
/// not empty, not `.` or `..`, no separators.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Strips exactly one leading slash.
pub fn rest_sub_path(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// One `component -> key = value` setting from a `component_config` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSetting {
    pub component: String,
    pub key: String,
    pub value: String,
}

/// Parses `{"component": {"key": "value", ...}, ...}`.
pub fn parse_component_config(name: &str, raw: &str) -> Result<Vec<ComponentSetting>> {
    let doc: Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::invalid_attribute(name, format!("value is not JSON: {e}")))?;
    let components = doc
        .as_object()
        .ok_or_else(|| CoreError::invalid_attribute(name, "expected a JSON object"))?;

    let mut settings = Vec::new();
    for (component, config) in components {
        let config = config.as_object().ok_or_else(|| {
            CoreError::invalid_attribute(name, format!("component '{component}' is not an object"))
        })?;
        for (key, value) in config {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            settings.push(ComponentSetting {
                component: component.clone(),
                key: key.clone(),
                value,
            });
        }
    }
    Ok(settings)
}

impl ComponentSetting {
    /// Substitutes every `<param>` from `params`; an unknown param is an error.
    pub fn render(&self, params: &BTreeMap<String, String>) -> Result<String> {
        let mut rendered = self.value.clone();
        for capture in PLACEHOLDER.captures_iter(&self.value) {
            let param = &capture[1];
            let value = params
                .get(param)
                .ok_or_else(|| CoreError::UnresolvedPlaceholder {
                    component: self.component.clone(),
                    key: self.key.clone(),
                    placeholder: param.to_string(),
                })?;
            rendered = rendered.replace(&capture[0], value);
        }
        Ok(rendered)
    }
}
