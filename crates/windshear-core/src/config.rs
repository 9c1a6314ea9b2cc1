//! Session configuration
//!
//! User options merge over a discovered project config file
//! (`windshear.config.json` in the working directory). Validation happens
//! before any file is processed; a bad configuration is fatal to the session,
//! since the correctness of mangling depends on it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "windshear.config.json";

/// Default prefix for generated class names.
pub const DEFAULT_CLASS_PREFIX: &str = "tw-";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid class prefix `{value}`")]
    InvalidClassPrefix { value: String },
    #[error("invalid theme prefix `{value}`")]
    InvalidThemePrefix { value: String },
    #[error("invalid class name `{value}` in classList")]
    InvalidClassName { value: String },
}

/// User-facing options, as read from the config file or passed by the caller.
///
/// Field names follow the JSON surface (`classList`, `ignoreVueScoped`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MangleUserConfig {
    /// Names that must never be mangled; seeds the preserve set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_list: Vec<String>,
    /// Skip class selectors carrying a `[data-v-...]` scoped-style marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_vue_scoped: Option<bool>,
    /// Theme prefix candidates are written with (`tw:flex`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mangle_options: Option<MangleOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_map_output: Option<ClassMapOutputOptions>,
}

/// Name-generation strategy knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MangleOptions {
    /// Prefix for generated names; defaults to `tw-`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_prefix: Option<String>,
    /// Extra outputs the generator must never produce.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved_class_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassMapOutputOptions {
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_class_map_file")]
    pub filename: PathBuf,
    /// Pretty-print the JSON report.
    #[serde(default)]
    pub loose: bool,
}

fn default_true() -> bool {
    true
}

fn default_class_map_file() -> PathBuf {
    PathBuf::from("windshear.class-map.json")
}

impl MangleUserConfig {
    /// Merge `self` over `base`: scalars from `self` win, lists are unioned.
    pub fn merge_over(self, base: MangleUserConfig) -> MangleUserConfig {
        let mut class_list: Vec<String> = base.class_list;
        let known: BTreeSet<String> = class_list.iter().cloned().collect();
        class_list.extend(self.class_list.into_iter().filter(|c| !known.contains(c)));

        let mangle_options = match (self.mangle_options, base.mangle_options) {
            (Some(user), Some(file)) => {
                let mut reserved = file.reserved_class_names;
                let known: BTreeSet<String> = reserved.iter().cloned().collect();
                reserved.extend(
                    user.reserved_class_names.into_iter().filter(|c| !known.contains(c)),
                );
                Some(MangleOptions {
                    class_prefix: user.class_prefix.or(file.class_prefix),
                    reserved_class_names: reserved,
                })
            }
            (user, file) => user.or(file),
        };

        MangleUserConfig {
            class_list,
            ignore_vue_scoped: self.ignore_vue_scoped.or(base.ignore_vue_scoped),
            prefix: self.prefix.or(base.prefix),
            mangle_options,
            class_map_output: self.class_map_output.or(base.class_map_output),
        }
    }
}

/// Fully resolved, validated session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangleConfig {
    pub class_list: Vec<String>,
    pub ignore_vue_scoped: bool,
    pub theme_prefix: Option<String>,
    pub class_prefix: String,
    pub reserved_class_names: Vec<String>,
    pub class_map_output: Option<ClassMapOutputOptions>,
}

impl Default for MangleConfig {
    fn default() -> Self {
        MangleConfig {
            class_list: Vec::new(),
            ignore_vue_scoped: true,
            theme_prefix: None,
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            reserved_class_names: Vec::new(),
            class_map_output: None,
        }
    }
}

impl MangleConfig {
    pub fn resolve(user: MangleUserConfig) -> Result<MangleConfig, ConfigError> {
        let mangle = user.mangle_options.unwrap_or_default();
        let config = MangleConfig {
            class_list: user.class_list,
            ignore_vue_scoped: user.ignore_vue_scoped.unwrap_or(true),
            theme_prefix: user.prefix,
            class_prefix: mangle.class_prefix.unwrap_or_else(|| DEFAULT_CLASS_PREFIX.to_string()),
            reserved_class_names: mangle.reserved_class_names,
            class_map_output: user.class_map_output,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_ident_prefix(&self.class_prefix) {
            return Err(ConfigError::InvalidClassPrefix { value: self.class_prefix.clone() });
        }
        if let Some(prefix) = &self.theme_prefix {
            if prefix.is_empty()
                || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(ConfigError::InvalidThemePrefix { value: prefix.clone() });
            }
        }
        for name in &self.class_list {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidClassName { value: name.clone() });
            }
        }
        Ok(())
    }
}

/// A generated-name prefix must itself be a valid start of a class identifier.
fn is_valid_ident_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    let Some(first) = chars.next() else { return false };
    (first.is_ascii_alphabetic() || first == '_' || first == '-')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read `windshear.config.json` from `dir`, if present.
pub fn discover_config(dir: &Path) -> Result<MangleUserConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(MangleUserConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = MangleConfig::resolve(MangleUserConfig::default()).unwrap();
        assert!(config.ignore_vue_scoped);
        assert_eq!(config.class_prefix, "tw-");
        assert!(config.class_list.is_empty());
    }

    #[test]
    fn user_options_win_over_file_options() {
        let file = MangleUserConfig {
            class_list: vec!["gap-y-4".into()],
            ignore_vue_scoped: Some(true),
            ..Default::default()
        };
        let user = MangleUserConfig {
            class_list: vec!["bg-white".into(), "gap-y-4".into()],
            ignore_vue_scoped: Some(false),
            ..Default::default()
        };
        let merged = user.merge_over(file);
        assert_eq!(merged.class_list, vec!["gap-y-4".to_string(), "bg-white".to_string()]);
        assert_eq!(merged.ignore_vue_scoped, Some(false));
    }

    #[test]
    fn invalid_class_prefix_is_fatal() {
        let user = MangleUserConfig {
            mangle_options: Some(MangleOptions {
                class_prefix: Some("1 bad".into()),
                reserved_class_names: vec![],
            }),
            ..Default::default()
        };
        assert!(matches!(
            MangleConfig::resolve(user),
            Err(ConfigError::InvalidClassPrefix { .. })
        ));
    }

    #[test]
    fn whitespace_class_names_are_rejected() {
        let user = MangleUserConfig { class_list: vec!["a b".into()], ..Default::default() };
        assert!(matches!(MangleConfig::resolve(user), Err(ConfigError::InvalidClassName { .. })));
    }

    #[test]
    fn config_file_round_trips() {
        let json = r#"{
            "classList": ["gap-y-4"],
            "ignoreVueScoped": false,
            "mangleOptions": { "classPrefix": "ws-" },
            "classMapOutput": { "filename": "map.json", "loose": true }
        }"#;
        let user: MangleUserConfig = serde_json::from_str(json).unwrap();
        let config = MangleConfig::resolve(user).unwrap();
        assert_eq!(config.class_prefix, "ws-");
        assert!(!config.ignore_vue_scoped);
        assert_eq!(config.class_map_output.unwrap().filename, PathBuf::from("map.json"));
    }
}
