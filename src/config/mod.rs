//! Configuration management for `db_schema`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`DB_SCHEMA_*`)
//! 3. Project config (`./.db-schema.yaml`)
//! 4. User config (`~/.config/db-schema/config.yaml`)
//! 5. Defaults
//!
//! Layers are flat string maps with normalized keys (`norm_types` and
//! `norm.types` both become `norm-types`). Typed values are resolved once
//! into [`Settings`].

use crate::error::{Result, SchemaError};
use crate::format::OutputFormat;
use crate::normalize::{NameCase, NormalizeOptions, SortScope};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_FILENAME: &str = ".db-schema.yaml";
const ENV_PREFIX: &str = "DB_SCHEMA_";

/// One configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents).map_err(|e| {
            SchemaError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.set(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from `DB_SCHEMA_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.set(stripped, value);
            }
        }
        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub norm_types: Option<bool>,
    /// `Some(None)` means an explicit `skip`.
    pub norm_names: Option<Option<NameCase>>,
    pub sort: Option<Vec<SortScope>>,
    pub assume_yes: Option<bool>,
    pub lock_timeout: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(norm_types) = self.norm_types {
            layer.set("norm-types", norm_types.to_string());
        }
        if let Some(norm_names) = self.norm_names {
            layer.set("norm-names", norm_names.map_or("skip", NameCase::as_str));
        }
        if let Some(sort) = &self.sort {
            let joined = sort
                .iter()
                .map(|s| match s {
                    SortScope::Tables => "tables",
                    SortScope::Columns => "columns",
                    SortScope::Indices => "indices",
                })
                .collect::<Vec<_>>()
                .join(",");
            layer.set("sort", joined);
        }
        if let Some(assume_yes) = self.assume_yes {
            layer.set("assume-yes", assume_yes.to_string());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.set("lock-timeout", lock_timeout.to_string());
        }

        layer
    }
}

/// Typed view of the merged configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Preferred format when neither `--fmt` nor an output extension decides.
    pub format: Option<OutputFormat>,
    pub normalize: NormalizeOptions,
    pub assume_yes: bool,
    pub lock_timeout: Option<u64>,
}

impl Settings {
    /// Resolve typed settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value cannot be parsed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let format = layer.get("format").map(OutputFormat::parse).transpose()?;

        let types = match layer.get("norm-types") {
            Some(value) => parse_bool(value)
                .ok_or_else(|| config_error("norm-types", value, "expected true or false"))?,
            None => false,
        };

        let names = match layer.get("norm-names").map(str::trim) {
            None | Some("" | "skip") => None,
            Some(value) => Some(
                value
                    .parse::<NameCase>()
                    .map_err(|_| config_error("norm-names", value, "expected skip, upper or lower"))?,
            ),
        };

        let mut sort = Vec::new();
        if let Some(value) = layer.get("sort") {
            for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let scope = SortScope::parse(part).ok_or_else(|| {
                    config_error("sort", part, "expected tables, columns or indices")
                })?;
                if !sort.contains(&scope) {
                    sort.push(scope);
                }
            }
        }

        let assume_yes = match layer.get("assume-yes") {
            Some(value) => parse_bool(value)
                .ok_or_else(|| config_error("assume-yes", value, "expected true or false"))?,
            None => false,
        };

        let lock_timeout = match layer.get("lock-timeout") {
            Some(value) => Some(value.trim().parse::<u64>().map_err(|_| {
                config_error("lock-timeout", value, "expected milliseconds")
            })?),
            None => None,
        };

        Ok(Self {
            format,
            normalize: NormalizeOptions { types, names, sort },
            assume_yes,
            lock_timeout,
        })
    }
}

/// Load the user config (`~/.config/db-schema/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    ConfigLayer::from_yaml(&user_config_path(Path::new(&home)))
}

#[must_use]
pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("db-schema").join("config.yaml")
}

/// Load the project config (`.db-schema.yaml` in `dir`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&dir.join(PROJECT_CONFIG_FILENAME))
}

/// Load configuration with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or a
/// value is invalid.
pub fn load_settings(project_dir: &Path, cli: &CliOverrides) -> Result<Settings> {
    let merged = ConfigLayer::merge_layers(&[
        load_user_config()?,
        load_project_config(project_dir)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]);
    Settings::from_layer(&merged)
}

fn config_error(key: &str, value: &str, expected: &str) -> SchemaError {
    SchemaError::Config(format!("invalid value '{value}' for '{key}': {expected}"))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '.'], "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_nothing_configured() {
        let settings = Settings::from_layer(&ConfigLayer::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.normalize.is_noop());
    }

    #[test]
    fn project_yaml_is_flattened() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILENAME),
            "format: yml\nnorm:\n  types: true\n  names: lower\nsort: [tables, columns]\n",
        )
        .expect("write config");

        let layer = load_project_config(temp.path()).unwrap();
        let settings = Settings::from_layer(&layer).unwrap();
        assert_eq!(settings.format, Some(OutputFormat::Yaml));
        assert!(settings.normalize.types);
        assert_eq!(settings.normalize.names, Some(NameCase::Lower));
        assert_eq!(
            settings.normalize.sort,
            vec![SortScope::Tables, SortScope::Columns]
        );
    }

    #[test]
    fn missing_file_is_empty_layer() {
        let temp = TempDir::new().expect("tempdir");
        assert_eq!(
            load_project_config(temp.path()).unwrap(),
            ConfigLayer::default()
        );
    }

    #[test]
    fn env_vars_use_prefix() {
        let layer = ConfigLayer::from_vars([
            ("DB_SCHEMA_NORM_TYPES".to_string(), "yes".to_string()),
            ("DB_SCHEMA_LOCK_TIMEOUT".to_string(), "250".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        assert_eq!(layer.values.len(), 2);
        let settings = Settings::from_layer(&layer).unwrap();
        assert!(settings.normalize.types);
        assert_eq!(settings.lock_timeout, Some(250));
    }

    #[test]
    fn cli_overrides_win() {
        let mut project = ConfigLayer::default();
        project.set("norm-names", "upper");
        project.set("assume-yes", "true");

        let cli = CliOverrides {
            norm_names: Some(None),
            assume_yes: Some(false),
            sort: Some(vec![SortScope::Indices]),
            ..Default::default()
        };
        let merged = ConfigLayer::merge_layers(&[project, cli.as_layer()]);
        let settings = Settings::from_layer(&merged).unwrap();
        assert_eq!(settings.normalize.names, None);
        assert!(!settings.assume_yes);
        assert_eq!(settings.normalize.sort, vec![SortScope::Indices]);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut layer = ConfigLayer::default();
        layer.set("sort", "tables,rows");
        assert!(matches!(
            Settings::from_layer(&layer),
            Err(SchemaError::Config(_))
        ));

        let mut layer = ConfigLayer::default();
        layer.set("format", "toml");
        assert!(matches!(
            Settings::from_layer(&layer),
            Err(SchemaError::UnsupportedFormat(_))
        ));
    }
}
