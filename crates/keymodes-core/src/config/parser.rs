// Keymodes Config Parser - TOML with Serde
// Parses mode definitions and demo global bindings from TOML files

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use super::parse_key_sequence;
use crate::compiler::{BindingEntry, KeySet, TargetSpec};
use crate::mapping::{BindingTarget, Keymap};
use crate::mode::{HookSpec, ModeDefinition};
use crate::KeySequence;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid binding in mode '{mode}': {reason}")]
    InvalidBinding { mode: String, reason: String },

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// Host bindings: key description -> command name
    #[serde(default)]
    pub global: IndexMap<String, String>,

    #[serde(default)]
    pub mode: Vec<ModeToml>,
}

/// One `[[mode]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModeToml {
    pub name: String,
    /// Status label; defaults to the name
    pub label: Option<String>,
    pub on_enable: Option<String>,
    pub on_disable: Option<String>,
    #[serde(default)]
    pub bind: Vec<BindToml>,
}

/// One `[[mode.bind]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindToml {
    pub keys: KeySet,
    /// A command if one exists under this name, otherwise keys to replay
    pub to: Option<String>,
    pub command: Option<String>,
    pub replay: Option<String>,
    /// Host commands run in order
    pub run: Option<Vec<String>>,
}

/// A parsed binding entry from `[global]`
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBinding {
    pub keys: KeySequence,
    pub command: String,
}

/// Parsed configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: Vec<GlobalBinding>,
    pub modes: Vec<ModeToml>,
}

impl Config {
    /// Default config location: `<config dir>/keymodes/modes.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keymodes").join("modes.toml"))
    }

    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// Host keymap built from `[global]`
    pub fn global_keymap(&self) -> Keymap {
        let mut keymap = Keymap::new("global");
        for binding in &self.global {
            keymap.insert(binding.keys.clone(), BindingTarget::Command(binding.command.clone()));
        }
        keymap
    }

    /// Command names referenced from `[global]`, in file order
    pub fn global_commands(&self) -> impl Iterator<Item = &str> {
        self.global.iter().map(|binding| binding.command.as_str())
    }

    /// Convert each `[[mode]]` into a definition for the dispatcher
    pub fn to_definitions(&self) -> Result<Vec<ModeDefinition>, ConfigError> {
        self.modes.iter().map(ModeToml::to_definition).collect()
    }
}

impl ConfigToml {
    fn to_config(&self) -> Result<Config, ConfigError> {
        let mut global = Vec::with_capacity(self.global.len());
        for (desc, command) in &self.global {
            global.push(GlobalBinding {
                keys: parse_keys(desc)?,
                command: command.clone(),
            });
        }

        // Surface bad key descriptions and binding shapes at load time
        for mode in &self.mode {
            mode.to_definition()?;
            for bind in &mode.bind {
                for desc in bind.keys.descriptions() {
                    parse_keys(desc)?;
                }
            }
        }

        log::debug!(
            "Loaded config: {} global bindings, {} modes",
            global.len(),
            self.mode.len()
        );
        Ok(Config {
            global,
            modes: self.mode.clone(),
        })
    }
}

impl ModeToml {
    fn to_definition(&self) -> Result<ModeDefinition, ConfigError> {
        let mut definition = ModeDefinition::new(&self.name);
        definition.label = self.label.clone();
        definition.on_enable = self.on_enable.clone().map(HookSpec::Command);
        definition.on_disable = self.on_disable.clone().map(HookSpec::Command);
        for bind in &self.bind {
            definition.bindings.push(BindingEntry::new(
                bind.keys.clone(),
                bind.target(&self.name)?,
            ));
        }
        Ok(definition)
    }
}

impl BindToml {
    /// Exactly one of `to`, `command`, `replay` or `run`
    fn target(&self, mode: &str) -> Result<TargetSpec, ConfigError> {
        let mut targets = Vec::with_capacity(1);
        if let Some(text) = &self.to {
            targets.push(TargetSpec::Name(text.clone()));
        }
        if let Some(name) = &self.command {
            targets.push(TargetSpec::Command(name.clone()));
        }
        if let Some(keys) = &self.replay {
            targets.push(TargetSpec::Keys(keys.clone()));
        }
        if let Some(names) = &self.run {
            if names.is_empty() {
                return Err(ConfigError::InvalidBinding {
                    mode: mode.to_string(),
                    reason: "'run' needs at least one command".to_string(),
                });
            }
            targets.push(TargetSpec::Run(names.clone()));
        }

        if targets.len() != 1 {
            return Err(ConfigError::InvalidBinding {
                mode: mode.to_string(),
                reason: format!(
                    "'{}' needs exactly one of to, command, replay or run",
                    self.keys.descriptions().join(", ")
                ),
            });
        }
        Ok(targets.remove(0))
    }
}

fn parse_keys(desc: &str) -> Result<KeySequence, ConfigError> {
    parse_key_sequence(desc).map_err(|e| ConfigError::InvalidKey {
        key: desc.to_string(),
        reason: e.to_string(),
    })
}
