// Keymodes Config API
// Key description parsing and TOML mode definitions

pub mod combo_parser;

#[cfg(feature = "toml-config")]
pub mod parser;

pub use combo_parser::{parse_combo_string, parse_key_sequence, ComboParseError, ParsedCombo};

#[cfg(feature = "toml-config")]
pub use parser::{BindToml, Config, ConfigError, ConfigToml, GlobalBinding, ModeToml};
