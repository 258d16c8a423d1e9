// Keymodes Core Library
// Modal key bindings: modes, prefix arguments, key translation

pub mod combo;
pub mod command;
pub mod compiler;
pub mod config;
pub mod dispatch;
pub mod host;
pub mod key;
pub mod mapping;
pub mod mode;
pub mod modifier;
pub mod prefix;

pub use combo::{Combo, KeySequence};
pub use command::{command_fn, Builtin, Command, CommandError, CommandFn, CommandTable, Invocation};
pub use compiler::{compile, BindingEntry, CompileError, InlineExpr, KeySet, TargetSpec};
pub use config::{parse_combo_string, parse_key_sequence, ComboParseError, ParsedCombo};
pub use dispatch::{DefineError, DispatchError, DispatchResult, Dispatcher};
pub use host::Host;
pub use key::Key;
pub use mapping::{BindingTable, BindingTarget, KeyLookup, Keymap};
pub use mode::{HookSpec, Mode, ModeDefinition, ModeRegistry};
pub use modifier::Modifier;
pub use prefix::{accumulate_digit, accumulate_negative, accumulate_universal, NotADigit, PrefixArg};

#[cfg(feature = "toml-config")]
pub use config::{Config, ConfigError};
