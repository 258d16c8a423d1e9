// Keymodes Dispatch
// Per-key resolution against enabled modes, builtin commands and replays

pub mod base;
pub mod engine;
pub mod translate;

pub use base::base_keymap;
pub use engine::Dispatcher;
pub use translate::{resolve_translation, Translation};

use crate::command::CommandError;
use crate::compiler::CompileError;
use crate::prefix::{NotADigit, PrefixArg};
use crate::KeySequence;

/// What happened to a key (or a command run by name)
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// The buffered keys are a prefix of a longer binding
    Pending,
    /// A command ran and consumed the prefix argument
    Executed(String),
    /// The prefix argument was updated
    Accumulated(PrefixArg),
    /// Replacement keys were queued on the host
    Replayed(KeySequence),
    ModeToggled { mode: String, enabled: bool },
    /// A translate binding with nothing behind it; the keys are dropped
    Swallowed,
    /// Neither an enabled mode nor the base binds these keys; the host should handle them
    Unhandled(KeySequence),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    #[error(transparent)]
    NotADigit(#[from] NotADigit),

    #[error("command '{name}' failed: {source}")]
    CommandFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("hook for mode '{mode}' failed: {source}")]
    HookFailed {
        mode: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while defining a mode
#[derive(Debug, thiserror::Error)]
pub enum DefineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("mode '{0}' is already defined")]
    DuplicateMode(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("mode '{mode}': hook command '{command}' is not a host command")]
    InvalidHook { mode: String, command: String },
}
