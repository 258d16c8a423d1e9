// Keymodes Command Table
// Named commands: builtins, mode toggles, host functions and trampolines

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::host::Host;
use crate::prefix::PrefixArg;
use crate::KeySequence;

/// Body of a host command or trampoline
pub type CommandFn = Arc<dyn Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Box a closure as a command body
pub fn command_fn<F>(f: F) -> CommandFn
where
    F: Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Everything a command body can see while it runs
pub struct Invocation<'a> {
    name: &'a str,
    keys: &'a KeySequence,
    prefix: PrefixArg,
    host: &'a mut dyn Host,
}

impl<'a> Invocation<'a> {
    pub fn new(name: &'a str, keys: &'a KeySequence, prefix: PrefixArg, host: &'a mut dyn Host) -> Self {
        Self {
            name,
            keys,
            prefix,
            host,
        }
    }

    /// Name the command was invoked under
    pub fn name(&self) -> &str {
        self.name
    }

    /// The keys that triggered this command (empty when run by name)
    pub fn keys(&self) -> &KeySequence {
        self.keys
    }

    pub fn prefix_arg(&self) -> PrefixArg {
        self.prefix
    }

    /// Numeric value of the prefix argument (1 when none was given)
    pub fn prefix_value(&self) -> i64 {
        self.prefix.value()
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }
}

/// Commands implemented by the dispatcher itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Builtin {
    UniversalArgument,
    DigitArgument,
    NegativeArgument,
    DisableAllModes,
    /// Entry point of the key re-dispatcher
    TranslateKey,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A named entry in the command table
#[derive(Clone)]
pub enum Command {
    Builtin(Builtin),
    /// Flips the named mode on or off
    ToggleMode(String),
    Function(CommandFn),
    /// Generated from an inline expression; `source` is its text
    Trampoline { source: String, body: CommandFn },
}

impl Command {
    /// Wrap a closure as a host command
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Command::Function(command_fn(f))
    }

    /// The callable body, for host functions and trampolines
    pub fn body(&self) -> Option<&CommandFn> {
        match self {
            Command::Function(body) | Command::Trampoline { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Builtin(builtin) => write!(f, "Builtin({})", builtin),
            Command::ToggleMode(mode) => write!(f, "ToggleMode({})", mode),
            Command::Function(_) => write!(f, "Function(..)"),
            Command::Trampoline { source, .. } => write!(f, "Trampoline({:?})", source),
        }
    }
}

/// Errors raised while defining commands
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("command '{0}' is already defined")]
    AlreadyDefined(String),
}

/// Ordered name -> command table
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: IndexMap<String, Command>,
}

impl CommandTable {
    /// Create a table holding only the builtins
    pub fn with_builtins() -> Self {
        let commands = Builtin::iter()
            .map(|builtin| (builtin.name().to_string(), Command::Builtin(builtin)))
            .collect();
        Self { commands }
    }

    /// Define a new command; names are never silently replaced
    pub fn define(&mut self, name: impl Into<String>, command: Command) -> Result<(), CommandError> {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(CommandError::AlreadyDefined(name));
        }
        log::debug!("Defined command '{}': {:?}", name, command);
        self.commands.insert(name, command);
        Ok(())
    }

    /// Define a host command from a closure
    pub fn define_fn<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), CommandError>
    where
        F: Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.define(name, Command::function(f))
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Command names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}
