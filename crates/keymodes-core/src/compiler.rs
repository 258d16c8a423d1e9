// Keymodes Binding Compiler
// Turns (key-set, target) entries into a mode's binding table

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::command::{command_fn, Command, CommandError, CommandFn, CommandTable, Invocation};
use crate::config::{parse_key_sequence, ComboParseError};
use crate::mapping::{BindingTable, BindingTarget, Keymap};
use crate::{Key, KeySequence};

/// One key description or several equivalent ones
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KeySet {
    One(String),
    Many(Vec<String>),
}

impl KeySet {
    pub fn descriptions(&self) -> &[String] {
        match self {
            KeySet::One(desc) => std::slice::from_ref(desc),
            KeySet::Many(descs) => descs,
        }
    }
}

impl From<&str> for KeySet {
    fn from(desc: &str) -> Self {
        KeySet::One(desc.to_string())
    }
}

impl From<Vec<&str>> for KeySet {
    fn from(descs: Vec<&str>) -> Self {
        KeySet::Many(descs.into_iter().map(String::from).collect())
    }
}

/// An inline expression: source text plus the closure it lowers to
#[derive(Clone)]
pub struct InlineExpr {
    source: String,
    body: CommandFn,
}

impl InlineExpr {
    pub fn new<F>(source: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            body: command_fn(body),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for InlineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InlineExpr").field(&self.source).finish()
    }
}

/// What an entry binds its keys to, before resolution
#[derive(Debug, Clone)]
pub enum TargetSpec {
    /// An existing command
    Command(String),
    /// An existing command if one has this name, otherwise literal keys
    Name(String),
    /// Literal keys to replay
    Keys(String),
    /// Inline expression lowered into a trampoline
    Inline(InlineExpr),
    /// Existing host commands run in order, lowered into a trampoline
    Run(Vec<String>),
}

/// A single (key-set, target) entry
#[derive(Debug, Clone)]
pub struct BindingEntry {
    pub keys: KeySet,
    pub target: TargetSpec,
}

impl BindingEntry {
    pub fn new(keys: impl Into<KeySet>, target: TargetSpec) -> Self {
        Self {
            keys: keys.into(),
            target,
        }
    }
}

/// Errors raised while compiling a mode's bindings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("mode '{mode}': malformed key description '{key}': {source}")]
    MalformedKey {
        mode: String,
        key: String,
        source: ComboParseError,
    },

    #[error("mode '{mode}': unknown command '{command}'")]
    UnknownCommand { mode: String, command: String },

    #[error("mode '{mode}': '{command}' cannot be used inside an inline expression")]
    NotCallable { mode: String, command: String },

    #[error("mode '{mode}': '{text}' is neither a command nor a key sequence")]
    UnresolvedTarget { mode: String, text: String },

    #[error("mode '{mode}': inline expressions '{first}' and '{second}' both compile to '{name}'")]
    NameCollision {
        mode: String,
        name: String,
        first: String,
        second: String,
    },
}

/// Suffix of a generated trampoline name, derived from its source text
pub fn trampoline_suffix(source: &str) -> String {
    let mut suffix = String::with_capacity(source.len());
    let mut pending_dash = false;
    for c in source.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending_dash && !suffix.is_empty() {
                suffix.push('-');
            }
            pending_dash = false;
            suffix.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if suffix.is_empty() {
        suffix.push_str("inline");
    }
    suffix
}

/// Resolved form of a target, before it is placed under each key
enum Resolved {
    Command(String),
    Translate(KeySequence, String),
    Trampoline(String, String),
}

/// A trampoline resolved during compilation, not yet in the command table
struct StagedTrampoline {
    name: String,
    source: String,
    body: CommandFn,
}

struct Compiler<'a> {
    mode: &'a str,
    commands: &'a CommandTable,
    staged: Vec<StagedTrampoline>,
}

impl Compiler<'_> {
    /// Existing or staged command under `name`
    fn command_body(&self, name: &str) -> Option<Option<&CommandFn>> {
        if let Some(command) = self.commands.get(name) {
            return Some(command.body());
        }
        self.staged
            .iter()
            .find(|staged| staged.name == name)
            .map(|staged| Some(&staged.body))
    }

    fn has_command(&self, name: &str) -> bool {
        self.command_body(name).is_some()
    }

    fn parse_keys(&self, desc: &str) -> Result<KeySequence, CompileError> {
        parse_key_sequence(desc).map_err(|source| CompileError::MalformedKey {
            mode: self.mode.to_string(),
            key: desc.to_string(),
            source,
        })
    }

    fn resolve(&mut self, spec: &TargetSpec) -> Result<Resolved, CompileError> {
        match spec {
            TargetSpec::Command(name) => {
                if !self.has_command(name) {
                    return Err(CompileError::UnknownCommand {
                        mode: self.mode.to_string(),
                        command: name.clone(),
                    });
                }
                Ok(Resolved::Command(name.clone()))
            }
            TargetSpec::Name(text) => {
                if self.has_command(text) {
                    return Ok(Resolved::Command(text.clone()));
                }
                parse_key_sequence(text)
                    .map(|keys| Resolved::Translate(keys, text.trim().to_string()))
                    .map_err(|_| CompileError::UnresolvedTarget {
                        mode: self.mode.to_string(),
                        text: text.clone(),
                    })
            }
            TargetSpec::Keys(text) => {
                let keys = self.parse_keys(text)?;
                Ok(Resolved::Translate(keys, text.trim().to_string()))
            }
            TargetSpec::Inline(expr) => self.define_trampoline(&expr.source, expr.body.clone()),
            TargetSpec::Run(names) => {
                let body = self.sequence_body(names)?;
                self.define_trampoline(&names.join("; "), body)
            }
        }
    }

    fn sequence_body(&self, names: &[String]) -> Result<CommandFn, CompileError> {
        let mut steps: Vec<CommandFn> = Vec::with_capacity(names.len());
        for name in names {
            let body = self.command_body(name).ok_or_else(|| CompileError::UnknownCommand {
                mode: self.mode.to_string(),
                command: name.clone(),
            })?;
            let body = body.ok_or_else(|| CompileError::NotCallable {
                mode: self.mode.to_string(),
                command: name.clone(),
            })?;
            steps.push(body.clone());
        }
        Ok(command_fn(move |invocation| {
            for step in &steps {
                step(invocation)?;
            }
            Ok(())
        }))
    }

    fn define_trampoline(&mut self, source: &str, body: CommandFn) -> Result<Resolved, CompileError> {
        let name = format!("{}/{}", self.mode, trampoline_suffix(source));

        let existing = match self.commands.get(&name) {
            Some(Command::Trampoline { source, .. }) => Some(source.as_str()),
            Some(_) => {
                return Err(CompileError::NameCollision {
                    mode: self.mode.to_string(),
                    first: name.clone(),
                    name,
                    second: source.to_string(),
                });
            }
            None => self
                .staged
                .iter()
                .find(|staged| staged.name == name)
                .map(|staged| staged.source.as_str()),
        };

        match existing {
            Some(existing) if existing == source => {
                log::trace!("Reusing trampoline '{}'", name);
            }
            Some(existing) => {
                return Err(CompileError::NameCollision {
                    mode: self.mode.to_string(),
                    name,
                    first: existing.to_string(),
                    second: source.to_string(),
                });
            }
            None => self.staged.push(StagedTrampoline {
                name: name.clone(),
                source: source.to_string(),
                body,
            }),
        }
        Ok(Resolved::Trampoline(name, source.to_string()))
    }

    fn bind(&self, keymap: &mut Keymap, keys: KeySequence, target: BindingTarget) {
        if let Some(previous) = keymap.insert(keys.clone(), target) {
            log::warn!(
                "Mode '{}': '{}' was bound to {}, now rebound",
                self.mode,
                keys,
                previous
            );
        }
    }
}

/// Compile a mode's entries into a binding table over `base`
///
/// Inline expressions define trampolines named `<mode>/<suffix>` in
/// `commands`, but only once every entry has compiled; a failing entry
/// leaves `commands` untouched. Translate targets are bound twice: the
/// sentinel-marked keys hold the replacement, the plain keys hand off to
/// the re-dispatcher.
pub fn compile(
    mode: &str,
    entries: &[BindingEntry],
    commands: &mut CommandTable,
    base: &Arc<Keymap>,
) -> Result<BindingTable, CompileError> {
    let mut compiler = Compiler {
        mode,
        commands,
        staged: Vec::new(),
    };
    let mut private = Keymap::new(mode);

    for entry in entries {
        let resolved = compiler.resolve(&entry.target)?;

        for desc in entry.keys.descriptions() {
            let keys = compiler.parse_keys(desc)?;
            match &resolved {
                Resolved::Command(name) => {
                    compiler.bind(&mut private, keys, BindingTarget::Command(name.clone()));
                }
                Resolved::Trampoline(name, source) => {
                    let target = BindingTarget::Trampoline {
                        name: name.clone(),
                        source: source.clone(),
                    };
                    compiler.bind(&mut private, keys, target);
                }
                Resolved::Translate(replacement, description) => {
                    let marked = keys.prefixed(Key::TRANSLATE);
                    compiler.bind(&mut private, marked, BindingTarget::Keys(replacement.clone()));
                    let target = BindingTarget::Translate {
                        replacement: replacement.clone(),
                        description: description.clone(),
                    };
                    compiler.bind(&mut private, keys, target);
                }
            }
        }
    }

    let staged = compiler.staged;
    for StagedTrampoline { name, source, body } in staged {
        let command = Command::Trampoline {
            source: source.clone(),
            body,
        };
        if let Err(CommandError::AlreadyDefined(name)) = commands.define(name, command) {
            return Err(CompileError::NameCollision {
                mode: mode.to_string(),
                first: name.clone(),
                name,
                second: source,
            });
        }
    }

    log::debug!("Compiled mode '{}' with {} bindings", mode, private.len());
    Ok(BindingTable::new(private, Arc::clone(base)))
}
