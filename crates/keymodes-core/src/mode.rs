// Keymodes Mode Registry
// Named, independently toggleable binding tables and the shared status label

use indexmap::IndexMap;

use crate::command::{CommandFn, Invocation};
use crate::compiler::BindingEntry;
use crate::dispatch::DispatchError;
use crate::host::Host;
use crate::mapping::{BindingTable, KeyLookup};
use crate::prefix::PrefixArg;
use crate::KeySequence;

/// Where an activation hook comes from
#[derive(Clone)]
pub enum HookSpec {
    /// A host command or trampoline, resolved when the mode is defined
    Command(String),
    Function(CommandFn),
}

impl std::fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookSpec::Command(name) => f.debug_tuple("Command").field(name).finish(),
            HookSpec::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Everything needed to define a mode
#[derive(Debug, Clone)]
pub struct ModeDefinition {
    pub name: String,
    /// Status label shown while enabled; defaults to the name
    pub label: Option<String>,
    pub on_enable: Option<HookSpec>,
    pub on_disable: Option<HookSpec>,
    pub bindings: Vec<BindingEntry>,
}

impl ModeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            on_enable: None,
            on_disable: None,
            bindings: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn on_enable(mut self, hook: HookSpec) -> Self {
        self.on_enable = Some(hook);
        self
    }

    pub fn on_disable(mut self, hook: HookSpec) -> Self {
        self.on_disable = Some(hook);
        self
    }

    pub fn bind(mut self, entry: BindingEntry) -> Self {
        self.bindings.push(entry);
        self
    }
}

/// A resolved activation hook
#[derive(Clone)]
pub struct Hook {
    pub name: String,
    pub body: CommandFn,
}

/// A defined mode
pub struct Mode {
    name: String,
    label: String,
    table: BindingTable,
    enabled: bool,
    on_enable: Option<Hook>,
    on_disable: Option<Hook>,
}

impl Mode {
    pub fn new(
        name: impl Into<String>,
        label: Option<String>,
        table: BindingTable,
        on_enable: Option<Hook>,
        on_disable: Option<Hook>,
    ) -> Self {
        let name = name.into();
        Self {
            label: label.unwrap_or_else(|| name.clone()),
            name,
            table,
            enabled: false,
            on_enable,
            on_disable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl std::fmt::Debug for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mode")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("enabled", &self.enabled)
            .field("bindings", &self.table.private().len())
            .finish()
    }
}

/// All defined modes, in registration order, plus the status label
#[derive(Debug, Default)]
pub struct ModeRegistry {
    modes: IndexMap<String, Mode>,
    status_label: Option<String>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mode; returns it back if the name is taken
    pub fn insert(&mut self, mode: Mode) -> Result<(), Mode> {
        if self.modes.contains_key(mode.name()) {
            return Err(mode);
        }
        self.modes.insert(mode.name.clone(), mode);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Mode> {
        self.modes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.modes.get(name).is_some_and(Mode::is_enabled)
    }

    /// Modes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.values()
    }

    /// Enabled modes in registration order
    pub fn enabled(&self) -> impl Iterator<Item = &Mode> {
        self.modes.values().filter(|mode| mode.enabled)
    }

    pub fn status_label(&self) -> Option<&str> {
        self.status_label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// First enabled mode reporting a binding or a prefix wins
    pub fn lookup(&self, keys: &KeySequence) -> KeyLookup<'_> {
        for mode in self.enabled() {
            let found = mode.table.lookup(keys);
            if !found.is_unbound() {
                log::trace!("'{}' matched in mode '{}'", keys, mode.name);
                return found;
            }
        }
        KeyLookup::Unbound
    }

    /// Flip a mode, running its hook first
    ///
    /// A failing hook leaves the mode and the status label untouched.
    /// Returns the new enabled state.
    pub fn toggle(
        &mut self,
        name: &str,
        keys: &KeySequence,
        prefix: PrefixArg,
        host: &mut dyn Host,
    ) -> Result<bool, DispatchError> {
        let mode = self
            .modes
            .get_mut(name)
            .ok_or_else(|| DispatchError::UnknownMode(name.to_string()))?;

        let hook = if mode.enabled {
            mode.on_disable.clone()
        } else {
            mode.on_enable.clone()
        };
        if let Some(hook) = hook {
            let mut invocation = Invocation::new(&hook.name, keys, prefix, &mut *host);
            (hook.body)(&mut invocation).map_err(|source| DispatchError::HookFailed {
                mode: name.to_string(),
                source,
            })?;
        }

        mode.enabled = !mode.enabled;
        let enabled = mode.enabled;
        self.status_label = if enabled {
            Some(mode.label.clone())
        } else {
            None
        };
        log::debug!(
            "Mode '{}' {}",
            name,
            if enabled { "enabled" } else { "disabled" }
        );
        host.status_label_changed(self.status_label.as_deref());
        Ok(enabled)
    }

    /// Toggle every enabled mode off, in registration order
    pub fn disable_all(
        &mut self,
        keys: &KeySequence,
        prefix: PrefixArg,
        host: &mut dyn Host,
    ) -> Result<Vec<String>, DispatchError> {
        let enabled: Vec<String> = self.enabled().map(|mode| mode.name.clone()).collect();
        for name in &enabled {
            self.toggle(name, keys, prefix, host)?;
        }
        Ok(enabled)
    }
}
