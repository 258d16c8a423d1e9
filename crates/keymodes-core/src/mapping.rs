// Keymodes Mapping Structures
// Keymap, BindingTarget, BindingTable (private keymap over a shared base)

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::KeySequence;

/// What a key sequence is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    /// A command from the command table, by name
    Command(String),
    /// A generated command wrapping an inline expression
    Trampoline { name: String, source: String },
    /// Hand the typed keys to the re-dispatcher
    Translate {
        replacement: KeySequence,
        description: String,
    },
    /// Literal replacement keys; the sentinel-marked half of a translate pair
    Keys(KeySequence),
}

impl BindingTarget {
    /// Human-readable label for help and status displays
    pub fn label(&self) -> String {
        match self {
            BindingTarget::Command(name) => name.clone(),
            BindingTarget::Trampoline { source, .. } => source.clone(),
            BindingTarget::Translate { description, .. } => description.clone(),
            BindingTarget::Keys(keys) => keys.to_string(),
        }
    }

    /// Name of the command this target runs, if it runs one directly
    pub fn command_name(&self) -> Option<&str> {
        match self {
            BindingTarget::Command(name) | BindingTarget::Trampoline { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingTarget::Command(name) => write!(f, "{}", name),
            BindingTarget::Trampoline { name, source } => write!(f, "{} ({})", name, source),
            BindingTarget::Translate { description, .. } => write!(f, "\"{}\"", description),
            BindingTarget::Keys(keys) => write!(f, "[{}]", keys),
        }
    }
}

/// Outcome of looking a key sequence up in a keymap
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyLookup<'a> {
    /// The sequence is bound
    Bound(&'a BindingTarget),
    /// The sequence is the start of at least one longer binding
    Prefix,
    /// Nothing starts with this sequence
    Unbound,
}

impl KeyLookup<'_> {
    pub fn is_unbound(&self) -> bool {
        matches!(self, KeyLookup::Unbound)
    }
}

/// Ordered keymap from key sequences to binding targets
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    name: String,
    mappings: IndexMap<KeySequence, BindingTarget>,
}

impl Keymap {
    /// Create a new Keymap
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mappings: IndexMap::new(),
        }
    }

    /// Get the name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a mapping, returning the target it replaced
    pub fn insert(&mut self, keys: KeySequence, target: BindingTarget) -> Option<BindingTarget> {
        self.mappings.insert(keys, target)
    }

    /// Get the target bound to exactly this sequence
    pub fn get(&self, keys: &KeySequence) -> Option<&BindingTarget> {
        self.mappings.get(keys)
    }

    /// Check if a sequence is bound
    pub fn contains(&self, keys: &KeySequence) -> bool {
        self.mappings.contains_key(keys)
    }

    /// Look a sequence up, distinguishing "prefix of a binding" from "unbound"
    pub fn lookup(&self, keys: &KeySequence) -> KeyLookup<'_> {
        if let Some(target) = self.mappings.get(keys) {
            return KeyLookup::Bound(target);
        }
        let is_prefix = self
            .mappings
            .keys()
            .any(|bound| bound.len() > keys.len() && bound.starts_with(keys));
        if is_prefix {
            KeyLookup::Prefix
        } else {
            KeyLookup::Unbound
        }
    }

    /// Iterate over bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&KeySequence, &BindingTarget)> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// A mode's compiled table: a private keymap layered over a shared base
#[derive(Debug, Clone)]
pub struct BindingTable {
    private: Keymap,
    base: Arc<Keymap>,
}

impl BindingTable {
    pub fn new(private: Keymap, base: Arc<Keymap>) -> Self {
        Self { private, base }
    }

    /// The mode-private bindings
    pub fn private(&self) -> &Keymap {
        &self.private
    }

    /// The shared base bindings
    pub fn base(&self) -> &Keymap {
        &self.base
    }

    /// Private keymap first, then the base; first match wins
    pub fn lookup(&self, keys: &KeySequence) -> KeyLookup<'_> {
        match self.private.lookup(keys) {
            KeyLookup::Unbound => self.base.lookup(keys),
            found => found,
        }
    }

    /// Exact binding for a sequence, private first
    pub fn get(&self, keys: &KeySequence) -> Option<&BindingTarget> {
        self.private.get(keys).or_else(|| self.base.get(keys))
    }
}
