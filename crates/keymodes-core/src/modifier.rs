// Keymodes Modifier System
// Represents key description modifiers (Ctrl, Meta, Shift, Super, Hyper)

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Global modifier table, built on first access
static MODIFIER_REGISTRY: LazyLock<ModifierRegistry> = LazyLock::new(ModifierRegistry::with_defaults);

/// Internal registry for modifiers
struct ModifierRegistry {
    by_name: HashMap<String, Modifier>,
    by_alias: HashMap<String, Modifier>,
}

impl ModifierRegistry {
    fn with_defaults() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_alias: HashMap::new(),
        };
        // Registration order fixes the order modifiers print in ("C-M-x")
        registry.add_internal("CONTROL", &["C", "Ctrl", "Control"]);
        registry.add_internal("META", &["M", "Alt", "Meta", "Opt", "Option"]);
        registry.add_internal("SHIFT", &["S", "Shift"]);
        registry.add_internal("SUPER", &["s", "Super", "Win", "Cmd", "Command"]);
        registry.add_internal("HYPER", &["H", "Hyper"]);
        registry
    }

    fn add_internal(&mut self, name: &str, aliases: &[&str]) {
        let modifier = Modifier {
            id: self.by_name.len() as u32,
            name: name.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        };

        for alias in aliases {
            self.by_alias.insert(alias.to_string(), modifier.clone());
        }
        self.by_name.insert(name.to_string(), modifier);
    }
}

/// Represents a key description modifier, such as Ctrl or Meta
#[derive(Debug, Clone)]
pub struct Modifier {
    id: u32,
    name: String,
    aliases: Vec<String>,
}

impl Modifier {
    /// Get the registry name ("CONTROL")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the first alias (string representation)
    pub fn primary_alias(&self) -> &str {
        self.aliases
            .first()
            .map(|s| s.as_str())
            .unwrap_or(&self.name)
    }

    /// Get modifier by name
    pub fn from_name(name: &str) -> Option<Modifier> {
        MODIFIER_REGISTRY.by_name.get(name).cloned()
    }

    /// Get modifier by alias
    ///
    /// Aliases are case-sensitive: "S" is Shift, "s" is Super.
    pub fn from_alias(alias: &str) -> Option<Modifier> {
        // Try direct name first
        if let Some(m) = Self::from_name(alias) {
            return Some(m);
        }
        MODIFIER_REGISTRY.by_alias.get(alias).cloned()
    }
}

impl PartialEq for Modifier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Modifier {}

impl PartialOrd for Modifier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Modifier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Modifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary_alias())
    }
}
