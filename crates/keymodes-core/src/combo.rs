// Keymodes Combo Type
// Represents a key combination with modifiers, and sequences of them

use std::fmt;
use std::ops::Deref;

use smallvec::SmallVec;

use crate::modifier::Modifier;
use crate::Key;

/// Represents a key combination with a set of modifiers
///
/// Modifiers are kept sorted and deduplicated, so equality and hashing
/// do not depend on the order they were written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combo {
    modifiers: SmallVec<[Modifier; 2]>,
    key: Key,
}

impl Combo {
    /// Create a new Combo from modifiers and a key
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: Key) -> Self {
        let mut modifiers: SmallVec<[Modifier; 2]> = modifiers.into_iter().collect();
        modifiers.sort();
        modifiers.dedup();
        Self { modifiers, key }
    }

    /// Create a Combo without modifiers
    pub fn plain(key: Key) -> Self {
        Self {
            modifiers: SmallVec::new(),
            key,
        }
    }

    /// Create a Combo from a single modifier and key
    pub fn from_single(modifier: Modifier, key: Key) -> Self {
        Self::new([modifier], key)
    }

    /// Get the modifiers for this combo
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Get the key for this combo
    pub fn key(&self) -> Key {
        self.key
    }
}

impl From<Key> for Combo {
    fn from(key: Key) -> Self {
        Combo::plain(key)
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}-", modifier)?;
        }
        write!(f, "{}", self.key.label())
    }
}

/// An ordered sequence of combos, such as "C-x C-f"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeySequence(SmallVec<[Combo; 4]>);

impl KeySequence {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn push(&mut self, combo: Combo) {
        self.0.push(combo);
    }

    /// Take the contents, leaving this sequence empty
    pub fn take(&mut self) -> KeySequence {
        std::mem::take(self)
    }

    /// Copy of this sequence with `key` in front of it
    pub fn prefixed(&self, key: Key) -> KeySequence {
        std::iter::once(Combo::plain(key))
            .chain(self.0.iter().cloned())
            .collect()
    }

    /// Last combo typed, if any
    pub fn last_combo(&self) -> Option<&Combo> {
        self.0.last()
    }
}

impl Deref for KeySequence {
    type Target = [Combo];

    fn deref(&self) -> &[Combo] {
        &self.0
    }
}

impl FromIterator<Combo> for KeySequence {
    fn from_iter<I: IntoIterator<Item = Combo>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Combo>> for KeySequence {
    fn from(combos: Vec<Combo>) -> Self {
        Self(combos.into())
    }
}

impl From<Combo> for KeySequence {
    fn from(combo: Combo) -> Self {
        std::iter::once(combo).collect()
    }
}

impl<'a> IntoIterator for &'a KeySequence {
    type Item = &'a Combo;
    type IntoIter = std::slice::Iter<'a, Combo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, combo) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", combo)?;
        }
        Ok(())
    }
}
