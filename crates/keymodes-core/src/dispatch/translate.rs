// Key re-dispatcher
//
// A translate binding is stored twice: under the typed keys as the entry
// point, and under the sentinel-prefixed keys with the replacement. This
// module resolves the sentinel half.

use crate::mapping::{BindingTarget, KeyLookup, Keymap};
use crate::mode::ModeRegistry;
use crate::{Key, KeySequence};

/// What a translate binding resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// Keys to push onto the host's pending input
    Replay(KeySequence),
    /// A command to run in place of the typed keys
    Run(String),
}

/// Resolve the sentinel-prefixed form of `typed` through the enabled modes,
/// then the host's global keymap
pub fn resolve_translation(
    modes: &ModeRegistry,
    global: &Keymap,
    typed: &KeySequence,
) -> Option<Translation> {
    let marked = typed.prefixed(Key::TRANSLATE);

    let target = match modes.lookup(&marked) {
        KeyLookup::Bound(target) => Some(target),
        _ => global.get(&marked),
    }?;

    match target {
        BindingTarget::Keys(keys) => Some(Translation::Replay(keys.clone())),
        BindingTarget::Command(name) | BindingTarget::Trampoline { name, .. } => {
            Some(Translation::Run(name.clone()))
        }
        BindingTarget::Translate { .. } => None,
    }
}
