// Shared base keymap inherited by every mode

use crate::command::Builtin;
use crate::config::parse_key_sequence;
use crate::mapping::{BindingTarget, Keymap};

const BASE_BINDINGS: &[(&str, Builtin)] = &[
    ("ESC ESC ESC", Builtin::DisableAllModes),
    ("C-u", Builtin::UniversalArgument),
    ("u", Builtin::UniversalArgument),
    ("-", Builtin::NegativeArgument),
    ("KPMINUS", Builtin::NegativeArgument),
];

const DIGIT_KEYS: &[&str] = &[
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "KP0", "KP1", "KP2", "KP3", "KP4", "KP5",
    "KP6", "KP7", "KP8", "KP9",
];

/// Build the base keymap: escape hatch and prefix-argument keys
pub fn base_keymap() -> Keymap {
    let mut keymap = Keymap::new("base");
    let digits = DIGIT_KEYS.iter().map(|desc| (*desc, Builtin::DigitArgument));

    for (desc, builtin) in BASE_BINDINGS.iter().copied().chain(digits) {
        match parse_key_sequence(desc) {
            Ok(keys) => {
                keymap.insert(keys, BindingTarget::Command(builtin.name().to_string()));
            }
            Err(e) => log::error!("Skipping base binding '{}': {}", desc, e),
        }
    }
    keymap
}
