// Keymodes Config API - Key Description Parser
// Parses descriptions like "C-x C-f" or "ESC ESC ESC" into key sequences

use crate::{Combo, Key, KeySequence, Modifier};

/// Result of parsing a single combo string
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCombo {
    /// The modifiers parsed from the string (in order, deduplicated)
    pub modifiers: Vec<Modifier>,
    /// The key (the last component after hyphens)
    pub key: Key,
}

impl ParsedCombo {
    pub fn into_combo(self) -> Combo {
        Combo::new(self.modifiers, self.key)
    }
}

/// Errors that can occur during key description parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComboParseError {
    #[error("key description cannot be empty")]
    EmptyInput,

    #[error("unknown key name: '{0}'")]
    UnknownKey(String),

    #[error("unknown modifier: '{0}'")]
    UnknownModifier(String),

    #[error("combo string cannot end with hyphen")]
    TrailingHyphen,
}

/// Parse a combo string like "C-M-a" into modifiers and key
///
/// A lone "-" is the minus key, and "C--" is Ctrl+minus. An uppercase
/// letter is the shifted key: "J" parses as "S-j".
///
/// # Examples
/// ```
/// use keymodes_core::config::parse_combo_string;
/// use keymodes_core::Key;
/// let parsed = parse_combo_string("C-a").unwrap();
/// assert_eq!(parsed.modifiers.len(), 1);
/// assert_eq!(parsed.key, Key::from(30)); // A
/// ```
pub fn parse_combo_string(exp: &str) -> Result<ParsedCombo, ComboParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(ComboParseError::EmptyInput);
    }

    let (modifier_part, key_str) = if trimmed == "-" {
        ("", "-")
    } else if let Some(head) = trimmed.strip_suffix("--") {
        (head, "-")
    } else if trimmed.ends_with('-') {
        return Err(ComboParseError::TrailingHyphen);
    } else {
        match trimmed.rfind('-') {
            Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
            None => ("", trimmed),
        }
    };

    let key = crate::key::key_from_name(key_str)
        .ok_or_else(|| ComboParseError::UnknownKey(key_str.to_string()))?;

    let mut modifiers: Vec<Modifier> = Vec::new();
    if !modifier_part.is_empty() {
        for modifier_str in modifier_part.split('-') {
            let modifier = Modifier::from_alias(modifier_str)
                .ok_or_else(|| ComboParseError::UnknownModifier(modifier_str.to_string()))?;

            // Avoid duplicate modifiers
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }
    }

    if is_upper_letter(key_str) {
        if let Some(shift) = Modifier::from_name("SHIFT") {
            if !modifiers.contains(&shift) {
                modifiers.push(shift);
            }
        }
    }

    Ok(ParsedCombo { modifiers, key })
}

fn is_upper_letter(key_str: &str) -> bool {
    let mut chars = key_str.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

/// Parse a whitespace-separated key description into a sequence
///
/// # Examples
/// ```
/// use keymodes_core::config::parse_key_sequence;
/// let seq = parse_key_sequence("C-x C-f").unwrap();
/// assert_eq!(seq.len(), 2);
/// assert_eq!(seq.to_string(), "C-x C-f");
/// ```
pub fn parse_key_sequence(desc: &str) -> Result<KeySequence, ComboParseError> {
    let mut sequence = KeySequence::new();
    for part in desc.split_whitespace() {
        sequence.push(parse_combo_string(part)?.into_combo());
    }
    if sequence.is_empty() {
        return Err(ComboParseError::EmptyInput);
    }
    Ok(sequence)
}
