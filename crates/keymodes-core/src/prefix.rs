// Keymodes Prefix Argument
// Numeric prefix-argument accumulation (C-u, digits, negation)

use std::fmt;

use crate::Combo;

/// The pending prefix argument
///
/// `Multiplier` is the explicit-multiplier form produced by C-u; a single
/// bare C-u is `Multiplier(4)`. `Number` comes from typed digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrefixArg {
    #[default]
    None,
    Number(i64),
    Multiplier(i64),
    /// A "-" typed before any digit
    Negative,
}

impl PrefixArg {
    /// The bare C-u marker
    pub const BARE: PrefixArg = PrefixArg::Multiplier(4);

    pub fn is_none(&self) -> bool {
        matches!(self, PrefixArg::None)
    }

    /// Numeric value a command sees when it consumes this argument
    pub fn value(&self) -> i64 {
        match self {
            PrefixArg::None => 1,
            PrefixArg::Number(n) | PrefixArg::Multiplier(n) => *n,
            PrefixArg::Negative => -1,
        }
    }
}

impl fmt::Display for PrefixArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixArg::None => write!(f, "none"),
            PrefixArg::Number(n) => write!(f, "{}", n),
            PrefixArg::Multiplier(n) => write!(f, "({})", n),
            PrefixArg::Negative => write!(f, "-"),
        }
    }
}

/// Error raised when a digit-argument event carries no digit
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("'{0}' does not carry a digit")]
pub struct NotADigit(pub String);

/// C-u: start or quadruple the multiplier
pub fn accumulate_universal(state: PrefixArg) -> PrefixArg {
    match state {
        PrefixArg::Number(n) | PrefixArg::Multiplier(n) => {
            PrefixArg::Multiplier(n.saturating_mul(4))
        }
        PrefixArg::Negative => PrefixArg::Multiplier(-4),
        PrefixArg::None => PrefixArg::BARE,
    }
}

/// A digit key: append it to a typed number, or start a new one
pub fn accumulate_digit(state: PrefixArg, event: &Combo) -> Result<PrefixArg, NotADigit> {
    let digit = event
        .key()
        .digit()
        .map(i64::from)
        .ok_or_else(|| NotADigit(event.to_string()))?;

    Ok(match state {
        PrefixArg::Number(n) if n < 0 => PrefixArg::Number(n.saturating_mul(10).saturating_sub(digit)),
        PrefixArg::Number(n) => PrefixArg::Number(n.saturating_mul(10).saturating_add(digit)),
        PrefixArg::Negative if digit == 0 => PrefixArg::Negative,
        PrefixArg::Negative => PrefixArg::Number(-digit),
        PrefixArg::None | PrefixArg::Multiplier(_) => PrefixArg::Number(digit),
    })
}

/// "-": negate a number, or toggle the pending minus sign
pub fn accumulate_negative(state: PrefixArg) -> PrefixArg {
    match state {
        PrefixArg::Number(n) => PrefixArg::Number(n.saturating_neg()),
        PrefixArg::Negative => PrefixArg::None,
        PrefixArg::None | PrefixArg::Multiplier(_) => PrefixArg::Negative,
    }
}
