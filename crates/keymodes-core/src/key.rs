// Keymodes Key Type
// Represents a single key code (Linux input-event-codes.h numbering)

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Represents a single keyboard key code.
///
/// This is a newtype wrapper around u16 for type safety.
/// The numeric values match Linux input-event-codes.h definitions,
/// plus one reserved code (`Key::TRANSLATE`) that no keyboard produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl Key {
    pub const ESC: Key = Key(1);
    pub const MINUS: Key = Key(12);
    pub const U: Key = Key(22);
    pub const KPMINUS: Key = Key(74);

    /// Sentinel marking the replacement half of a translate pair.
    pub const TRANSLATE: Key = Key(0x2ff);

    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Get the name of this key
    pub fn name(self) -> &'static str {
        key_name(self.0)
    }

    /// Short form used in key descriptions ("n", "5", "-", "ESC")
    pub fn label(self) -> String {
        if let Some(digit) = self.main_row_digit() {
            return digit.to_string();
        }
        if let Some(c) = key_to_ascii(self) {
            return c.to_string();
        }
        let name = self.name();
        if name.len() == 1 {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Decode the digit carried by this key.
    ///
    /// Both the main digit row and the numeric pad decode into 0-9.
    pub fn digit(self) -> Option<u8> {
        self.main_row_digit().or_else(|| self.keypad_digit())
    }

    fn main_row_digit(self) -> Option<u8> {
        match self.0 {
            2..=10 => Some((self.0 - 1) as u8),
            11 => Some(0),
            _ => None,
        }
    }

    fn keypad_digit(self) -> Option<u8> {
        match self.0 {
            71 => Some(7),
            72 => Some(8),
            73 => Some(9),
            75 => Some(4),
            76 => Some(5),
            77 => Some(6),
            79 => Some(1),
            80 => Some(2),
            81 => Some(3),
            82 => Some(0),
            _ => None,
        }
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_from_name(s).ok_or_else(|| format!("Unknown key: {}", s))
    }
}

const KEY_TABLE: &[(u16, &str)] = &[
    (0, "RESERVED"),
    (1, "ESC"),
    (2, "KEY_1"),
    (3, "KEY_2"),
    (4, "KEY_3"),
    (5, "KEY_4"),
    (6, "KEY_5"),
    (7, "KEY_6"),
    (8, "KEY_7"),
    (9, "KEY_8"),
    (10, "KEY_9"),
    (11, "KEY_0"),
    (12, "MINUS"),
    (13, "EQUAL"),
    (14, "BACKSPACE"),
    (15, "TAB"),
    (16, "Q"),
    (17, "W"),
    (18, "E"),
    (19, "R"),
    (20, "T"),
    (21, "Y"),
    (22, "U"),
    (23, "I"),
    (24, "O"),
    (25, "P"),
    (26, "LEFT_BRACE"),
    (27, "RIGHT_BRACE"),
    (28, "ENTER"),
    (30, "A"),
    (31, "S"),
    (32, "D"),
    (33, "F"),
    (34, "G"),
    (35, "H"),
    (36, "J"),
    (37, "K"),
    (38, "L"),
    (39, "SEMICOLON"),
    (40, "APOSTROPHE"),
    (41, "GRAVE"),
    (43, "BACKSLASH"),
    (44, "Z"),
    (45, "X"),
    (46, "C"),
    (47, "V"),
    (48, "B"),
    (49, "N"),
    (50, "M"),
    (51, "COMMA"),
    (52, "DOT"),
    (53, "SLASH"),
    (55, "KPASTERISK"),
    (57, "SPACE"),
    (59, "F1"),
    (60, "F2"),
    (61, "F3"),
    (62, "F4"),
    (63, "F5"),
    (64, "F6"),
    (65, "F7"),
    (66, "F8"),
    (67, "F9"),
    (68, "F10"),
    (71, "KP7"),
    (72, "KP8"),
    (73, "KP9"),
    (74, "KPMINUS"),
    (75, "KP4"),
    (76, "KP5"),
    (77, "KP6"),
    (78, "KPPLUS"),
    (79, "KP1"),
    (80, "KP2"),
    (81, "KP3"),
    (82, "KP0"),
    (83, "KPDOT"),
    (87, "F11"),
    (88, "F12"),
    (96, "KPENTER"),
    (98, "KPSLASH"),
    (102, "HOME"),
    (103, "UP"),
    (104, "PAGE_UP"),
    (105, "LEFT"),
    (106, "RIGHT"),
    (107, "END"),
    (108, "DOWN"),
    (109, "PAGE_DOWN"),
    (110, "INSERT"),
    (111, "DELETE"),
    (117, "KPEQUAL"),
    (139, "MENU"),
    (0x2ff, "TRANSLATE"),
];

/// Extra spellings accepted by `key_from_name`
const KEY_ALIASES: &[(&str, u16)] = &[
    ("ESCAPE", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("BS", 14),
    ("RET", 28),
    ("RETURN", 28),
    ("SPC", 57),
    ("DEL", 111),
    ("PRIOR", 104),
    ("NEXT", 109),
];

/// Display name for a key code
pub fn key_name(code: u16) -> &'static str {
    static KEY_NAMES: OnceLock<Vec<&'static str>> = OnceLock::new();
    KEY_NAMES
        .get_or_init(|| {
            let mut names = vec!["UNKNOWN"; 0x300];
            for &(code, name) in KEY_TABLE {
                names[code as usize] = name;
            }
            names
        })
        .get(code as usize)
        .copied()
        .unwrap_or("UNKNOWN")
}

/// Try to parse a key name to a key code
///
/// Names are case-insensitive; single punctuation characters
/// (`-`, `;`, `/`, ...) are accepted as their own key. The reserved
/// `TRANSLATE` code has no spelling.
pub fn key_from_name(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(key) = ascii_to_key(c) {
            return Some(key);
        }
    }

    let name_upper = name.to_uppercase();
    KEY_TABLE
        .iter()
        .find(|(_, n)| *n == name_upper)
        .map(|(code, _)| Key::from(*code))
        .or_else(|| {
            KEY_ALIASES
                .iter()
                .find(|(n, _)| *n == name_upper)
                .map(|(_, code)| Key::from(*code))
        })
        .filter(|key| *key != Key::TRANSLATE)
}

/// ASCII character to key code mapping
pub fn ascii_to_key(c: char) -> Option<Key> {
    match c {
        ';' => Some(Key::from(39)),  // SEMICOLON
        '\'' => Some(Key::from(40)), // APOSTROPHE
        '=' => Some(Key::from(13)),  // EQUAL
        '-' => Some(Key::MINUS),
        '`' => Some(Key::from(41)),  // GRAVE
        '[' => Some(Key::from(26)),  // LEFT_BRACE
        ']' => Some(Key::from(27)),  // RIGHT_BRACE
        ',' => Some(Key::from(51)),  // COMMA
        '.' => Some(Key::from(52)),  // DOT
        '/' => Some(Key::from(53)),  // SLASH
        '\\' => Some(Key::from(43)), // BACKSLASH
        _ => None,
    }
}

fn key_to_ascii(key: Key) -> Option<char> {
    ";'=-`[],./\\"
        .chars()
        .find(|&c| ascii_to_key(c) == Some(key))
}
