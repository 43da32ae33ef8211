//! Drum symbols and their key bindings

use serde::{Deserialize, Serialize};

/// One of the four drum symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Pata,
    Pon,
    Don,
    Chaka,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [Symbol::Pata, Symbol::Pon, Symbol::Don, Symbol::Chaka];

    /// Map a raw key to a symbol (case-insensitive). Keys outside the alphabet map to `None`.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'A' => Some(Symbol::Pata),
            'D' => Some(Symbol::Pon),
            'S' => Some(Symbol::Don),
            'W' => Some(Symbol::Chaka),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Symbol::Pata => 'A',
            Symbol::Pon => 'D',
            Symbol::Don => 'S',
            Symbol::Chaka => 'W',
        }
    }

    /// Drum call, also the name of the sample the host plays
    pub fn name(self) -> &'static str {
        match self {
            Symbol::Pata => "PATA",
            Symbol::Pon => "PON",
            Symbol::Don => "DON",
            Symbol::Chaka => "CHAKA",
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
