//! Command table lookup

use serde::{Deserialize, Serialize};

use crate::rhythm::buffer::COMMAND_LENGTH;
use crate::rhythm::symbol::Symbol;
use crate::rhythm::symbol::Symbol::{Chaka, Don, Pata, Pon};

/// A recognized four-beat command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Walk,
    Attack,
    Defend,
    Retreat,
}

impl Command {
    /// War chant shown while the command resolves
    pub fn chant(self) -> &'static str {
        match self {
            Command::Walk => "PATA PATA PATA PON!",
            Command::Attack => "PON PON PATA PON!",
            Command::Defend => "CHAKA CHAKA PATA PON!",
            Command::Retreat => "PATA PON DON CHAKA!",
        }
    }

    /// The phrase that triggers this command
    pub fn sequence(self) -> [Symbol; COMMAND_LENGTH] {
        match self {
            Command::Walk => COMMAND_TABLE[0].0,
            Command::Attack => COMMAND_TABLE[1].0,
            Command::Defend => COMMAND_TABLE[2].0,
            Command::Retreat => COMMAND_TABLE[3].0,
        }
    }
}

/// Exact, order-sensitive phrases
pub const COMMAND_TABLE: [([Symbol; COMMAND_LENGTH], Command); 4] = [
    ([Pata, Pata, Pata, Pon], Command::Walk),
    ([Pon, Pon, Pata, Pon], Command::Attack),
    ([Chaka, Chaka, Pata, Pon], Command::Defend),
    ([Pata, Pon, Don, Chaka], Command::Retreat),
];

/// Match a complete phrase. No prefix or partial matches.
pub fn recognize(sequence: &[Symbol; COMMAND_LENGTH]) -> Option<Command> {
    COMMAND_TABLE
        .iter()
        .find(|(phrase, _)| phrase == sequence)
        .map(|(_, command)| *command)
}
