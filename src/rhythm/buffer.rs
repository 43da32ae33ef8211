//! Bounded buffer of accepted symbols

use serde::{Deserialize, Serialize};

use crate::rhythm::symbol::Symbol;

/// Number of symbols in a command
pub const COMMAND_LENGTH: usize = 4;

/// The in-progress phrase, 0 to 4 symbols
///
/// Only ever cleared wholesale; there is no way to drop a single symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBuffer {
    symbols: Vec<Symbol>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            symbols: Vec::with_capacity(COMMAND_LENGTH),
        }
    }

    /// Append a symbol, returning its slot index, or `None` if the buffer is already full
    pub fn push(&mut self, symbol: Symbol) -> Option<usize> {
        if self.is_complete() {
            return None;
        }
        self.symbols.push(symbol);
        Some(self.symbols.len() - 1)
    }

    /// Replace the contents with a single symbol
    pub fn restart_with(&mut self, symbol: Symbol) {
        self.symbols.clear();
        self.symbols.push(symbol);
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.symbols.len() == COMMAND_LENGTH
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The full phrase, once all four slots are filled
    pub fn sequence(&self) -> Option<[Symbol; COMMAND_LENGTH]> {
        self.symbols.as_slice().try_into().ok()
    }
}
