//! Core type definitions used throughout the engine

use serde::{Deserialize, Serialize};

/// Host-supplied monotonic time, in milliseconds
pub type Millis = u64;

/// Round generation counter
///
/// Bumped on every restart and terminal outcome. Scheduled work stamped with an
/// older generation is discarded instead of firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// The two combatants on the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Hero,
    Enemy,
}
