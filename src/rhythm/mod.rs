//! Rhythm input - from raw timed keys to recognized commands
//!
//! Keys become symbols, symbols are classified against the gap since the last
//! accepted key, and a full four-symbol buffer is matched against the command
//! table. The beat clock is a cue only; it never gates input.

pub mod beat_clock;
pub mod buffer;
pub mod classifier;
pub mod recognizer;
pub mod symbol;

pub use beat_clock::{format_elapsed, BeatClock};
pub use buffer::{CommandBuffer, COMMAND_LENGTH};
pub use classifier::{Classification, InputClassifier};
pub use recognizer::{recognize, Command, COMMAND_TABLE};
pub use symbol::Symbol;
