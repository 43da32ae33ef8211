//! Round lifecycle - wiring input, recognition and battle together
//!
//! The controller owns the combo, the feedback line, every timer, and the
//! win/lose outcome. Hosts drive it with timestamps and render the events it
//! returns.

pub mod controller;
pub mod events;
pub mod observer;

pub use controller::{Phase, RoundController, RoundSnapshot};
pub use events::{AmbienceCue, CombatantUpdate, EngineEvent, EventLog, Outcome};
pub use observer::EngineObserver;
