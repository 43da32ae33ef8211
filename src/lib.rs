//! War Drum - rhythm-command battle engine
//!
//! Four drum symbols, struck on the beat, form a command. Commands march the
//! hero, strike the enemy, raise a guard or pull back, while the enemy runs its
//! own attack cycle. The engine is host-driven: every entry point takes the
//! current monotonic time and returns the events the presentation layer should
//! render or play.

pub mod battle;
pub mod core;
pub mod rhythm;
pub mod round;
pub mod schedule;
