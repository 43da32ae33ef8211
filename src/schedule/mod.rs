//! Deferred work on the host's clock
//!
//! The engine never sleeps or spawns. Timed effects are queued here and fired
//! when the host advances time.

pub mod scheduler;

pub use scheduler::{Scheduled, Scheduler};
