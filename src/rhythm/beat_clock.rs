//! Beat clock - periodic pulse from a fixed round origin
//!
//! Purely a cue for the player. Input timing is judged key-to-key by the
//! classifier, never against this clock.

use crate::core::config::BeatConfig;
use crate::core::types::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatClock {
    origin: Millis,
    period_ms: Millis,
    flash_ms: Millis,
}

impl BeatClock {
    pub fn new(config: &BeatConfig, origin: Millis) -> Self {
        Self {
            origin,
            period_ms: config.period_ms.max(1),
            flash_ms: config.flash_ms,
        }
    }

    pub fn origin(&self) -> Millis {
        self.origin
    }

    /// Time of the first pulse after the origin
    pub fn first_pulse(&self) -> Millis {
        self.origin + self.period_ms
    }

    /// Time of the pulse following one that fired at `pulse`
    pub fn next_pulse(&self, pulse: Millis) -> Millis {
        pulse + self.period_ms
    }

    /// When the flash started by a pulse at `pulse` should end
    pub fn flash_end(&self, pulse: Millis) -> Millis {
        pulse + self.flash_ms
    }

    /// Number of whole beats since the origin
    pub fn beat_index(&self, now: Millis) -> u64 {
        now.saturating_sub(self.origin) / self.period_ms
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.origin)
    }
}

/// Render elapsed round time as `MM:SS`
pub fn format_elapsed(elapsed: Millis) -> String {
    let minutes = elapsed / 60_000;
    let seconds = (elapsed % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}
