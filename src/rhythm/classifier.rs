//! Input classification - rhythm windows over the gap between accepted keys
//!
//! Each accepted key is judged only against the key before it:
//! - gap above the fresh threshold: rhythm lost, the key starts a new phrase
//! - gap inside the on-beat window: the key extends the phrase
//! - anything else: a miss, the phrase is thrown away
//!
//! Every branch moves the timestamp to the key just judged, so the key after a
//! miss is timed from the miss rather than from stale context.

use serde::{Deserialize, Serialize};

use crate::core::config::RhythmConfig;
use crate::core::types::Millis;
use crate::rhythm::buffer::CommandBuffer;
use crate::rhythm::symbol::Symbol;

/// How a key was judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Rhythm lost or not yet established; the key opened a new buffer
    Fresh,
    /// On the beat; the key landed in slot `index`
    OnBeat { index: usize },
    /// Off the beat; the buffer was cleared
    Miss,
}

/// Turns timed symbols into buffer updates
#[derive(Debug, Clone)]
pub struct InputClassifier {
    windows: RhythmConfig,
    buffer: CommandBuffer,
    last_accepted: Millis,
}

impl InputClassifier {
    pub fn new(windows: RhythmConfig, now: Millis) -> Self {
        Self {
            windows,
            buffer: CommandBuffer::new(),
            last_accepted: now,
        }
    }

    /// Judge `symbol` arriving at `now` and update the buffer accordingly
    pub fn classify(&mut self, symbol: Symbol, now: Millis) -> Classification {
        let delta = now.saturating_sub(self.last_accepted);
        self.last_accepted = now;

        if delta > self.windows.fresh_after_ms {
            self.buffer.restart_with(symbol);
            return Classification::Fresh;
        }

        if (self.windows.on_beat_min_ms..=self.windows.on_beat_max_ms).contains(&delta) {
            if let Some(index) = self.buffer.push(symbol) {
                return Classification::OnBeat { index };
            }
        }

        self.buffer.clear();
        Classification::Miss
    }

    /// Clear the buffer and time the next key from `now`
    pub fn rearm(&mut self, now: Millis) {
        self.buffer.clear();
        self.last_accepted = now;
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    pub fn last_accepted(&self) -> Millis {
        self.last_accepted
    }
}
