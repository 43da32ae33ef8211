//! Callback surface for hosts that prefer observers over event logs

use crate::battle::combatant::DisplayState;
use crate::core::types::{Millis, Side};
use crate::rhythm::recognizer::Command;
use crate::rhythm::symbol::Symbol;
use crate::round::events::{AmbienceCue, EngineEvent, EventLog, Outcome};

/// Presentation-layer hooks. Every method defaults to doing nothing.
pub trait EngineObserver {
    fn on_feedback(&mut self, _message: &str) {}
    fn on_symbol_accepted(&mut self, _symbol: Symbol, _buffer_index: usize) {}
    fn on_buffer_cleared(&mut self) {}
    fn on_combatant_state(&mut self, _which: Side, _position: f32, _hp: f32, _display: DisplayState) {}
    fn on_beat_pulse(&mut self) {}
    fn on_beat_flash_ended(&mut self) {}
    fn on_elapsed(&mut self, _elapsed_ms: Millis) {}
    fn on_command(&mut self, _command: Command, _combo: u32) {}
    fn on_combo(&mut self, _combo: u32) {}
    fn on_outcome(&mut self, _outcome: Option<Outcome>) {}
    fn play_sound(&mut self, _symbol: Symbol) {}
    fn duck_ambience(&mut self, _factor: f32, _duration_ms: Millis) {}
    /// Every other ambience request
    fn on_ambience(&mut self, _cue: AmbienceCue) {}
}

impl EventLog {
    /// Replay this log against an observer, in order
    pub fn dispatch<O: EngineObserver + ?Sized>(&self, observer: &mut O) {
        for event in &self.events {
            match event {
                EngineEvent::Feedback(message) => observer.on_feedback(message),
                EngineEvent::SymbolAccepted { symbol, index } => {
                    observer.on_symbol_accepted(*symbol, *index)
                }
                EngineEvent::BufferCleared => observer.on_buffer_cleared(),
                EngineEvent::Combatant(update) => observer.on_combatant_state(
                    update.side,
                    update.position,
                    update.hp,
                    update.display,
                ),
                EngineEvent::BeatPulse => observer.on_beat_pulse(),
                EngineEvent::BeatFlashEnded => observer.on_beat_flash_ended(),
                EngineEvent::Elapsed { elapsed_ms } => observer.on_elapsed(*elapsed_ms),
                EngineEvent::CommandRecognized { command, combo } => {
                    observer.on_command(*command, *combo)
                }
                EngineEvent::Combo(combo) => observer.on_combo(*combo),
                EngineEvent::Outcome(outcome) => observer.on_outcome(*outcome),
                EngineEvent::PlaySound(symbol) => observer.play_sound(*symbol),
                EngineEvent::Ambience(AmbienceCue::Duck {
                    factor,
                    duration_ms,
                }) => observer.duck_ambience(*factor, *duration_ms),
                EngineEvent::Ambience(cue) => observer.on_ambience(*cue),
            }
        }
    }
}
