//! Events emitted to the presentation layer

use serde::{Deserialize, Serialize};

use crate::battle::combatant::DisplayState;
use crate::core::types::{Millis, Side};
use crate::rhythm::recognizer::Command;
use crate::rhythm::symbol::Symbol;

/// Terminal result of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

/// Background audio requests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AmbienceCue {
    /// Start (or restart) the battle loop at `volume`
    Start { volume: f32 },
    /// Dip the loop to `factor` of its level for `duration_ms`
    Duck { factor: f32, duration_ms: Millis },
    /// The dip window elapsed; back to `volume`
    Restore { volume: f32 },
    Stop,
    VictoryTheme,
    StopVictoryTheme,
}

/// Position, hp and pose of one combatant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatantUpdate {
    pub side: Side,
    pub position: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub display: DisplayState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    Feedback(String),
    SymbolAccepted { symbol: Symbol, index: usize },
    BufferCleared,
    Combatant(CombatantUpdate),
    BeatPulse,
    BeatFlashEnded,
    /// Elapsed round time, for the timer readout
    Elapsed { elapsed_ms: Millis },
    CommandRecognized { command: Command, combo: u32 },
    Combo(u32),
    Outcome(Option<Outcome>),
    PlaySound(Symbol),
    Ambience(AmbienceCue),
}

/// Events produced by one call into the engine, in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<EngineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn append(&mut self, mut other: EventLog) {
        self.events.append(&mut other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter()
    }

    /// Feedback lines in this log
    pub fn feedback(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            EngineEvent::Feedback(message) => Some(message.as_str()),
            _ => None,
        })
    }

    /// Commands recognized in this log
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.events.iter().filter_map(|e| match e {
            EngineEvent::CommandRecognized { command, .. } => Some(*command),
            _ => None,
        })
    }

    /// Terminal outcomes declared in this log
    pub fn outcomes(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.events.iter().filter_map(|e| match e {
            EngineEvent::Outcome(Some(outcome)) => Some(*outcome),
            _ => None,
        })
    }

    pub fn contains(&self, event: &EngineEvent) -> bool {
        self.events.contains(event)
    }
}

impl IntoIterator for EventLog {
    type Item = EngineEvent;
    type IntoIter = std::vec::IntoIter<EngineEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filters() {
        let mut log = EventLog::new();
        log.push(EngineEvent::Feedback("Listening...".into()));
        log.push(EngineEvent::CommandRecognized {
            command: Command::Walk,
            combo: 1,
        });
        log.push(EngineEvent::Outcome(None));
        log.push(EngineEvent::Outcome(Some(Outcome::Win)));

        assert_eq!(log.feedback().collect::<Vec<_>>(), vec!["Listening..."]);
        assert_eq!(log.commands().collect::<Vec<_>>(), vec![Command::Walk]);
        assert_eq!(log.outcomes().collect::<Vec<_>>(), vec![Outcome::Win]);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut first = EventLog::new();
        first.push(EngineEvent::BeatPulse);
        let mut second = EventLog::new();
        second.push(EngineEvent::BeatFlashEnded);
        first.append(second);
        assert_eq!(
            first.events,
            vec![EngineEvent::BeatPulse, EngineEvent::BeatFlashEnded]
        );
    }

    #[test]
    fn test_events_serialize() {
        let event = EngineEvent::SymbolAccepted {
            symbol: Symbol::Pon,
            index: 2,
        };
        let json = serde_json::to_string(&event).expect("event should serialize");
        assert!(json.contains("SymbolAccepted"));
        assert!(json.contains("Pon"));
    }
}
