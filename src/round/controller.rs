//! Round controller - the single owner of round state and timers
//!
//! Flow: key -> classifier -> (four symbols) recognizer -> battle transition.
//! Every delayed effect is a `RoundTask` on the scheduler, stamped with the
//! round generation. Restart and terminal outcomes bump the generation, so no
//! callback from an earlier round can touch the current one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::{Combatant, EnemyState, HeroState};
use crate::battle::state::{ActionEffect, BattleState, EnemyTick};
use crate::core::config::EngineConfig;
use crate::core::types::{Millis, Side};
use crate::rhythm::beat_clock::BeatClock;
use crate::rhythm::buffer::{CommandBuffer, COMMAND_LENGTH};
use crate::rhythm::classifier::{Classification, InputClassifier};
use crate::rhythm::recognizer::{recognize, Command};
use crate::rhythm::symbol::Symbol;
use crate::round::events::{AmbienceCue, CombatantUpdate, EngineEvent, EventLog, Outcome};
use crate::schedule::Scheduler;

const MSG_START: &str = "Keep the Rhythm! (Wait for the beat)";
const MSG_RESTART: &str = "Drum to the beat!";
const MSG_LISTENING: &str = "Listening...";
const MSG_MISS: &str = "Miss! Rhythm broken!";
const MSG_UNKNOWN: &str = "Unknown sequence.";
const MSG_TOO_FAR: &str = "Too far! Get closer!";
const MSG_YOUR_TURN: &str = "Your turn! Drum to the beat!";
const MSG_WIN: &str = "Mission Complete!";
const MSG_LOSE: &str = "The Hero fell...";

/// Whether keys are being taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    AcceptingInput,
    /// A recognized command is playing out; keys are dropped
    ActionResolving,
    /// An unknown phrase is on screen; keys are dropped until it clears
    RejectingSequence,
}

/// Deferred work, fired by `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundTask {
    BeatPulse,
    BeatFlashEnd,
    ClockTick,
    EnemyCycle,
    EnemyStrike,
    StrikeRecover,
    ActionEffect(Command),
    ActionComplete,
    EnemyRecover,
    UnknownClear,
    AmbienceRestore,
}

/// Comparable view of everything a restart must reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub combo: u32,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
    pub buffer: Vec<Symbol>,
    pub last_accepted: Millis,
    pub round_origin: Millis,
    pub hero: Combatant<HeroState>,
    pub enemy: Combatant<EnemyState>,
}

pub struct RoundController<R = ChaCha8Rng> {
    config: EngineConfig,
    rng: R,
    scheduler: Scheduler<RoundTask>,
    classifier: InputClassifier,
    battle: BattleState,
    beat: BeatClock,
    combo: u32,
    phase: Phase,
    outcome: Option<Outcome>,
    feedback: String,
    ambience_restore_at: Option<Millis>,
    now: Millis,
    started: bool,
    torn_down: bool,
}

impl RoundController<ChaCha8Rng> {
    /// Controller with a seeded ChaCha damage roll
    pub fn with_seed(config: EngineConfig, seed: u64, now: Millis) -> Self {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed), now)
    }
}

impl<R: Rng> RoundController<R> {
    /// Build a controller. Nothing runs until `start`.
    pub fn new(config: EngineConfig, rng: R, now: Millis) -> Self {
        Self {
            classifier: InputClassifier::new(config.rhythm.clone(), now),
            battle: BattleState::new(&config.battle, &config.enemy),
            beat: BeatClock::new(&config.beat, now),
            config,
            rng,
            scheduler: Scheduler::new(),
            combo: 0,
            phase: Phase::AcceptingInput,
            outcome: None,
            feedback: MSG_START.to_string(),
            ambience_restore_at: None,
            now,
            started: false,
            torn_down: false,
        }
    }

    // ===== LIFECYCLE =====

    /// Start the first round at `now`
    pub fn start(&mut self, now: Millis) -> EventLog {
        let mut log = EventLog::new();
        if self.torn_down || self.started {
            tracing::warn!("start ignored: round already started or torn down");
            return log;
        }
        tracing::info!(now, "round started");
        log.push(EngineEvent::Ambience(AmbienceCue::Start {
            volume: self.config.audio.ambience_volume,
        }));
        self.begin_round(now, MSG_START, &mut log);
        log
    }

    /// Reinitialize every piece of round state and restart the timers from `now`
    pub fn restart(&mut self, now: Millis) -> EventLog {
        let mut log = EventLog::new();
        if self.torn_down {
            return log;
        }
        tracing::info!(now, previous = ?self.outcome, "round restarted");
        log.push(EngineEvent::Ambience(AmbienceCue::StopVictoryTheme));
        log.push(EngineEvent::Ambience(AmbienceCue::Start {
            volume: self.config.audio.ambience_volume,
        }));
        self.begin_round(now, MSG_RESTART, &mut log);
        log
    }

    /// Invalidate every pending task; all later calls are no-ops
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.scheduler.cancel_all();
        self.torn_down = true;
        tracing::info!("round controller torn down");
    }

    fn begin_round(&mut self, now: Millis, message: &str, log: &mut EventLog) {
        self.scheduler.cancel_all();
        self.now = now;
        self.started = true;

        self.battle.reset();
        self.classifier.rearm(now);
        self.beat = BeatClock::new(&self.config.beat, now);
        self.combo = 0;
        self.phase = Phase::AcceptingInput;
        self.outcome = None;
        self.ambience_restore_at = None;

        self.scheduler.schedule_at(self.beat.first_pulse(), RoundTask::BeatPulse);
        self.scheduler
            .schedule_at(now + self.config.beat.clock_period_ms, RoundTask::ClockTick);
        self.scheduler
            .schedule_at(now + self.config.enemy.attack_interval_ms, RoundTask::EnemyCycle);

        self.set_feedback(message, log);
        log.push(EngineEvent::Combo(0));
        log.push(EngineEvent::BufferCleared);
        log.push(self.combatant_update(Side::Hero));
        log.push(self.combatant_update(Side::Enemy));
        log.push(EngineEvent::Outcome(None));
    }

    // ===== INPUT =====

    /// Raw key from the host. Keys outside the drum alphabet only advance time.
    pub fn handle_key(&mut self, key: char, now: Millis) -> EventLog {
        match Symbol::from_key(key) {
            Some(symbol) => self.on_symbol(symbol, now),
            None => {
                tracing::trace!(?key, "ignoring key outside the drum alphabet");
                self.advance(now)
            }
        }
    }

    /// A drum symbol struck at `now`
    pub fn on_symbol(&mut self, symbol: Symbol, now: Millis) -> EventLog {
        let mut log = self.advance(now);
        if !self.is_accepting_input() {
            // The drum still sounds while an unknown phrase is on screen
            if self.phase == Phase::RejectingSequence && self.is_live() {
                log.push(EngineEvent::PlaySound(symbol));
            }
            tracing::trace!(?symbol, phase = ?self.phase, "symbol dropped");
            return log;
        }
        let now = self.now;

        log.push(EngineEvent::PlaySound(symbol));
        let classification = self.classifier.classify(symbol, now);
        tracing::debug!(?symbol, ?classification, now, "symbol classified");

        match classification {
            Classification::Fresh => {
                self.set_feedback(MSG_LISTENING, &mut log);
                log.push(EngineEvent::BufferCleared);
                log.push(EngineEvent::SymbolAccepted { symbol, index: 0 });
            }
            Classification::OnBeat { index } => {
                log.push(EngineEvent::SymbolAccepted { symbol, index });
            }
            Classification::Miss => {
                self.reset_combo(&mut log);
                self.set_feedback(MSG_MISS, &mut log);
                log.push(EngineEvent::BufferCleared);
                self.duck_ambience(now, &mut log);
            }
        }

        if let Some(sequence) = self.classifier.buffer().sequence() {
            self.resolve_sequence(sequence, now, &mut log);
        }
        log
    }

    fn resolve_sequence(&mut self, sequence: [Symbol; COMMAND_LENGTH], now: Millis, log: &mut EventLog) {
        match recognize(&sequence) {
            Some(command) => self.execute_command(command, now, log),
            None => {
                tracing::debug!(?sequence, "unknown sequence");
                self.reset_combo(log);
                self.set_feedback(MSG_UNKNOWN, log);
                self.phase = Phase::RejectingSequence;
                self.scheduler
                    .schedule_at(now + self.config.rhythm.unknown_clear_ms, RoundTask::UnknownClear);
            }
        }
    }

    fn execute_command(&mut self, command: Command, now: Millis, log: &mut EventLog) {
        self.phase = Phase::ActionResolving;
        self.combo += 1;
        tracing::info!(?command, combo = self.combo, "command recognized");

        log.push(EngineEvent::CommandRecognized {
            command,
            combo: self.combo,
        });
        log.push(EngineEvent::Combo(self.combo));
        self.set_feedback(command.chant(), log);

        self.battle.begin_action(command);
        log.push(self.combatant_update(Side::Hero));

        if command != Command::Defend {
            self.scheduler.schedule_at(
                now + self.config.battle.action_effect_ms,
                RoundTask::ActionEffect(command),
            );
        }
        self.scheduler
            .schedule_at(now + self.config.battle.action_resolution_ms, RoundTask::ActionComplete);
    }

    // ===== TIME =====

    /// Fire every task due at or before `now`, each at its own due time
    pub fn advance(&mut self, now: Millis) -> EventLog {
        let mut log = EventLog::new();
        if self.torn_down || !self.started {
            return log;
        }
        if now < self.now {
            tracing::warn!(now, last = self.now, "host clock went backwards; holding time");
        }
        let now = now.max(self.now);

        while let Some(scheduled) = self.scheduler.pop_due(now) {
            self.now = scheduled.due;
            self.run_task(scheduled.task, scheduled.due, &mut log);
        }
        self.now = now;
        log
    }

    fn run_task(&mut self, task: RoundTask, due: Millis, log: &mut EventLog) {
        tracing::trace!(?task, due, "task fired");
        match task {
            RoundTask::BeatPulse => {
                log.push(EngineEvent::BeatPulse);
                self.scheduler.schedule_at(self.beat.flash_end(due), RoundTask::BeatFlashEnd);
                self.scheduler.schedule_at(self.beat.next_pulse(due), RoundTask::BeatPulse);
            }
            RoundTask::BeatFlashEnd => log.push(EngineEvent::BeatFlashEnded),
            RoundTask::ClockTick => {
                log.push(EngineEvent::Elapsed {
                    elapsed_ms: self.beat.elapsed(due),
                });
                self.scheduler
                    .schedule_at(due + self.config.beat.clock_period_ms, RoundTask::ClockTick);
            }
            RoundTask::EnemyCycle => {
                self.scheduler
                    .schedule_at(due + self.config.enemy.attack_interval_ms, RoundTask::EnemyCycle);
                self.enemy_cycle(due, log);
            }
            RoundTask::EnemyStrike => {
                let strike = self.battle.enemy_strike();
                tracing::debug!(damage = strike.damage, hero_hp = strike.hero_hp, "enemy strike landed");
                log.push(self.combatant_update(Side::Hero));
                if strike.defeated {
                    self.declare(Outcome::Lose, log);
                } else {
                    self.scheduler
                        .schedule_at(due + self.config.enemy.recover_ms, RoundTask::StrikeRecover);
                }
            }
            RoundTask::StrikeRecover => {
                self.battle.recover_after_strike();
                log.push(self.combatant_update(Side::Hero));
                log.push(self.combatant_update(Side::Enemy));
            }
            RoundTask::ActionEffect(command) => self.land_action(command, due, log),
            RoundTask::ActionComplete => {
                self.phase = Phase::AcceptingInput;
                self.battle.finish_action();
                self.classifier.rearm(due);
                self.set_feedback(MSG_YOUR_TURN, log);
                log.push(EngineEvent::BufferCleared);
                log.push(self.combatant_update(Side::Hero));
            }
            RoundTask::EnemyRecover => {
                self.battle.recover_enemy();
                log.push(self.combatant_update(Side::Enemy));
            }
            RoundTask::UnknownClear => {
                self.phase = Phase::AcceptingInput;
                self.classifier.rearm(due);
                log.push(EngineEvent::BufferCleared);
            }
            RoundTask::AmbienceRestore => {
                // A later miss re-ducked; its own restore is still queued
                if self.ambience_restore_at == Some(due) {
                    self.ambience_restore_at = None;
                    log.push(EngineEvent::Ambience(AmbienceCue::Restore {
                        volume: self.config.audio.ambience_volume,
                    }));
                }
            }
        }
    }

    fn enemy_cycle(&mut self, due: Millis, log: &mut EventLog) {
        if self.phase == Phase::ActionResolving {
            tracing::debug!(due, "enemy holds while player action resolves");
            return;
        }
        match self.battle.enemy_tick() {
            EnemyTick::WindUp => {
                tracing::debug!(due, distance = self.battle.distance(), "enemy winds up");
                self.scheduler
                    .schedule_at(due + self.config.enemy.windup_ms, RoundTask::EnemyStrike);
            }
            EnemyTick::Advanced { from, to } => {
                tracing::debug!(from, to, "enemy advances");
            }
        }
        log.push(self.combatant_update(Side::Enemy));
    }

    fn land_action(&mut self, command: Command, due: Millis, log: &mut EventLog) {
        let effect = self.battle.apply_action_effect(command, &mut self.rng);
        tracing::debug!(?command, ?effect, "action effect landed");
        match effect {
            ActionEffect::Moved { .. } => log.push(self.combatant_update(Side::Hero)),
            ActionEffect::Struck { defeated, .. } => {
                log.push(self.combatant_update(Side::Enemy));
                if defeated {
                    self.declare(Outcome::Win, log);
                } else {
                    self.scheduler
                        .schedule_at(due + self.config.battle.enemy_hurt_ms, RoundTask::EnemyRecover);
                }
            }
            ActionEffect::OutOfRange { .. } => self.set_feedback(MSG_TOO_FAR, log),
            ActionEffect::Held => {}
        }
    }

    /// Terminal outcome: freeze the round until restart
    fn declare(&mut self, outcome: Outcome, log: &mut EventLog) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.scheduler.cancel_all();
        tracing::info!(?outcome, combo = self.combo, "round over");

        match outcome {
            Outcome::Win => {
                self.ambience_restore_at = None;
                log.push(EngineEvent::Ambience(AmbienceCue::Stop));
                log.push(EngineEvent::Ambience(AmbienceCue::VictoryTheme));
                self.set_feedback(MSG_WIN, log);
            }
            Outcome::Lose => {
                // The queued restore was just cancelled; undo the dip now
                if self.ambience_restore_at.take().is_some() {
                    log.push(EngineEvent::Ambience(AmbienceCue::Restore {
                        volume: self.config.audio.ambience_volume,
                    }));
                }
                self.set_feedback(MSG_LOSE, log);
            }
        }
        log.push(EngineEvent::Outcome(Some(outcome)));
    }

    // ===== HELPERS =====

    fn reset_combo(&mut self, log: &mut EventLog) {
        self.combo = 0;
        log.push(EngineEvent::Combo(0));
    }

    fn set_feedback(&mut self, message: &str, log: &mut EventLog) {
        self.feedback = message.to_string();
        log.push(EngineEvent::Feedback(message.to_string()));
    }

    fn duck_ambience(&mut self, now: Millis, log: &mut EventLog) {
        let audio = &self.config.audio;
        let restore_at = now + audio.duck_ms;
        log.push(EngineEvent::Ambience(AmbienceCue::Duck {
            factor: audio.duck_factor(),
            duration_ms: audio.duck_ms,
        }));
        self.ambience_restore_at = Some(restore_at);
        self.scheduler.schedule_at(restore_at, RoundTask::AmbienceRestore);
    }

    fn combatant_update(&self, side: Side) -> EngineEvent {
        let update = match side {
            Side::Hero => CombatantUpdate {
                side,
                position: self.battle.hero.position,
                hp: self.battle.hero.hp,
                max_hp: self.battle.hero.max_hp,
                display: self.battle.hero.state.into(),
            },
            Side::Enemy => CombatantUpdate {
                side,
                position: self.battle.enemy.position,
                hp: self.battle.enemy.hp,
                max_hp: self.battle.enemy.max_hp,
                display: self.battle.enemy.state.into(),
            },
        };
        EngineEvent::Combatant(update)
    }

    // ===== ACCESSORS =====

    pub fn is_accepting_input(&self) -> bool {
        self.is_live() && self.phase == Phase::AcceptingInput
    }

    /// Started, not torn down, no outcome yet
    fn is_live(&self) -> bool {
        self.started && !self.torn_down && self.outcome.is_none()
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn buffer(&self) -> &CommandBuffer {
        self.classifier.buffer()
    }

    pub fn battle(&self) -> &BattleState {
        &self.battle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Latest time the controller has seen
    pub fn now(&self) -> Millis {
        self.now
    }

    /// When the next scheduled task will fire, for hosts that sleep between frames
    pub fn next_wakeup(&mut self) -> Option<Millis> {
        if self.torn_down {
            return None;
        }
        self.scheduler.next_due()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            combo: self.combo,
            phase: self.phase,
            outcome: self.outcome,
            buffer: self.classifier.buffer().as_slice().to_vec(),
            last_accepted: self.classifier.last_accepted(),
            round_origin: self.beat.origin(),
            hero: self.battle.hero.clone(),
            enemy: self.battle.enemy.clone(),
        }
    }
}
