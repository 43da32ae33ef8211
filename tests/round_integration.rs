//! Round lifecycle integration tests
//!
//! Drives the controller through complete phrases, enemy cycles and
//! win/lose/restart, asserting on state and emitted events.

use war_drum::battle::{DisplayState, EnemyState, HeroState};
use war_drum::core::config::EngineConfig;
use war_drum::core::types::{Millis, Side};
use war_drum::rhythm::{format_elapsed, Command, Symbol};
use war_drum::round::{
    AmbienceCue, EngineEvent, EngineObserver, EventLog, Outcome, Phase, RoundController,
};

fn started(config: EngineConfig, now: Millis) -> RoundController {
    let mut round = RoundController::with_seed(config, 7, now);
    round.start(now);
    round
}

/// Strike `keys` starting at `first`, `gap` ms apart
fn drum(round: &mut RoundController, keys: &str, first: Millis, gap: Millis) -> EventLog {
    let mut log = EventLog::new();
    for (i, key) in keys.chars().enumerate() {
        log.append(round.handle_key(key, first + gap * i as Millis));
    }
    log
}

fn config_with_hero_at(position: f32) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.battle.hero_start = position;
    config
}

#[test]
fn test_walk_phrase_moves_hero() {
    let mut round = started(EngineConfig::default(), 0);

    let log = drum(&mut round, "AAAD", 1000, 400);
    assert_eq!(log.commands().collect::<Vec<_>>(), vec![Command::Walk]);
    assert_eq!(round.combo(), 1);
    assert_eq!(round.feedback(), "PATA PATA PATA PON!");

    round.advance(3199);
    assert_eq!(round.battle().hero.position, 20.0);
    round.advance(3200);
    assert!(round.battle().hero.position > 20.0);
    assert_eq!(round.battle().hero.position, 32.0);
}

#[test]
fn test_attack_in_range_damages_enemy() {
    let mut round = started(config_with_hero_at(55.0), 0);

    drum(&mut round, "DDAD", 1000, 400);
    assert_eq!(round.combo(), 1);
    assert_eq!(round.battle().hero.state, HeroState::Attacking);

    let log = round.advance(3200);
    let enemy_hp = round.battle().enemy.hp;
    assert!(enemy_hp <= 100.0 - 15.0, "damage at least 15, hp {}", enemy_hp);
    assert!(enemy_hp > 100.0 - 23.0, "damage below 23, hp {}", enemy_hp);
    assert_eq!(round.battle().enemy.state, EnemyState::Hurt);
    assert!(log.iter().any(|e| matches!(
        e,
        EngineEvent::Combatant(u) if u.side == Side::Enemy && u.display == DisplayState::Hurt
    )));

    round.advance(3700);
    assert_eq!(round.battle().enemy.state, EnemyState::Idle);
}

#[test]
fn test_attack_out_of_range_is_too_far() {
    let mut round = started(EngineConfig::default(), 0);

    drum(&mut round, "DDAD", 1000, 400);
    let log = round.advance(3200);

    assert_eq!(round.battle().enemy.hp, 100.0);
    assert!(log.feedback().any(|line| line == "Too far! Get closer!"));
    assert_eq!(round.combo(), 1);
}

#[test]
fn test_unknown_sequence_resets_combo() {
    let mut round = started(EngineConfig::default(), 0);

    drum(&mut round, "AAAD", 1000, 400);
    round.advance(4200);
    assert_eq!(round.combo(), 1);

    let log = drum(&mut round, "ASAD", 5200, 400);
    assert_eq!(log.commands().count(), 0);
    assert_eq!(round.combo(), 0);
    assert_eq!(round.feedback(), "Unknown sequence.");
    assert_eq!(round.buffer().len(), 4);

    round.advance(6899);
    assert_eq!(round.buffer().len(), 4);
    let log = round.advance(6900);
    assert!(log.contains(&EngineEvent::BufferCleared));
    assert!(round.buffer().is_empty());
    assert_eq!(round.phase(), Phase::AcceptingInput);
}

#[test]
fn test_unknown_clear_shorter_than_action_resolution() {
    let config = EngineConfig::default();
    assert!(config.rhythm.unknown_clear_ms < config.battle.action_resolution_ms);
}

#[test]
fn test_miss_breaks_rhythm() {
    let mut round = started(EngineConfig::default(), 0);

    drum(&mut round, "AAA", 1000, 400);
    let log = round.handle_key('D', 1900);
    assert!(log.feedback().any(|line| line == "Miss! Rhythm broken!"));
    assert!(log.contains(&EngineEvent::PlaySound(Symbol::Pon)));
    assert!(round.buffer().is_empty());
    assert_eq!(round.combo(), 0);
}

#[test]
fn test_enemy_holds_while_action_resolves() {
    let mut round = started(config_with_hero_at(50.0), 0);

    // Defend recognized at 4600, resolving until 6600; the 5000 cycle is skipped
    drum(&mut round, "WWAD", 3400, 400);
    assert_eq!(round.phase(), Phase::ActionResolving);

    let log = round.advance(6600);
    assert_eq!(round.battle().hero.hp, 50.0);
    assert_eq!(round.battle().enemy.state, EnemyState::Idle);
    assert!(!log.iter().any(|e| matches!(
        e,
        EngineEvent::Combatant(u) if u.side == Side::Hero && u.display == DisplayState::Hurt
    )));

    // Next cycle runs normally
    round.advance(10_000);
    assert_eq!(round.battle().enemy.state, EnemyState::Attacking);
    round.advance(10_800);
    assert_eq!(round.battle().hero.hp, 35.0);
    assert_eq!(round.battle().hero.state, HeroState::Hurt);
    round.advance(11_300);
    assert_eq!(round.battle().hero.state, HeroState::Idle);
    assert_eq!(round.battle().enemy.state, EnemyState::Idle);
}

#[test]
fn test_defend_during_windup_reduces_damage() {
    let mut round = started(config_with_hero_at(50.0), 0);

    // The 5000 cycle winds up before the last key lands, then Defend resolves
    drum(&mut round, "WWAD", 3800, 400);
    assert_eq!(round.battle().enemy.state, EnemyState::Attacking);
    assert_eq!(round.battle().hero.state, HeroState::Defending);

    round.advance(5800);
    assert_eq!(round.battle().hero.hp, 47.0);
    assert_eq!(round.battle().hero.state, HeroState::Defending);

    round.advance(6300);
    assert_eq!(round.battle().hero.state, HeroState::Defending);
    assert_eq!(round.battle().enemy.state, EnemyState::Idle);

    round.advance(7000);
    assert_eq!(round.battle().hero.state, HeroState::Idle);
}

#[test]
fn test_retreat_during_windup_takes_no_damage() {
    let mut round = started(config_with_hero_at(50.0), 0);

    drum(&mut round, "ADSW", 3800, 400);
    assert_eq!(round.battle().hero.state, HeroState::Retreating);

    round.advance(5800);
    assert_eq!(round.battle().hero.hp, 50.0);

    round.advance(6000);
    assert_eq!(round.battle().hero.position, 35.0);
}

#[test]
fn test_idle_hero_eventually_falls() {
    let mut round = started(EngineConfig::default(), 0);

    round.advance(39_999);
    assert_eq!(round.battle().enemy.position, 52.0);
    assert_eq!(round.battle().hero.hp, 50.0);

    round.advance(40_800);
    assert_eq!(round.battle().hero.hp, 35.0);

    let log = round.advance(55_800);
    assert_eq!(log.outcomes().collect::<Vec<_>>(), vec![Outcome::Lose]);
    assert_eq!(round.battle().hero.hp, 0.0);
    assert_eq!(round.feedback(), "The Hero fell...");

    // Terminal: nothing else happens, no input accepted
    assert!(round.advance(120_000).is_empty());
    assert!(round.handle_key('A', 121_000).is_empty());
    assert_eq!(round.outcome(), Some(Outcome::Lose));
}

#[test]
fn test_enemy_never_closes_inside_separation() {
    let mut round = started(EngineConfig::default(), 0);

    // Walk right up to the enemy repeatedly
    let mut t = 1000;
    for _ in 0..6 {
        drum(&mut round, "AAAD", t, 400);
        t += 1200 + 2000 + 1000;
        round.advance(t - 1000);
        let gap = round.battle().enemy.position - round.battle().hero.position;
        assert!(gap >= 10.0 - 1e-4, "gap {}", gap);
    }
}

#[test]
fn test_lose_then_restart_matches_fresh_round() {
    let mut config = config_with_hero_at(50.0);
    config.battle.hero_max_hp = 10.0;
    let mut round = started(config.clone(), 0);

    let log = round.advance(5800);
    assert_eq!(log.outcomes().count(), 1);
    assert_eq!(round.outcome(), Some(Outcome::Lose));

    let log = round.restart(20_000);
    assert!(log.contains(&EngineEvent::Outcome(None)));
    assert!(log.contains(&EngineEvent::Ambience(AmbienceCue::Start { volume: 0.2 })));

    let fresh = started(config, 20_000);
    assert_eq!(round.snapshot(), fresh.snapshot());
    assert_eq!(round.battle().hero.hp, 10.0);
    assert_eq!(round.battle().enemy.hp, 100.0);
    assert_eq!(round.combo(), 0);
}

#[test]
fn test_win_then_restart_matches_fresh_round() {
    let mut config = config_with_hero_at(55.0);
    config.battle.enemy_max_hp = 10.0;
    let mut round = started(config.clone(), 0);

    drum(&mut round, "DDAD", 1000, 400);
    let log = round.advance(3200);
    assert_eq!(log.outcomes().collect::<Vec<_>>(), vec![Outcome::Win]);
    assert!(log.contains(&EngineEvent::Ambience(AmbienceCue::Stop)));
    assert!(log.contains(&EngineEvent::Ambience(AmbienceCue::VictoryTheme)));
    assert_eq!(round.battle().enemy.hp, 0.0);
    assert_eq!(round.combo(), 1);

    // Keys after the win are dropped
    assert!(round.handle_key('A', 5000).is_empty());

    let log = round.restart(6000);
    assert!(log.contains(&EngineEvent::Ambience(AmbienceCue::StopVictoryTheme)));
    assert_eq!(round.feedback(), "Drum to the beat!");

    let fresh = started(config, 6000);
    assert_eq!(round.snapshot(), fresh.snapshot());
}

#[test]
fn test_restart_cancels_pending_effects() {
    let mut round = started(EngineConfig::default(), 0);

    drum(&mut round, "AAAD", 1000, 400);
    round.restart(2500);

    let log = round.advance(4500);
    assert_eq!(round.battle().hero.position, 20.0);
    assert_eq!(round.phase(), Phase::AcceptingInput);
    assert!(!log.feedback().any(|line| line == "Your turn! Drum to the beat!"));

    // Beats run from the new origin only: 3000, 3500, 4000, 4500
    let pulses = log.iter().filter(|e| **e == EngineEvent::BeatPulse).count();
    assert_eq!(pulses, 4);
}

#[test]
fn test_elapsed_timer_restarts_with_round() {
    let mut round = started(EngineConfig::default(), 0);

    let log = round.advance(30_000);
    assert!(log.contains(&EngineEvent::Elapsed { elapsed_ms: 30_000 }));
    assert_eq!(format_elapsed(30_000), "00:30");

    round.restart(30_500);
    let log = round.advance(31_500);
    assert!(log.contains(&EngineEvent::Elapsed { elapsed_ms: 1000 }));
}

#[derive(Default)]
struct HostDouble {
    sounds: Vec<Symbol>,
    hits: Vec<usize>,
    outcomes: Vec<Option<Outcome>>,
    hero_hp: Option<f32>,
}

impl EngineObserver for HostDouble {
    fn play_sound(&mut self, symbol: Symbol) {
        self.sounds.push(symbol);
    }

    fn on_symbol_accepted(&mut self, _symbol: Symbol, buffer_index: usize) {
        self.hits.push(buffer_index);
    }

    fn on_outcome(&mut self, outcome: Option<Outcome>) {
        self.outcomes.push(outcome);
    }

    fn on_combatant_state(&mut self, which: Side, _position: f32, hp: f32, _display: DisplayState) {
        if which == Side::Hero {
            self.hero_hp = Some(hp);
        }
    }
}

#[test]
fn test_observer_sees_full_round() {
    let mut host = HostDouble::default();
    let mut round = RoundController::with_seed(EngineConfig::default(), 3, 0);
    round.start(0).dispatch(&mut host);

    drum(&mut round, "AAAD", 1000, 400).dispatch(&mut host);
    round.advance(4200).dispatch(&mut host);

    assert_eq!(host.sounds, vec![Symbol::Pata, Symbol::Pata, Symbol::Pata, Symbol::Pon]);
    assert_eq!(host.hits, vec![0, 1, 2, 3]);
    assert_eq!(host.outcomes, vec![None]);
    assert_eq!(host.hero_hp, Some(50.0));
}
