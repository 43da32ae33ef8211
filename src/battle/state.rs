//! Battle state machine
//!
//! Every mutation of the combatants goes through one of the named transitions
//! below. Timing (when a transition runs) belongs to the round controller.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::{Combatant, EnemyState, HeroState};
use crate::battle::damage::{enemy_damage_for, roll_hero_damage};
use crate::core::config::{BattleConfig, EnemyConfig};
use crate::rhythm::recognizer::Command;

/// What a resolved command did to the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActionEffect {
    /// Hero moved (walk or retreat)
    Moved { from: f32, to: f32 },
    /// Attack connected
    Struck {
        damage: f32,
        enemy_hp: f32,
        defeated: bool,
    },
    /// Attack launched from outside strike range
    OutOfRange { distance: f32 },
    /// Stance change only
    Held,
}

/// What the enemy decided on its cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyTick {
    /// Hero within aggro range; a strike lands after the wind-up
    WindUp,
    Advanced { from: f32, to: f32 },
}

/// Result of an enemy strike landing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeResult {
    pub damage: f32,
    pub hero_hp: f32,
    pub defeated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub hero: Combatant<HeroState>,
    pub enemy: Combatant<EnemyState>,
    battle: BattleConfig,
    enemy_cfg: EnemyConfig,
}

impl BattleState {
    pub fn new(battle: &BattleConfig, enemy: &EnemyConfig) -> Self {
        Self {
            hero: Combatant::new(battle.hero_start, battle.hero_max_hp),
            enemy: Combatant::new(battle.enemy_start, battle.enemy_max_hp),
            battle: battle.clone(),
            enemy_cfg: enemy.clone(),
        }
    }

    /// Put both combatants back at their starting positions, full hp, idle
    pub fn reset(&mut self) {
        self.hero = Combatant::new(self.battle.hero_start, self.battle.hero_max_hp);
        self.enemy = Combatant::new(self.battle.enemy_start, self.battle.enemy_max_hp);
    }

    /// Gap between the two combatants
    pub fn distance(&self) -> f32 {
        self.enemy.position - self.hero.position
    }

    pub fn in_strike_range(&self) -> bool {
        self.distance() <= self.battle.strike_range
    }

    pub fn in_aggro_range(&self) -> bool {
        self.distance() <= self.enemy_cfg.aggro_range
    }

    // ===== PLAYER ACTIONS =====

    /// Command recognized: strike the pose, effects land later
    pub fn begin_action(&mut self, command: Command) {
        self.hero.state = match command {
            Command::Walk => HeroState::Walking,
            Command::Attack => HeroState::Attacking,
            Command::Defend => HeroState::Defending,
            Command::Retreat => HeroState::Retreating,
        };
    }

    /// Apply the gameplay effect of `command`
    pub fn apply_action_effect<R: Rng + ?Sized>(
        &mut self,
        command: Command,
        rng: &mut R,
    ) -> ActionEffect {
        match command {
            Command::Walk => {
                let from = self.hero.position;
                let limit = self.enemy.position - self.battle.min_separation;
                self.hero.position = (from + self.battle.walk_step).min(limit);
                ActionEffect::Moved {
                    from,
                    to: self.hero.position,
                }
            }
            Command::Retreat => {
                let from = self.hero.position;
                self.hero.position = (from - self.battle.retreat_step).max(self.battle.retreat_floor);
                ActionEffect::Moved {
                    from,
                    to: self.hero.position,
                }
            }
            Command::Attack => {
                if !self.in_strike_range() {
                    return ActionEffect::OutOfRange {
                        distance: self.distance(),
                    };
                }
                let damage = roll_hero_damage(rng, &self.battle);
                let defeated = self.enemy.apply_damage(damage);
                self.enemy.state = EnemyState::Hurt;
                ActionEffect::Struck {
                    damage,
                    enemy_hp: self.enemy.hp,
                    defeated,
                }
            }
            Command::Defend => ActionEffect::Held,
        }
    }

    /// Resolution window closed
    pub fn finish_action(&mut self) {
        self.hero.state = HeroState::Idle;
    }

    /// Enemy flinch from a player strike wears off
    pub fn recover_enemy(&mut self) {
        if self.enemy.state == EnemyState::Hurt {
            self.enemy.state = EnemyState::Idle;
        }
    }

    // ===== ENEMY CYCLE =====

    /// One enemy decision: wind up if the hero is close, otherwise advance
    pub fn enemy_tick(&mut self) -> EnemyTick {
        if self.in_aggro_range() {
            self.enemy.state = EnemyState::Attacking;
            return EnemyTick::WindUp;
        }

        let from = self.enemy.position;
        let halt = self.hero.position + self.enemy_cfg.halt_gap.max(self.battle.min_separation);
        self.enemy.position = (from - self.enemy_cfg.step).max(halt);
        EnemyTick::Advanced {
            from,
            to: self.enemy.position,
        }
    }

    /// Wound-up blow lands; damage depends on the hero's pose right now
    pub fn enemy_strike(&mut self) -> StrikeResult {
        let damage = enemy_damage_for(self.hero.state, &self.enemy_cfg);
        let defeated = self.hero.apply_damage(damage);
        if self.hero.state != HeroState::Defending {
            self.hero.state = HeroState::Hurt;
        }
        StrikeResult {
            damage,
            hero_hp: self.hero.hp,
            defeated,
        }
    }

    /// Attack animation ends and a hurt hero stands back up. A guard is kept.
    pub fn recover_after_strike(&mut self) {
        if self.enemy.state == EnemyState::Attacking {
            self.enemy.state = EnemyState::Idle;
        }
        if self.hero.state == HeroState::Hurt {
            self.hero.state = HeroState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn battle() -> BattleState {
        BattleState::new(&BattleConfig::default(), &EnemyConfig::default())
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_initial_positions() {
        let state = battle();
        assert_eq!(state.hero.position, 20.0);
        assert_eq!(state.enemy.position, 80.0);
        assert_eq!(state.distance(), 60.0);
    }

    #[test]
    fn test_walk_advances_hero() {
        let mut state = battle();
        let effect = state.apply_action_effect(Command::Walk, &mut rng());
        assert_eq!(effect, ActionEffect::Moved { from: 20.0, to: 32.0 });
    }

    #[test]
    fn test_walk_clamped_by_min_separation() {
        let mut state = battle();
        state.hero.position = 65.0;
        state.apply_action_effect(Command::Walk, &mut rng());
        assert_eq!(state.hero.position, 70.0);
        assert!(state.distance() >= 10.0);
    }

    #[test]
    fn test_retreat_clamped_at_floor() {
        let mut state = battle();
        state.apply_action_effect(Command::Retreat, &mut rng());
        assert_eq!(state.hero.position, 10.0);
        state.apply_action_effect(Command::Retreat, &mut rng());
        assert_eq!(state.hero.position, 10.0);
    }

    #[test]
    fn test_attack_out_of_range_does_nothing() {
        let mut state = battle();
        let effect = state.apply_action_effect(Command::Attack, &mut rng());
        assert_eq!(effect, ActionEffect::OutOfRange { distance: 60.0 });
        assert_eq!(state.enemy.hp, 100.0);
        assert_eq!(state.enemy.state, EnemyState::Idle);
    }

    #[test]
    fn test_attack_in_range_damages_enemy() {
        let mut state = battle();
        state.hero.position = 50.0;
        match state.apply_action_effect(Command::Attack, &mut rng()) {
            ActionEffect::Struck { damage, enemy_hp, defeated } => {
                assert!((15.0..23.0).contains(&damage));
                assert_eq!(enemy_hp, 100.0 - damage);
                assert!(!defeated);
            }
            other => panic!("expected strike, got {:?}", other),
        }
        assert_eq!(state.enemy.state, EnemyState::Hurt);

        state.recover_enemy();
        assert_eq!(state.enemy.state, EnemyState::Idle);
    }

    #[test]
    fn test_attack_at_exact_strike_range() {
        let mut state = battle();
        state.hero.position = 50.0; // distance 30
        assert!(state.in_strike_range());
        state.hero.position = 49.0;
        assert!(!state.in_strike_range());
    }

    #[test]
    fn test_finishing_blow_reports_defeat() {
        let mut state = battle();
        state.hero.position = 60.0;
        state.enemy.hp = 5.0;
        match state.apply_action_effect(Command::Attack, &mut rng()) {
            ActionEffect::Struck { enemy_hp, defeated, .. } => {
                assert_eq!(enemy_hp, 0.0);
                assert!(defeated);
            }
            other => panic!("expected strike, got {:?}", other),
        }
    }

    #[test]
    fn test_begin_and_finish_action_poses() {
        let mut state = battle();
        state.begin_action(Command::Defend);
        assert_eq!(state.hero.state, HeroState::Defending);
        assert_eq!(state.apply_action_effect(Command::Defend, &mut rng()), ActionEffect::Held);
        state.finish_action();
        assert_eq!(state.hero.state, HeroState::Idle);
    }

    #[test]
    fn test_enemy_advances_when_far() {
        let mut state = battle();
        assert_eq!(state.enemy_tick(), EnemyTick::Advanced { from: 80.0, to: 76.0 });
        assert_eq!(state.enemy.state, EnemyState::Idle);
    }

    #[test]
    fn test_enemy_winds_up_in_aggro_range() {
        let mut state = battle();
        state.hero.position = 45.0; // distance 35
        assert_eq!(state.enemy_tick(), EnemyTick::WindUp);
        assert_eq!(state.enemy.state, EnemyState::Attacking);
        assert_eq!(state.enemy.position, 80.0);
    }

    #[test]
    fn test_enemy_strike_hurts_idle_hero() {
        let mut state = battle();
        let result = state.enemy_strike();
        assert_eq!(result.damage, 15.0);
        assert_eq!(state.hero.hp, 35.0);
        assert_eq!(state.hero.state, HeroState::Hurt);

        state.enemy.state = EnemyState::Attacking;
        state.recover_after_strike();
        assert_eq!(state.hero.state, HeroState::Idle);
        assert_eq!(state.enemy.state, EnemyState::Idle);
    }

    #[test]
    fn test_defending_hero_keeps_guard() {
        let mut state = battle();
        state.begin_action(Command::Defend);
        let result = state.enemy_strike();
        assert_eq!(result.damage, 3.0);
        assert_eq!(state.hero.state, HeroState::Defending);

        state.recover_after_strike();
        assert_eq!(state.hero.state, HeroState::Defending);
    }

    #[test]
    fn test_retreating_hero_takes_no_damage() {
        let mut state = battle();
        state.begin_action(Command::Retreat);
        let result = state.enemy_strike();
        assert_eq!(result.damage, 0.0);
        assert_eq!(state.hero.hp, 50.0);
    }

    #[test]
    fn test_enemy_strike_can_defeat_hero() {
        let mut state = battle();
        state.hero.hp = 10.0;
        assert!(state.enemy_strike().defeated);
        assert_eq!(state.hero.hp, 0.0);
        assert!(!state.enemy_strike().defeated);
    }

    #[test]
    fn test_reset_restores_start() {
        let mut state = battle();
        state.hero.position = 50.0;
        state.hero.hp = 1.0;
        state.enemy.hp = 3.0;
        state.enemy.state = EnemyState::Hurt;
        state.reset();
        assert_eq!(state, battle());
    }
}
