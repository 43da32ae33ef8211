//! Damage numbers for both sides

use rand::Rng;

use crate::battle::combatant::HeroState;
use crate::core::config::{BattleConfig, EnemyConfig};

/// Hero strike damage, uniform over `[hero_damage_min, hero_damage_max)`
///
/// An empty range (fixed-damage tuning, or an unvalidated config) yields
/// `hero_damage_min` without touching the rng.
pub fn roll_hero_damage<R: Rng + ?Sized>(rng: &mut R, config: &BattleConfig) -> f32 {
    if config.hero_damage_min < config.hero_damage_max {
        rng.gen_range(config.hero_damage_min..config.hero_damage_max)
    } else {
        config.hero_damage_min
    }
}

/// Enemy strike damage given the hero's pose when the blow lands
pub fn enemy_damage_for(state: HeroState, config: &EnemyConfig) -> f32 {
    match state {
        HeroState::Defending => config.defend_damage,
        HeroState::Retreating => config.retreat_damage,
        _ => config.damage,
    }
}
