//! Combatant state: position, hit points, pose

use serde::{Deserialize, Serialize};

/// Hero poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeroState {
    #[default]
    Idle,
    Walking,
    Attacking,
    Defending,
    Hurt,
    Retreating,
}

/// Enemy poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyState {
    #[default]
    Idle,
    Attacking,
    Hurt,
}

/// Pose as reported to the presentation layer, for either side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    Idle,
    Walking,
    Attacking,
    Defending,
    Hurt,
    Retreating,
}

impl From<HeroState> for DisplayState {
    fn from(state: HeroState) -> Self {
        match state {
            HeroState::Idle => DisplayState::Idle,
            HeroState::Walking => DisplayState::Walking,
            HeroState::Attacking => DisplayState::Attacking,
            HeroState::Defending => DisplayState::Defending,
            HeroState::Hurt => DisplayState::Hurt,
            HeroState::Retreating => DisplayState::Retreating,
        }
    }
}

impl From<EnemyState> for DisplayState {
    fn from(state: EnemyState) -> Self {
        match state {
            EnemyState::Idle => DisplayState::Idle,
            EnemyState::Attacking => DisplayState::Attacking,
            EnemyState::Hurt => DisplayState::Hurt,
        }
    }
}

/// One side of the fight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant<S> {
    pub position: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub state: S,
}

impl<S: Default> Combatant<S> {
    pub fn new(position: f32, max_hp: f32) -> Self {
        Self {
            position,
            hp: max_hp,
            max_hp,
            state: S::default(),
        }
    }
}

impl<S> Combatant<S> {
    /// Subtract `amount` from hp, clamped to `[0, max_hp]`
    ///
    /// Returns true only for the hit that takes hp from positive to zero, so a
    /// defeat is reported once no matter how much damage follows.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        let was_standing = self.hp > 0.0;
        self.hp = (self.hp - amount.max(0.0)).clamp(0.0, self.max_hp);
        was_standing && self.hp == 0.0
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0.0
    }

    /// Fraction of max hp remaining, for health bars
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            self.hp / self.max_hp
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_combatant_at_full_hp() {
        let hero: Combatant<HeroState> = Combatant::new(20.0, 50.0);
        assert_eq!(hero.hp, 50.0);
        assert_eq!(hero.state, HeroState::Idle);
        assert_eq!(hero.hp_fraction(), 1.0);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut enemy: Combatant<EnemyState> = Combatant::new(80.0, 100.0);
        assert!(!enemy.apply_damage(40.0));
        assert!(enemy.apply_damage(75.0));
        assert_eq!(enemy.hp, 0.0);
        assert!(enemy.is_down());
    }

    #[test]
    fn test_defeat_reported_once() {
        let mut hero: Combatant<HeroState> = Combatant::new(20.0, 10.0);
        assert!(hero.apply_damage(10.0));
        assert!(!hero.apply_damage(10.0));
        assert_eq!(hero.hp, 0.0);
    }

    #[test]
    fn test_zero_damage_is_harmless() {
        let mut hero: Combatant<HeroState> = Combatant::new(20.0, 10.0);
        assert!(!hero.apply_damage(0.0));
        assert_eq!(hero.hp, 10.0);
    }

    #[test]
    fn test_display_state_conversion() {
        assert_eq!(DisplayState::from(HeroState::Retreating), DisplayState::Retreating);
        assert_eq!(DisplayState::from(EnemyState::Attacking), DisplayState::Attacking);
    }
}
