//! Battle simulation - two combatants on a one-dimensional field
//!
//! The hero moves only through resolved commands; the enemy advances and
//! strikes on its own cycle. Positions are percentages of the field width and
//! the two sides can never close inside the minimum separation.

pub mod combatant;
pub mod damage;
pub mod state;

pub use combatant::{Combatant, DisplayState, EnemyState, HeroState};
pub use damage::{enemy_damage_for, roll_hero_damage};
pub use state::{ActionEffect, BattleState, EnemyTick, StrikeResult};
