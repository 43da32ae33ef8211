//! Engine configuration with documented balance constants
//!
//! Every timing window and combat number lives here. The defaults are the
//! tuned values the game ships with; `data/engine.toml` mirrors them so they
//! can be tweaked without a rebuild.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{DrumError, Result};
use crate::core::types::Millis;

/// Rhythm windows for classifying the gap between two accepted keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    /// Gaps strictly longer than this start a fresh buffer
    pub fresh_after_ms: Millis,
    /// Shortest on-beat gap (inclusive)
    pub on_beat_min_ms: Millis,
    /// Longest on-beat gap (inclusive)
    ///
    /// Gaps between this and `fresh_after_ms` are misses: too late to continue
    /// the phrase, too early to start a new one.
    pub on_beat_max_ms: Millis,
    /// How long an unrecognized sequence stays on screen before the buffer clears
    pub unknown_clear_ms: Millis,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            fresh_after_ms: 850,
            on_beat_min_ms: 200,
            on_beat_max_ms: 800,
            unknown_clear_ms: 500,
        }
    }
}

/// Visual/audio beat cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    pub period_ms: Millis,
    pub flash_ms: Millis,
    /// Period of the elapsed-time readout
    pub clock_period_ms: Millis,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            period_ms: 500,
            flash_ms: 150,
            clock_period_ms: 1000,
        }
    }
}

/// Field geometry and the hero's side of combat
///
/// Positions are percentages of the field width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub hero_max_hp: f32,
    pub enemy_max_hp: f32,
    pub hero_start: f32,
    pub enemy_start: f32,
    /// Closest the two combatants may ever stand
    pub min_separation: f32,
    pub walk_step: f32,
    pub retreat_step: f32,
    /// Retreat never pushes the hero behind this position
    pub retreat_floor: f32,
    pub strike_range: f32,
    /// Hero damage is uniform over `[hero_damage_min, hero_damage_max)`; equal
    /// bounds give fixed damage
    pub hero_damage_min: f32,
    pub hero_damage_max: f32,
    /// Delay between recognizing a command and its effect landing
    pub action_effect_ms: Millis,
    /// Delay between recognizing a command and input re-arming
    pub action_resolution_ms: Millis,
    /// How long the enemy shows Hurt after being struck
    pub enemy_hurt_ms: Millis,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            hero_max_hp: 50.0,
            enemy_max_hp: 100.0,
            hero_start: 20.0,
            enemy_start: 80.0,
            min_separation: 10.0,
            walk_step: 12.0,
            retreat_step: 15.0,
            retreat_floor: 10.0,
            strike_range: 30.0,
            hero_damage_min: 15.0,
            hero_damage_max: 23.0,
            action_effect_ms: 1000,
            action_resolution_ms: 2000,
            enemy_hurt_ms: 500,
        }
    }
}

/// Enemy attack cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub attack_interval_ms: Millis,
    pub aggro_range: f32,
    pub windup_ms: Millis,
    /// Delay after a strike before Attacking/Hurt poses return to Idle
    pub recover_ms: Millis,
    pub step: f32,
    /// The enemy stops advancing this far in front of the hero
    pub halt_gap: f32,
    pub damage: f32,
    pub defend_damage: f32,
    pub retreat_damage: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            attack_interval_ms: 5000,
            aggro_range: 35.0,
            windup_ms: 800,
            recover_ms: 500,
            step: 4.0,
            halt_gap: 15.0,
            damage: 15.0,
            defend_damage: 3.0,
            retreat_damage: 0.0,
        }
    }
}

/// Background ambience levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub ambience_volume: f32,
    pub ducked_volume: f32,
    pub duck_ms: Millis,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ambience_volume: 0.2,
            ducked_volume: 0.05,
            duck_ms: 500,
        }
    }
}

impl AudioConfig {
    /// Ducked level as a fraction of the normal ambience level
    pub fn duck_factor(&self) -> f32 {
        if self.ambience_volume > 0.0 {
            self.ducked_volume / self.ambience_volume
        } else {
            0.0
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rhythm: RhythmConfig,
    #[serde(default)]
    pub beat: BeatConfig,
    #[serde(default)]
    pub battle: BattleConfig,
    #[serde(default)]
    pub enemy: EnemyConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let r = &self.rhythm;
        if r.on_beat_min_ms > r.on_beat_max_ms {
            return Err(invalid(format!(
                "on_beat_min_ms ({}) should be <= on_beat_max_ms ({})",
                r.on_beat_min_ms, r.on_beat_max_ms
            )));
        }
        if r.on_beat_max_ms > r.fresh_after_ms {
            return Err(invalid(format!(
                "on_beat_max_ms ({}) should be <= fresh_after_ms ({})",
                r.on_beat_max_ms, r.fresh_after_ms
            )));
        }
        if r.unknown_clear_ms >= self.battle.action_resolution_ms {
            return Err(invalid(format!(
                "unknown_clear_ms ({}) should be shorter than action_resolution_ms ({})",
                r.unknown_clear_ms, self.battle.action_resolution_ms
            )));
        }

        if self.beat.period_ms == 0 || self.beat.clock_period_ms == 0 {
            return Err(invalid("beat periods must be positive".into()));
        }
        if self.enemy.attack_interval_ms == 0 {
            return Err(invalid("attack_interval_ms must be positive".into()));
        }

        let b = &self.battle;
        if b.hero_max_hp <= 0.0 || b.enemy_max_hp <= 0.0 {
            return Err(invalid("max hp must be positive".into()));
        }
        if b.enemy_start - b.hero_start < b.min_separation {
            return Err(invalid(format!(
                "start positions ({}, {}) violate min_separation ({})",
                b.hero_start, b.enemy_start, b.min_separation
            )));
        }
        if b.hero_start < b.retreat_floor {
            return Err(invalid(format!(
                "hero_start ({}) should be >= retreat_floor ({})",
                b.hero_start, b.retreat_floor
            )));
        }
        if b.hero_damage_min > b.hero_damage_max {
            return Err(invalid(format!(
                "hero_damage_min ({}) should be <= hero_damage_max ({})",
                b.hero_damage_min, b.hero_damage_max
            )));
        }
        if b.action_effect_ms > b.action_resolution_ms {
            return Err(invalid(format!(
                "action_effect_ms ({}) should be <= action_resolution_ms ({})",
                b.action_effect_ms, b.action_resolution_ms
            )));
        }

        let e = &self.enemy;
        if e.halt_gap < b.min_separation {
            return Err(invalid(format!(
                "enemy halt_gap ({}) should be >= min_separation ({})",
                e.halt_gap, b.min_separation
            )));
        }
        if e.aggro_range < e.halt_gap {
            return Err(invalid(format!(
                "enemy aggro_range ({}) should be >= halt_gap ({}) or the enemy stalls out of reach",
                e.aggro_range, e.halt_gap
            )));
        }
        if e.damage < 0.0 || e.defend_damage < 0.0 || e.retreat_damage < 0.0 {
            return Err(invalid("enemy damage values must be non-negative".into()));
        }

        Ok(())
    }
}

fn invalid(message: String) -> DrumError {
    DrumError::InvalidConfig(message)
}
