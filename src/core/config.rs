//! Combat and battle configuration
//!
//! Every tunable has a default in `battle::constants`. A TOML file can
//! override any subset of fields; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::battle::constants::*;
use crate::core::error::{Result, TacticsError};

/// Chance and duration of a status inflicted as an on-hit rider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusRider {
    /// Percent chance (0-100) rolled on every landed hit
    pub chance: u32,
    /// Rounds the status lasts
    pub duration: u8,
}

/// Tunables for the combat resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === HIT RESOLUTION ===
    /// Starting hit chance before evasion and status shifts (percent)
    pub base_hit_chance: i32,
    pub min_hit_chance: i32,
    pub max_hit_chance: i32,
    /// Added when the attacker is blessed, subtracted when the defender is
    pub blessed_accuracy_shift: i32,
    /// Terrain defense bonus divided by this becomes evasion
    pub terrain_evasion_divisor: i32,

    // === DAMAGE ===
    /// Percent chance of a critical physical hit
    pub critical_chance: u32,
    pub critical_multiplier: f32,
    /// Damage percent gained (or lost) per level of elevation difference
    pub height_bonus_per_level: f32,
    /// Physical damage is scaled by a uniform roll in `1 ± physical_variance`
    pub physical_variance: f32,
    pub magical_variance: f32,
    /// Magic exaggerates elemental modifiers: `1 + (m - 1) * amplification`
    pub magic_elemental_amplification: f32,
    pub default_spell_power: i32,

    // === STATUS RIDERS ===
    pub burn: StatusRider,
    pub poison: StatusRider,
    pub slow: StatusRider,

    // === ROUND-END STATUS DAMAGE ===
    /// Burning deals `max_hp / burn_damage_divisor` (at least 1)
    pub burn_damage_divisor: i32,
    pub poison_damage_divisor: i32,

    // === HEALING ===
    pub default_heal_power: i32,
    pub heal_variance: f32,
    pub life_heal_multiplier: f32,
    pub blessed_heal_multiplier: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_hit_chance: BASE_HIT_CHANCE,
            min_hit_chance: MIN_HIT_CHANCE,
            max_hit_chance: MAX_HIT_CHANCE,
            blessed_accuracy_shift: BLESSED_ACCURACY_SHIFT,
            terrain_evasion_divisor: TERRAIN_EVASION_DIVISOR,
            critical_chance: CRITICAL_HIT_CHANCE,
            critical_multiplier: CRITICAL_MULTIPLIER,
            height_bonus_per_level: HEIGHT_BONUS_PER_LEVEL,
            physical_variance: PHYSICAL_VARIANCE,
            magical_variance: MAGICAL_VARIANCE,
            magic_elemental_amplification: MAGIC_ELEMENTAL_AMPLIFICATION,
            default_spell_power: DEFAULT_SPELL_POWER,
            burn: StatusRider {
                chance: BURN_CHANCE,
                duration: BURN_DURATION,
            },
            poison: StatusRider {
                chance: POISON_CHANCE,
                duration: POISON_DURATION,
            },
            slow: StatusRider {
                chance: SLOW_CHANCE,
                duration: SLOW_DURATION,
            },
            burn_damage_divisor: BURN_DAMAGE_DIVISOR,
            poison_damage_divisor: POISON_DAMAGE_DIVISOR,
            default_heal_power: DEFAULT_HEAL_POWER,
            heal_variance: HEAL_VARIANCE,
            life_heal_multiplier: LIFE_HEAL_MULTIPLIER,
            blessed_heal_multiplier: BLESSED_HEAL_MULTIPLIER,
        }
    }
}

impl CombatConfig {
    /// Parse from TOML text; absent keys keep defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the resolver cannot roll with
    pub fn validate(&self) -> Result<()> {
        if self.min_hit_chance > self.max_hit_chance {
            return Err(TacticsError::Config(format!(
                "min_hit_chance {} exceeds max_hit_chance {}",
                self.min_hit_chance, self.max_hit_chance
            )));
        }
        for (name, spread) in [
            ("physical_variance", self.physical_variance),
            ("magical_variance", self.magical_variance),
            ("heal_variance", self.heal_variance),
        ] {
            if !(0.0..1.0).contains(&spread) {
                return Err(TacticsError::Config(format!(
                    "{} must be in [0, 1), got {}",
                    name, spread
                )));
            }
        }
        for (name, rider) in [("burn", self.burn), ("poison", self.poison), ("slow", self.slow)] {
            if rider.chance > 100 {
                return Err(TacticsError::Config(format!(
                    "{} chance {} is over 100",
                    name, rider.chance
                )));
            }
        }
        if self.burn_damage_divisor <= 0 || self.poison_damage_divisor <= 0 {
            return Err(TacticsError::Config("damage divisors must be positive".into()));
        }
        Ok(())
    }

    /// Load from a TOML file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Structural options for a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleOptions {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Maximum hex distance for a basic attack
    pub melee_range: u32,
    /// Rebuild the speed-ordered turn order at the start of every round
    /// instead of keeping the order fixed at battle start
    pub recompute_turn_order_each_round: bool,
}

impl Default for BattleOptions {
    fn default() -> Self {
        Self {
            grid_width: BATTLE_GRID_WIDTH,
            grid_height: BATTLE_GRID_HEIGHT,
            melee_range: MELEE_RANGE,
            recompute_turn_order_each_round: false,
        }
    }
}
