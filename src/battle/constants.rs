//! Battle system constants - default values for every tunable in one place
//!
//! `CombatConfig` and `BattleOptions` start from these; a TOML file can
//! override any of them.

// Grid
pub const BATTLE_GRID_WIDTH: u32 = 12;
pub const BATTLE_GRID_HEIGHT: u32 = 18;
pub const MELEE_RANGE: u32 = 1;
/// Largest grid a saved record may describe
pub const MAX_GRID_CELLS: u32 = 1 << 20;

// Hit resolution (percent)
pub const BASE_HIT_CHANCE: i32 = 90;
pub const MIN_HIT_CHANCE: i32 = 10;
pub const MAX_HIT_CHANCE: i32 = 100;
pub const BLESSED_ACCURACY_SHIFT: i32 = 10;
pub const TERRAIN_EVASION_DIVISOR: i32 = 5;

// Damage
pub const CRITICAL_HIT_CHANCE: u32 = 10;
pub const CRITICAL_MULTIPLIER: f32 = 1.5;
pub const HEIGHT_BONUS_PER_LEVEL: f32 = 5.0;
pub const PHYSICAL_VARIANCE: f32 = 0.10;
pub const MAGICAL_VARIANCE: f32 = 0.15;
pub const MAGIC_ELEMENTAL_AMPLIFICATION: f32 = 1.5;
pub const DEFAULT_SPELL_POWER: i32 = 100;

// Elemental multipliers
pub const RESISTED_MULTIPLIER: f32 = 0.5;
pub const SUPER_EFFECTIVE_MULTIPLIER: f32 = 1.5;
pub const NOT_VERY_EFFECTIVE_MULTIPLIER: f32 = 0.75;

// On-hit elemental riders (chance percent, duration rounds)
pub const BURN_CHANCE: u32 = 20;
pub const BURN_DURATION: u8 = 3;
pub const POISON_CHANCE: u32 = 20;
pub const POISON_DURATION: u8 = 3;
pub const SLOW_CHANCE: u32 = 15;
pub const SLOW_DURATION: u8 = 2;

// Round-end status damage (fraction of max HP as a divisor)
pub const BURN_DAMAGE_DIVISOR: i32 = 10;
pub const POISON_DAMAGE_DIVISOR: i32 = 20;

// Healing
pub const DEFAULT_HEAL_POWER: i32 = 50;
pub const HEAL_VARIANCE: f32 = 0.10;
pub const LIFE_HEAL_MULTIPLIER: f32 = 1.3;
pub const BLESSED_HEAL_MULTIPLIER: f32 = 1.2;

// Stat modifiers from statuses
pub const BLESSED_STAT_MULTIPLIER: f32 = 1.2;
pub const HASTE_SPEED_MULTIPLIER: f32 = 1.5;
pub const SLOW_SPEED_MULTIPLIER: f32 = 0.5;
