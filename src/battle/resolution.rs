//! Combat resolution: hit chance, damage, elemental math, statuses, healing
//!
//! The arithmetic lives in pure functions that take pre-rolled values.
//! `CombatResolver` owns the seeded RNG, rolls the dice and applies the
//! results to the grid.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::battle_map::BattleGrid;
use crate::battle::constants::{
    MELEE_RANGE, NOT_VERY_EFFECTIVE_MULTIPLIER, RESISTED_MULTIPLIER, SUPER_EFFECTIVE_MULTIPLIER,
};
use crate::battle::units::{CombatUnit, StatusEffect};
use crate::core::config::{CombatConfig, StatusRider};
use crate::core::error::{Result, TacticsError};
use crate::core::types::{Element, UnitId};

/// How an attack is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AttackKind {
    #[default]
    Physical,
    /// Always hits; damage scales with spell power and magic stats
    Magical { spell_power: i32 },
}

/// Outcome of one resolved attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub kind: AttackKind,
    pub hit: bool,
    pub damage: i32,
    pub critical: bool,
    pub elemental_multiplier: f32,
    /// Defender's terrain defense bonus (percent)
    pub terrain_bonus: i32,
    /// Signed damage percent from elevation
    pub height_bonus: i32,
    pub status_inflicted: Option<StatusEffect>,
    pub defender_defeated: bool,
    pub message: String,
}

/// Outcome of a heal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealResult {
    pub healer: UnitId,
    pub target: UnitId,
    pub amount: i32,
}

/// Situational modifiers for a physical hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageContext {
    pub elemental: f32,
    pub terrain_bonus: i32,
    /// Attacker elevation minus defender elevation
    pub height_difference: i32,
}

impl Default for DamageContext {
    fn default() -> Self {
        Self {
            elemental: 1.0,
            terrain_bonus: 0,
            height_difference: 0,
        }
    }
}

/// Damage multiplier for an attacker/defender element pairing
pub fn elemental_modifier(attacker: Option<Element>, defender: Option<Element>) -> f32 {
    let (Some(att), Some(def)) = (attacker, defender) else {
        return 1.0;
    };
    if att == def {
        RESISTED_MULTIPLIER
    } else if att.beats(def) {
        SUPER_EFFECTIVE_MULTIPLIER
    } else if def.beats(att) {
        NOT_VERY_EFFECTIVE_MULTIPLIER
    } else {
        1.0
    }
}

/// Percent chance for a physical attack to land, clamped to the configured
/// bounds. Every two points of net defender speed is one point of evasion.
pub fn hit_chance(
    config: &CombatConfig,
    attacker: &CombatUnit,
    defender: &CombatUnit,
    terrain_bonus: i32,
) -> i32 {
    let evasion = (defender.total_speed() - attacker.total_speed()).div_euclid(2);
    let mut chance = config.base_hit_chance - evasion;

    if config.terrain_evasion_divisor > 0 {
        chance -= terrain_bonus / config.terrain_evasion_divisor;
    }
    if attacker.has_status(StatusEffect::Blessed) {
        chance += config.blessed_accuracy_shift;
    }
    if defender.has_status(StatusEffect::Blessed) {
        chance -= config.blessed_accuracy_shift;
    }

    chance.min(config.max_hit_chance).max(config.min_hit_chance)
}

/// Physical damage from pre-rolled critical and variance values.
/// `variance` is the multiplier itself (e.g. 0.95).
pub fn physical_damage(
    config: &CombatConfig,
    attack: i32,
    defense: i32,
    context: &DamageContext,
    critical: bool,
    variance: f32,
) -> i32 {
    let mut damage = (attack - defense / 2).max(1) as f32;

    if critical {
        damage *= config.critical_multiplier;
    }
    damage *= context.elemental;
    damage *= 1.0 - context.terrain_bonus as f32 / 100.0;
    damage *= 1.0 + context.height_difference as f32 * config.height_bonus_per_level / 100.0;
    damage *= variance;

    (damage.floor() as i32).max(1)
}

/// Magical damage from a pre-rolled variance multiplier
pub fn magical_damage(
    config: &CombatConfig,
    spell_power: i32,
    magic_attack: i32,
    magic_defense: i32,
    elemental: f32,
    variance: f32,
) -> i32 {
    let base = (spell_power + magic_attack - magic_defense / 2).max(1) as f32;
    let amplified = 1.0 + (elemental - 1.0) * config.magic_elemental_amplification;
    ((base * amplified * variance).floor() as i32).max(1)
}

/// Raw healing before clamping to the target's missing HP
pub fn healing_amount(
    config: &CombatConfig,
    heal_power: i32,
    healer: &CombatUnit,
    variance: f32,
) -> i32 {
    let mut amount = (heal_power + healer.magic_attack / 2) as f32;
    if healer.element == Some(Element::Life) {
        amount *= config.life_heal_multiplier;
    }
    if healer.has_status(StatusEffect::Blessed) {
        amount *= config.blessed_heal_multiplier;
    }
    (amount * variance).floor().max(0.0) as i32
}

/// Status a given attacking element may inflict on hit
pub fn status_rider(config: &CombatConfig, element: Option<Element>) -> Option<(StatusEffect, StatusRider)> {
    match element? {
        Element::Fire => Some((StatusEffect::Burning, config.burn)),
        Element::Death => Some((StatusEffect::Poisoned, config.poison)),
        Element::Water => Some((StatusEffect::Slowed, config.slow)),
        _ => None,
    }
}

/// Damage a damaging status deals at round end, if it is one
pub fn status_tick_damage(config: &CombatConfig, max_hp: i32, status: StatusEffect) -> Option<i32> {
    let divisor = match status {
        StatusEffect::Burning => config.burn_damage_divisor,
        StatusEffect::Poisoned => config.poison_damage_divisor,
        _ => return None,
    };
    Some((max_hp / divisor.max(1)).max(1))
}

/// Apply round-end damage from burning and poison. Returns each damaging
/// status with the damage it dealt.
pub fn apply_status_damage(config: &CombatConfig, unit: &mut CombatUnit) -> Vec<(StatusEffect, i32)> {
    let mut dealt = Vec::new();
    for status in [StatusEffect::Burning, StatusEffect::Poisoned] {
        if !unit.has_status(status) || !unit.is_alive() {
            continue;
        }
        if let Some(damage) = status_tick_damage(config, unit.max_hp, status) {
            dealt.push((status, unit.take_damage(damage)));
        }
    }
    dealt
}

/// Target validity ignoring range: alive and on a hostile side
fn is_valid_target(attacker: &CombatUnit, defender: &CombatUnit) -> bool {
    defender.is_alive() && attacker.side.is_hostile_to(defender.side)
}

/// Rolls dice for combat and applies the outcome to the grid
#[derive(Debug, Clone)]
pub struct CombatResolver {
    config: CombatConfig,
    melee_range: u32,
    rng: ChaCha8Rng,
}

impl CombatResolver {
    pub fn new(config: CombatConfig, melee_range: u32, seed: u64) -> Self {
        Self {
            config,
            melee_range,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Default tunables, melee range 1
    pub fn from_seed(seed: u64) -> Self {
        Self::new(CombatConfig::default(), MELEE_RANGE, seed)
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn melee_range(&self) -> u32 {
        self.melee_range
    }

    /// Position in the random stream, in 32-bit words consumed
    pub fn rng_word_pos(&self) -> u128 {
        self.rng.get_word_pos()
    }

    /// Jump the random stream to a position saved with `rng_word_pos`
    pub fn set_rng_word_pos(&mut self, word_pos: u128) {
        self.rng.set_word_pos(word_pos);
    }

    /// Uniform 1..=100
    fn roll_percent(&mut self) -> u32 {
        self.rng.gen_range(1..=100)
    }

    fn roll_variance(&mut self, spread: f32) -> f32 {
        // Unvalidated configs may carry a negative or NaN spread
        if !(spread > 0.0 && spread.is_finite()) {
            return 1.0;
        }
        self.rng.gen_range((1.0 - spread)..=(1.0 + spread))
    }

    /// Can `attacker` hit `defender` from where they stand?
    pub fn can_target(&self, grid: &BattleGrid, attacker: &UnitId, defender: &UnitId) -> bool {
        let (Some(att), Some(def)) = (grid.unit(attacker), grid.unit(defender)) else {
            return false;
        };
        let (Some(from), Some(to)) = (att.position, def.position) else {
            return false;
        };
        from.distance(&to) <= self.melee_range && is_valid_target(att, def)
    }

    /// Every living hostile unit within melee range of `attacker`
    pub fn targets_in_range(&self, grid: &BattleGrid, attacker: &UnitId) -> Vec<UnitId> {
        grid.units()
            .iter()
            .filter(|u| self.can_target(grid, attacker, &u.id))
            .map(|u| u.id.clone())
            .collect()
    }

    /// Resolve one attack and apply damage and riders to the defender.
    /// The attacker is marked as having acted.
    pub fn execute_attack(
        &mut self,
        grid: &mut BattleGrid,
        attacker_id: &UnitId,
        defender_id: &UnitId,
        kind: AttackKind,
    ) -> Result<AttackResult> {
        let attacker = grid
            .unit(attacker_id)
            .ok_or_else(|| TacticsError::UnknownUnit(attacker_id.clone()))?
            .clone();
        let defender = grid
            .unit(defender_id)
            .ok_or_else(|| TacticsError::UnknownUnit(defender_id.clone()))?
            .clone();
        let from = attacker
            .position
            .ok_or_else(|| TacticsError::NotPlaced(attacker_id.clone()))?;
        let to = defender
            .position
            .ok_or_else(|| TacticsError::NotPlaced(defender_id.clone()))?;

        if !attacker.can_act() {
            return Err(TacticsError::CannotAct(attacker_id.clone()));
        }
        if !is_valid_target(&attacker, &defender) {
            return Err(TacticsError::InvalidTarget(defender_id.clone()));
        }
        if from.distance(&to) > self.melee_range {
            return Err(TacticsError::OutOfRange {
                attacker: attacker_id.clone(),
                defender: defender_id.clone(),
            });
        }

        let terrain_bonus = grid.cell(to).map(|c| c.defense_bonus()).unwrap_or(0);
        let height_difference = grid.elevation_difference(from, to);
        let elemental = elemental_modifier(attacker.element, defender.element);

        let mut critical = false;
        let (hit, damage) = match kind {
            AttackKind::Physical => {
                let chance = hit_chance(&self.config, &attacker, &defender, terrain_bonus);
                let hit = self.roll_percent() as i32 <= chance;
                if hit {
                    critical = self.roll_percent() <= self.config.critical_chance;
                    let variance = self.roll_variance(self.config.physical_variance);
                    let context = DamageContext {
                        elemental,
                        terrain_bonus,
                        height_difference,
                    };
                    let damage = physical_damage(
                        &self.config,
                        attacker.total_attack(),
                        defender.total_defense(),
                        &context,
                        critical,
                        variance,
                    );
                    (true, damage)
                } else {
                    (false, 0)
                }
            }
            AttackKind::Magical { spell_power } => {
                let variance = self.roll_variance(self.config.magical_variance);
                let damage = magical_damage(
                    &self.config,
                    spell_power,
                    attacker.magic_attack,
                    defender.magic_defense,
                    elemental,
                    variance,
                );
                (true, damage)
            }
        };

        let mut dealt = 0;
        let mut status_inflicted = None;
        let mut defender_defeated = false;
        if hit {
            let rider = status_rider(&self.config, attacker.element);
            let rider_roll = rider.map(|_| self.roll_percent());
            if let Some(target) = grid.unit_mut(defender_id) {
                dealt = target.take_damage(damage);
                defender_defeated = !target.is_alive();
                if let (Some((status, rider)), Some(roll)) = (rider, rider_roll) {
                    if !defender_defeated && roll <= rider.chance {
                        target.add_status(status, rider.duration);
                        status_inflicted = Some(status);
                    }
                }
            }
        }

        if let Some(unit) = grid.unit_mut(attacker_id) {
            unit.has_acted = true;
            if let Some(dir) = from.facing_toward(&to) {
                unit.facing = dir;
            }
        }

        let message = attack_message(hit, dealt, critical, elemental, status_inflicted, defender_defeated);
        debug!(
            attacker = %attacker_id,
            defender = %defender_id,
            hit,
            damage = dealt,
            critical,
            "attack resolved"
        );

        Ok(AttackResult {
            attacker: attacker_id.clone(),
            defender: defender_id.clone(),
            kind,
            hit,
            damage: dealt,
            critical,
            elemental_multiplier: elemental,
            terrain_bonus,
            height_bonus: (height_difference as f32 * self.config.height_bonus_per_level) as i32,
            status_inflicted,
            defender_defeated,
            message,
        })
    }

    /// Heal a friendly unit within reach. `heal_power` defaults to the
    /// configured base. The healer is marked as having acted.
    pub fn heal(
        &mut self,
        grid: &mut BattleGrid,
        healer_id: &UnitId,
        target_id: &UnitId,
        heal_power: Option<i32>,
    ) -> Result<HealResult> {
        let healer = grid
            .unit(healer_id)
            .ok_or_else(|| TacticsError::UnknownUnit(healer_id.clone()))?
            .clone();
        let target = grid
            .unit(target_id)
            .ok_or_else(|| TacticsError::UnknownUnit(target_id.clone()))?;
        let from = healer
            .position
            .ok_or_else(|| TacticsError::NotPlaced(healer_id.clone()))?;
        let to = target
            .position
            .ok_or_else(|| TacticsError::NotPlaced(target_id.clone()))?;

        if !healer.can_act() {
            return Err(TacticsError::CannotAct(healer_id.clone()));
        }
        if !target.is_alive() || healer.side.is_hostile_to(target.side) {
            return Err(TacticsError::InvalidTarget(target_id.clone()));
        }
        if from.distance(&to) > self.melee_range {
            return Err(TacticsError::OutOfRange {
                attacker: healer_id.clone(),
                defender: target_id.clone(),
            });
        }

        let power = heal_power.unwrap_or(self.config.default_heal_power);
        let variance = self.roll_variance(self.config.heal_variance);
        let raw = healing_amount(&self.config, power, &healer, variance);

        let amount = grid.unit_mut(target_id).map(|t| t.heal(raw)).unwrap_or(0);
        if let Some(unit) = grid.unit_mut(healer_id) {
            unit.has_acted = true;
        }

        debug!(healer = %healer_id, target = %target_id, amount, "heal resolved");
        Ok(HealResult {
            healer: healer_id.clone(),
            target: target_id.clone(),
            amount,
        })
    }
}

fn attack_message(
    hit: bool,
    damage: i32,
    critical: bool,
    elemental: f32,
    status: Option<StatusEffect>,
    defeated: bool,
) -> String {
    if !hit {
        return "Miss!".to_string();
    }
    let mut parts = Vec::new();
    if critical {
        parts.push("Critical hit!".to_string());
    }
    if elemental > 1.0 {
        parts.push("Super effective!".to_string());
    } else if elemental < 1.0 {
        parts.push("Resisted...".to_string());
    }
    parts.push(format!("{} damage!", damage));
    if let Some(status) = status {
        parts.push(format!("Inflicted {:?}.", status));
    }
    if defeated {
        parts.push("Target defeated.".to_string());
    }
    parts.join(" ")
}
