//! Heuristic scoring for AI decisions
//!
//! Positions are scored for defensive value and engagement distance;
//! targets for how close they are to falling and how dangerous they are.

use crate::battle::battle_map::BattleGrid;
use crate::battle::hex::HexCoord;
use crate::battle::units::CombatUnit;

/// Weights behind position and target scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Terrain defense bonus is divided by this
    pub terrain_divisor: f32,
    pub elevation_weight: f32,
    pub adjacent_bonus: f32,
    pub near_bonus: f32,
    pub approach_bonus: f32,
    pub grouping_bonus: f32,
    /// Aggressive units lose this much per hex from the enemy
    pub aggressive_distance_penalty: f32,
    /// Cautious units gain this much per hex from the enemy
    pub cautious_distance_reward: f32,
    pub critical_hp_bonus: f32,
    pub wounded_hp_bonus: f32,
    pub threat_weight: f32,
    pub target_distance_penalty: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            terrain_divisor: 10.0,
            elevation_weight: 5.0,
            adjacent_bonus: 50.0,
            near_bonus: 30.0,
            approach_bonus: 10.0,
            grouping_bonus: 5.0,
            aggressive_distance_penalty: 10.0,
            cautious_distance_reward: 5.0,
            critical_hp_bonus: 100.0,
            wounded_hp_bonus: 50.0,
            threat_weight: 2.0,
            target_distance_penalty: 5.0,
        }
    }
}

/// Closest living hostile unit. Ties go to the earliest placed.
pub fn nearest_hostile<'a>(grid: &'a BattleGrid, unit: &CombatUnit) -> Option<&'a CombatUnit> {
    let origin = unit.position?;
    grid.units()
        .iter()
        .filter(|u| u.is_alive() && unit.side.is_hostile_to(u.side))
        .filter_map(|u| u.position.map(|p| (u, origin.distance(&p))))
        .min_by_key(|(_, d)| *d)
        .map(|(u, _)| u)
}

/// Closest living unit on the same side, excluding the unit itself
pub fn nearest_ally<'a>(grid: &'a BattleGrid, unit: &CombatUnit) -> Option<&'a CombatUnit> {
    let origin = unit.position?;
    grid.units()
        .iter()
        .filter(|u| u.is_alive() && u.side == unit.side && u.id != unit.id)
        .filter_map(|u| u.position.map(|p| (u, origin.distance(&p))))
        .min_by_key(|(_, d)| *d)
        .map(|(u, _)| u)
}

/// How attractive `position` is for `unit` (higher is better).
///
/// Reference enemy and ally are the ones nearest the unit's current cell.
pub fn evaluate_position(
    grid: &BattleGrid,
    unit: &CombatUnit,
    position: HexCoord,
    weights: &ScoreWeights,
) -> f32 {
    let mut score = 0.0;

    if let Some(cell) = grid.cell(position) {
        score += cell.defense_bonus() as f32 / weights.terrain_divisor;
        score += cell.elevation as f32 * weights.elevation_weight;
    }

    if let Some(enemy_pos) = nearest_hostile(grid, unit).and_then(|e| e.position) {
        score += match position.distance(&enemy_pos) {
            1 => weights.adjacent_bonus,
            2 => weights.near_bonus,
            d if d <= 4 => weights.approach_bonus,
            _ => 0.0,
        };
    }

    if let Some(ally_pos) = nearest_ally(grid, unit).and_then(|a| a.position) {
        if (2..=4).contains(&position.distance(&ally_pos)) {
            score += weights.grouping_bonus;
        }
    }

    score
}

/// Distance shaping from temperament: above 0.5 aggression closes in,
/// otherwise keeps away.
pub fn aggression_adjustment(aggression: f32, distance_to_enemy: u32, weights: &ScoreWeights) -> f32 {
    let distance = distance_to_enemy as f32;
    if aggression > 0.5 {
        -distance * weights.aggressive_distance_penalty
    } else {
        distance * weights.cautious_distance_reward
    }
}

/// Priority of `target` for `attacker` (higher is better)
pub fn target_score(attacker: &CombatUnit, target: &CombatUnit, weights: &ScoreWeights) -> f32 {
    let mut score = 0.0;

    let hp = target.hp_percentage();
    if hp < 30.0 {
        score += weights.critical_hp_bonus;
    } else if hp < 60.0 {
        score += weights.wounded_hp_bonus;
    }

    score += target.total_attack() as f32 * weights.threat_weight;

    if let (Some(from), Some(to)) = (attacker.position, target.position) {
        score -= from.distance(&to) as f32 * weights.target_distance_penalty;
    }

    score
}
