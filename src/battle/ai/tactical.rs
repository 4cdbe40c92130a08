//! Scoring policy: weighs terrain, height and engagement distance when
//! moving, and focuses fire on wounded or dangerous targets.

use crate::battle::ai::scoring::{
    aggression_adjustment, evaluate_position, nearest_hostile, target_score, ScoreWeights,
};
use crate::battle::ai::{MovePlanner, TargetSelector};
use crate::battle::battle_map::BattleGrid;
use crate::battle::hex::HexCoord;
use crate::battle::movement::reachable_positions;
use crate::battle::units::CombatUnit;
use crate::core::types::UnitId;

/// Highest `target_score` wins. Ties go to the first candidate.
#[derive(Debug, Clone, Default)]
pub struct ThreatTargeting {
    pub weights: ScoreWeights,
}

impl TargetSelector for ThreatTargeting {
    fn select_target(
        &self,
        _grid: &BattleGrid,
        attacker: &CombatUnit,
        candidates: &[&CombatUnit],
    ) -> Option<UnitId> {
        let mut best: Option<(&CombatUnit, f32)> = None;
        for candidate in candidates {
            let score = target_score(attacker, candidate, &self.weights);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        best.map(|(u, _)| u.id.clone())
    }
}

/// Move to the reachable cell with the best position score, shaped by
/// aggression (0.0 keeps away, 1.0 charges in)
#[derive(Debug, Clone)]
pub struct PositionalMovement {
    pub aggression: f32,
    pub weights: ScoreWeights,
}

impl PositionalMovement {
    pub fn new(aggression: f32) -> Self {
        Self {
            aggression: aggression.clamp(0.0, 1.0),
            weights: ScoreWeights::default(),
        }
    }

    fn score(&self, grid: &BattleGrid, unit: &CombatUnit, coord: HexCoord, enemy_pos: HexCoord) -> f32 {
        evaluate_position(grid, unit, coord, &self.weights)
            + aggression_adjustment(self.aggression, coord.distance(&enemy_pos), &self.weights)
    }
}

impl Default for PositionalMovement {
    fn default() -> Self {
        Self::new(0.7)
    }
}

impl MovePlanner for PositionalMovement {
    fn choose_move(&self, grid: &BattleGrid, unit: &CombatUnit) -> Option<HexCoord> {
        let enemy_pos = nearest_hostile(grid, unit)?.position?;

        let mut best: Option<(HexCoord, f32)> = None;
        for coord in reachable_positions(grid, unit, None).into_keys() {
            let score = self.score(grid, unit, coord, enemy_pos);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((coord, score));
            }
        }
        best.map(|(coord, _)| coord)
    }
}
