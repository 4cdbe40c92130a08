//! Straightforward melee policy: finish off the weakest target in reach,
//! otherwise walk at the nearest enemy.

use crate::battle::ai::scoring::nearest_hostile;
use crate::battle::ai::{MovePlanner, TargetSelector};
use crate::battle::battle_map::BattleGrid;
use crate::battle::hex::HexCoord;
use crate::battle::movement::reachable_positions;
use crate::battle::units::CombatUnit;
use crate::core::types::UnitId;

/// Pick the candidate with the lowest HP percentage. Ties go to the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestHealthTargeting;

impl TargetSelector for LowestHealthTargeting {
    fn select_target(
        &self,
        _grid: &BattleGrid,
        _attacker: &CombatUnit,
        candidates: &[&CombatUnit],
    ) -> Option<UnitId> {
        let mut best: Option<&CombatUnit> = None;
        for candidate in candidates {
            if best.map_or(true, |b| candidate.hp_percentage() < b.hp_percentage()) {
                best = Some(candidate);
            }
        }
        best.map(|u| u.id.clone())
    }
}

/// Move to the reachable cell closest to the nearest living enemy
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestApproach;

impl MovePlanner for ClosestApproach {
    fn choose_move(&self, grid: &BattleGrid, unit: &CombatUnit) -> Option<HexCoord> {
        let enemy_pos = nearest_hostile(grid, unit)?.position?;

        let mut best: Option<(HexCoord, u32)> = None;
        for coord in reachable_positions(grid, unit, None).into_keys() {
            let distance = coord.distance(&enemy_pos);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((coord, distance));
            }
        }
        best.map(|(coord, _)| coord)
    }
}
