//! Random battle generation
//!
//! Scatters forests, hills and obstacles across the middle of the field,
//! lines the player roster up on the left and spawns a generic enemy
//! squad on the right.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::battle::battle_map::BattleGrid;
use crate::battle::execution::{Battle, VictoryConditions};
use crate::battle::hex::HexCoord;
use crate::battle::terrain::BattleTerrain;
use crate::battle::units::CombatUnit;
use crate::core::config::{BattleOptions, CombatConfig};
use crate::core::error::Result;
use crate::core::types::Side;

/// Column players deploy on
const PLAYER_COLUMN: i32 = 2;
/// First row used for deployment on both sides
const DEPLOY_START_ROW: i32 = 2;

/// Builds ready-to-start battles from a roster
#[derive(Debug, Clone, Default)]
pub struct BattleGenerator {
    pub options: BattleOptions,
    pub config: CombatConfig,
    pub victory_conditions: VictoryConditions,
}

impl BattleGenerator {
    pub fn new(options: BattleOptions, config: CombatConfig) -> Self {
        Self {
            options,
            config,
            victory_conditions: VictoryConditions::default(),
        }
    }

    /// Generate a battle. The same seed always yields the same field and
    /// the same combat rolls.
    ///
    /// Units that do not fit in the deployment rows are left out.
    pub fn generate_random_battle(
        &self,
        players: Vec<CombatUnit>,
        enemy_count: usize,
        terrain_variety: bool,
        seed: u64,
    ) -> Result<Battle> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = BattleGrid::new(self.options.grid_width, self.options.grid_height);

        if terrain_variety {
            add_random_terrain(&mut grid, &mut rng);
        }

        let rows = deployment_rows(&grid);
        if players.len() > rows.len() {
            warn!(
                roster = players.len(),
                slots = rows.len(),
                "player roster exceeds deployment rows"
            );
        }
        for (unit, row) in players.into_iter().zip(rows.iter()) {
            grid.add_unit(unit, HexCoord::new(PLAYER_COLUMN, *row))?;
        }

        let enemy_column = grid.width as i32 - 3;
        for (i, row) in rows.iter().take(enemy_count).enumerate() {
            grid.add_unit(generic_enemy(i), HexCoord::new(enemy_column, *row))?;
        }

        debug!(units = grid.unit_count(), seed, "random battle generated");

        Ok(Battle::new(
            grid,
            self.victory_conditions.clone(),
            self.options.clone(),
            self.config.clone(),
            seed,
        ))
    }
}

/// Rows available for deployment, top to bottom
fn deployment_rows(grid: &BattleGrid) -> Vec<i32> {
    (DEPLOY_START_ROW..grid.height as i32 - 2).collect()
}

/// Baseline enemy; later spawns are slightly faster
pub fn generic_enemy(index: usize) -> CombatUnit {
    CombatUnit::new(
        format!("enemy_{}", index),
        format!("Enemy {}", index + 1),
        Side::Enemy,
    )
    .with_hp(80)
    .with_stats(12, 8, 8 + index as i32)
    .ai_controlled()
}

/// Random in-bounds cell with x in `x_lo..=width - x_hi_margin` and
/// y in `y_lo..=height - y_hi_margin`. `None` when the grid is too small.
fn random_cell(
    grid: &BattleGrid,
    rng: &mut ChaCha8Rng,
    x_lo: i32,
    x_hi_margin: i32,
    y_lo: i32,
    y_hi_margin: i32,
) -> Option<HexCoord> {
    let x_hi = grid.width as i32 - x_hi_margin;
    let y_hi = grid.height as i32 - y_hi_margin;
    if x_hi < x_lo || y_hi < y_lo {
        return None;
    }
    Some(HexCoord::new(rng.gen_range(x_lo..=x_hi), rng.gen_range(y_lo..=y_hi)))
}

fn add_random_terrain(grid: &mut BattleGrid, rng: &mut ChaCha8Rng) {
    for _ in 0..rng.gen_range(3..=6) {
        if let Some(coord) = random_cell(grid, rng, 3, 4, 2, 3) {
            grid.set_terrain(coord, BattleTerrain::Forest);
        }
    }

    for _ in 0..rng.gen_range(2..=4) {
        if let Some(coord) = random_cell(grid, rng, 3, 4, 2, 3) {
            grid.set_terrain(coord, BattleTerrain::Hill);
            let height = rng.gen_range(1..=2);
            grid.set_elevation(coord, height);
        }
    }

    // Obstacles stay clear of both deployment columns
    for _ in 0..rng.gen_range(1..=3) {
        if let Some(coord) = random_cell(grid, rng, 4, 5, 3, 4) {
            grid.set_terrain(coord, BattleTerrain::Obstacle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UnitId;

    fn roster(n: usize) -> Vec<CombatUnit> {
        (0..n)
            .map(|i| CombatUnit::new(format!("hero_{}", i), format!("Hero {}", i), Side::Player))
            .collect()
    }

    #[test]
    fn test_deployment_positions() {
        let battle = BattleGenerator::default()
            .generate_random_battle(roster(2), 3, false, 1)
            .unwrap();

        let grid = &battle.grid;
        assert_eq!(grid.unit_count(), 5);
        assert_eq!(
            grid.unit(&UnitId::from("hero_1")).unwrap().position,
            Some(HexCoord::new(2, 3))
        );
        let enemy = grid.unit(&UnitId::from("enemy_2")).unwrap();
        assert_eq!(enemy.position, Some(HexCoord::new(9, 4)));
        assert_eq!(enemy.name, "Enemy 3");
        assert_eq!(enemy.max_hp, 80);
        assert_eq!(enemy.speed, 10);
        assert!(enemy.is_ai_controlled);
        assert!(grid.check_consistency().is_ok());
    }

    #[test]
    fn test_no_terrain_means_open_plains() {
        let battle = BattleGenerator::default()
            .generate_random_battle(roster(1), 1, false, 3)
            .unwrap();
        assert!(battle
            .grid
            .cells()
            .iter()
            .all(|c| c.terrain == BattleTerrain::Plains && c.elevation == 0));
    }

    #[test]
    fn test_terrain_varies_and_is_seeded() {
        let generator = BattleGenerator::default();
        let a = generator.generate_random_battle(roster(3), 3, true, 77).unwrap();
        let b = generator.generate_random_battle(roster(3), 3, true, 77).unwrap();

        let terrain = |battle: &Battle| -> Vec<(BattleTerrain, i32)> {
            battle.grid.cells().iter().map(|c| (c.terrain, c.elevation)).collect()
        };
        assert_eq!(terrain(&a), terrain(&b));
        assert!(a.grid.cells().iter().any(|c| c.terrain != BattleTerrain::Plains));
    }

    #[test]
    fn test_obstacles_never_on_deployment_columns() {
        for seed in 0..50 {
            let battle = BattleGenerator::default()
                .generate_random_battle(roster(4), 4, true, seed)
                .unwrap();
            for cell in battle.grid.cells() {
                if cell.terrain == BattleTerrain::Obstacle {
                    assert!(cell.coord.x >= 4 && cell.coord.x <= 7);
                }
            }
        }
    }

    #[test]
    fn test_oversized_roster_truncated() {
        let battle = BattleGenerator::default()
            .generate_random_battle(roster(30), 30, false, 0)
            .unwrap();
        // Rows 2..16 on the standard 18-row grid
        assert_eq!(battle.grid.units_by_side(Side::Player).len(), 14);
        assert_eq!(battle.grid.units_by_side(Side::Enemy).len(), 14);
    }
}
