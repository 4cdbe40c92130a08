//! Plain-data battle records for save and restore
//!
//! A `BattleRecord` holds everything needed to rebuild a `Battle`: terrain,
//! units with full stat blocks and statuses, the turn order with speed
//! snapshots, round, phase and result. Encoding is left to the caller;
//! JSON helpers are provided.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleGrid;
use crate::battle::constants::MAX_GRID_CELLS;
use crate::battle::execution::{
    Battle, BattleEventLog, BattlePhase, BattleResult, TurnOrderEntry, VictoryConditions,
};
use crate::battle::hex::HexCoord;
use crate::battle::resolution::CombatResolver;
use crate::battle::terrain::BattleTerrain;
use crate::battle::units::CombatUnit;
use crate::core::config::{BattleOptions, CombatConfig};
use crate::core::error::{Result, TacticsError};
use crate::core::types::BattleId;

/// Terrain and elevation of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub coord: HexCoord,
    pub terrain: BattleTerrain,
    pub elevation: i32,
}

/// Complete serializable battle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub battle_id: BattleId,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<CellRecord>,
    /// Units on the grid, in placement order, each with its position
    pub units: Vec<CombatUnit>,
    pub fallen: Vec<CombatUnit>,
    pub turn_order: Vec<TurnOrderEntry>,
    pub turn_index: usize,
    pub round: u32,
    pub phase: BattlePhase,
    pub result: BattleResult,
    pub victory_conditions: VictoryConditions,
    pub options: BattleOptions,
    pub combat_config: CombatConfig,
    pub seed: u64,
    /// Words the combat resolver has drawn from its seeded stream
    #[serde(default)]
    pub rng_word_pos: u128,
    #[serde(default)]
    pub events: BattleEventLog,
}

impl BattleRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl Battle {
    /// Snapshot the full battle state
    pub fn to_record(&self) -> BattleRecord {
        let cells = self
            .grid
            .cells()
            .into_iter()
            .map(|c| CellRecord {
                coord: c.coord,
                terrain: c.terrain,
                elevation: c.elevation,
            })
            .collect();

        BattleRecord {
            battle_id: self.id,
            width: self.grid.width,
            height: self.grid.height,
            cells,
            units: self.grid.units().to_vec(),
            fallen: self.fallen.clone(),
            turn_order: self.turn_order.clone(),
            turn_index: self.turn_index,
            round: self.round,
            phase: self.phase,
            result: self.result,
            victory_conditions: self.victory_conditions.clone(),
            options: self.options.clone(),
            combat_config: self.resolver.config().clone(),
            seed: self.seed,
            rng_word_pos: self.resolver.rng_word_pos(),
            events: self.log.clone(),
        }
    }

    /// Rebuild a battle from a record, validating it on the way.
    ///
    /// The resolver resumes its random stream where the snapshot left it, so
    /// a restored battle rolls exactly as the original would have.
    pub fn from_record(record: BattleRecord) -> Result<Battle> {
        let cell_count = record
            .width
            .checked_mul(record.height)
            .filter(|n| *n <= MAX_GRID_CELLS)
            .ok_or_else(|| {
                TacticsError::Inconsistent(format!(
                    "grid of {}x{} is too large",
                    record.width, record.height
                ))
            })?;
        if cell_count == 0 {
            return Err(TacticsError::Inconsistent("grid has no cells".into()));
        }

        let mut grid = BattleGrid::new(record.width, record.height);
        for cell in &record.cells {
            if !grid.in_bounds(cell.coord) {
                return Err(TacticsError::OutOfBounds(cell.coord));
            }
            grid.set_terrain(cell.coord, cell.terrain);
            grid.set_elevation(cell.coord, cell.elevation);
        }

        for unit in record.units {
            let position = unit
                .position
                .ok_or_else(|| TacticsError::NotPlaced(unit.id.clone()))?;
            grid.add_unit(unit, position)?;
        }
        grid.check_consistency()?;

        for entry in &record.turn_order {
            if grid.unit(&entry.unit_id).is_none() {
                return Err(TacticsError::Inconsistent(format!(
                    "turn order references unit {} not on the grid",
                    entry.unit_id
                )));
            }
        }
        if record.turn_index > record.turn_order.len() {
            return Err(TacticsError::Inconsistent(format!(
                "turn index {} past turn order of {}",
                record.turn_index,
                record.turn_order.len()
            )));
        }

        record.combat_config.validate()?;
        let mut resolver =
            CombatResolver::new(record.combat_config, record.options.melee_range, record.seed);
        resolver.set_rng_word_pos(record.rng_word_pos);

        Ok(Battle {
            id: record.battle_id,
            grid,
            round: record.round,
            phase: record.phase,
            result: record.result,
            victory_conditions: record.victory_conditions,
            turn_order: record.turn_order,
            turn_index: record.turn_index,
            options: record.options,
            resolver,
            seed: record.seed,
            log: record.events,
            fallen: record.fallen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::generation::BattleGenerator;
    use crate::battle::resolution::AttackKind;
    use crate::battle::units::StatusEffect;
    use crate::core::types::{Side, UnitId};

    fn sample_battle() -> Battle {
        let roster = vec![
            CombatUnit::new("knight", "Knight", Side::Player).with_stats(14, 12, 9),
            CombatUnit::new("mage", "Mage", Side::Player).with_magic(20, 12),
        ];
        let mut battle = BattleGenerator::default()
            .generate_random_battle(roster, 2, true, 5)
            .unwrap();
        battle.start_battle();
        battle
            .grid
            .unit_mut(&UnitId::from("knight"))
            .unwrap()
            .add_status(StatusEffect::Burning, 2);
        battle.next_turn();
        battle
    }

    #[test]
    fn test_record_restores_state() {
        let battle = sample_battle();
        let record = battle.to_record();
        let restored = Battle::from_record(record.clone()).unwrap();

        assert_eq!(restored.id, battle.id);
        assert_eq!(restored.round, battle.round);
        assert_eq!(restored.phase, battle.phase);
        assert_eq!(restored.turn_order(), battle.turn_order());
        assert_eq!(restored.turn_index(), battle.turn_index());
        assert_eq!(restored.grid.units(), battle.grid.units());
        assert_eq!(restored.to_record(), record);
    }

    #[test]
    fn test_json_round_trip_preserves_statuses() {
        let record = sample_battle().to_record();
        let json = record.to_json().unwrap();
        let parsed = BattleRecord::from_json(&json).unwrap();
        let restored = Battle::from_record(parsed).unwrap();

        let knight = restored.grid.unit(&UnitId::from("knight")).unwrap();
        assert_eq!(knight.statuses.remaining(StatusEffect::Burning), 2);
    }

    #[test]
    fn test_unplaced_unit_rejected() {
        let mut record = sample_battle().to_record();
        record.units[0].position = None;
        assert!(matches!(
            Battle::from_record(record),
            Err(TacticsError::NotPlaced(_))
        ));
    }

    #[test]
    fn test_stacked_units_rejected() {
        let mut record = sample_battle().to_record();
        let pos = record.units[0].position;
        record.units[1].position = pos;
        assert!(matches!(
            Battle::from_record(record),
            Err(TacticsError::CellOccupied(_))
        ));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let mut record = sample_battle().to_record();
        record.width = u32::MAX;
        record.height = 2;
        assert!(matches!(
            Battle::from_record(record),
            Err(TacticsError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_rng_position_survives_json() {
        let mut battle = sample_battle();
        battle.resolver.set_rng_word_pos(40);

        let record = battle.to_record();
        assert_eq!(record.rng_word_pos, 40);
        let parsed = BattleRecord::from_json(&record.to_json().unwrap()).unwrap();
        let mut restored = Battle::from_record(parsed).unwrap();
        assert_eq!(restored.resolver.rng_word_pos(), 40);

        // Both resolvers now roll the same stream
        let mut grid = restored.grid.clone();
        let attacker = UnitId::from("knight");
        let defender = grid.units_by_side(Side::Enemy)[0].id.clone();
        let spot = grid.unit(&defender).unwrap().position.unwrap();
        let near = grid
            .neighbors(spot)
            .into_iter()
            .find(|c| grid.is_position_free(*c))
            .unwrap();
        grid.move_unit(&attacker, near).unwrap();
        let mut other = grid.clone();
        let first = restored
            .resolver
            .execute_attack(&mut grid, &attacker, &defender, AttackKind::Physical)
            .unwrap();
        let second = battle
            .resolver
            .execute_attack(&mut other, &attacker, &defender, AttackKind::Physical)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dangling_turn_order_rejected() {
        let mut record = sample_battle().to_record();
        record.turn_order.push(TurnOrderEntry {
            unit_id: UnitId::from("ghost"),
            speed: 1,
            has_acted: false,
        });
        assert!(matches!(
            Battle::from_record(record),
            Err(TacticsError::Inconsistent(_))
        ));
    }
}
