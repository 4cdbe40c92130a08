//! Battle grid with hex cells, terrain, elevation and the unit collection
//!
//! The grid is the single owner of every unit on the battlefield. A cell's
//! occupant and the occupant's position always agree; `add_unit`,
//! `remove_unit` and `move_unit` are the only places either changes.

use ahash::AHashMap;

use crate::battle::constants::{BATTLE_GRID_HEIGHT, BATTLE_GRID_WIDTH};
use crate::battle::hex::HexCoord;
use crate::battle::terrain::BattleTerrain;
use crate::battle::units::CombatUnit;
use crate::core::error::{Result, TacticsError};
use crate::core::types::{Side, UnitId};

/// A single cell on the battle grid
#[derive(Debug, Clone, PartialEq)]
pub struct BattleCell {
    pub coord: HexCoord,
    pub terrain: BattleTerrain,
    pub elevation: i32,
    pub occupant: Option<UnitId>,
}

impl BattleCell {
    pub fn new(coord: HexCoord, terrain: BattleTerrain) -> Self {
        Self {
            coord,
            terrain,
            elevation: 0,
            occupant: None,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Movement cost of entering this cell, `None` if impassable
    pub fn movement_cost(&self) -> Option<u32> {
        self.terrain.movement_cost()
    }

    pub fn defense_bonus(&self) -> i32 {
        self.terrain.defense_bonus()
    }
}

/// The full tactical grid
#[derive(Debug, Clone)]
pub struct BattleGrid {
    pub width: u32,
    pub height: u32,
    cells: AHashMap<HexCoord, BattleCell>,
    /// Units in placement order
    units: Vec<CombatUnit>,
}

impl BattleGrid {
    /// Create a grid of open plains
    pub fn new(width: u32, height: u32) -> Self {
        let mut cells = AHashMap::with_capacity((width as usize).saturating_mul(height as usize));
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let coord = HexCoord::new(x, y);
                cells.insert(coord, BattleCell::new(coord, BattleTerrain::Plains));
            }
        }

        Self {
            width,
            height,
            cells,
            units: Vec::new(),
        }
    }

    /// Standard 12 x 18 battle grid
    pub fn standard() -> Self {
        Self::new(BATTLE_GRID_WIDTH, BATTLE_GRID_HEIGHT)
    }

    pub fn in_bounds(&self, coord: HexCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width as i32 && coord.y < self.height as i32
    }

    pub fn cell(&self, coord: HexCoord) -> Option<&BattleCell> {
        self.cells.get(&coord)
    }

    fn cell_mut(&mut self, coord: HexCoord) -> Option<&mut BattleCell> {
        self.cells.get_mut(&coord)
    }

    /// Every cell, row by row
    pub fn cells(&self) -> Vec<&BattleCell> {
        let mut cells: Vec<&BattleCell> = self.cells.values().collect();
        cells.sort_by_key(|c| (c.coord.y, c.coord.x));
        cells
    }

    pub fn set_terrain(&mut self, coord: HexCoord, terrain: BattleTerrain) {
        if let Some(cell) = self.cell_mut(coord) {
            cell.terrain = terrain;
        }
    }

    pub fn set_elevation(&mut self, coord: HexCoord, elevation: i32) {
        if let Some(cell) = self.cell_mut(coord) {
            cell.elevation = elevation;
        }
    }

    pub fn elevation(&self, coord: HexCoord) -> i32 {
        self.cell(coord).map(|c| c.elevation).unwrap_or(0)
    }

    /// Elevation difference (positive = `from` is higher)
    pub fn elevation_difference(&self, from: HexCoord, to: HexCoord) -> i32 {
        self.elevation(from) - self.elevation(to)
    }

    /// In bounds, passable terrain and nobody standing there
    pub fn is_position_free(&self, coord: HexCoord) -> bool {
        self.cell(coord)
            .map(|c| c.is_passable() && !c.is_occupied())
            .unwrap_or(false)
    }

    /// In-bounds neighbors of a coordinate
    pub fn neighbors(&self, coord: HexCoord) -> Vec<HexCoord> {
        coord
            .neighbors()
            .into_iter()
            .filter(|n| self.in_bounds(*n))
            .collect()
    }

    /// Place a unit on the battlefield
    pub fn add_unit(&mut self, mut unit: CombatUnit, position: HexCoord) -> Result<()> {
        if self.unit(&unit.id).is_some() {
            return Err(TacticsError::DuplicateUnit(unit.id));
        }
        let cell = self
            .cell_mut(position)
            .ok_or(TacticsError::OutOfBounds(position))?;
        if cell.is_occupied() {
            return Err(TacticsError::CellOccupied(position));
        }
        if !cell.is_passable() {
            return Err(TacticsError::Impassable(position));
        }

        cell.occupant = Some(unit.id.clone());
        unit.position = Some(position);
        self.units.push(unit);
        Ok(())
    }

    /// Take a unit off the battlefield, clearing its cell
    pub fn remove_unit(&mut self, id: &UnitId) -> Option<CombatUnit> {
        let idx = self.units.iter().position(|u| &u.id == id)?;
        let mut unit = self.units.remove(idx);
        if let Some(pos) = unit.position.take() {
            if let Some(cell) = self.cell_mut(pos) {
                if cell.occupant.as_ref() == Some(id) {
                    cell.occupant = None;
                }
            }
        }
        Some(unit)
    }

    /// Relocate a unit, keeping cell occupancy and unit position in sync
    pub fn move_unit(&mut self, id: &UnitId, new_position: HexCoord) -> Result<()> {
        let old_position = self
            .unit(id)
            .ok_or_else(|| TacticsError::UnknownUnit(id.clone()))?
            .position
            .ok_or_else(|| TacticsError::NotPlaced(id.clone()))?;

        let target = self
            .cell(new_position)
            .ok_or(TacticsError::OutOfBounds(new_position))?;
        if !target.is_passable() {
            return Err(TacticsError::Impassable(new_position));
        }
        match &target.occupant {
            Some(occupant) if occupant != id => {
                return Err(TacticsError::CellOccupied(new_position));
            }
            _ => {}
        }

        if let Some(old_cell) = self.cell_mut(old_position) {
            old_cell.occupant = None;
        }
        if let Some(new_cell) = self.cell_mut(new_position) {
            new_cell.occupant = Some(id.clone());
        }
        if let Some(unit) = self.unit_mut(id) {
            unit.position = Some(new_position);
        }
        Ok(())
    }

    pub fn unit(&self, id: &UnitId) -> Option<&CombatUnit> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Mutable access for stat/status changes. Position must only change
    /// through `move_unit`.
    pub fn unit_mut(&mut self, id: &UnitId) -> Option<&mut CombatUnit> {
        self.units.iter_mut().find(|u| &u.id == id)
    }

    /// All units in placement order
    pub fn units(&self) -> &[CombatUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut CombatUnit> {
        self.units.iter_mut()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit_at(&self, coord: HexCoord) -> Option<&CombatUnit> {
        self.cell(coord)
            .and_then(|c| c.occupant.as_ref())
            .and_then(|id| self.unit(id))
    }

    /// Units within `range` hexes of a coordinate
    pub fn units_in_range(&self, coord: HexCoord, range: u32) -> Vec<&CombatUnit> {
        self.units
            .iter()
            .filter(|u| u.position.map(|p| coord.distance(&p) <= range).unwrap_or(false))
            .collect()
    }

    pub fn units_by_side(&self, side: Side) -> Vec<&CombatUnit> {
        self.units.iter().filter(|u| u.side == side).collect()
    }

    pub fn living_units_of(&self, side: Side) -> Vec<&CombatUnit> {
        self.units
            .iter()
            .filter(|u| u.side == side && u.is_alive())
            .collect()
    }

    /// Verify that cells and units agree. A failure here is an internal bug,
    /// never a user error.
    pub fn check_consistency(&self) -> Result<()> {
        for cell in self.cells.values() {
            if let Some(id) = &cell.occupant {
                let unit = self.unit(id).ok_or_else(|| {
                    TacticsError::Inconsistent(format!(
                        "cell {:?} references missing unit {}",
                        cell.coord, id
                    ))
                })?;
                if unit.position != Some(cell.coord) {
                    return Err(TacticsError::Inconsistent(format!(
                        "unit {} is at {:?} but occupies cell {:?}",
                        id, unit.position, cell.coord
                    )));
                }
            }
        }

        for unit in &self.units {
            let pos = unit
                .position
                .ok_or_else(|| TacticsError::Inconsistent(format!("unit {} has no position", unit.id)))?;
            let occupant = self.cell(pos).and_then(|c| c.occupant.as_ref());
            if occupant != Some(&unit.id) {
                return Err(TacticsError::Inconsistent(format!(
                    "unit {} at {:?} is not recorded in its cell",
                    unit.id, pos
                )));
            }
        }

        if self.cells.len() != (self.width * self.height) as usize {
            return Err(TacticsError::Inconsistent("cell map is incomplete".into()));
        }
        Ok(())
    }
}

impl Default for BattleGrid {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soldier(id: &str) -> CombatUnit {
        CombatUnit::new(id, id, Side::Player)
    }

    #[test]
    fn test_standard_grid_has_every_cell() {
        let grid = BattleGrid::standard();
        assert_eq!(grid.width, 12);
        assert_eq!(grid.height, 18);
        assert_eq!(grid.cells().len(), 12 * 18);
        assert!(grid.cell(HexCoord::new(11, 17)).is_some());
        assert!(grid.cell(HexCoord::new(12, 0)).is_none());
    }

    #[test]
    fn test_add_unit_sets_both_sides() {
        let mut grid = BattleGrid::new(6, 6);
        grid.add_unit(soldier("a"), HexCoord::new(2, 2)).unwrap();

        let unit = grid.unit(&UnitId::from("a")).unwrap();
        assert_eq!(unit.position, Some(HexCoord::new(2, 2)));
        assert_eq!(
            grid.cell(HexCoord::new(2, 2)).unwrap().occupant,
            Some(UnitId::from("a"))
        );
        assert!(grid.check_consistency().is_ok());
    }

    #[test]
    fn test_add_unit_occupied_fails_and_count_unchanged() {
        let mut grid = BattleGrid::new(6, 6);
        grid.add_unit(soldier("a"), HexCoord::new(1, 1)).unwrap();
        let err = grid.add_unit(soldier("b"), HexCoord::new(1, 1)).unwrap_err();
        assert!(matches!(err, TacticsError::CellOccupied(_)));
        assert_eq!(grid.unit_count(), 1);
    }

    #[test]
    fn test_add_unit_out_of_bounds() {
        let mut grid = BattleGrid::new(6, 6);
        let err = grid.add_unit(soldier("a"), HexCoord::new(-1, 0)).unwrap_err();
        assert!(matches!(err, TacticsError::OutOfBounds(_)));
        assert_eq!(grid.unit_count(), 0);
    }

    #[test]
    fn test_add_duplicate_id_rejected() {
        let mut grid = BattleGrid::new(6, 6);
        grid.add_unit(soldier("a"), HexCoord::new(1, 1)).unwrap();
        let err = grid.add_unit(soldier("a"), HexCoord::new(2, 2)).unwrap_err();
        assert!(matches!(err, TacticsError::DuplicateUnit(_)));
    }

    #[test]
    fn test_remove_unit_clears_cell() {
        let mut grid = BattleGrid::new(6, 6);
        grid.add_unit(soldier("a"), HexCoord::new(3, 3)).unwrap();
        let removed = grid.remove_unit(&UnitId::from("a")).unwrap();
        assert_eq!(removed.position, None);
        assert!(!grid.cell(HexCoord::new(3, 3)).unwrap().is_occupied());
        assert!(grid.remove_unit(&UnitId::from("a")).is_none());
    }

    #[test]
    fn test_move_unit_atomic() {
        let mut grid = BattleGrid::new(6, 6);
        grid.add_unit(soldier("a"), HexCoord::new(0, 0)).unwrap();
        grid.move_unit(&UnitId::from("a"), HexCoord::new(4, 4)).unwrap();

        assert!(!grid.cell(HexCoord::new(0, 0)).unwrap().is_occupied());
        assert_eq!(
            grid.unit_at(HexCoord::new(4, 4)).map(|u| u.id.clone()),
            Some(UnitId::from("a"))
        );
        assert!(grid.check_consistency().is_ok());
    }

    #[test]
    fn test_move_unit_rejections() {
        let mut grid = BattleGrid::new(6, 6);
        grid.add_unit(soldier("a"), HexCoord::new(0, 0)).unwrap();
        grid.add_unit(soldier("b"), HexCoord::new(1, 0)).unwrap();
        grid.set_terrain(HexCoord::new(2, 2), BattleTerrain::Wall);
        let a = UnitId::from("a");

        assert!(matches!(
            grid.move_unit(&a, HexCoord::new(1, 0)),
            Err(TacticsError::CellOccupied(_))
        ));
        assert!(matches!(
            grid.move_unit(&a, HexCoord::new(2, 2)),
            Err(TacticsError::Impassable(_))
        ));
        assert!(matches!(
            grid.move_unit(&a, HexCoord::new(9, 9)),
            Err(TacticsError::OutOfBounds(_))
        ));
        assert!(matches!(
            grid.move_unit(&UnitId::from("ghost"), HexCoord::new(3, 3)),
            Err(TacticsError::UnknownUnit(_))
        ));
        assert_eq!(grid.unit(&a).unwrap().position, Some(HexCoord::new(0, 0)));
    }

    #[test]
    fn test_neighbors_clipped_at_edges() {
        let grid = BattleGrid::new(6, 6);
        assert_eq!(grid.neighbors(HexCoord::new(0, 0)).len(), 2);
        assert_eq!(grid.neighbors(HexCoord::new(3, 3)).len(), 6);
    }

    #[test]
    fn test_elevation_difference() {
        let mut grid = BattleGrid::new(6, 6);
        grid.set_elevation(HexCoord::new(0, 0), 3);
        grid.set_elevation(HexCoord::new(5, 5), 1);
        assert_eq!(
            grid.elevation_difference(HexCoord::new(0, 0), HexCoord::new(5, 5)),
            2
        );
    }

    #[test]
    fn test_units_in_range() {
        let mut grid = BattleGrid::new(8, 8);
        grid.add_unit(soldier("a"), HexCoord::new(2, 2)).unwrap();
        grid.add_unit(soldier("b"), HexCoord::new(3, 2)).unwrap();
        grid.add_unit(soldier("c"), HexCoord::new(7, 7)).unwrap();
        assert_eq!(grid.units_in_range(HexCoord::new(2, 2), 1).len(), 2);
    }

    #[test]
    fn test_living_units_of_skips_dead_and_other_sides() {
        let mut grid = BattleGrid::new(8, 8);
        grid.add_unit(soldier("a"), HexCoord::new(0, 0)).unwrap();
        grid.add_unit(soldier("b"), HexCoord::new(1, 0)).unwrap();
        grid.add_unit(CombatUnit::new("e", "E", Side::Enemy), HexCoord::new(2, 0))
            .unwrap();
        grid.unit_mut(&UnitId::from("b")).unwrap().current_hp = 0;

        let living: Vec<&str> = grid
            .living_units_of(Side::Player)
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(living, vec!["a"]);
        assert_eq!(grid.units_by_side(Side::Player).len(), 2);
    }

    #[test]
    fn test_consistency_detects_stray_position() {
        let mut grid = BattleGrid::new(4, 4);
        grid.add_unit(soldier("a"), HexCoord::new(0, 0)).unwrap();
        grid.unit_mut(&UnitId::from("a")).unwrap().position = Some(HexCoord::new(1, 1));
        assert!(matches!(
            grid.check_consistency(),
            Err(TacticsError::Inconsistent(_))
        ));
    }
}
