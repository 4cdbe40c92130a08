//! Movement rules: reachability, composite moves and range queries
//!
//! Terrain costs are non-uniform, so reachability is a Dijkstra relaxation
//! rather than a plain breadth-first flood. Costs in the returned map are
//! global minima regardless of expansion order.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use tracing::debug;

use crate::battle::battle_map::BattleGrid;
use crate::battle::hex::HexCoord;
use crate::battle::pathfinding::find_path;
use crate::battle::units::CombatUnit;
use crate::core::error::{Result, TacticsError};
use crate::core::types::UnitId;

/// Can `unit` stand on `coord`? In bounds, passable and either empty or
/// already holding this unit.
pub fn is_position_accessible(grid: &BattleGrid, coord: HexCoord, unit: &CombatUnit) -> bool {
    match grid.cell(coord) {
        Some(cell) => {
            cell.is_passable()
                && match &cell.occupant {
                    Some(occupant) => occupant == &unit.id,
                    None => true,
                }
        }
        None => false,
    }
}

/// Cost of stepping from `from` into the adjacent `to`, or `None` if the
/// step is not allowed for this unit.
pub fn step_cost(
    grid: &BattleGrid,
    from: HexCoord,
    to: HexCoord,
    unit: &CombatUnit,
) -> Option<u32> {
    if !is_position_accessible(grid, to, unit) {
        return None;
    }
    let climb = grid.elevation_difference(from, to).unsigned_abs();
    if climb > unit.jump_height {
        return None;
    }
    grid.cell(to).and_then(|c| c.movement_cost())
}

/// Every cell the unit can reach this turn, mapped to its minimal cost.
/// The unit's own cell is excluded. `max_range` defaults to the unit's
/// move range.
pub fn reachable_positions(
    grid: &BattleGrid,
    unit: &CombatUnit,
    max_range: Option<u32>,
) -> BTreeMap<HexCoord, u32> {
    let Some(start) = unit.position else {
        return BTreeMap::new();
    };
    let budget = max_range.unwrap_or(unit.move_range);

    let mut best: BTreeMap<HexCoord, u32> = BTreeMap::new();
    let mut frontier = BinaryHeap::new();
    best.insert(start, 0);
    frontier.push(Reverse((0u32, start)));

    while let Some(Reverse((cost, current))) = frontier.pop() {
        if best.get(&current).is_some_and(|b| cost > *b) {
            continue; // stale entry
        }

        for neighbor in grid.neighbors(current) {
            let Some(step) = step_cost(grid, current, neighbor, unit) else {
                continue;
            };
            let total = cost + step;
            if total > budget {
                continue;
            }
            if best.get(&neighbor).map_or(true, |b| total < *b) {
                best.insert(neighbor, total);
                frontier.push(Reverse((total, neighbor)));
            }
        }
    }

    best.remove(&start);
    best
}

/// Would `unit` be allowed to move to `destination` right now?
pub fn can_move_to(grid: &BattleGrid, unit: &CombatUnit, destination: HexCoord) -> bool {
    unit.can_move()
        && is_position_accessible(grid, destination, unit)
        && reachable_positions(grid, unit, None).contains_key(&destination)
}

/// Move a unit along a legal path, marking it as having moved.
///
/// Returns the path taken, start and destination included.
pub fn move_unit(grid: &mut BattleGrid, id: &UnitId, destination: HexCoord) -> Result<Vec<HexCoord>> {
    let unit = grid
        .unit(id)
        .ok_or_else(|| TacticsError::UnknownUnit(id.clone()))?;
    let start = unit
        .position
        .ok_or_else(|| TacticsError::NotPlaced(id.clone()))?;

    if !unit.can_move() {
        return Err(TacticsError::CannotMove(id.clone()));
    }

    match grid.cell(destination) {
        None => return Err(TacticsError::OutOfBounds(destination)),
        Some(cell) if !cell.is_passable() => return Err(TacticsError::Impassable(destination)),
        Some(_) if !is_position_accessible(grid, destination, unit) => {
            return Err(TacticsError::CellOccupied(destination))
        }
        Some(_) => {}
    }

    if !can_move_to(grid, unit, destination) {
        return Err(TacticsError::Unreachable(destination));
    }

    let path = find_path(grid, start, destination, unit).ok_or(TacticsError::NoPath {
        from: start,
        to: destination,
    })?;

    grid.move_unit(id, destination)?;

    let facing = path
        .len()
        .checked_sub(2)
        .and_then(|i| path[i].direction_to(&destination));
    if let Some(unit) = grid.unit_mut(id) {
        unit.has_moved = true;
        if let Some(dir) = facing {
            unit.facing = dir;
        }
    }

    debug!(unit = %id, from = ?start, to = ?destination, steps = path.len() - 1, "unit moved");
    Ok(path)
}

/// Total cost of walking a path: the sum of every entered cell's cost.
/// `None` if the path leaves the grid or crosses impassable terrain.
pub fn path_cost(grid: &BattleGrid, path: &[HexCoord]) -> Option<u32> {
    path.iter()
        .skip(1)
        .map(|coord| grid.cell(*coord).and_then(|c| c.movement_cost()))
        .sum()
}

/// In-bounds coordinates whose distance from `center` lies in
/// `min_range..=max_range`, row by row.
pub fn positions_in_range(
    grid: &BattleGrid,
    center: HexCoord,
    min_range: u32,
    max_range: u32,
) -> Vec<HexCoord> {
    let mut positions = Vec::new();
    for y in 0..grid.height as i32 {
        for x in 0..grid.width as i32 {
            let coord = HexCoord::new(x, y);
            let dist = center.distance(&coord);
            if dist >= min_range && dist <= max_range {
                positions.push(coord);
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::BattleTerrain;
    use crate::core::types::Side;

    fn grid_with_unit(pos: HexCoord) -> (BattleGrid, UnitId) {
        let mut grid = BattleGrid::new(12, 12);
        let unit = CombatUnit::new("mover", "Mover", Side::Player);
        grid.add_unit(unit, pos).unwrap();
        (grid, UnitId::from("mover"))
    }

    #[test]
    fn test_open_plains_reach_exactly_move_range() {
        let center = HexCoord::new(5, 5);
        let (grid, id) = grid_with_unit(center);
        let unit = grid.unit(&id).unwrap();
        let reachable = reachable_positions(&grid, unit, None);

        for y in 0..12 {
            for x in 0..12 {
                let coord = HexCoord::new(x, y);
                let dist = center.distance(&coord);
                if dist == 0 {
                    assert!(!reachable.contains_key(&coord));
                } else if dist <= 3 {
                    assert_eq!(reachable.get(&coord), Some(&dist), "{:?}", coord);
                } else {
                    assert!(!reachable.contains_key(&coord), "{:?}", coord);
                }
            }
        }
        // 6 + 12 + 18 cells in the first three rings
        assert_eq!(reachable.len(), 36);
    }

    #[test]
    fn test_forest_costs_two() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(5, 5));
        grid.set_terrain(HexCoord::new(6, 5), BattleTerrain::Forest);
        let unit = grid.unit(&id).unwrap();
        let reachable = reachable_positions(&grid, unit, None);
        assert_eq!(reachable.get(&HexCoord::new(6, 5)), Some(&2));
    }

    #[test]
    fn test_cheaper_detour_beats_direct_water() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(5, 4));
        // Straight through the water costs 4; around it over plains costs 3
        grid.set_terrain(HexCoord::new(6, 4), BattleTerrain::Water);
        let unit = grid.unit(&id).unwrap();
        let reachable = reachable_positions(&grid, unit, Some(3));
        assert_eq!(reachable.get(&HexCoord::new(6, 4)), Some(&3));
        assert_eq!(reachable.get(&HexCoord::new(7, 4)), Some(&3));
    }

    #[test]
    fn test_walls_block_reachability() {
        let center = HexCoord::new(5, 5);
        let (mut grid, id) = grid_with_unit(center);
        for n in center.neighbors() {
            grid.set_terrain(n, BattleTerrain::Wall);
        }
        let unit = grid.unit(&id).unwrap();
        assert!(reachable_positions(&grid, unit, None).is_empty());
    }

    #[test]
    fn test_jump_height_limits_climb() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(5, 5));
        grid.set_elevation(HexCoord::new(6, 5), 2);
        grid.set_elevation(HexCoord::new(4, 5), 1);
        let unit = grid.unit(&id).unwrap();
        let reachable = reachable_positions(&grid, unit, None);
        assert!(!reachable.contains_key(&HexCoord::new(6, 5)));
        assert!(reachable.contains_key(&HexCoord::new(4, 5)));
    }

    #[test]
    fn test_occupied_cells_excluded() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(5, 5));
        grid.add_unit(CombatUnit::new("other", "Other", Side::Enemy), HexCoord::new(6, 5))
            .unwrap();
        let unit = grid.unit(&id).unwrap();
        assert!(!reachable_positions(&grid, unit, None).contains_key(&HexCoord::new(6, 5)));
    }

    #[test]
    fn test_move_unit_sets_flag_and_facing() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(2, 2));
        let path = move_unit(&mut grid, &id, HexCoord::new(4, 2)).unwrap();

        assert_eq!(path.first(), Some(&HexCoord::new(2, 2)));
        assert_eq!(path.last(), Some(&HexCoord::new(4, 2)));
        let unit = grid.unit(&id).unwrap();
        assert!(unit.has_moved);
        assert_eq!(unit.position, Some(HexCoord::new(4, 2)));
        assert_eq!(unit.facing, crate::battle::hex::HexDirection::East);
        assert!(grid.check_consistency().is_ok());
    }

    #[test]
    fn test_move_unit_twice_rejected() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(2, 2));
        move_unit(&mut grid, &id, HexCoord::new(3, 2)).unwrap();
        assert!(matches!(
            move_unit(&mut grid, &id, HexCoord::new(4, 2)),
            Err(TacticsError::CannotMove(_))
        ));
    }

    #[test]
    fn test_move_unit_out_of_reach() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(0, 0));
        assert!(matches!(
            move_unit(&mut grid, &id, HexCoord::new(9, 9)),
            Err(TacticsError::Unreachable(_))
        ));
        assert!(!grid.unit(&id).unwrap().has_moved);
    }

    #[test]
    fn test_can_move_to() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(2, 2));
        let unit = grid.unit(&id).unwrap().clone();
        assert!(can_move_to(&grid, &unit, HexCoord::new(4, 2)));
        assert!(!can_move_to(&grid, &unit, HexCoord::new(2, 2)));
        assert!(!can_move_to(&grid, &unit, HexCoord::new(9, 9)));

        grid.set_terrain(HexCoord::new(3, 2), BattleTerrain::Wall);
        assert!(!can_move_to(&grid, &unit, HexCoord::new(3, 2)));

        let mut moved = unit.clone();
        moved.has_moved = true;
        assert!(!can_move_to(&grid, &moved, HexCoord::new(4, 2)));
    }

    #[test]
    fn test_move_unit_rejects_stunned() {
        let (mut grid, id) = grid_with_unit(HexCoord::new(2, 2));
        grid.unit_mut(&id)
            .unwrap()
            .add_status(crate::battle::units::StatusEffect::Stunned, 1);
        assert!(matches!(
            move_unit(&mut grid, &id, HexCoord::new(3, 2)),
            Err(TacticsError::CannotMove(_))
        ));
    }

    #[test]
    fn test_path_cost_skips_start() {
        let mut grid = BattleGrid::new(6, 6);
        grid.set_terrain(HexCoord::new(1, 0), BattleTerrain::Forest);
        let path = [HexCoord::new(0, 0), HexCoord::new(1, 0), HexCoord::new(2, 0)];
        assert_eq!(path_cost(&grid, &path), Some(3));
        grid.set_terrain(HexCoord::new(2, 0), BattleTerrain::Wall);
        assert_eq!(path_cost(&grid, &path), None);
    }

    #[test]
    fn test_positions_in_range_ring() {
        let grid = BattleGrid::new(12, 12);
        let ring = positions_in_range(&grid, HexCoord::new(5, 5), 2, 2);
        assert_eq!(ring.len(), 12);
        let disc = positions_in_range(&grid, HexCoord::new(5, 5), 0, 1);
        assert_eq!(disc.len(), 7);
    }
}
