//! A* pathfinding for battle grids
//!
//! Respects terrain costs, occupancy and the mover's jump height.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::battle::battle_map::BattleGrid;
use crate::battle::hex::HexCoord;
use crate::battle::movement::{is_position_accessible, step_cost};
use crate::battle::units::CombatUnit;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    coord: HexCoord,
    f_cost: u32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord && self.f_cost == other.f_cost
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; coordinate breaks ties deterministically
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path using A*
///
/// Returns `None` if no path exists or the goal cannot be entered by `unit`.
/// The path includes both `start` and `goal`.
pub fn find_path(
    grid: &BattleGrid,
    start: HexCoord,
    goal: HexCoord,
    unit: &CombatUnit,
) -> Option<Vec<HexCoord>> {
    if !is_position_accessible(grid, goal, unit) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut g_scores: HashMap<HexCoord, u32> = HashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        f_cost: start.distance(&goal),
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return Some(reconstruct_path(&came_from, current.coord));
        }

        let current_g = *g_scores.get(&current.coord).unwrap_or(&u32::MAX);
        if current.f_cost > current_g.saturating_add(current.coord.distance(&goal)) {
            continue; // superseded by a cheaper route
        }

        for neighbor in grid.neighbors(current.coord) {
            let Some(move_cost) = step_cost(grid, current.coord, neighbor, unit) else {
                continue;
            };

            let tentative_g = current_g + move_cost;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);

                let f_cost = tentative_g + neighbor.distance(&goal);
                open_set.push(PathNode {
                    coord: neighbor,
                    f_cost,
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<HexCoord, HexCoord>, mut current: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
