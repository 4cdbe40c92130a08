//! Battle terrain types and their effects

use serde::{Deserialize, Serialize};

/// Terrain type for a battle grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BattleTerrain {
    #[default]
    Plains,
    Forest,
    Hill,
    Water,
    Wall,
    Obstacle,
}

impl BattleTerrain {
    /// Movement points consumed entering this terrain, `None` if impassable
    pub fn movement_cost(&self) -> Option<u32> {
        match self {
            BattleTerrain::Plains => Some(1),
            BattleTerrain::Forest => Some(2),
            BattleTerrain::Hill => Some(2),
            BattleTerrain::Water => Some(3),
            BattleTerrain::Wall | BattleTerrain::Obstacle => None,
        }
    }

    /// Can units enter this terrain at all?
    pub fn is_passable(&self) -> bool {
        self.movement_cost().is_some()
    }

    /// Defensive bonus (percent damage reduction, also feeds evasion)
    pub fn defense_bonus(&self) -> i32 {
        match self {
            BattleTerrain::Plains => 0,
            BattleTerrain::Forest => 15,
            BattleTerrain::Hill => 20,
            BattleTerrain::Water => 5,
            BattleTerrain::Wall => 50,
            BattleTerrain::Obstacle => 10,
        }
    }
}
