//! Hex coordinate system for battle grids (offset coordinates)
//!
//! Cells are addressed by (column, row). Odd rows sit half a hex to the
//! right, so even and odd rows use different neighbor offset tables.

use serde::{Deserialize, Serialize};

/// Neighbor offsets for even rows, in `HexDirection::all()` order
const EVEN_ROW_OFFSETS: [(i32, i32); 6] = [(-1, -1), (0, -1), (1, 0), (0, 1), (-1, 1), (-1, 0)];

/// Neighbor offsets for odd rows, in `HexDirection::all()` order
const ODD_ROW_OFFSETS: [(i32, i32); 6] = [(0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 0)];

/// Offset hex coordinate for the battle grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    pub x: i32,
    pub y: i32,
}

impl HexCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn is_odd_row(&self) -> bool {
        self.y.rem_euclid(2) == 1
    }

    /// Axial (q, r) form of this coordinate
    pub fn to_axial(&self) -> (i32, i32) {
        let q = self.x - (self.y - self.y.rem_euclid(2)).div_euclid(2);
        (q, self.y)
    }

    /// Hex distance, accounting for the row-parity offset
    pub fn distance(&self, other: &Self) -> u32 {
        let (q1, r1) = self.to_axial();
        let (q2, r2) = other.to_axial();
        let dq = (q1 - q2).abs();
        let dr = (r1 - r2).abs();
        let ds = ((q1 + r1) - (q2 + r2)).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// All 6 adjacent coordinates, ignoring grid bounds
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let offsets = if self.is_odd_row() {
            &ODD_ROW_OFFSETS
        } else {
            &EVEN_ROW_OFFSETS
        };
        let mut result = [*self; 6];
        for (slot, (dx, dy)) in result.iter_mut().zip(offsets.iter()) {
            *slot = HexCoord::new(self.x + dx, self.y + dy);
        }
        result
    }

    /// Neighbor in a given direction
    pub fn step(&self, direction: HexDirection) -> HexCoord {
        self.neighbors()[direction.index()]
    }

    /// Direction of an adjacent coordinate, if it is one
    pub fn direction_to(&self, other: &HexCoord) -> Option<HexDirection> {
        self.neighbors()
            .iter()
            .position(|n| n == other)
            .map(|i| HexDirection::all()[i])
    }

    /// Best facing toward any coordinate (exact for neighbors)
    pub fn facing_toward(&self, other: &HexCoord) -> Option<HexDirection> {
        if self == other {
            return None;
        }
        HexDirection::all()
            .into_iter()
            .min_by_key(|dir| self.step(*dir).distance(other))
    }
}

/// Direction enum for hex facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    NorthWest,
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
}

impl HexDirection {
    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            HexDirection::NorthWest => HexDirection::SouthEast,
            HexDirection::NorthEast => HexDirection::SouthWest,
            HexDirection::East => HexDirection::West,
            HexDirection::SouthEast => HexDirection::NorthWest,
            HexDirection::SouthWest => HexDirection::NorthEast,
            HexDirection::West => HexDirection::East,
        }
    }

    /// Position in the neighbor tables (0-5)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// All directions
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::NorthWest,
            HexDirection::NorthEast,
            HexDirection::East,
            HexDirection::SouthEast,
            HexDirection::SouthWest,
            HexDirection::West,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_coord_creation() {
        let coord = HexCoord::new(5, 10);
        assert_eq!(coord.x, 5);
        assert_eq!(coord.y, 10);
    }

    #[test]
    fn test_hex_distance_same() {
        let a = HexCoord::new(3, 4);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_every_neighbor_is_distance_one() {
        for coord in [HexCoord::new(4, 4), HexCoord::new(4, 5)] {
            for n in coord.neighbors() {
                assert_eq!(coord.distance(&n), 1, "{:?} -> {:?}", coord, n);
            }
        }
    }

    #[test]
    fn test_parity_tables_differ() {
        let even = HexCoord::new(3, 2).neighbors();
        let odd = HexCoord::new(3, 3).neighbors();
        assert!(even.contains(&HexCoord::new(2, 1)));
        assert!(!even.contains(&HexCoord::new(4, 1)));
        assert!(odd.contains(&HexCoord::new(4, 2)));
        assert!(!odd.contains(&HexCoord::new(2, 2)));
    }

    #[test]
    fn test_neighbor_relation_symmetric() {
        let a = HexCoord::new(5, 6);
        for n in a.neighbors() {
            assert!(n.neighbors().contains(&a));
        }
    }

    #[test]
    fn test_distance_straight_row() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(5, 0);
        assert_eq!(a.distance(&b), 5);
    }

    #[test]
    fn test_distance_down_column_zigzag() {
        // Moving straight down rows alternates between the two diagonal offsets
        let a = HexCoord::new(3, 0);
        let b = HexCoord::new(3, 4);
        assert_eq!(a.distance(&b), 4);
    }

    #[test]
    fn test_direction_to_neighbor() {
        let a = HexCoord::new(2, 2);
        assert_eq!(a.direction_to(&HexCoord::new(3, 2)), Some(HexDirection::East));
        assert_eq!(a.direction_to(&HexCoord::new(1, 1)), Some(HexDirection::NorthWest));
        assert_eq!(a.direction_to(&HexCoord::new(5, 5)), None);
    }

    #[test]
    fn test_step_round_trips_opposite() {
        let a = HexCoord::new(4, 7);
        for dir in HexDirection::all() {
            assert_eq!(a.step(dir).step(dir.opposite()), a);
        }
    }

    #[test]
    fn test_facing_toward() {
        let a = HexCoord::new(2, 2);
        assert_eq!(a.facing_toward(&HexCoord::new(6, 2)), Some(HexDirection::East));
        assert_eq!(a.facing_toward(&a), None);
    }
}
