//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a battle encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier for a combat unit.
///
/// Ids come from the strategic layer (roster ids) or from the battle
/// generator (`enemy_0`, `enemy_1`, ...), so they are plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UnitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which side a unit fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    Player,
    Enemy,
    Ally,
    Neutral,
}

impl Side {
    /// Player and Ally fight together against Enemy. Neutral units are
    /// nobody's target.
    pub fn is_hostile_to(&self, other: Side) -> bool {
        matches!(
            (self, other),
            (Side::Player, Side::Enemy)
                | (Side::Ally, Side::Enemy)
                | (Side::Enemy, Side::Player)
                | (Side::Enemy, Side::Ally)
        )
    }
}

/// The six elemental forces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Water,
    Earth,
    Air,
    Life,
    Death,
}

pub const ELEMENT_COUNT: usize = 6;

/// `ELEMENT_BEATS[attacker][defender]` is true when the attacker's element is
/// super-effective against the defender's.
const ELEMENT_BEATS: [[bool; ELEMENT_COUNT]; ELEMENT_COUNT] = [
    // Fire:  earth, death
    [false, false, true, false, false, true],
    // Water: fire
    [true, false, false, false, false, false],
    // Earth: air
    [false, false, false, true, false, false],
    // Air:   water
    [false, true, false, false, false, false],
    // Life:  death
    [false, false, false, false, false, true],
    // Death: life
    [false, false, false, false, true, false],
];

impl Element {
    pub fn all() -> [Element; ELEMENT_COUNT] {
        [
            Element::Fire,
            Element::Water,
            Element::Earth,
            Element::Air,
            Element::Life,
            Element::Death,
        ]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Is this element super-effective against `other`?
    pub fn beats(&self, other: Element) -> bool {
        ELEMENT_BEATS[self.index()][other.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_display() {
        let id = UnitId::new("enemy_0");
        assert_eq!(id.to_string(), "enemy_0");
        assert_eq!(UnitId::from("enemy_0"), id);
    }

    #[test]
    fn test_side_hostility() {
        assert!(Side::Player.is_hostile_to(Side::Enemy));
        assert!(Side::Enemy.is_hostile_to(Side::Ally));
        assert!(!Side::Player.is_hostile_to(Side::Ally));
        assert!(!Side::Player.is_hostile_to(Side::Player));
        assert!(!Side::Neutral.is_hostile_to(Side::Enemy));
        assert!(!Side::Enemy.is_hostile_to(Side::Neutral));
    }

    #[test]
    fn test_element_table() {
        assert!(Element::Fire.beats(Element::Earth));
        assert!(Element::Fire.beats(Element::Death));
        assert!(Element::Water.beats(Element::Fire));
        assert!(Element::Earth.beats(Element::Air));
        assert!(Element::Air.beats(Element::Water));
        assert!(Element::Life.beats(Element::Death));
        assert!(Element::Death.beats(Element::Life));
        assert!(!Element::Earth.beats(Element::Fire));
    }

    #[test]
    fn test_no_element_beats_itself() {
        for element in Element::all() {
            assert!(!element.beats(element));
        }
    }

    #[test]
    fn test_element_index_matches_all() {
        for (i, element) in Element::all().iter().enumerate() {
            assert_eq!(element.index(), i);
        }
    }
}
