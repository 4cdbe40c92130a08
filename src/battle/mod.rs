//! Battle system - turn-based tactics on a hex grid
//!
//! Units take turns fastest first. Each turn a unit may move once and act
//! once. Terrain shapes both: forests, hills and water slow movement and
//! grant defense, elevation limits climbing and adds to damage.
//!
//! Layers, bottom up:
//! - `hex`, `terrain`, `units`, `battle_map`: grid and unit state
//! - `movement`, `pathfinding`: reachability and shortest paths
//! - `resolution`: hit, damage, status and healing math
//! - `execution`: turn order, round lifecycle, victory
//! - `ai`: policies acting for non-player units

pub mod ai;
pub mod battle_map;
pub mod constants;
pub mod execution;
pub mod generation;
pub mod hex;
pub mod movement;
pub mod pathfinding;
pub mod record;
pub mod resolution;
pub mod terrain;
pub mod units;

// Re-exports for convenient access
pub use ai::{AiController, AiPersonality, MovePlanner, PolicyKind, TargetSelector, UnitPolicy};
pub use battle_map::{BattleCell, BattleGrid};
pub use execution::{
    Battle, BattleEvent, BattleEventLog, BattleEventType, BattlePhase, BattleReport, BattleResult,
    TurnOrderEntry, UnitSummary, VictoryConditions,
};
pub use generation::BattleGenerator;
pub use hex::{HexCoord, HexDirection};
pub use movement::{can_move_to, reachable_positions};
pub use pathfinding::find_path;
pub use record::{BattleRecord, CellRecord};
pub use resolution::{AttackKind, AttackResult, CombatResolver, HealResult};
pub use terrain::BattleTerrain;
pub use units::{CombatUnit, StatusEffect, StatusSet};
