use thiserror::Error;

use crate::battle::hex::HexCoord;
use crate::core::types::UnitId;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Position out of bounds: {0:?}")]
    OutOfBounds(HexCoord),

    #[error("Cell already occupied: {0:?}")]
    CellOccupied(HexCoord),

    #[error("Terrain is impassable at {0:?}")]
    Impassable(HexCoord),

    #[error("Unit not found: {0}")]
    UnknownUnit(UnitId),

    #[error("Unit already on the battlefield: {0}")]
    DuplicateUnit(UnitId),

    #[error("Unit has no position on the grid: {0}")]
    NotPlaced(UnitId),

    #[error("Unit cannot move this turn: {0}")]
    CannotMove(UnitId),

    #[error("Unit cannot act this turn: {0}")]
    CannotAct(UnitId),

    #[error("Destination not within movement range: {0:?}")]
    Unreachable(HexCoord),

    #[error("No path from {from:?} to {to:?}")]
    NoPath { from: HexCoord, to: HexCoord },

    #[error("Target {defender} is out of range of {attacker}")]
    OutOfRange { attacker: UnitId, defender: UnitId },

    #[error("Invalid target: {0}")]
    InvalidTarget(UnitId),

    #[error("Battle is already over")]
    BattleOver,

    #[error("Internal consistency violated: {0}")]
    Inconsistent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl From<toml::de::Error> for TacticsError {
    fn from(err: toml::de::Error) -> Self {
        TacticsError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TacticsError>;
