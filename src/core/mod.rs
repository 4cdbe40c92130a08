pub mod config;
pub mod error;
pub mod types;

pub use config::{BattleOptions, CombatConfig};
pub use error::{Result, TacticsError};
pub use types::{BattleId, Element, Side, UnitId};
