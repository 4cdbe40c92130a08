//! Aethermoor Tactics - hex-grid tactical battle core

pub mod battle;
pub mod core;
