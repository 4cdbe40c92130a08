//! AI personality configuration loaded from TOML
//!
//! A personality picks the policy family and tunes its temperament.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::Result;

/// Which policy family drives the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Hit the weakest target in reach, otherwise close on the nearest enemy
    #[default]
    Basic,
    /// Score positions and targets
    Tactical,
}

/// Behavioral tendencies (0.0 to 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Tendency to close distance (0.0 = keeps away, 1.0 = charges in)
    pub aggression: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self { aggression: 0.7 }
    }
}

/// Complete AI personality configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPersonality {
    /// Name of this personality (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub policy: PolicyKind,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            policy: PolicyKind::Basic,
            behavior: BehaviorConfig::default(),
        }
    }
}

impl AiPersonality {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut personality: AiPersonality = toml::from_str(contents)?;
        personality.behavior.aggression = personality.behavior.aggression.clamp(0.0, 1.0);
        Ok(personality)
    }
}

/// Load personality from TOML file
///
/// Loads from `data/ai_personalities/{name}.toml`
pub fn load_personality(name: &str) -> Result<AiPersonality> {
    load_personality_from(Path::new(PERSONALITY_DIR), name)
}

/// Load `{dir}/{name}.toml`
pub fn load_personality_from(dir: &Path, name: &str) -> Result<AiPersonality> {
    let path = personality_path(dir, name);
    let contents = fs::read_to_string(&path)?;
    let mut personality = AiPersonality::from_toml_str(&contents)?;
    personality.name = name.to_string();
    Ok(personality)
}

const PERSONALITY_DIR: &str = "data/ai_personalities";

fn personality_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.toml", name))
}
