//! Persisted engine state. Only the corruption level survives a save; live
//! instances and cooldowns are transient by nature.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub corruption_level: f32,
}
