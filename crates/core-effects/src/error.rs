//! Submission outcomes and registry errors.
//!
//! None of these are fatal. A rejected request never reaches the Active set
//! and never disturbs other instances; callers decide whether to surface it.

use crate::instance::{InstanceId, Target};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("unknown effect kind `{0}`")]
    UnknownKind(String),
}

/// Why a submission did not become an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Target references lines not in the buffer, is empty, or does not fit the
    /// kind's applicability.
    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: Target, reason: &'static str },
    #[error("unknown effect kind `{0}`")]
    UnknownKind(String),
    /// Same kind on the same target fired too recently; retry at `ready_at`.
    #[error("cooldown active until tick {ready_at}")]
    CooldownActive { ready_at: u64 },
    /// An equal or higher priority instance already holds the target/group.
    #[error("conflict lost to {holder}")]
    ConflictLost { holder: InstanceId },
    #[error("intensity is not a finite number")]
    InvalidIntensity,
}

impl Rejection {
    /// Short stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::InvalidTarget { .. } => "invalid_target",
            Rejection::UnknownKind(_) => "unknown_kind",
            Rejection::CooldownActive { .. } => "cooldown_active",
            Rejection::ConflictLost { .. } => "conflict_lost",
            Rejection::InvalidIntensity => "invalid_intensity",
        }
    }
}

impl From<EffectError> for Rejection {
    fn from(e: EffectError) -> Self {
        match e {
            EffectError::UnknownKind(name) => Rejection::UnknownKind(name),
        }
    }
}
