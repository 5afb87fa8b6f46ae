use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::card::EffectKind;
use super::slots::{ExecutionOrderSlot, PlayerHandSlot};
use super::turn::TurnPhase;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum TurnError {
    #[error("cards can only be registered while waiting for cards (current phase: {phase:?})")]
    RegistrationClosed { phase: TurnPhase },
    #[error("the encounter has already finished")]
    EncounterFinished,
    #[error("hand slot {slot:?} is empty")]
    HandSlotEmpty { slot: PlayerHandSlot },
    #[error("execution slot {slot:?} does not hold a player card")]
    CardNotOwnedByPlayer { slot: ExecutionOrderSlot },
    #[error("card in {slot:?} cannot return to its hand slot")]
    CannotRestore { slot: ExecutionOrderSlot },
    #[error("the enemy has no card in its battle slot")]
    NoEnemyCard,
}

/// 单个效果命令无法生效的原因；由效果管线记录后忽略。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum EffectError {
    #[error("{kind:?} effect has invalid magnitude {magnitude}")]
    InvalidMagnitude { kind: EffectKind, magnitude: i32 },
    #[error("source is already at full health")]
    NothingToHeal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("failed to parse encounter config: {message}")]
    Parse { message: String },
    #[error("enemy card pool is empty")]
    EmptyEnemyPool,
    #[error("player hand has no card templates")]
    EmptyPlayerHand,
    #[error("character {name} must have positive max hp")]
    InvalidCharacter { name: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: error.to_string(),
        }
    }
}
