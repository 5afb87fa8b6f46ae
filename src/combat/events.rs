use serde::{Deserialize, Serialize};

use super::card::{CardInstanceId, CardOwner, EffectKind};
use super::error::EffectError;
use super::slots::{ExecutionOrderSlot, OrderAssignment, PlayerHandSlot, SlotPosition};
use super::turn::TurnPhase;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkipReason {
    EmptySlot,
    MissingCombatant,
    SourceDefeated,
    TargetDefeated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EncounterOutcome {
    Victory,
    Defeat,
}

/// 战斗事件流，按发生顺序记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CombatEvent {
    CardRegistered {
        slot: ExecutionOrderSlot,
        card_id: CardInstanceId,
        owner: CardOwner,
        #[serde(skip_serializing_if = "Option::is_none")]
        replaced: Option<CardInstanceId>,
    },
    SlotCleared {
        slot: ExecutionOrderSlot,
        card_id: CardInstanceId,
    },
    EnemySlotReserved {
        slot: ExecutionOrderSlot,
    },
    RegistryReset,
    PhaseChanged {
        from: TurnPhase,
        to: TurnPhase,
    },
    OrderAssigned {
        assignment: OrderAssignment,
    },
    CardExecuted {
        slot: ExecutionOrderSlot,
        card_id: CardInstanceId,
        owner: CardOwner,
    },
    ExecutionSkipped {
        slot: ExecutionOrderSlot,
        reason: SkipReason,
    },
    DamageResolved {
        source: CardOwner,
        target: CardOwner,
        amount: i32,
        blocked: bool,
    },
    Healed {
        side: CardOwner,
        amount: i32,
    },
    GuardRaised {
        side: CardOwner,
    },
    EffectFailed {
        card_id: CardInstanceId,
        kind: EffectKind,
        error: EffectError,
    },
    GuardsCleared,
    CardRestored {
        slot: ExecutionOrderSlot,
        hand_slot: PlayerHandSlot,
        card_id: CardInstanceId,
    },
    PlayerCardDrawn {
        hand_slot: PlayerHandSlot,
        card_id: CardInstanceId,
    },
    EnemyQueueAdvanced {
        #[serde(skip_serializing_if = "Option::is_none")]
        battle_card: Option<CardInstanceId>,
    },
    EnemyCardDrawn {
        slot: SlotPosition,
        card_id: CardInstanceId,
    },
    EnemyDrawFailed {
        slot: SlotPosition,
    },
    EncounterEnded {
        outcome: EncounterOutcome,
    },
}
