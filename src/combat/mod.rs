//! 战斗核心：槽位、出牌登记、效果管线、回合状态机与敌方出牌队列。

pub mod card;
pub mod combatant;
pub mod context;
pub mod effects;
pub mod enemy;
pub mod error;
pub mod events;
pub mod hand;
pub mod order;
pub mod registry;
pub mod slots;
pub mod turn;

pub use card::{
    Card,
    CardInstanceId,
    CardOwner,
    CardTemplate,
    EffectKind,
    EffectSpec,
    InstanceCounter,
    TemplateId,
};
pub use combatant::{Character, Combatant, Combatants};
pub use context::CardExecutionContext;
pub use effects::{
    command_for,
    DamageCommand,
    EffectCommand,
    EffectPipeline,
    GuardCommand,
    HealCommand,
    PipelineReport,
};
pub use enemy::{DeckProvider, EnemyHandCycle, RandomDeck};
pub use error::{ConfigError, EffectError, TurnError};
pub use events::{CombatEvent, EncounterOutcome, SkipReason};
pub use hand::PlayerHand;
pub use order::{CoinFlipSelector, FixedOrder, SlotOrderSelector};
pub use registry::TurnCardRegistry;
pub use slots::{
    ExecutionOrderSlot,
    HandSlotPosition,
    OrderAssignment,
    PlayerHandSlot,
    SlotPosition,
};
pub use turn::{play_turn, EncounterObserver, TurnManager, TurnPhase, TurnStep};
