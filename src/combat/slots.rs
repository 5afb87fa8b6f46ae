use serde::{Deserialize, Serialize};

/// 执行侧槽位：战斗槽以及敌方的四个等待槽。
///
/// 顺序为 `WaitSlot4 → WaitSlot3 → WaitSlot2 → WaitSlot1 → BattleSlot → (离场)`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotPosition {
    BattleSlot,
    WaitSlot1,
    WaitSlot2,
    WaitSlot3,
    WaitSlot4,
}

impl SlotPosition {
    pub const WAIT_SLOTS: [SlotPosition; 4] = [
        SlotPosition::WaitSlot1,
        SlotPosition::WaitSlot2,
        SlotPosition::WaitSlot3,
        SlotPosition::WaitSlot4,
    ];

    pub fn is_battle_slot(self) -> bool {
        matches!(self, SlotPosition::BattleSlot)
    }

    pub fn is_wait_slot(self) -> bool {
        !self.is_battle_slot()
    }

    /// 朝战斗槽方向的下一个槽位；战斗槽之后没有槽位。
    pub fn next(self) -> Option<SlotPosition> {
        match self {
            SlotPosition::WaitSlot4 => Some(SlotPosition::WaitSlot3),
            SlotPosition::WaitSlot3 => Some(SlotPosition::WaitSlot2),
            SlotPosition::WaitSlot2 => Some(SlotPosition::WaitSlot1),
            SlotPosition::WaitSlot1 => Some(SlotPosition::BattleSlot),
            SlotPosition::BattleSlot => None,
        }
    }

    pub fn previous(self) -> Option<SlotPosition> {
        match self {
            SlotPosition::BattleSlot => Some(SlotPosition::WaitSlot1),
            SlotPosition::WaitSlot1 => Some(SlotPosition::WaitSlot2),
            SlotPosition::WaitSlot2 => Some(SlotPosition::WaitSlot3),
            SlotPosition::WaitSlot3 => Some(SlotPosition::WaitSlot4),
            SlotPosition::WaitSlot4 => None,
        }
    }

    /// 等待槽编号（1–4），战斗槽返回 0。
    pub fn wait_slot_number(self) -> u8 {
        match self {
            SlotPosition::BattleSlot => 0,
            SlotPosition::WaitSlot1 => 1,
            SlotPosition::WaitSlot2 => 2,
            SlotPosition::WaitSlot3 => 3,
            SlotPosition::WaitSlot4 => 4,
        }
    }

    pub fn from_wait_slot_number(number: u8) -> Option<SlotPosition> {
        match number {
            1 => Some(SlotPosition::WaitSlot1),
            2 => Some(SlotPosition::WaitSlot2),
            3 => Some(SlotPosition::WaitSlot3),
            4 => Some(SlotPosition::WaitSlot4),
            _ => None,
        }
    }

    /// 队列最末端的等待槽，新抽到的卡牌放在这里。
    pub fn back_most() -> SlotPosition {
        SlotPosition::WaitSlot4
    }
}

/// 每回合的结算顺序槽，与 `SlotPosition` 相互独立。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecutionOrderSlot {
    First,
    Second,
}

impl ExecutionOrderSlot {
    pub const ALL: [ExecutionOrderSlot; 2] = [ExecutionOrderSlot::First, ExecutionOrderSlot::Second];

    pub fn other(self) -> ExecutionOrderSlot {
        match self {
            ExecutionOrderSlot::First => ExecutionOrderSlot::Second,
            ExecutionOrderSlot::Second => ExecutionOrderSlot::First,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlayerHandSlot {
    Hand1,
    Hand2,
    Hand3,
}

impl PlayerHandSlot {
    pub const ALL: [PlayerHandSlot; 3] = [
        PlayerHandSlot::Hand1,
        PlayerHandSlot::Hand2,
        PlayerHandSlot::Hand3,
    ];

    pub fn index(self) -> usize {
        match self {
            PlayerHandSlot::Hand1 => 0,
            PlayerHandSlot::Hand2 => 1,
            PlayerHandSlot::Hand3 => 2,
        }
    }
}

/// 卡牌未打出时所在的手牌槽位。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "side", content = "slot")]
pub enum HandSlotPosition {
    Player(PlayerHandSlot),
    Enemy(SlotPosition),
}

/// 本回合双方各自分到的结算顺序槽，二者永不相同。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderAssignment {
    player: ExecutionOrderSlot,
    enemy: ExecutionOrderSlot,
}

impl OrderAssignment {
    pub fn new(player: ExecutionOrderSlot) -> Self {
        Self {
            player,
            enemy: player.other(),
        }
    }

    pub fn player_first() -> Self {
        Self::new(ExecutionOrderSlot::First)
    }

    pub fn enemy_first() -> Self {
        Self::new(ExecutionOrderSlot::Second)
    }

    pub fn player(&self) -> ExecutionOrderSlot {
        self.player
    }

    pub fn enemy(&self) -> ExecutionOrderSlot {
        self.enemy
    }
}
