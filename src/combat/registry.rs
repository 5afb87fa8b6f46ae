use std::collections::BTreeMap;

use log::{debug, warn};

use super::card::{Card, CardOwner};
use super::events::CombatEvent;
use super::slots::ExecutionOrderSlot;

/// 当前回合的出牌登记表：结算顺序槽 → 卡牌。
///
/// 登记表本身不知道回合阶段，也不校验覆盖时的所有者；
/// 这些检查由调用方在登记之前完成。
#[derive(Debug, Default)]
pub struct TurnCardRegistry {
    entries: BTreeMap<ExecutionOrderSlot, Card>,
    reserved_enemy_slot: Option<ExecutionOrderSlot>,
    notifications: Vec<CombatEvent>,
}

impl TurnCardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记卡牌并覆盖该槽位原有的卡牌。传入 `None` 时只记录警告。
    pub fn register_card(&mut self, slot: ExecutionOrderSlot, card: Option<Card>) -> bool {
        let Some(mut card) = card else {
            warn!("refusing to register a missing card into {slot:?}");
            return false;
        };

        card.execution_slot = Some(slot);
        let card_id = card.instance_id;
        let owner = card.owner();
        if owner == CardOwner::Enemy {
            self.reserved_enemy_slot = Some(slot);
        }

        let replaced = self.entries.insert(slot, card).map(|old| old.instance_id);
        if let Some(old_id) = replaced {
            debug!("card {card_id} replaced card {old_id} in {slot:?}");
        }
        self.notifications.push(CombatEvent::CardRegistered {
            slot,
            card_id,
            owner,
            replaced,
        });
        true
    }

    pub fn get_card(&self, slot: ExecutionOrderSlot) -> Option<&Card> {
        self.entries.get(&slot)
    }

    /// 取出槽位中的卡牌；只有真正移除了卡牌时才发出通知。
    pub fn take_card(&mut self, slot: ExecutionOrderSlot) -> Option<Card> {
        let mut card = self.entries.remove(&slot)?;
        card.execution_slot = None;
        self.notifications.push(CombatEvent::SlotCleared {
            slot,
            card_id: card.instance_id,
        });
        Some(card)
    }

    pub fn clear_slot(&mut self, slot: ExecutionOrderSlot) {
        let _ = self.take_card(slot);
    }

    pub fn has_player_card(&self) -> bool {
        self.has_card_owned_by(CardOwner::Player)
    }

    pub fn has_enemy_card(&self) -> bool {
        self.has_card_owned_by(CardOwner::Enemy)
    }

    fn has_card_owned_by(&self, owner: CardOwner) -> bool {
        self.entries.values().any(|card| card.owner() == owner)
    }

    /// 移除所有敌方卡牌，保留玩家已提交的卡牌。
    pub fn clear_enemy_cards_only(&mut self) {
        let enemy_slots: Vec<ExecutionOrderSlot> = self
            .entries
            .iter()
            .filter(|(_, card)| card.owner() == CardOwner::Enemy)
            .map(|(slot, _)| *slot)
            .collect();
        for slot in enemy_slots {
            self.clear_slot(slot);
        }
    }

    pub fn reserved_enemy_slot(&self) -> Option<ExecutionOrderSlot> {
        self.reserved_enemy_slot
    }

    /// 预告敌方本回合的结算槽；槽位变化时发出通知。
    pub fn reserve_enemy_slot(&mut self, slot: ExecutionOrderSlot) {
        if self.reserved_enemy_slot == Some(slot) {
            return;
        }
        self.reserved_enemy_slot = Some(slot);
        self.notifications
            .push(CombatEvent::EnemySlotReserved { slot });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        let had_state = !self.entries.is_empty() || self.reserved_enemy_slot.is_some();
        self.entries.clear();
        self.reserved_enemy_slot = None;
        if had_state {
            self.notifications.push(CombatEvent::RegistryReset);
        }
    }

    pub fn drain_notifications(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::card::EffectSpec;

    fn card(id: u64, owner: CardOwner) -> Card {
        Card::new(id, 1, "Test Card", owner, vec![EffectSpec::damage(1)])
    }

    #[test]
    fn missing_card_is_a_silent_no_op() {
        let mut registry = TurnCardRegistry::new();
        assert!(!registry.register_card(ExecutionOrderSlot::First, None));
        assert!(registry.is_empty());
        assert!(registry.drain_notifications().is_empty());
    }

    #[test]
    fn latest_registration_wins_and_other_slot_is_untouched() {
        let mut registry = TurnCardRegistry::new();
        registry.register_card(ExecutionOrderSlot::Second, Some(card(9, CardOwner::Enemy)));
        for id in 1..=3 {
            registry.register_card(ExecutionOrderSlot::First, Some(card(id, CardOwner::Player)));
        }
        let first = registry
            .get_card(ExecutionOrderSlot::First)
            .expect("first slot should be occupied");
        assert_eq!(first.instance_id, 3);
        assert_eq!(first.execution_slot, Some(ExecutionOrderSlot::First));
        assert_eq!(
            registry
                .get_card(ExecutionOrderSlot::Second)
                .map(|card| card.instance_id),
            Some(9)
        );
    }

    #[test]
    fn enemy_registration_reserves_its_slot() {
        let mut registry = TurnCardRegistry::new();
        registry.register_card(ExecutionOrderSlot::Second, Some(card(4, CardOwner::Enemy)));
        assert_eq!(
            registry.reserved_enemy_slot(),
            Some(ExecutionOrderSlot::Second)
        );
        assert!(registry.has_enemy_card());
        assert!(!registry.has_player_card());
    }

    #[test]
    fn reservation_is_announced_once_and_survives_enemy_withdrawal() {
        let mut registry = TurnCardRegistry::new();
        registry.reserve_enemy_slot(ExecutionOrderSlot::First);
        registry.reserve_enemy_slot(ExecutionOrderSlot::First);
        assert_eq!(
            registry.drain_notifications(),
            vec![CombatEvent::EnemySlotReserved {
                slot: ExecutionOrderSlot::First
            }]
        );

        registry.register_card(ExecutionOrderSlot::First, Some(card(5, CardOwner::Enemy)));
        registry.clear_enemy_cards_only();
        assert_eq!(registry.reserved_enemy_slot(), Some(ExecutionOrderSlot::First));
    }

    #[test]
    fn clearing_an_empty_slot_does_not_notify() {
        let mut registry = TurnCardRegistry::new();
        registry.clear_slot(ExecutionOrderSlot::First);
        assert!(registry.drain_notifications().is_empty());

        registry.register_card(ExecutionOrderSlot::First, Some(card(1, CardOwner::Player)));
        registry.clear_slot(ExecutionOrderSlot::First);
        registry.clear_slot(ExecutionOrderSlot::First);
        let events = registry.drain_notifications();
        assert_eq!(events.len(), 2, "one registration and one removal expected");
        assert!(matches!(
            events[1],
            CombatEvent::SlotCleared { card_id: 1, .. }
        ));
    }

    #[test]
    fn clearing_enemy_cards_keeps_the_player_move() {
        let mut registry = TurnCardRegistry::new();
        registry.register_card(ExecutionOrderSlot::First, Some(card(1, CardOwner::Player)));
        registry.register_card(ExecutionOrderSlot::Second, Some(card(2, CardOwner::Enemy)));
        registry.clear_enemy_cards_only();
        assert!(registry.has_player_card());
        assert!(!registry.has_enemy_card());
    }

    #[test]
    fn reset_twice_leaves_the_same_empty_state() {
        let mut registry = TurnCardRegistry::new();
        registry.register_card(ExecutionOrderSlot::First, Some(card(1, CardOwner::Player)));
        registry.register_card(ExecutionOrderSlot::Second, Some(card(2, CardOwner::Enemy)));
        registry.reset();
        registry.reset();
        assert!(registry.is_empty());
        assert!(!registry.has_player_card());
        assert!(!registry.has_enemy_card());
        assert_eq!(registry.reserved_enemy_slot(), None);
    }
}
