use log::warn;

use super::card::{Card, CardOwner, CardTemplate, InstanceCounter};
use super::events::CombatEvent;
use super::slots::{HandSlotPosition, PlayerHandSlot};

/// 玩家的三格手牌，按模板列表循环补牌。
#[derive(Debug, Default)]
pub struct PlayerHand {
    slots: [Option<Card>; 3],
    templates: Vec<CardTemplate>,
    next_template: usize,
}

impl PlayerHand {
    pub fn new(templates: Vec<CardTemplate>) -> Self {
        Self {
            slots: Default::default(),
            templates,
            next_template: 0,
        }
    }

    pub fn card(&self, slot: PlayerHandSlot) -> Option<&Card> {
        self.slots[slot.index()].as_ref()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.slots.iter().flatten()
    }

    pub fn take(&mut self, slot: PlayerHandSlot) -> Option<Card> {
        self.slots[slot.index()].take()
    }

    /// 把尚未结算的卡牌放回它原来的手牌槽；槽位已被占用时原样退回。
    pub fn restore(&mut self, mut card: Card) -> Result<PlayerHandSlot, Card> {
        let Some(HandSlotPosition::Player(slot)) = card.hand_slot else {
            return Err(card);
        };
        if card.owner() != CardOwner::Player || self.slots[slot.index()].is_some() {
            return Err(card);
        }
        card.execution_slot = None;
        self.slots[slot.index()] = Some(card);
        Ok(slot)
    }

    pub fn refill(&mut self, counter: &mut InstanceCounter, events: &mut Vec<CombatEvent>) {
        if self.templates.is_empty() {
            warn!("player hand has no templates to draw from");
            return;
        }
        for slot in PlayerHandSlot::ALL {
            if self.slots[slot.index()].is_some() {
                continue;
            }
            let template = &self.templates[self.next_template % self.templates.len()];
            self.next_template += 1;
            let card = counter
                .spawn(template, CardOwner::Player)
                .with_hand_slot(HandSlotPosition::Player(slot));
            events.push(CombatEvent::PlayerCardDrawn {
                hand_slot: slot,
                card_id: card.instance_id,
            });
            self.slots[slot.index()] = Some(card);
        }
    }
}
