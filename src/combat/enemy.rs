use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::card::{Card, CardOwner, CardTemplate, InstanceCounter};
use super::events::CombatEvent;
use super::slots::{HandSlotPosition, SlotPosition};

/// 敌方抽牌来源，抽不到时返回 `None`。
pub trait DeckProvider {
    fn draw(&mut self) -> Option<CardTemplate>;
}

impl<F> DeckProvider for F
where
    F: FnMut() -> Option<CardTemplate>,
{
    fn draw(&mut self) -> Option<CardTemplate> {
        self()
    }
}

/// 从卡池中等概率随机抽取，卡池不会被消耗。
pub struct RandomDeck {
    pool: Vec<CardTemplate>,
    rng: SmallRng,
}

impl RandomDeck {
    pub fn new(pool: Vec<CardTemplate>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { pool, rng }
    }

    pub fn pool(&self) -> &[CardTemplate] {
        &self.pool
    }
}

impl DeckProvider for RandomDeck {
    fn draw(&mut self) -> Option<CardTemplate> {
        self.pool.choose(&mut self.rng).cloned()
    }
}

/// 敌方出牌队列：四个等待槽依次向战斗槽推进。
#[derive(Debug, Default)]
pub struct EnemyHandCycle {
    battle: Option<Card>,
    waiting: [Option<Card>; 4],
}

impl EnemyHandCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card_at(&self, slot: SlotPosition) -> Option<&Card> {
        match slot {
            SlotPosition::BattleSlot => self.battle.as_ref(),
            wait => self.waiting[Self::wait_index(wait)].as_ref(),
        }
    }

    /// 等待队列，从 `WaitSlot1` 到 `WaitSlot4`。
    pub fn wait_queue(&self) -> Vec<Option<&Card>> {
        self.waiting.iter().map(Option::as_ref).collect()
    }

    pub fn battle_card(&self) -> Option<&Card> {
        self.battle.as_ref()
    }

    pub fn take_battle_card(&mut self) -> Option<Card> {
        self.battle.take()
    }

    /// 撤回的牌回到战斗槽；槽位已有牌时丢弃撤回的牌。
    pub fn return_battle_card(&mut self, card: Card) {
        if self.battle.is_some() {
            warn!("battle slot occupied; dropping withdrawn card {}", card.instance_id);
            return;
        }
        self.battle = Some(card);
    }

    /// 补满所有空槽，用于遭遇战开始时。
    pub fn fill(
        &mut self,
        provider: &mut dyn DeckProvider,
        counter: &mut InstanceCounter,
        events: &mut Vec<CombatEvent>,
    ) {
        if self.battle.is_none() {
            self.battle = Self::draw_into(SlotPosition::BattleSlot, provider, counter, events);
        }
        self.refill_waiting(provider, counter, events);
    }

    /// 回合结束时推进队列：战斗槽中的牌离场，最靠前的等待牌进入战斗槽，
    /// 其余等待牌依次前移，空出的等待槽重新抽牌。
    pub fn advance(
        &mut self,
        provider: &mut dyn DeckProvider,
        counter: &mut InstanceCounter,
        events: &mut Vec<CombatEvent>,
    ) {
        if let Some(stale) = self.battle.take() {
            debug!("enemy card {} left the battle slot unplayed", stale.instance_id);
        }
        self.promote();
        events.push(CombatEvent::EnemyQueueAdvanced {
            battle_card: self.battle.as_ref().map(|card| card.instance_id),
        });
        self.refill_waiting(provider, counter, events);
    }

    /// 战斗槽为空时设法补上一张牌：先前移等待队列，仍为空则直接抽牌。
    /// 返回战斗槽中是否有牌。
    pub fn replenish(
        &mut self,
        provider: &mut dyn DeckProvider,
        counter: &mut InstanceCounter,
        events: &mut Vec<CombatEvent>,
    ) -> bool {
        if self.battle.is_some() {
            return true;
        }
        self.promote();
        if self.battle.is_none() {
            self.battle = Self::draw_into(SlotPosition::BattleSlot, provider, counter, events);
        }
        self.refill_waiting(provider, counter, events);
        self.battle.is_some()
    }

    /// 战斗槽为空时调用：等待牌按原顺序向前压紧，第一张进入战斗槽。
    fn promote(&mut self) {
        let mut queued = self
            .waiting
            .iter_mut()
            .filter_map(Option::take)
            .collect::<Vec<_>>()
            .into_iter();
        self.battle = queued.next().map(|card| {
            card.with_hand_slot(HandSlotPosition::Enemy(SlotPosition::BattleSlot))
        });
        for (index, slot) in SlotPosition::WAIT_SLOTS.iter().enumerate() {
            self.waiting[index] = queued
                .next()
                .map(|card| card.with_hand_slot(HandSlotPosition::Enemy(*slot)));
        }
    }

    fn refill_waiting(
        &mut self,
        provider: &mut dyn DeckProvider,
        counter: &mut InstanceCounter,
        events: &mut Vec<CombatEvent>,
    ) {
        for slot in SlotPosition::WAIT_SLOTS {
            let index = Self::wait_index(slot);
            if self.waiting[index].is_none() {
                self.waiting[index] = Self::draw_into(slot, provider, counter, events);
            }
        }
    }

    fn draw_into(
        slot: SlotPosition,
        provider: &mut dyn DeckProvider,
        counter: &mut InstanceCounter,
        events: &mut Vec<CombatEvent>,
    ) -> Option<Card> {
        match provider.draw() {
            Some(template) => {
                let card = counter
                    .spawn(&template, CardOwner::Enemy)
                    .with_hand_slot(HandSlotPosition::Enemy(slot));
                events.push(CombatEvent::EnemyCardDrawn {
                    slot,
                    card_id: card.instance_id,
                });
                Some(card)
            }
            None => {
                warn!("enemy draw for {slot:?} yielded no card; slot stays empty");
                events.push(CombatEvent::EnemyDrawFailed { slot });
                None
            }
        }
    }

    fn wait_index(slot: SlotPosition) -> usize {
        usize::from(slot.wait_slot_number().saturating_sub(1))
    }
}
