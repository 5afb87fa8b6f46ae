use std::cell::RefCell;
use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::card::{Card, CardOwner, CardTemplate, InstanceCounter};
use super::combatant::Combatants;
use super::context::CardExecutionContext;
use super::effects::EffectPipeline;
use super::enemy::{DeckProvider, EnemyHandCycle};
use super::error::TurnError;
use super::events::{CombatEvent, EncounterOutcome, SkipReason};
use super::hand::PlayerHand;
use super::order::{CoinFlipSelector, SlotOrderSelector};
use super::registry::TurnCardRegistry;
use super::slots::{ExecutionOrderSlot, OrderAssignment, PlayerHandSlot};
use crate::config::TurnConfig;
use crate::presentation::{NullPresenter, Presenter};

/// 回合阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", content = "outcome")]
pub enum TurnPhase {
    WaitingForCards,
    Ready,
    ExecutingFirst,
    ExecutingSecond,
    Resolving,
    Finished(EncounterOutcome),
}

impl Default for TurnPhase {
    fn default() -> Self {
        TurnPhase::WaitingForCards
    }
}

/// 遭遇战结束时的通知对象。
pub trait EncounterObserver {
    fn on_victory(&mut self) {}
    fn on_defeat(&mut self) {}
}

impl EncounterObserver for () {}

/// 一次 `advance` 的结果；`suspend` 不为空时调用方需等待后再推进。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnStep {
    pub phase: TurnPhase,
    pub suspend: Option<Duration>,
}

impl TurnStep {
    fn settled(phase: TurnPhase) -> Self {
        Self {
            phase,
            suspend: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self.phase,
            TurnPhase::WaitingForCards | TurnPhase::Finished(_)
        )
    }
}

pub struct TurnManager {
    config: TurnConfig,
    phase: TurnPhase,
    turn: u32,
    registry: TurnCardRegistry,
    combatants: Combatants,
    player_hand: PlayerHand,
    enemy_cycle: EnemyHandCycle,
    enemy_deck: Box<dyn DeckProvider>,
    selector: Box<dyn SlotOrderSelector>,
    presenter: Box<dyn Presenter>,
    observer: Box<dyn EncounterObserver>,
    counter: InstanceCounter,
    assignment: Option<OrderAssignment>,
    events: Vec<CombatEvent>,
}

impl TurnManager {
    pub fn new(config: TurnConfig, combatants: Combatants, enemy_deck: Box<dyn DeckProvider>) -> Self {
        Self {
            config,
            phase: TurnPhase::WaitingForCards,
            turn: 0,
            registry: TurnCardRegistry::new(),
            combatants,
            player_hand: PlayerHand::default(),
            enemy_cycle: EnemyHandCycle::new(),
            enemy_deck,
            selector: Box::new(CoinFlipSelector::new(None)),
            presenter: Box::new(NullPresenter),
            observer: Box::new(()),
            counter: InstanceCounter::default(),
            assignment: None,
            events: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: Box<dyn SlotOrderSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn EncounterObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_player_hand(mut self, templates: Vec<CardTemplate>) -> Self {
        self.player_hand = PlayerHand::new(templates);
        self
    }

    /// 开始一场新的遭遇战：清空登记表，补满敌方队列与玩家手牌。
    pub fn begin_encounter(&mut self) {
        self.registry.reset();
        self.assignment = None;
        self.turn = 1;
        self.enemy_cycle
            .fill(self.enemy_deck.as_mut(), &mut self.counter, &mut self.events);
        self.player_hand.refill(&mut self.counter, &mut self.events);
        self.flush_registry();
        self.set_phase(TurnPhase::WaitingForCards);
        info!("encounter started");
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn registry(&self) -> &TurnCardRegistry {
        &self.registry
    }

    pub fn combatants(&self) -> &Combatants {
        &self.combatants
    }

    pub fn combatants_mut(&mut self) -> &mut Combatants {
        &mut self.combatants
    }

    pub fn player_hand(&self) -> &PlayerHand {
        &self.player_hand
    }

    pub fn enemy_cycle(&self) -> &EnemyHandCycle {
        &self.enemy_cycle
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        match self.phase {
            TurnPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// 卡牌只能在结算开始之前登记。
    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, TurnPhase::WaitingForCards | TurnPhase::Ready)
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.flush_registry();
        std::mem::take(&mut self.events)
    }

    /// 本回合的先后手分配，首次查询时才向选择策略请求，
    /// 同时在登记表中预告敌方的结算槽。
    pub fn order_assignment(&mut self) -> OrderAssignment {
        if let Some(assignment) = self.assignment {
            return assignment;
        }
        let assignment = self.selector.select();
        debug!("turn {} order: {:?}", self.turn, assignment);
        self.events.push(CombatEvent::OrderAssigned { assignment });
        self.assignment = Some(assignment);
        self.registry.reserve_enemy_slot(assignment.enemy());
        self.flush_registry();
        assignment
    }

    pub fn register_card(
        &mut self,
        slot: ExecutionOrderSlot,
        card: Option<Card>,
    ) -> Result<TurnPhase, TurnError> {
        self.ensure_accepting()?;
        self.registry.register_card(slot, card);
        Ok(self.sync_readiness())
    }

    pub fn clear_slot(&mut self, slot: ExecutionOrderSlot) -> Result<TurnPhase, TurnError> {
        self.ensure_accepting()?;
        self.registry.clear_slot(slot);
        Ok(self.sync_readiness())
    }

    /// 把手牌打到玩家本回合的结算槽。
    pub fn play_from_hand(&mut self, hand_slot: PlayerHandSlot) -> Result<TurnPhase, TurnError> {
        self.ensure_accepting()?;
        let card = self
            .player_hand
            .take(hand_slot)
            .ok_or(TurnError::HandSlotEmpty { slot: hand_slot })?;
        let slot = self.order_assignment().player();
        self.register_card(slot, Some(card))
    }

    pub fn restore_to_hand(&mut self, slot: ExecutionOrderSlot) -> Result<PlayerHandSlot, TurnError> {
        self.ensure_accepting()?;
        let is_player_card = self
            .registry
            .get_card(slot)
            .map(|card| card.owner() == CardOwner::Player)
            .unwrap_or(false);
        if !is_player_card {
            return Err(TurnError::CardNotOwnedByPlayer { slot });
        }
        let card = self
            .registry
            .take_card(slot)
            .ok_or(TurnError::CardNotOwnedByPlayer { slot })?;
        let card_id = card.instance_id;
        match self.player_hand.restore(card) {
            Ok(hand_slot) => {
                self.flush_registry();
                self.events.push(CombatEvent::CardRestored {
                    slot,
                    hand_slot,
                    card_id,
                });
                self.sync_readiness();
                Ok(hand_slot)
            }
            Err(card) => {
                self.registry.register_card(slot, Some(card));
                self.sync_readiness();
                Err(TurnError::CannotRestore { slot })
            }
        }
    }

    /// 敌方把战斗槽中的牌登记到它本回合的结算槽。
    /// 本回合尚未出牌而战斗槽为空时，先尝试前移队列或补抽。
    pub fn commit_enemy_card(&mut self) -> Result<TurnPhase, TurnError> {
        self.ensure_accepting()?;
        let has_card = !self.registry.has_enemy_card()
            && self.enemy_cycle.replenish(
                self.enemy_deck.as_mut(),
                &mut self.counter,
                &mut self.events,
            );
        if !has_card {
            warn!("enemy has nothing to commit on turn {}", self.turn);
            return Err(TurnError::NoEnemyCard);
        }
        let card = self
            .enemy_cycle
            .take_battle_card()
            .ok_or(TurnError::NoEnemyCard)?;
        let slot = self.order_assignment().enemy();
        self.register_card(slot, Some(card))
    }

    /// 撤回敌方已登记的牌并重新登记，玩家已提交的牌保持不动。
    pub fn replan_enemy(&mut self) -> Result<TurnPhase, TurnError> {
        self.ensure_accepting()?;
        let withdrawn = self
            .registry
            .reserved_enemy_slot()
            .and_then(|slot| self.registry.get_card(slot))
            .filter(|card| card.owner() == CardOwner::Enemy)
            .cloned();
        self.registry.clear_enemy_cards_only();
        if let Some(mut card) = withdrawn {
            card.execution_slot = None;
            self.enemy_cycle.return_battle_card(card);
        }
        self.sync_readiness();
        self.commit_enemy_card()
    }

    /// 执行一次状态转换。
    pub fn advance(&mut self) -> TurnStep {
        match self.phase {
            TurnPhase::WaitingForCards | TurnPhase::Finished(_) => TurnStep::settled(self.phase),
            TurnPhase::Ready => {
                self.set_phase(TurnPhase::ExecutingFirst);
                self.execute_slot(ExecutionOrderSlot::First);
                TurnStep {
                    phase: self.phase,
                    suspend: Some(self.config.first_to_second_delay()),
                }
            }
            TurnPhase::ExecutingFirst => {
                self.set_phase(TurnPhase::ExecutingSecond);
                let second_source = self
                    .registry
                    .get_card(ExecutionOrderSlot::Second)
                    .map(|card| card.owner());
                match second_source {
                    Some(source) if self.combatants.is_dead(source) => {
                        warn!("second card skipped: its caster {source:?} has fallen");
                        self.events.push(CombatEvent::ExecutionSkipped {
                            slot: ExecutionOrderSlot::Second,
                            reason: SkipReason::SourceDefeated,
                        });
                    }
                    _ => self.execute_slot(ExecutionOrderSlot::Second),
                }
                TurnStep {
                    phase: self.phase,
                    suspend: Some(self.config.second_to_resolve_delay()),
                }
            }
            TurnPhase::ExecutingSecond => {
                self.set_phase(TurnPhase::Resolving);
                for slot in ExecutionOrderSlot::ALL {
                    self.registry.clear_slot(slot);
                }
                self.flush_registry();
                TurnStep::settled(self.phase)
            }
            TurnPhase::Resolving => {
                self.finish_turn();
                TurnStep::settled(self.phase)
            }
        }
    }

    /// 同步推进到回合结束；每个挂起点调用一次 `on_suspend`。
    pub fn run_until_settled<F>(&mut self, mut on_suspend: F) -> TurnPhase
    where
        F: FnMut(Duration),
    {
        loop {
            let step = self.advance();
            if let Some(delay) = step.suspend {
                on_suspend(delay);
            }
            if step.is_settled() {
                return step.phase;
            }
        }
    }

    fn finish_turn(&mut self) {
        let player_dead = self.combatants.is_dead(CardOwner::Player);
        let enemy_dead = self.combatants.is_dead(CardOwner::Enemy);
        if player_dead || enemy_dead {
            let outcome = if player_dead {
                EncounterOutcome::Defeat
            } else {
                EncounterOutcome::Victory
            };
            info!("encounter ended on turn {}: {:?}", self.turn, outcome);
            match outcome {
                EncounterOutcome::Victory => self.observer.on_victory(),
                EncounterOutcome::Defeat => self.observer.on_defeat(),
            }
            self.registry.reset();
            self.flush_registry();
            self.assignment = None;
            self.events.push(CombatEvent::EncounterEnded { outcome });
            self.set_phase(TurnPhase::Finished(outcome));
            return;
        }

        self.enemy_cycle
            .advance(self.enemy_deck.as_mut(), &mut self.counter, &mut self.events);
        self.combatants.clear_guards();
        self.events.push(CombatEvent::GuardsCleared);
        self.registry.reset();
        self.flush_registry();
        self.assignment = None;
        self.player_hand.refill(&mut self.counter, &mut self.events);
        self.turn += 1;
        self.set_phase(TurnPhase::WaitingForCards);
    }

    fn execute_slot(&mut self, slot: ExecutionOrderSlot) {
        let Some(card) = self.registry.get_card(slot) else {
            warn!("nothing to execute in {slot:?}");
            self.events.push(CombatEvent::ExecutionSkipped {
                slot,
                reason: SkipReason::EmptySlot,
            });
            return;
        };
        let pipeline = EffectPipeline::for_card(card);
        let Some(mut ctx) = CardExecutionContext::resolve(card, &mut self.combatants) else {
            self.events.push(CombatEvent::ExecutionSkipped {
                slot,
                reason: SkipReason::MissingCombatant,
            });
            return;
        };

        self.events.push(CombatEvent::CardExecuted {
            slot,
            card_id: card.instance_id,
            owner: card.owner(),
        });
        let report = pipeline.execute(card, &mut ctx, self.presenter.as_mut(), &mut self.events);
        if report.aborted {
            self.events.push(CombatEvent::ExecutionSkipped {
                slot,
                reason: SkipReason::TargetDefeated,
            });
        }
    }

    fn ensure_accepting(&self) -> Result<(), TurnError> {
        match self.phase {
            TurnPhase::Finished(_) => Err(TurnError::EncounterFinished),
            phase if !self.accepts_input() => Err(TurnError::RegistrationClosed { phase }),
            _ => Ok(()),
        }
    }

    /// 每次登记表变动后检查就绪条件：双方都已出牌时进入 `Ready`。
    fn sync_readiness(&mut self) -> TurnPhase {
        self.flush_registry();
        let ready = self.registry.has_player_card() && self.registry.has_enemy_card();
        match (self.phase, ready) {
            (TurnPhase::WaitingForCards, true) => self.set_phase(TurnPhase::Ready),
            (TurnPhase::Ready, false) => self.set_phase(TurnPhase::WaitingForCards),
            _ => {}
        }
        self.phase
    }

    fn flush_registry(&mut self) {
        self.events.extend(self.registry.drain_notifications());
    }

    fn set_phase(&mut self, next: TurnPhase) {
        if self.phase == next {
            return;
        }
        debug!("turn {}: {:?} -> {:?}", self.turn, self.phase, next);
        self.events.push(CombatEvent::PhaseChanged {
            from: self.phase,
            to: next,
        });
        self.phase = next;
    }
}

/// 异步推进一个完整回合，在挂起点等待 `wait` 返回的 future。
///
/// 等待期间不持有管理器的借用，宿主可以在此时查询状态。
pub async fn play_turn<W, F>(manager: &RefCell<TurnManager>, mut wait: W) -> TurnPhase
where
    W: FnMut(Duration) -> F,
    F: Future<Output = ()>,
{
    loop {
        let step = manager.borrow_mut().advance();
        if let Some(delay) = step.suspend {
            wait(delay).await;
        }
        if step.is_settled() {
            return step.phase;
        }
    }
}
