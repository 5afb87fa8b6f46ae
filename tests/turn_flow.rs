use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use slot_battle::combat::FixedOrder;
use slot_battle::{
    Card, CardOwner, CardTemplate, Character, Combatant, Combatants, CombatEvent, EffectSpec,
    EncounterObserver, EncounterOutcome, ExecutionOrderSlot, OrderAssignment, SlotPosition,
    TurnConfig, TurnError, TurnManager, TurnPhase,
};

struct OutcomeLog {
    outcomes: Rc<RefCell<Vec<EncounterOutcome>>>,
}

impl EncounterObserver for OutcomeLog {
    fn on_victory(&mut self) {
        self.outcomes.borrow_mut().push(EncounterOutcome::Victory);
    }

    fn on_defeat(&mut self) {
        self.outcomes.borrow_mut().push(EncounterOutcome::Defeat);
    }
}

fn lettered_deck() -> impl FnMut() -> Option<CardTemplate> {
    let mut next = 0u32;
    move || {
        let letter = char::from(b'A' + (next % 26) as u8);
        next += 1;
        Some(CardTemplate::new(
            100 + next,
            letter.to_string(),
            vec![EffectSpec::damage(5)],
        ))
    }
}

fn encounter(player: Character, enemy: Character) -> (TurnManager, Rc<RefCell<Vec<EncounterOutcome>>>) {
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let observer = OutcomeLog {
        outcomes: Rc::clone(&outcomes),
    };
    let mut manager = TurnManager::new(
        TurnConfig::immediate(),
        Combatants::new(Box::new(player), Box::new(enemy)),
        Box::new(lettered_deck()),
    )
    .with_selector(Box::new(FixedOrder(OrderAssignment::player_first())))
    .with_observer(Box::new(observer));
    manager.begin_encounter();
    (manager, outcomes)
}

fn hp(manager: &TurnManager, side: CardOwner) -> i32 {
    manager
        .combatants()
        .get(side)
        .map(|combatant| combatant.hp())
        .expect("combatant should be present")
}

fn card(id: u64, owner: CardOwner, effects: Vec<EffectSpec>) -> Card {
    Card::new(id, 1, "Scripted", owner, effects)
}

#[test]
fn normal_turn_trades_damage_and_advances_the_enemy_queue() {
    let (mut manager, outcomes) = encounter(Character::new("Hero", 100), Character::new("Brute", 100));
    let queue_before: Vec<String> = manager
        .enemy_cycle()
        .wait_queue()
        .into_iter()
        .map(|card| card.map(|c| c.name.clone()).unwrap_or_default())
        .collect();
    assert_eq!(queue_before, vec!["B", "C", "D", "E"]);

    manager
        .register_card(
            ExecutionOrderSlot::First,
            Some(card(1000, CardOwner::Player, vec![EffectSpec::damage(10)])),
        )
        .expect("player registers");
    let enemy_card = manager
        .enemy_cycle()
        .battle_card()
        .cloned()
        .map(|mut c| {
            c.effects = vec![EffectSpec::damage(5)];
            c
        });
    let phase = manager
        .register_card(ExecutionOrderSlot::Second, enemy_card)
        .expect("enemy registers");
    assert_eq!(phase, TurnPhase::Ready);

    let phase = manager.run_until_settled(|_| {});

    assert_eq!(phase, TurnPhase::WaitingForCards);
    assert_eq!(hp(&manager, CardOwner::Enemy), 90);
    assert_eq!(hp(&manager, CardOwner::Player), 95);
    assert!(manager.registry().is_empty());
    assert!(!manager.registry().has_player_card() && !manager.registry().has_enemy_card());
    assert!(outcomes.borrow().is_empty());

    let battle = manager
        .enemy_cycle()
        .card_at(SlotPosition::BattleSlot)
        .map(|c| c.name.clone());
    assert_eq!(battle.as_deref(), Some("B"));
    let queue_after: Vec<String> = manager
        .enemy_cycle()
        .wait_queue()
        .into_iter()
        .map(|card| card.map(|c| c.name.clone()).unwrap_or_default())
        .collect();
    assert_eq!(queue_after, vec!["C", "D", "E", "F"]);
}

#[test]
fn guarded_target_ignores_plain_damage_but_not_piercing() {
    let mut brute = Character::new("Brute", 100);
    brute.set_guarded(true);
    let (mut manager, _) = encounter(Character::new("Hero", 100), brute);

    manager
        .register_card(
            ExecutionOrderSlot::First,
            Some(card(
                1,
                CardOwner::Player,
                vec![EffectSpec::damage(10), EffectSpec::piercing(10)],
            )),
        )
        .expect("register");
    manager.commit_enemy_card().expect("commit");
    manager.advance();

    assert_eq!(hp(&manager, CardOwner::Enemy), 90);
    let events = manager.drain_events();
    let blocked = events
        .iter()
        .filter(|event| matches!(event, CombatEvent::DamageResolved { blocked: true, amount: 0, .. }))
        .count();
    assert_eq!(blocked, 1);
}

#[test]
fn lethal_first_card_skips_the_fallen_casters_reply() {
    let (mut manager, outcomes) = encounter(
        Character::new("Hero", 100),
        Character::new("Brute", 100).with_hp(10),
    );
    manager
        .register_card(
            ExecutionOrderSlot::First,
            Some(card(1, CardOwner::Player, vec![EffectSpec::damage(10)])),
        )
        .expect("register");
    manager.commit_enemy_card().expect("commit");

    let mut suspensions = 0;
    let phase = manager.run_until_settled(|_| suspensions += 1);

    assert_eq!(phase, TurnPhase::Finished(EncounterOutcome::Victory));
    assert_eq!(manager.outcome(), Some(EncounterOutcome::Victory));
    assert_eq!(hp(&manager, CardOwner::Enemy), 0);
    assert_eq!(hp(&manager, CardOwner::Player), 100, "dead brute must not strike back");
    assert_eq!(*outcomes.borrow(), vec![EncounterOutcome::Victory]);
    assert_eq!(suspensions, 2);

    let late = manager.register_card(
        ExecutionOrderSlot::First,
        Some(card(2, CardOwner::Player, vec![EffectSpec::damage(1)])),
    );
    assert_eq!(late, Err(TurnError::EncounterFinished));
    assert_eq!(manager.advance().phase, TurnPhase::Finished(EncounterOutcome::Victory));
}

#[test]
fn enemy_striking_first_can_end_in_defeat() {
    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let mut manager = TurnManager::new(
        TurnConfig::immediate(),
        Combatants::new(
            Box::new(Character::new("Hero", 100).with_hp(5)),
            Box::new(Character::new("Brute", 100)),
        ),
        Box::new(lettered_deck()),
    )
    .with_selector(Box::new(FixedOrder(OrderAssignment::enemy_first())))
    .with_observer(Box::new(OutcomeLog {
        outcomes: Rc::clone(&outcomes),
    }));
    manager.begin_encounter();

    manager.commit_enemy_card().expect("commit");
    manager
        .register_card(
            ExecutionOrderSlot::Second,
            Some(card(1, CardOwner::Player, vec![EffectSpec::damage(50)])),
        )
        .expect("register");
    let phase = manager.run_until_settled(|_| {});

    assert_eq!(phase, TurnPhase::Finished(EncounterOutcome::Defeat));
    assert_eq!(hp(&manager, CardOwner::Enemy), 100);
    assert_eq!(*outcomes.borrow(), vec![EncounterOutcome::Defeat]);
}

#[test]
fn missing_enemy_combatant_skips_execution_and_keeps_turning() {
    let mut combatants = Combatants::default();
    combatants.set(CardOwner::Player, Some(Box::new(Character::new("Hero", 30))));
    let mut manager = TurnManager::new(TurnConfig::immediate(), combatants, Box::new(lettered_deck()))
        .with_selector(Box::new(FixedOrder(OrderAssignment::player_first())));
    manager.begin_encounter();

    manager
        .register_card(
            ExecutionOrderSlot::First,
            Some(card(1, CardOwner::Player, vec![EffectSpec::damage(4)])),
        )
        .expect("register");
    manager.commit_enemy_card().expect("commit");
    let phase = manager.run_until_settled(|_| {});

    assert_eq!(phase, TurnPhase::WaitingForCards);
    assert_eq!(hp(&manager, CardOwner::Player), 30);
    let skipped = manager
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, CombatEvent::ExecutionSkipped { .. }))
        .count();
    assert_eq!(skipped, 2);
}

#[test]
fn ready_holds_exactly_when_both_sides_have_registered() {
    let (mut manager, _) = encounter(Character::new("Hero", 100), Character::new("Brute", 100));
    let mut rng = SmallRng::seed_from_u64(2024);

    for id in 0..200u64 {
        let slot = if rng.gen_bool(0.5) {
            ExecutionOrderSlot::First
        } else {
            ExecutionOrderSlot::Second
        };
        let phase = match rng.gen_range(0..3) {
            0 => manager.register_card(slot, Some(card(id, CardOwner::Player, Vec::new()))),
            1 => manager.register_card(slot, Some(card(id, CardOwner::Enemy, Vec::new()))),
            _ => manager.clear_slot(slot),
        }
        .expect("input is accepted before execution");

        let registry = manager.registry();
        let both = registry.has_player_card() && registry.has_enemy_card();
        assert_eq!(phase == TurnPhase::Ready, both, "step {id}");
    }
}

#[test]
fn one_failed_enemy_draw_does_not_stall_the_encounter() {
    let mut draws = 0u32;
    let flaky_deck = move || {
        draws += 1;
        (draws != 6).then(|| CardTemplate::new(draws, format!("E{draws}"), vec![EffectSpec::damage(1)]))
    };
    let mut manager = TurnManager::new(
        TurnConfig::immediate(),
        Combatants::new(
            Box::new(Character::new("Hero", 100)),
            Box::new(Character::new("Brute", 100)),
        ),
        Box::new(flaky_deck),
    )
    .with_selector(Box::new(FixedOrder(OrderAssignment::player_first())));
    manager.begin_encounter();

    for turn in 1..=8u64 {
        manager
            .register_card(
                ExecutionOrderSlot::First,
                Some(card(1000 + turn, CardOwner::Player, vec![EffectSpec::damage(1)])),
            )
            .expect("player registers");
        manager
            .commit_enemy_card()
            .unwrap_or_else(|error| panic!("turn {turn}: enemy could not commit: {error}"));
        assert_eq!(manager.run_until_settled(|_| {}), TurnPhase::WaitingForCards);
    }

    assert_eq!(manager.turn(), 9);
    assert_eq!(hp(&manager, CardOwner::Enemy), 92);
    assert_eq!(hp(&manager, CardOwner::Player), 92);
}
