pub mod combat;
pub mod config;
pub mod presentation;

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use combat::{
    play_turn, Card, CardExecutionContext, CardOwner, CardTemplate, Character, Combatant,
    Combatants, CombatEvent, DeckProvider, EffectKind, EffectPipeline, EffectSpec,
    EncounterObserver, EncounterOutcome, EnemyHandCycle, ExecutionOrderSlot, OrderAssignment,
    PlayerHandSlot, SlotOrderSelector, SlotPosition, TurnCardRegistry, TurnError, TurnManager,
    TurnPhase, TurnStep,
};
pub use config::{CharacterSpec, EncounterConfig, TurnConfig};
pub use presentation::{CueLog, NullPresenter, PresentationCue, PresentationRegistry, Presenter};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

static LOGGER: OnceCell<()> = OnceCell::new();

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    init_logging();
}

fn init_logging() {
    LOGGER.get_or_init(|| {
        if console_log::init_with_level(log::Level::Trace).is_err() {
            web_sys::console::warn_1(&"logger already installed".into());
        }
    });
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn hand_slot_from_index(index: u8) -> Result<PlayerHandSlot, JsValue> {
    PlayerHandSlot::ALL
        .get(usize::from(index))
        .copied()
        .ok_or_else(|| JsValue::from_str(&format!("invalid hand slot {index}")))
}

fn order_slot_from_index(index: u8) -> Result<ExecutionOrderSlot, JsValue> {
    ExecutionOrderSlot::ALL
        .get(usize::from(index))
        .copied()
        .ok_or_else(|| JsValue::from_str(&format!("invalid execution slot {index}")))
}

#[derive(Serialize)]
struct CombatantView {
    name: String,
    hp: i32,
    max_hp: i32,
    guarded: bool,
}

impl CombatantView {
    fn of(combatant: &dyn Combatant) -> Self {
        Self {
            name: combatant.name().to_string(),
            hp: combatant.hp(),
            max_hp: combatant.max_hp(),
            guarded: combatant.is_guarded(),
        }
    }
}

#[derive(Serialize)]
struct EngineSnapshot<'a> {
    phase: TurnPhase,
    turn: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    player: Option<CombatantView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enemy: Option<CombatantView>,
    hand: Vec<&'a Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enemy_battle_card: Option<&'a Card>,
    enemy_queue: Vec<Option<&'a Card>>,
    registered: Vec<&'a Card>,
}

impl<'a> EngineSnapshot<'a> {
    fn of(manager: &'a TurnManager) -> Self {
        let combatants = manager.combatants();
        Self {
            phase: manager.phase(),
            turn: manager.turn(),
            player: combatants.get(CardOwner::Player).map(CombatantView::of),
            enemy: combatants.get(CardOwner::Enemy).map(CombatantView::of),
            hand: manager.player_hand().cards().collect(),
            enemy_battle_card: manager.enemy_cycle().battle_card(),
            enemy_queue: manager.enemy_cycle().wait_queue(),
            registered: ExecutionOrderSlot::ALL
                .iter()
                .filter_map(|slot| manager.registry().get_card(*slot))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct TurnReport {
    phase: TurnPhase,
    events: Vec<CombatEvent>,
    cues: Vec<PresentationCue>,
}

#[wasm_bindgen]
pub struct BattleEngine {
    manager: Rc<RefCell<TurnManager>>,
    cues: Rc<RefCell<CueLog>>,
}

#[wasm_bindgen]
impl BattleEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BattleEngine, JsValue> {
        let config = match config_json {
            Some(json) => EncounterConfig::from_json(&json).map_err(to_js_error)?,
            None => EncounterConfig::sample(),
        };
        log::set_max_level(config.log_level().to_level_filter());

        let cues = Rc::new(RefCell::new(CueLog::default()));
        let presenter: Box<dyn Presenter> = Box::new(Rc::clone(&cues));
        let manager = config.build().with_presenter(presenter);
        Ok(BattleEngine {
            manager: Rc::new(RefCell::new(manager)),
            cues,
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        let manager = self.manager.borrow();
        serde_json::to_string(&EngineSnapshot::of(&manager)).map_err(serde_to_js_error)
    }

    pub fn events_json(&self) -> Result<String, JsValue> {
        let events = self.manager.borrow_mut().drain_events();
        serde_json::to_string(&events).map_err(serde_to_js_error)
    }

    pub fn play_card(&mut self, hand_slot: u8) -> Result<String, JsValue> {
        let slot = hand_slot_from_index(hand_slot)?;
        let phase = self
            .manager
            .borrow_mut()
            .play_from_hand(slot)
            .map_err(to_js_error)?;
        serde_json::to_string(&phase).map_err(serde_to_js_error)
    }

    pub fn restore_card(&mut self, order_slot: u8) -> Result<String, JsValue> {
        let slot = order_slot_from_index(order_slot)?;
        let hand_slot = self
            .manager
            .borrow_mut()
            .restore_to_hand(slot)
            .map_err(to_js_error)?;
        serde_json::to_string(&hand_slot).map_err(serde_to_js_error)
    }

    pub fn commit_enemy_card(&mut self) -> Result<String, JsValue> {
        let phase = self
            .manager
            .borrow_mut()
            .commit_enemy_card()
            .map_err(to_js_error)?;
        serde_json::to_string(&phase).map_err(serde_to_js_error)
    }

    /// 推进一个完整回合，在两个挂起点按配置等待；结果为本回合的事件与表现提示。
    pub fn play_turn(&self) -> Promise {
        let manager = Rc::clone(&self.manager);
        let cues = Rc::clone(&self.cues);

        future_to_promise(async move {
            let phase = play_turn(&manager, |delay| {
                TimeoutFuture::new(u32::try_from(delay.as_millis()).unwrap_or(u32::MAX))
            })
            .await;
            let report = TurnReport {
                phase,
                events: manager.borrow_mut().drain_events(),
                cues: cues.borrow_mut().drain(),
            };
            let json = serde_json::to_string(&report).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 返回示例遭遇战配置，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createSampleEncounter")]
pub fn create_sample_encounter() -> Result<JsValue, JsValue> {
    to_value(&EncounterConfig::sample()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateEncounter")]
pub fn validate_encounter(config_json: &str) -> Result<(), JsValue> {
    EncounterConfig::from_json(config_json)
        .map(|_| ())
        .map_err(to_js_error)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
