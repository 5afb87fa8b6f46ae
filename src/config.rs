//! 遭遇战配置：角色、卡池与回合节奏，均可从 JSON 加载。

use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::combat::{
    CardTemplate, Character, CoinFlipSelector, Combatants, ConfigError, EffectSpec, RandomDeck,
    TurnManager,
};

const DEFAULT_FIRST_TO_SECOND_DELAY_MS: u32 = 600;
const DEFAULT_SECOND_TO_RESOLVE_DELAY_MS: u32 = 600;

/// 两个表现挂起点的等待时长。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnConfig {
    #[serde(default = "default_first_to_second")]
    pub first_to_second_delay_ms: u32,
    #[serde(default = "default_second_to_resolve")]
    pub second_to_resolve_delay_ms: u32,
}

fn default_first_to_second() -> u32 {
    DEFAULT_FIRST_TO_SECOND_DELAY_MS
}

fn default_second_to_resolve() -> u32 {
    DEFAULT_SECOND_TO_RESOLVE_DELAY_MS
}

impl TurnConfig {
    pub fn immediate() -> Self {
        Self {
            first_to_second_delay_ms: 0,
            second_to_resolve_delay_ms: 0,
        }
    }

    pub fn first_to_second_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.first_to_second_delay_ms))
    }

    pub fn second_to_resolve_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.second_to_resolve_delay_ms))
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            first_to_second_delay_ms: DEFAULT_FIRST_TO_SECOND_DELAY_MS,
            second_to_resolve_delay_ms: DEFAULT_SECOND_TO_RESOLVE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterSpec {
    pub name: String,
    pub max_hp: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
}

impl CharacterSpec {
    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            hp: None,
        }
    }

    pub fn build(&self) -> Character {
        let character = Character::new(self.name.clone(), self.max_hp);
        match self.hp {
            Some(hp) => character.with_hp(hp),
            None => character,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncounterConfig {
    pub player: CharacterSpec,
    pub enemy: CharacterSpec,
    #[serde(default)]
    pub player_hand: Vec<CardTemplate>,
    pub enemy_pool: Vec<CardTemplate>,
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

static SAMPLE_TEMPLATES: Lazy<Vec<CardTemplate>> = Lazy::new(|| {
    vec![
        CardTemplate::new(1, "Slash", vec![EffectSpec::damage(10)]),
        CardTemplate::new(2, "Shield Up", vec![EffectSpec::guard()]),
        CardTemplate::new(
            3,
            "Second Wind",
            vec![EffectSpec::heal(6), EffectSpec::damage(3).with_order(1)],
        ),
        CardTemplate::new(101, "Bite", vec![EffectSpec::damage(5)]),
        CardTemplate::new(102, "Bone Spike", vec![EffectSpec::piercing(7)]),
        CardTemplate::new(103, "Harden", vec![EffectSpec::guard(), EffectSpec::heal(3)]),
    ]
});

impl EncounterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EncounterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enemy_pool.is_empty() {
            return Err(ConfigError::EmptyEnemyPool);
        }
        if self.player_hand.is_empty() {
            return Err(ConfigError::EmptyPlayerHand);
        }
        for spec in [&self.player, &self.enemy] {
            if spec.max_hp <= 0 {
                return Err(ConfigError::InvalidCharacter {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level
            .as_deref()
            .and_then(|value| log::Level::from_str(value).ok())
            .unwrap_or(log::Level::Info)
    }

    /// 根据配置组装回合管理器，并开始遭遇战。
    pub fn build(&self) -> TurnManager {
        let combatants = Combatants::new(
            Box::new(self.player.build()),
            Box::new(self.enemy.build()),
        );
        let deck = RandomDeck::new(self.enemy_pool.clone(), self.seed);
        let selector = CoinFlipSelector::new(self.seed.map(|seed| seed.wrapping_add(1)));
        let mut manager = TurnManager::new(self.turn.clone(), combatants, Box::new(deck))
            .with_selector(Box::new(selector))
            .with_player_hand(self.player_hand.clone());
        manager.begin_encounter();
        manager
    }

    pub fn sample() -> Self {
        let (player_hand, enemy_pool): (Vec<CardTemplate>, Vec<CardTemplate>) = SAMPLE_TEMPLATES
            .iter()
            .cloned()
            .partition(|template| template.id < 100);
        Self {
            player: CharacterSpec::new("Wanderer", 60),
            enemy: CharacterSpec::new("Crypt Hound", 45),
            player_hand,
            enemy_pool,
            turn: TurnConfig::default(),
            seed: None,
            log_level: None,
        }
    }
}
