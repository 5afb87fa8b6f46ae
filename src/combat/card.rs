use serde::{Deserialize, Serialize};

use super::slots::{ExecutionOrderSlot, HandSlotPosition};

/// 卡牌模板标识。
pub type TemplateId = u32;
/// 单局内唯一的卡牌实例标识。
pub type CardInstanceId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardOwner {
    Player,
    Enemy,
}

impl CardOwner {
    pub fn opponent(self) -> CardOwner {
        match self {
            CardOwner::Player => CardOwner::Enemy,
            CardOwner::Enemy => CardOwner::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Damage,
    Heal,
    Guard,
}

impl EffectKind {
    /// 类别优先级：伤害类先于其他效果结算。
    pub fn class_priority(self) -> u8 {
        match self {
            EffectKind::Damage => 0,
            EffectKind::Heal | EffectKind::Guard => 1,
        }
    }
}

/// 卡牌附带的单个效果描述。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectSpec {
    pub kind: EffectKind,
    pub magnitude: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<i32>,
    #[serde(default)]
    pub ignore_guard: bool,
}

impl EffectSpec {
    pub fn new(kind: EffectKind, magnitude: i32) -> Self {
        Self {
            kind,
            magnitude,
            execution_order: None,
            ignore_guard: false,
        }
    }

    pub fn damage(magnitude: i32) -> Self {
        Self::new(EffectKind::Damage, magnitude)
    }

    pub fn piercing(magnitude: i32) -> Self {
        Self::damage(magnitude).ignoring_guard()
    }

    pub fn heal(magnitude: i32) -> Self {
        Self::new(EffectKind::Heal, magnitude)
    }

    pub fn guard() -> Self {
        Self::new(EffectKind::Guard, 0)
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.execution_order = Some(order);
        self
    }

    pub fn ignoring_guard(mut self) -> Self {
        self.ignore_guard = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
}

impl CardTemplate {
    pub fn new(id: TemplateId, name: impl Into<String>, effects: Vec<EffectSpec>) -> Self {
        Self {
            id,
            name: name.into(),
            effects,
        }
    }
}

/// 战斗中的卡牌实例。所有者在实例生命周期内不可变。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub instance_id: CardInstanceId,
    pub template_id: TemplateId,
    pub name: String,
    owner: CardOwner,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_slot: Option<HandSlotPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_slot: Option<ExecutionOrderSlot>,
}

impl Card {
    pub fn new(
        instance_id: CardInstanceId,
        template_id: TemplateId,
        name: impl Into<String>,
        owner: CardOwner,
        effects: Vec<EffectSpec>,
    ) -> Self {
        Self {
            instance_id,
            template_id,
            name: name.into(),
            owner,
            effects,
            hand_slot: None,
            execution_slot: None,
        }
    }

    pub fn from_template(
        instance_id: CardInstanceId,
        template: &CardTemplate,
        owner: CardOwner,
    ) -> Self {
        Self::new(
            instance_id,
            template.id,
            template.name.clone(),
            owner,
            template.effects.clone(),
        )
    }

    pub fn owner(&self) -> CardOwner {
        self.owner
    }

    pub fn with_hand_slot(mut self, slot: HandSlotPosition) -> Self {
        self.hand_slot = Some(slot);
        self
    }
}

/// 顺序分配器：为卡牌实例发放递增的标识。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceCounter {
    next: CardInstanceId,
}

impl InstanceCounter {
    pub fn spawn(&mut self, template: &CardTemplate, owner: CardOwner) -> Card {
        self.next += 1;
        Card::from_template(self.next, template, owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_effects_deserialize_with_defaults() {
        let json = r#"{
            "id": 7,
            "name": "Rending Strike",
            "effects": [
                { "kind": "Damage", "magnitude": 6, "ignore_guard": true },
                { "kind": "Heal", "magnitude": 2, "execution_order": 3 }
            ]
        }"#;
        let template: CardTemplate = serde_json::from_str(json).expect("template should parse");
        assert_eq!(template.effects[0], EffectSpec::piercing(6));
        assert_eq!(template.effects[1], EffectSpec::heal(2).with_order(3));
    }

    #[test]
    fn spawned_cards_keep_their_owner_and_get_fresh_ids() {
        let template = CardTemplate::new(1, "Jab", vec![EffectSpec::damage(3)]);
        let mut counter = InstanceCounter::default();
        let first = counter.spawn(&template, CardOwner::Enemy);
        let second = counter.spawn(&template, CardOwner::Player);
        assert_ne!(first.instance_id, second.instance_id);
        assert_eq!(first.owner(), CardOwner::Enemy);
        assert_eq!(second.owner().opponent(), CardOwner::Enemy);
        assert!(first.hand_slot.is_none() && first.execution_slot.is_none());
    }
}
