use serde::{Deserialize, Serialize};

use super::card::CardOwner;

/// 引擎只通过这一组读写操作接触角色状态，从不自行保存。
pub trait Combatant {
    fn name(&self) -> &str;
    fn hp(&self) -> i32;
    fn max_hp(&self) -> i32;
    fn is_guarded(&self) -> bool;
    fn set_guarded(&mut self, guarded: bool);
    /// 受到伤害，格挡状态下不扣血。返回实际扣除的生命值。
    fn take_damage(&mut self, amount: i32) -> i32;
    fn take_damage_ignoring_guard(&mut self, amount: i32) -> i32;
    /// 回复生命值，不超过上限。返回实际回复量。
    fn heal(&mut self, amount: i32) -> i32;

    fn is_dead(&self) -> bool {
        self.hp() <= 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub guarded: bool,
}

impl Character {
    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            hp: max_hp,
            max_hp,
            guarded: false,
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.min(self.max_hp);
        self
    }
}

impl Combatant for Character {
    fn name(&self) -> &str {
        &self.name
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.max_hp
    }

    fn is_guarded(&self) -> bool {
        self.guarded
    }

    fn set_guarded(&mut self, guarded: bool) {
        self.guarded = guarded;
    }

    fn take_damage(&mut self, amount: i32) -> i32 {
        if self.guarded {
            return 0;
        }
        self.take_damage_ignoring_guard(amount)
    }

    fn take_damage_ignoring_guard(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.is_dead() {
            return 0;
        }
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.is_dead() {
            return 0;
        }
        let restored = amount.min(self.max_hp - self.hp).max(0);
        self.hp += restored;
        restored
    }
}

/// 当前遭遇战中的两名参战者。任一方都可能尚未就位。
#[derive(Default)]
pub struct Combatants {
    player: Option<Box<dyn Combatant>>,
    enemy: Option<Box<dyn Combatant>>,
}

impl Combatants {
    pub fn new(player: Box<dyn Combatant>, enemy: Box<dyn Combatant>) -> Self {
        Self {
            player: Some(player),
            enemy: Some(enemy),
        }
    }

    pub fn set(&mut self, side: CardOwner, combatant: Option<Box<dyn Combatant>>) {
        match side {
            CardOwner::Player => self.player = combatant,
            CardOwner::Enemy => self.enemy = combatant,
        }
    }

    pub fn get(&self, side: CardOwner) -> Option<&dyn Combatant> {
        match side {
            CardOwner::Player => self.player.as_deref(),
            CardOwner::Enemy => self.enemy.as_deref(),
        }
    }

    pub fn get_mut(&mut self, side: CardOwner) -> Option<&mut (dyn Combatant + 'static)> {
        match side {
            CardOwner::Player => self.player.as_deref_mut(),
            CardOwner::Enemy => self.enemy.as_deref_mut(),
        }
    }

    /// 同时借出施放方与承受方。
    pub fn split_mut(
        &mut self,
        source: CardOwner,
    ) -> Option<(&mut dyn Combatant, &mut dyn Combatant)> {
        let player: &mut dyn Combatant = self.player.as_deref_mut()?;
        let enemy: &mut dyn Combatant = self.enemy.as_deref_mut()?;
        match source {
            CardOwner::Player => Some((player, enemy)),
            CardOwner::Enemy => Some((enemy, player)),
        }
    }

    pub fn is_dead(&self, side: CardOwner) -> bool {
        self.get(side).map(|c| c.is_dead()).unwrap_or(false)
    }

    pub fn clear_guards(&mut self) {
        for side in [CardOwner::Player, CardOwner::Enemy] {
            if let Some(combatant) = self.get_mut(side) {
                combatant.set_guarded(false);
            }
        }
    }
}
