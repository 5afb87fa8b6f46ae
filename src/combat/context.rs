use log::error;

use super::card::{Card, CardOwner};
use super::combatant::{Combatant, Combatants};

/// 一张卡牌结算时的施放方与承受方。
///
/// 玩家卡牌由玩家施放、作用于敌人；敌方卡牌反之。
pub struct CardExecutionContext<'a> {
    pub source_side: CardOwner,
    pub target_side: CardOwner,
    pub source: &'a mut dyn Combatant,
    pub target: &'a mut dyn Combatant,
}

impl<'a> CardExecutionContext<'a> {
    /// 任一参战者缺失时返回 `None`，调用方应跳过这张卡牌。
    pub fn resolve(card: &Card, combatants: &'a mut Combatants) -> Option<Self> {
        let source_side = card.owner();
        let target_side = source_side.opponent();
        match combatants.split_mut(source_side) {
            Some((source, target)) => Some(Self {
                source_side,
                target_side,
                source,
                target,
            }),
            None => {
                error!(
                    "cannot resolve combatants for card {} ({:?}): {:?} or {:?} is missing",
                    card.instance_id, source_side, source_side, target_side
                );
                None
            }
        }
    }
}
