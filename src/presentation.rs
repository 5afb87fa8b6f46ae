//! 表现层边界：动画、音效等协作方通过这里接收卡牌效果提示。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::combat::{Card, CardInstanceId, EffectKind};

pub trait Presenter {
    fn present(&mut self, card: &Card, kind: EffectKind);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _card: &Card, _kind: EffectKind) {}
}

impl<P: Presenter> Presenter for Rc<RefCell<P>> {
    fn present(&mut self, card: &Card, kind: EffectKind) {
        self.borrow_mut().present(card, kind);
    }
}

/// 启动时按效果类别注册的处理器表。
#[derive(Default)]
pub struct PresentationRegistry {
    handlers: HashMap<EffectKind, Box<dyn FnMut(&Card)>>,
}

impl PresentationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: EffectKind, handler: F)
    where
        F: FnMut(&Card) + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn with_handler<F>(mut self, kind: EffectKind, handler: F) -> Self
    where
        F: FnMut(&Card) + 'static,
    {
        self.register(kind, handler);
        self
    }

    pub fn has_handler(&self, kind: EffectKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl Presenter for PresentationRegistry {
    fn present(&mut self, card: &Card, kind: EffectKind) {
        if let Some(handler) = self.handlers.get_mut(&kind) {
            handler(card);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationCue {
    pub card_id: CardInstanceId,
    pub kind: EffectKind,
}

/// 记录提示而不播放，供前端在回合结束后统一回放。
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    cues: Vec<PresentationCue>,
}

impl CueLog {
    pub fn drain(&mut self) -> Vec<PresentationCue> {
        std::mem::take(&mut self.cues)
    }
}

impl Presenter for CueLog {
    fn present(&mut self, card: &Card, kind: EffectKind) {
        self.cues.push(PresentationCue {
            card_id: card.instance_id,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::combat::CardOwner;

    #[test]
    fn registry_dispatches_by_kind() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let mut registry = PresentationRegistry::new()
            .with_handler(EffectKind::Damage, move |_| counter.set(counter.get() + 1));
        let card = Card::new(1, 1, "Slash", CardOwner::Player, Vec::new());

        registry.present(&card, EffectKind::Damage);
        registry.present(&card, EffectKind::Heal);

        assert_eq!(hits.get(), 1);
        assert!(!registry.has_handler(EffectKind::Guard));
    }
}
