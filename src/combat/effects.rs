use std::cmp::Ordering;

use log::{debug, warn};

use super::card::{Card, EffectKind, EffectSpec};
use super::context::CardExecutionContext;
use super::error::EffectError;
use super::events::CombatEvent;
use crate::presentation::Presenter;

/// 效果命令：根据上下文与数值修改施放方或承受方的状态。
///
/// 命令不向管线返回结果；无法生效时返回错误，由管线记录后继续。
pub trait EffectCommand {
    fn kind(&self) -> EffectKind;

    fn execute(
        &self,
        ctx: &mut CardExecutionContext<'_>,
        magnitude: i32,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), EffectError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DamageCommand {
    pub ignore_guard: bool,
}

impl EffectCommand for DamageCommand {
    fn kind(&self) -> EffectKind {
        EffectKind::Damage
    }

    fn execute(
        &self,
        ctx: &mut CardExecutionContext<'_>,
        magnitude: i32,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), EffectError> {
        if magnitude <= 0 {
            return Err(EffectError::InvalidMagnitude {
                kind: EffectKind::Damage,
                magnitude,
            });
        }
        let blocked = !self.ignore_guard && ctx.target.is_guarded();
        let amount = if self.ignore_guard {
            ctx.target.take_damage_ignoring_guard(magnitude)
        } else {
            ctx.target.take_damage(magnitude)
        };
        events.push(CombatEvent::DamageResolved {
            source: ctx.source_side,
            target: ctx.target_side,
            amount,
            blocked,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HealCommand;

impl EffectCommand for HealCommand {
    fn kind(&self) -> EffectKind {
        EffectKind::Heal
    }

    fn execute(
        &self,
        ctx: &mut CardExecutionContext<'_>,
        magnitude: i32,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), EffectError> {
        if magnitude <= 0 {
            return Err(EffectError::InvalidMagnitude {
                kind: EffectKind::Heal,
                magnitude,
            });
        }
        if ctx.source.hp() >= ctx.source.max_hp() {
            return Err(EffectError::NothingToHeal);
        }
        let amount = ctx.source.heal(magnitude);
        events.push(CombatEvent::Healed {
            side: ctx.source_side,
            amount,
        });
        Ok(())
    }
}

/// 施放方进入格挡状态，持续到本回合结束。
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardCommand;

impl EffectCommand for GuardCommand {
    fn kind(&self) -> EffectKind {
        EffectKind::Guard
    }

    fn execute(
        &self,
        ctx: &mut CardExecutionContext<'_>,
        _magnitude: i32,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), EffectError> {
        ctx.source.set_guarded(true);
        events.push(CombatEvent::GuardRaised {
            side: ctx.source_side,
        });
        Ok(())
    }
}

pub fn command_for(spec: &EffectSpec) -> Box<dyn EffectCommand> {
    match spec.kind {
        EffectKind::Damage => Box::new(DamageCommand {
            ignore_guard: spec.ignore_guard,
        }),
        EffectKind::Heal => Box::new(HealCommand),
        EffectKind::Guard => Box::new(GuardCommand),
    }
}

struct PipelineEntry {
    class: u8,
    order: i32,
    declared: usize,
    magnitude: i32,
    command: Box<dyn EffectCommand>,
}

impl PartialEq for PipelineEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PipelineEntry {}

impl PartialOrd for PipelineEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PipelineEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.class
            .cmp(&other.class)
            .then_with(|| self.order.cmp(&other.order))
            .then_with(|| self.declared.cmp(&other.declared))
    }
}

/// 一张卡牌的有序效果命令序列。
///
/// 先按类别（伤害类在前），再按 `execution_order` 升序，最后按声明顺序排列；
/// 未声明顺序的效果排在同类别末尾。
#[derive(Default)]
pub struct EffectPipeline {
    entries: Vec<PipelineEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub aborted: bool,
    pub applied: usize,
    pub failed: usize,
}

impl EffectPipeline {
    pub fn for_card(card: &Card) -> Self {
        let mut pipeline = Self::default();
        for spec in &card.effects {
            pipeline.push(command_for(spec), spec.magnitude, spec.execution_order);
        }
        pipeline
    }

    pub fn push(
        &mut self,
        command: Box<dyn EffectCommand>,
        magnitude: i32,
        execution_order: Option<i32>,
    ) {
        let entry = PipelineEntry {
            class: command.kind().class_priority(),
            order: execution_order.unwrap_or(i32::MAX),
            declared: self.entries.len(),
            magnitude,
            command,
        };
        let index = self.entries.partition_point(|existing| existing <= &entry);
        self.entries.insert(index, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kinds(&self) -> Vec<EffectKind> {
        self.entries.iter().map(|entry| entry.command.kind()).collect()
    }

    pub fn execute(
        &self,
        card: &Card,
        ctx: &mut CardExecutionContext<'_>,
        presenter: &mut dyn Presenter,
        events: &mut Vec<CombatEvent>,
    ) -> PipelineReport {
        let mut report = PipelineReport::default();
        if ctx.target.is_dead() {
            warn!(
                "card {} skipped: target {:?} is already dead",
                card.instance_id, ctx.target_side
            );
            report.aborted = true;
            return report;
        }

        for entry in &self.entries {
            let kind = entry.command.kind();
            presenter.present(card, kind);
            match entry.command.execute(ctx, entry.magnitude, events) {
                Ok(()) => {
                    debug!("card {} applied {:?} ({})", card.instance_id, kind, entry.magnitude);
                    report.applied += 1;
                }
                Err(error) => {
                    warn!("card {} effect {:?} had no effect: {}", card.instance_id, kind, error);
                    events.push(CombatEvent::EffectFailed {
                        card_id: card.instance_id,
                        kind,
                        error,
                    });
                    report.failed += 1;
                }
            }
        }
        report
    }
}
