use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::slots::OrderAssignment;

/// 决定本回合哪一方先结算。每回合最多调用一次。
pub trait SlotOrderSelector {
    fn select(&mut self) -> OrderAssignment;
}

impl<F> SlotOrderSelector for F
where
    F: FnMut() -> OrderAssignment,
{
    fn select(&mut self) -> OrderAssignment {
        self()
    }
}

/// 默认策略：公平抛硬币。
pub struct CoinFlipSelector {
    rng: SmallRng,
}

impl CoinFlipSelector {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { rng }
    }
}

impl SlotOrderSelector for CoinFlipSelector {
    fn select(&mut self) -> OrderAssignment {
        if self.rng.gen_bool(0.5) {
            OrderAssignment::player_first()
        } else {
            OrderAssignment::enemy_first()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedOrder(pub OrderAssignment);

impl SlotOrderSelector for FixedOrder {
    fn select(&mut self) -> OrderAssignment {
        self.0
    }
}
