//! Deterministic synthetic order flow.
//!
//! Seeded stream of add/amend/pull events for replay tests and benchmarks.
//! Same config (including seed) produces the same event sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{OrderId, Side};

/// One engine-bound order event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    Add {
        order_id: OrderId,
        side: Side,
        price: i64,
        volume: i64,
    },
    Amend {
        order_id: OrderId,
        new_price: i64,
        new_volume: i64,
    },
    Pull {
        order_id: OrderId,
    },
}

/// Configuration for the event generator. All ranges are inclusive; ratios
/// are probabilities in `0.0..=1.0` (amend + pull must be at most 1.0, the
/// rest of the mass goes to adds).
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// RNG seed. Same seed, same stream.
    pub seed: u64,
    /// Number of events produced by [`OrderFlow::events`].
    pub num_events: usize,
    /// Probability that an add is a Buy.
    pub buy_ratio: f64,
    pub price_min: i64,
    pub price_max: i64,
    pub volume_min: i64,
    pub volume_max: i64,
    /// Probability that an event amends an earlier order.
    pub amend_ratio: f64,
    /// Probability that an event pulls an earlier order.
    pub pull_ratio: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_events: 1000,
            buy_ratio: 0.5,
            price_min: 95,
            price_max: 105,
            volume_min: 1,
            volume_max: 100,
            amend_ratio: 0.1,
            pull_ratio: 0.1,
        }
    }
}

/// Deterministic event stream. Amends and pulls target a uniformly chosen
/// order issued earlier in the stream; a target may already have matched or
/// been pulled, which exercises the engine's rejection paths.
pub struct OrderFlow {
    rng: StdRng,
    config: FlowConfig,
    next_order_id: u64,
    issued: Vec<OrderId>,
}

impl OrderFlow {
    pub fn new(config: FlowConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            rng,
            config,
            next_order_id: 1,
            issued: Vec::new(),
        }
    }

    /// Next event. The first event is always an add.
    pub fn next_event(&mut self) -> FlowEvent {
        let roll: f64 = self.rng.gen();
        if !self.issued.is_empty() && roll < self.config.amend_ratio {
            let target = self.issued[self.rng.gen_range(0..self.issued.len())];
            FlowEvent::Amend {
                order_id: target,
                new_price: self.rng.gen_range(self.config.price_min..=self.config.price_max),
                new_volume: self.rng.gen_range(self.config.volume_min..=self.config.volume_max),
            }
        } else if !self.issued.is_empty()
            && roll < self.config.amend_ratio + self.config.pull_ratio
        {
            let pos = self.rng.gen_range(0..self.issued.len());
            FlowEvent::Pull {
                order_id: self.issued.swap_remove(pos),
            }
        } else {
            let order_id = OrderId(self.next_order_id);
            self.next_order_id += 1;
            self.issued.push(order_id);
            FlowEvent::Add {
                order_id,
                side: if self.rng.gen_bool(self.config.buy_ratio) {
                    Side::Buy
                } else {
                    Side::Sell
                },
                price: self.rng.gen_range(self.config.price_min..=self.config.price_max),
                volume: self.rng.gen_range(self.config.volume_min..=self.config.volume_max),
            }
        }
    }

    /// Collects `num_events` events.
    pub fn events(mut self) -> Vec<FlowEvent> {
        (0..self.config.num_events).map(|_| self.next_event()).collect()
    }
}
