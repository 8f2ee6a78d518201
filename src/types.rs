//! Core identifiers and records of the engine's public surface.
//!
//! Prices and volumes are plain `i64` ticks: the external boundary divides
//! incoming prices by the owning book's unit, and everything past that
//! boundary is integer arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique order identifier, process-wide across all books. Zero is reserved
/// and never names a live order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order of this side takes liquidity from.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// One match against a resting counter order, quoting the counter order's id
/// and the traded price and volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub other_order_id: OrderId,
    pub trade_price: i64,
    pub trade_volume: i64,
}

/// Snapshot of both best levels of one book. Fields are zero when the symbol
/// is unknown or the side is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestBidOffer {
    pub bid_volume: i64,
    pub bid_price: i64,
    pub ask_volume: i64,
    pub ask_price: i64,
}

/// Value copy of one resting order. Snapshots are detached from the book:
/// mutating the book never changes a snapshot already taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub side: Side,
    pub price: i64,
    pub volume: i64,
}
