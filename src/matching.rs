//! Price-time priority matching.
//!
//! [`match_order`] runs one incoming limit order against a book: it consumes
//! the head of the best opposite level while the top of book still crosses,
//! and reports what was taken. Resting the remainder is the caller's call.

use crate::book::OrderBook;
use crate::types::{Fill, OrderId, Side};

/// Outcome of running one incoming order against a book.
#[derive(Clone, Debug)]
pub struct MatchResult {
    /// Fills in consumption order: best price first, FIFO within a price.
    pub fills: Vec<Fill>,
    /// Counter orders consumed entirely and removed from the book. Callers
    /// tracking orders across books must drop these from their own indices.
    pub fully_filled: Vec<OrderId>,
    /// Volume the book could not satisfy.
    pub remaining: i64,
}

/// Consumes marketable volume from the side opposite `side`, in strict
/// price-time priority.
///
/// A counter order larger than the remainder is amended down in place (it
/// keeps its queue position); a smaller or equal one is removed and the loop
/// moves to the next head. Matching stops when the incoming volume is
/// exhausted, the opposite side empties, or the top of book no longer crosses
/// `limit_price`.
pub fn match_order(book: &mut OrderBook, side: Side, limit_price: i64, volume: i64) -> MatchResult {
    let mut result = MatchResult {
        fills: Vec::new(),
        fully_filled: Vec::new(),
        remaining: volume,
    };

    while result.remaining > 0 {
        let Some(best_id) = book.best_order_id(side.opposite()) else {
            break;
        };
        let Some(best) = book.order_by_id(best_id) else {
            debug_assert!(false, "best order {best_id} has no backing order");
            break;
        };
        let crosses = match side {
            Side::Buy => best.price <= limit_price,
            Side::Sell => best.price >= limit_price,
        };
        if !crosses {
            break;
        }

        if best.volume > result.remaining {
            let taken = result.remaining;
            let amended = book.amend(best.order_id, best.price, best.volume - taken);
            debug_assert!(amended.is_ok(), "volume-down amend of resting order rejected");
            result.fills.push(Fill {
                other_order_id: best.order_id,
                trade_price: best.price,
                trade_volume: taken,
            });
            result.remaining = 0;
        } else {
            let removed = book.remove(best.order_id);
            debug_assert!(removed, "resting best order {best_id} failed to remove");
            result.fills.push(Fill {
                other_order_id: best.order_id,
                trade_price: best.price,
                trade_volume: best.volume,
            });
            result.fully_filled.push(best.order_id);
            result.remaining -= best.volume;
        }
    }

    result
}
