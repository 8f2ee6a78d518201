//! Multi-symbol matching engine: routes order events to books, crosses
//! marketable volume, and reports fills.
//!
//! The engine is the single writer for all of its books. Events complete
//! synchronously in submission order; fills from one `add_order` are reported
//! in the order the counter orders were consumed.

use std::collections::HashMap;

use log::{debug, trace};

use crate::book::OrderBook;
use crate::error::Reject;
use crate::matching::match_order;
use crate::types::{BestBidOffer, Fill, OrderId, OrderSnapshot, Side};

/// Price unit of books created implicitly by [`MatchingEngine::add_order`].
/// Books needing a coarser unit go through [`MatchingEngine::register_symbol`].
const DEFAULT_UNIT: i64 = 1;

/// Symbol-routed order entry point over a set of [`OrderBook`]s.
///
/// Order ids are unique across all books: the engine tracks which book owns
/// each resting order, so amends and pulls need only the id.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    books: Vec<OrderBook>,
    symbols: HashMap<String, usize>,
    order_index: HashMap<OrderId, usize>,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_book(&mut self, symbol: &str, unit: i64) -> Result<usize, Reject> {
        let book = OrderBook::new(symbol, unit)?;
        let idx = self.books.len();
        self.books.push(book);
        self.symbols.insert(symbol.to_string(), idx);
        debug!("created book for {symbol} with unit {unit}");
        Ok(idx)
    }

    /// Registers `symbol` with an explicit price unit ahead of any orders.
    /// Books created implicitly by [`MatchingEngine::add_order`] use unit 1.
    pub fn register_symbol(&mut self, symbol: &str, unit: i64) -> Result<(), Reject> {
        if symbol.is_empty() {
            return Err(Reject::EmptySymbol);
        }
        if self.symbols.contains_key(symbol) {
            return Err(Reject::DuplicateSymbol(symbol.to_string()));
        }
        self.create_book(symbol, unit)?;
        Ok(())
    }

    /// Submits a new limit order. Marketable volume is crossed against the
    /// opposite side of the symbol's book first; any remainder rests.
    ///
    /// Returns the fills in consumption order. Validation failures reject the
    /// whole order with no side effect.
    pub fn add_order(
        &mut self,
        order_id: OrderId,
        symbol: &str,
        side: Side,
        price: i64,
        volume: i64,
    ) -> Result<Vec<Fill>, Reject> {
        if order_id.0 == 0 {
            return Err(Reject::ZeroOrderId);
        }
        if self.order_index.contains_key(&order_id) {
            return Err(Reject::DuplicateOrder(order_id));
        }
        if symbol.is_empty() {
            return Err(Reject::EmptySymbol);
        }
        if price <= 0 {
            return Err(Reject::NonPositivePrice(price));
        }
        if volume <= 0 {
            return Err(Reject::NonPositiveVolume(volume));
        }

        let book_idx = match self.symbols.get(symbol) {
            Some(&idx) => idx,
            None => self.create_book(symbol, DEFAULT_UNIT)?,
        };
        let unit = self.books[book_idx].unit();
        if price % unit != 0 {
            return Err(Reject::MisalignedPrice { price, unit });
        }

        let outcome = match_order(&mut self.books[book_idx], side, price, volume);
        for id in &outcome.fully_filled {
            self.order_index.remove(id);
        }
        if !outcome.fills.is_empty() {
            trace!("{symbol}: order {order_id} took {} fills", outcome.fills.len());
        }
        if outcome.remaining > 0 {
            let rested = self.books[book_idx].insert(order_id, side, price, outcome.remaining);
            debug_assert!(rested.is_ok(), "residual insert of {order_id} rejected");
            if rested.is_ok() {
                self.order_index.insert(order_id, book_idx);
            }
        }
        Ok(outcome.fills)
    }

    /// Amends a resting order.
    ///
    /// A volume decrease at the unchanged price is applied in place and keeps
    /// time priority; no matching runs. A price change or volume increase is
    /// replayed as pull + add at the new parameters, so the amended order
    /// loses its queue position and may cross, in which case the returned
    /// fills are those of the replayed add.
    pub fn amend_order(
        &mut self,
        order_id: OrderId,
        new_price: i64,
        new_volume: i64,
    ) -> Result<Vec<Fill>, Reject> {
        let &book_idx = self
            .order_index
            .get(&order_id)
            .ok_or(Reject::UnknownOrder(order_id))?;
        if new_price <= 0 {
            return Err(Reject::NonPositivePrice(new_price));
        }
        if new_volume <= 0 {
            return Err(Reject::NonPositiveVolume(new_volume));
        }
        let unit = self.books[book_idx].unit();
        if new_price % unit != 0 {
            return Err(Reject::MisalignedPrice { price: new_price, unit });
        }
        let Some(current) = self.books[book_idx].order_by_id(order_id) else {
            debug_assert!(false, "indexed order {order_id} missing from its book");
            return Err(Reject::UnknownOrder(order_id));
        };

        if new_price == current.price && new_volume <= current.volume {
            self.books[book_idx].amend(order_id, new_price, new_volume)?;
            Ok(Vec::new())
        } else {
            let symbol = self.books[book_idx].symbol().to_string();
            let side = current.side;
            self.pull_order(order_id)?;
            self.add_order(order_id, &symbol, side, new_price, new_volume)
        }
    }

    /// Removes a resting order from its book and the engine's index.
    pub fn pull_order(&mut self, order_id: OrderId) -> Result<(), Reject> {
        let book_idx = self
            .order_index
            .remove(&order_id)
            .ok_or(Reject::UnknownOrder(order_id))?;
        let removed = self.books[book_idx].remove(order_id);
        debug_assert!(removed, "indexed order {order_id} missing from its book");
        Ok(())
    }

    /// The book for `symbol`, if any order or registration created it.
    pub fn get_book(&self, symbol: &str) -> Option<&OrderBook> {
        self.symbols.get(symbol).map(|&idx| &self.books[idx])
    }

    /// Best bid and ask of `symbol` with their level volumes. All fields are
    /// zero for an unknown symbol or an empty side.
    pub fn get_top_of_book(&self, symbol: &str) -> BestBidOffer {
        let Some(book) = self.get_book(symbol) else {
            return BestBidOffer::default();
        };
        let (bid_price, bid_volume) = match book.best_price(Side::Buy) {
            Some(price) => (price, book.volume_at(Side::Buy, price)),
            None => (0, 0),
        };
        let (ask_price, ask_volume) = match book.best_price(Side::Sell) {
            Some(price) => (price, book.volume_at(Side::Sell, price)),
            None => (0, 0),
        };
        BestBidOffer {
            bid_volume,
            bid_price,
            ask_volume,
            ask_price,
        }
    }

    /// Value copy of a resting order, wherever it rests.
    pub fn order_by_id(&self, order_id: OrderId) -> Option<OrderSnapshot> {
        let &book_idx = self.order_index.get(&order_id)?;
        self.books[book_idx].order_by_id(order_id)
    }

    /// Number of orders resting across all books.
    pub fn open_order_count(&self) -> usize {
        self.order_index.len()
    }
}
