//! Single-symbol order book: paged price directories, intrusive FIFO levels,
//! and cached best-price handles.
//!
//! Orders and price levels live in slab arenas and refer to each other by
//! index, so the queue links are plain `Option<usize>` handles rather than a
//! pointer graph. All aggregate counters and the best-bid/best-ask caches are
//! maintained by the guarded mutating methods; a [`Reject`] always means the
//! book did not change.

use std::collections::HashMap;

use slab::Slab;

use crate::error::Reject;
use crate::paged::PagedDirectory;
use crate::types::{OrderId, OrderSnapshot, Side};

/// Arena index of a resting order.
type OrderKey = usize;
/// Arena index of a price level.
type LevelKey = usize;

/// Initial tick capacity of each side's price directory.
const INITIAL_TICKS: usize = 4096;

#[derive(Debug)]
struct OrderNode {
    id: OrderId,
    side: Side,
    price: i64,
    volume: i64,
    level: LevelKey,
    prev: Option<OrderKey>,
    next: Option<OrderKey>,
}

/// All resting orders at one price on one side, in arrival order. The FIFO
/// discipline is what delivers time priority within a price.
#[derive(Debug)]
struct PriceLevel {
    price: i64,
    size: usize,
    volume: i64,
    head: Option<OrderKey>,
    tail: Option<OrderKey>,
}

impl PriceLevel {
    fn new(price: i64) -> Self {
        Self {
            price,
            size: 0,
            volume: 0,
            head: None,
            tail: None,
        }
    }

    /// Links `key` at the tail of the queue. O(1).
    fn append(&mut self, orders: &mut Slab<OrderNode>, key: OrderKey) {
        match self.tail {
            None => {
                self.head = Some(key);
                self.tail = Some(key);
            }
            Some(tail) => {
                orders[tail].next = Some(key);
                orders[key].prev = Some(tail);
                self.tail = Some(key);
            }
        }
        self.size += 1;
        self.volume += orders[key].volume;
    }

    /// Splices `key` out of the queue and clears its links. O(1).
    fn unlink(&mut self, orders: &mut Slab<OrderNode>, key: OrderKey) {
        let (prev, next, volume) = {
            let node = &orders[key];
            (node.prev, node.next, node.volume)
        };
        match prev {
            Some(p) => orders[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => orders[n].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut orders[key];
        node.prev = None;
        node.next = None;
        self.size -= 1;
        self.volume -= volume;
    }
}

/// Price-time priority limit order book for one symbol.
///
/// Prices are integer multiples of the book's `unit`; the tick index
/// `price / unit` addresses the per-side [`PagedDirectory`]. Level slots are
/// never freed for the book's lifetime, which keeps best-price scans bounded
/// and lookups branch-free.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    unit: i64,
    buy_levels: PagedDirectory<Option<LevelKey>>,
    sell_levels: PagedDirectory<Option<LevelKey>>,
    levels: Slab<PriceLevel>,
    order_arena: Slab<OrderNode>,
    orders: HashMap<OrderId, OrderKey>,
    order_count: u64,
    buy_volume: i64,
    sell_volume: i64,
    best_bid: Option<LevelKey>,
    best_ask: Option<LevelKey>,
}

impl OrderBook {
    /// Creates an empty book. `unit` is the price-tick denominator every
    /// order price must be a multiple of.
    pub fn new(symbol: impl Into<String>, unit: i64) -> Result<Self, Reject> {
        if unit <= 0 {
            return Err(Reject::NonPositiveUnit(unit));
        }
        Ok(Self {
            symbol: symbol.into(),
            unit,
            buy_levels: PagedDirectory::new(INITIAL_TICKS),
            sell_levels: PagedDirectory::new(INITIAL_TICKS),
            levels: Slab::new(),
            order_arena: Slab::new(),
            orders: HashMap::new(),
            order_count: 0,
            buy_volume: 0,
            sell_volume: 0,
            best_bid: None,
            best_ask: None,
        })
    }

    fn tick_of(&self, price: i64) -> usize {
        (price / self.unit) as usize
    }

    /// Rests a new order at the tail of its price level, creating the level
    /// on first use. Updates counters and the best-price cache. O(1).
    pub fn insert(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: i64,
        volume: i64,
    ) -> Result<(), Reject> {
        if self.orders.contains_key(&order_id) {
            return Err(Reject::DuplicateOrder(order_id));
        }
        if price <= 0 {
            return Err(Reject::NonPositivePrice(price));
        }
        if volume <= 0 {
            return Err(Reject::NonPositiveVolume(volume));
        }
        if price % self.unit != 0 {
            return Err(Reject::MisalignedPrice {
                price,
                unit: self.unit,
            });
        }

        let tick = self.tick_of(price);
        let existing = match side {
            Side::Buy => self.buy_levels.get(tick),
            Side::Sell => self.sell_levels.get(tick),
        };
        let level_key = match existing {
            Some(key) => key,
            None => {
                let key = self.levels.insert(PriceLevel::new(price));
                match side {
                    Side::Buy => self.buy_levels.set(tick, Some(key)),
                    Side::Sell => self.sell_levels.set(tick, Some(key)),
                }
                key
            }
        };

        let order_key = self.order_arena.insert(OrderNode {
            id: order_id,
            side,
            price,
            volume,
            level: level_key,
            prev: None,
            next: None,
        });
        self.levels[level_key].append(&mut self.order_arena, order_key);
        self.orders.insert(order_id, order_key);
        self.order_count += 1;
        match side {
            Side::Buy => self.buy_volume += volume,
            Side::Sell => self.sell_volume += volume,
        }

        // Adopt the level as best only if it beats the current best.
        match side {
            Side::Buy => {
                let better = match self.best_bid {
                    Some(best) => self.levels[best].price < price,
                    None => true,
                };
                if better {
                    self.best_bid = Some(level_key);
                }
            }
            Side::Sell => {
                let better = match self.best_ask {
                    Some(best) => self.levels[best].price > price,
                    None => true,
                };
                if better {
                    self.best_ask = Some(level_key);
                }
            }
        }
        Ok(())
    }

    /// Amends a resting order. Same price mutates volume in place and keeps
    /// queue position; a price change detaches and re-inserts, forfeiting
    /// time priority at the new price.
    pub fn amend(
        &mut self,
        order_id: OrderId,
        new_price: i64,
        new_volume: i64,
    ) -> Result<(), Reject> {
        let &order_key = self
            .orders
            .get(&order_id)
            .ok_or(Reject::UnknownOrder(order_id))?;
        if new_price <= 0 {
            return Err(Reject::NonPositivePrice(new_price));
        }
        if new_volume <= 0 {
            return Err(Reject::NonPositiveVolume(new_volume));
        }
        if new_price % self.unit != 0 {
            return Err(Reject::MisalignedPrice {
                price: new_price,
                unit: self.unit,
            });
        }

        let (side, price, old_volume, level_key) = {
            let node = &self.order_arena[order_key];
            (node.side, node.price, node.volume, node.level)
        };

        if new_price == price {
            let delta = new_volume - old_volume;
            self.order_arena[order_key].volume = new_volume;
            self.levels[level_key].volume += delta;
            match side {
                Side::Buy => self.buy_volume += delta,
                Side::Sell => self.sell_volume += delta,
            }
        } else {
            self.detach(order_id)?;
            self.insert(order_id, side, new_price, new_volume)?;
        }
        Ok(())
    }

    /// Removes a resting order from its level and all indices, returning its
    /// final state. Refreshes the best-price cache when the best level
    /// empties. O(1) amortized; O(levels) when a best-price scan is needed.
    pub fn detach(&mut self, order_id: OrderId) -> Result<OrderSnapshot, Reject> {
        let order_key = self
            .orders
            .remove(&order_id)
            .ok_or(Reject::UnknownOrder(order_id))?;
        let level_key = self.order_arena[order_key].level;
        self.levels[level_key].unlink(&mut self.order_arena, order_key);
        let node = self.order_arena.remove(order_key);

        self.order_count -= 1;
        match node.side {
            Side::Buy => self.buy_volume -= node.volume,
            Side::Sell => self.sell_volume -= node.volume,
        }

        let tick = self.tick_of(node.price);
        match node.side {
            Side::Buy => {
                if let Some(best) = self.best_bid {
                    if self.levels[best].size == 0 {
                        self.best_bid = self.next_bid_below(tick);
                    }
                }
            }
            Side::Sell => {
                if let Some(best) = self.best_ask {
                    if self.levels[best].size == 0 {
                        self.best_ask = self.next_ask_above(tick);
                    }
                }
            }
        }

        Ok(OrderSnapshot {
            order_id: node.id,
            side: node.side,
            price: node.price,
            volume: node.volume,
        })
    }

    /// Removes an order by id. Returns `true` if it was resting here.
    pub fn remove(&mut self, order_id: OrderId) -> bool {
        self.detach(order_id).is_ok()
    }

    /// Next populated buy level strictly below `tick`, scanning better to
    /// worse and skipping empty slots.
    fn next_bid_below(&self, tick: usize) -> Option<LevelKey> {
        (0..tick)
            .rev()
            .find_map(|t| self.buy_levels.get(t).filter(|&k| self.levels[k].size > 0))
    }

    /// Next populated sell level strictly above `tick`.
    fn next_ask_above(&self, tick: usize) -> Option<LevelKey> {
        ((tick + 1)..self.sell_levels.span())
            .find_map(|t| self.sell_levels.get(t).filter(|&k| self.levels[k].size > 0))
    }

    fn best_level(&self, side: Side) -> Option<&PriceLevel> {
        let key = match side {
            Side::Buy => self.best_bid,
            Side::Sell => self.best_ask,
        };
        key.map(|k| &self.levels[k])
    }

    /// Head order of the best level on `side`: highest-price buy or
    /// lowest-price sell, earliest arrival within the level.
    pub fn best_order_id(&self, side: Side) -> Option<OrderId> {
        let level = self.best_level(side)?;
        level.head.map(|k| self.order_arena[k].id)
    }

    /// Price of the best non-empty level on `side`.
    pub fn best_price(&self, side: Side) -> Option<i64> {
        self.best_level(side).map(|level| level.price)
    }

    /// Total resting volume at `price` on `side`; 0 when the level is absent,
    /// empty, or the price is not a multiple of the unit.
    pub fn volume_at(&self, side: Side, price: i64) -> i64 {
        if price <= 0 || price % self.unit != 0 {
            return 0;
        }
        let tick = self.tick_of(price);
        let key = match side {
            Side::Buy => self.buy_levels.get(tick),
            Side::Sell => self.sell_levels.get(tick),
        };
        key.map_or(0, |k| self.levels[k].volume)
    }

    /// Value copy of a resting order.
    pub fn order_by_id(&self, order_id: OrderId) -> Option<OrderSnapshot> {
        self.orders.get(&order_id).map(|&key| {
            let node = &self.order_arena[key];
            OrderSnapshot {
                order_id: node.id,
                side: node.side,
                price: node.price,
                volume: node.volume,
            }
        })
    }

    /// All resting orders, buys then sells, each side best price first and
    /// FIFO within a level. Not on the hot path.
    pub fn resting_orders(&self) -> Vec<OrderSnapshot> {
        let mut out = Vec::with_capacity(self.orders.len());
        for tick in (0..self.buy_levels.span()).rev() {
            if let Some(key) = self.buy_levels.get(tick) {
                self.push_level_orders(key, &mut out);
            }
        }
        for tick in 0..self.sell_levels.span() {
            if let Some(key) = self.sell_levels.get(tick) {
                self.push_level_orders(key, &mut out);
            }
        }
        out
    }

    fn push_level_orders(&self, level_key: LevelKey, out: &mut Vec<OrderSnapshot>) {
        let mut cursor = self.levels[level_key].head;
        while let Some(key) = cursor {
            let node = &self.order_arena[key];
            out.push(OrderSnapshot {
                order_id: node.id,
                side: node.side,
                price: node.price,
                volume: node.volume,
            });
            cursor = node.next;
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn unit(&self) -> i64 {
        self.unit
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    /// Sum of resting buy volume.
    pub fn buy_volume(&self) -> i64 {
        self.buy_volume
    }

    /// Sum of resting sell volume.
    pub fn sell_volume(&self) -> i64 {
        self.sell_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook::new("TEST", 1).unwrap()
    }

    #[test]
    fn insert_updates_counters_and_best() {
        let mut book = book();
        book.insert(OrderId(1), Side::Buy, 100, 10).unwrap();
        book.insert(OrderId(2), Side::Sell, 105, 4).unwrap();
        assert_eq!(book.order_count(), 2);
        assert_eq!(book.buy_volume(), 10);
        assert_eq!(book.sell_volume(), 4);
        assert_eq!(book.best_price(Side::Buy), Some(100));
        assert_eq!(book.best_price(Side::Sell), Some(105));
        assert_eq!(book.best_order_id(Side::Buy), Some(OrderId(1)));
    }

    #[test]
    fn insert_rejects_duplicates_and_bad_prices() {
        let mut book = OrderBook::new("TEST", 5).unwrap();
        book.insert(OrderId(1), Side::Buy, 100, 10).unwrap();
        assert_eq!(
            book.insert(OrderId(1), Side::Buy, 100, 10),
            Err(Reject::DuplicateOrder(OrderId(1)))
        );
        assert_eq!(
            book.insert(OrderId(2), Side::Buy, 102, 10),
            Err(Reject::MisalignedPrice { price: 102, unit: 5 })
        );
        assert_eq!(
            book.insert(OrderId(3), Side::Buy, -5, 10),
            Err(Reject::NonPositivePrice(-5))
        );
        // Nothing above mutated the book.
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.buy_volume(), 10);
    }

    #[test]
    fn fifo_within_a_level() {
        let mut book = book();
        book.insert(OrderId(1), Side::Sell, 100, 1).unwrap();
        book.insert(OrderId(2), Side::Sell, 100, 2).unwrap();
        book.insert(OrderId(3), Side::Sell, 100, 3).unwrap();
        assert_eq!(book.best_order_id(Side::Sell), Some(OrderId(1)));
        assert!(book.remove(OrderId(1)));
        assert_eq!(book.best_order_id(Side::Sell), Some(OrderId(2)));
        // Removing from the middle keeps head and tail intact.
        book.insert(OrderId(4), Side::Sell, 100, 4).unwrap();
        assert!(book.remove(OrderId(3)));
        assert_eq!(book.best_order_id(Side::Sell), Some(OrderId(2)));
        assert_eq!(book.volume_at(Side::Sell, 100), 6);
    }

    #[test]
    fn detach_returns_final_state() {
        let mut book = book();
        book.insert(OrderId(7), Side::Buy, 90, 12).unwrap();
        let snap = book.detach(OrderId(7)).unwrap();
        assert_eq!(
            snap,
            OrderSnapshot {
                order_id: OrderId(7),
                side: Side::Buy,
                price: 90,
                volume: 12,
            }
        );
        assert_eq!(book.detach(OrderId(7)), Err(Reject::UnknownOrder(OrderId(7))));
        assert_eq!(book.order_count(), 0);
        assert_eq!(book.buy_volume(), 0);
        assert_eq!(book.best_price(Side::Buy), None);
    }

    #[test]
    fn best_bid_rescan_skips_empty_levels() {
        let mut book = book();
        book.insert(OrderId(1), Side::Buy, 100, 1).unwrap();
        book.insert(OrderId(2), Side::Buy, 98, 1).unwrap();
        book.insert(OrderId(3), Side::Buy, 95, 1).unwrap();
        // Empty the middle level first; 98's slot persists but is skipped.
        assert!(book.remove(OrderId(2)));
        assert_eq!(book.best_price(Side::Buy), Some(100));
        assert!(book.remove(OrderId(1)));
        assert_eq!(book.best_price(Side::Buy), Some(95));
        assert!(book.remove(OrderId(3)));
        assert_eq!(book.best_price(Side::Buy), None);
    }

    #[test]
    fn best_ask_rescan_moves_up() {
        let mut book = book();
        book.insert(OrderId(1), Side::Sell, 100, 1).unwrap();
        book.insert(OrderId(2), Side::Sell, 104, 1).unwrap();
        assert!(book.remove(OrderId(1)));
        assert_eq!(book.best_price(Side::Sell), Some(104));
        assert!(book.remove(OrderId(2)));
        assert_eq!(book.best_price(Side::Sell), None);
    }

    #[test]
    fn reinserting_into_emptied_level_restores_best() {
        let mut book = book();
        book.insert(OrderId(1), Side::Buy, 100, 1).unwrap();
        assert!(book.remove(OrderId(1)));
        assert_eq!(book.best_price(Side::Buy), None);
        // The level slot persists; a new order at the same tick reuses it.
        book.insert(OrderId(2), Side::Buy, 100, 2).unwrap();
        assert_eq!(book.best_price(Side::Buy), Some(100));
        assert_eq!(book.volume_at(Side::Buy, 100), 2);
    }

    #[test]
    fn amend_same_price_adjusts_volume_in_place() {
        let mut book = book();
        book.insert(OrderId(1), Side::Sell, 100, 10).unwrap();
        book.insert(OrderId(2), Side::Sell, 100, 5).unwrap();
        book.amend(OrderId(1), 100, 4).unwrap();
        assert_eq!(book.volume_at(Side::Sell, 100), 9);
        assert_eq!(book.sell_volume(), 9);
        // Queue position kept: id 1 is still at the head.
        assert_eq!(book.best_order_id(Side::Sell), Some(OrderId(1)));
    }

    #[test]
    fn amend_price_change_reinserts_at_tail() {
        let mut book = book();
        book.insert(OrderId(1), Side::Sell, 100, 5).unwrap();
        book.insert(OrderId(2), Side::Sell, 101, 5).unwrap();
        book.amend(OrderId(1), 101, 5).unwrap();
        assert_eq!(book.volume_at(Side::Sell, 100), 0);
        assert_eq!(book.volume_at(Side::Sell, 101), 10);
        // Moved order queues behind the level's incumbent.
        assert_eq!(book.best_order_id(Side::Sell), Some(OrderId(2)));
        assert_eq!(book.best_price(Side::Sell), Some(101));
    }

    #[test]
    fn amend_rejections_leave_book_untouched() {
        let mut book = OrderBook::new("TEST", 2).unwrap();
        book.insert(OrderId(1), Side::Buy, 100, 5).unwrap();
        assert_eq!(
            book.amend(OrderId(9), 100, 5),
            Err(Reject::UnknownOrder(OrderId(9)))
        );
        assert_eq!(
            book.amend(OrderId(1), 101, 5),
            Err(Reject::MisalignedPrice { price: 101, unit: 2 })
        );
        assert_eq!(
            book.amend(OrderId(1), 100, 0),
            Err(Reject::NonPositiveVolume(0))
        );
        assert_eq!(book.volume_at(Side::Buy, 100), 5);
        assert_eq!(book.buy_volume(), 5);
    }

    #[test]
    fn volume_at_is_zero_for_absent_or_misaligned() {
        let mut book = OrderBook::new("TEST", 2).unwrap();
        book.insert(OrderId(1), Side::Buy, 100, 5).unwrap();
        assert_eq!(book.volume_at(Side::Buy, 100), 5);
        assert_eq!(book.volume_at(Side::Sell, 100), 0);
        assert_eq!(book.volume_at(Side::Buy, 98), 0);
        assert_eq!(book.volume_at(Side::Buy, 99), 0);
    }

    #[test]
    fn resting_orders_lists_best_first_fifo_within_level() {
        let mut book = book();
        book.insert(OrderId(1), Side::Buy, 99, 1).unwrap();
        book.insert(OrderId(2), Side::Buy, 100, 1).unwrap();
        book.insert(OrderId(3), Side::Buy, 100, 1).unwrap();
        book.insert(OrderId(4), Side::Sell, 101, 1).unwrap();
        let ids: Vec<u64> = book.resting_orders().iter().map(|o| o.order_id.0).collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn new_rejects_nonpositive_unit() {
        assert_eq!(
            OrderBook::new("TEST", 0).err(),
            Some(Reject::NonPositiveUnit(0))
        );
    }

    #[test]
    fn units_divide_prices_into_ticks() {
        let mut book = OrderBook::new("TEST", 25).unwrap();
        book.insert(OrderId(1), Side::Sell, 1000, 3).unwrap();
        book.insert(OrderId(2), Side::Sell, 1025, 3).unwrap();
        assert_eq!(book.best_price(Side::Sell), Some(1000));
        assert!(book.remove(OrderId(1)));
        assert_eq!(book.best_price(Side::Sell), Some(1025));
    }
}
