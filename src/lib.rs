//! # clob-engine
//!
//! Price-time priority central limit order book with a multi-symbol matching
//! engine on top.
//!
//! Each [`OrderBook`] keeps one symbol's resting limit orders in paged price
//! directories with an intrusive FIFO queue per price level and cached
//! best-bid/best-ask handles. [`MatchingEngine`] routes add/amend/pull events
//! by symbol, crosses marketable volume against the opposite side in strict
//! price-time priority, and reports the resulting [`Fill`]s.
//!
//! ## Example
//!
//! ```rust
//! use clob_engine::{MatchingEngine, OrderId, Side};
//!
//! let mut engine = MatchingEngine::new();
//! engine.add_order(OrderId(1), "ACME", Side::Sell, 100, 5).unwrap();
//! let fills = engine.add_order(OrderId(2), "ACME", Side::Buy, 100, 5).unwrap();
//! assert_eq!(fills.len(), 1);
//! assert_eq!(fills[0].other_order_id, OrderId(1));
//! assert_eq!(fills[0].trade_volume, 5);
//!
//! // Both orders are gone; the top of book reads all zeros.
//! let top = engine.get_top_of_book("ACME");
//! assert_eq!(top.bid_volume, 0);
//! assert_eq!(top.ask_volume, 0);
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`] and [`match_order`] can be used directly when a single book
//! without symbol routing is enough.

pub mod book;
pub mod engine;
pub mod error;
pub mod matching;
pub mod order_flow;
pub mod paged;
pub mod types;

pub use book::OrderBook;
pub use engine::MatchingEngine;
pub use error::Reject;
pub use matching::{match_order, MatchResult};
pub use order_flow::{FlowConfig, FlowEvent, OrderFlow};
pub use paged::PagedDirectory;
pub use types::{BestBidOffer, Fill, OrderId, OrderSnapshot, Side};
