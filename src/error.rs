//! Rejection reasons for order events.
//!
//! Every public operation validates before it mutates, so a [`Reject`] always
//! means the engine and its books are exactly as they were before the call.

use crate::types::OrderId;

/// Why an order event was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Reject {
    #[error("order id 0 is reserved")]
    ZeroOrderId,
    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),
    #[error("order {0} does not exist")]
    UnknownOrder(OrderId),
    #[error("symbol must be non-empty")]
    EmptySymbol,
    #[error("symbol {0} is already registered")]
    DuplicateSymbol(String),
    #[error("price {0} must be positive")]
    NonPositivePrice(i64),
    #[error("volume {0} must be positive")]
    NonPositiveVolume(i64),
    #[error("price unit {0} must be positive")]
    NonPositiveUnit(i64),
    #[error("price {price} is not a multiple of the book unit {unit}")]
    MisalignedPrice { price: i64, unit: i64 },
}
