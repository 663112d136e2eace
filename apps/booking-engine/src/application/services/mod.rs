//! Application services.

mod trade_service;

pub use trade_service::{TradeFilter, TradeService};
