//! Trade domain: entity, value objects, validation rules, lifecycle.

pub mod aggregate;
pub mod errors;
pub mod services;
pub mod validation;
pub mod value_objects;

pub use aggregate::{derive_quote_amount, Trade, TradeDraft, TradeUpdate};
pub use errors::{TradeError, ValidationFailure, Violation};
pub use value_objects::{format_trade_reference, Direction, TradeStatus};
