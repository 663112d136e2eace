//! Trade entity and its input commands.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::value_objects::{Direction, TradeStatus};

/// Fixed scale for currency amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Fixed scale for exchange rates.
pub const RATE_SCALE: u32 = 6;

/// One FX spot deal.
///
/// The trade reference uniquely and permanently identifies one trade; it is
/// never reused and never mutated after booking. `version` is the optimistic
/// concurrency stamp, starting at 1 and incremented on every persisted
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Surrogate id. Zero until the trade is persisted.
    pub id: i64,
    /// Canonical reference, `FX-YYYYMMDD-NNNN`.
    pub trade_reference: String,
    /// Date the deal was struck.
    pub trade_date: NaiveDate,
    /// Settlement date; never precedes `trade_date`.
    pub value_date: NaiveDate,
    /// Buy or sell the base currency.
    pub direction: Direction,
    /// ISO 4217 code of the base currency.
    pub base_currency: String,
    /// ISO 4217 code of the quote currency.
    pub quote_currency: String,
    /// Amount in base currency, scale 4.
    pub base_amount: Decimal,
    /// Agreed rate, scale 6.
    pub exchange_rate: Decimal,
    /// `base_amount * exchange_rate`, half-up at scale 4.
    pub quote_amount: Decimal,
    /// Counterparty name.
    pub counterparty: Option<String>,
    /// Booking trader.
    pub trader: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Lifecycle status.
    pub status: TradeStatus,
    /// Booking timestamp.
    pub created_at: DateTime<Utc>,
    /// Identity that booked the trade.
    pub created_by: String,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Identity of the last mutation.
    pub updated_by: String,
    /// Optimistic concurrency stamp.
    pub version: i64,
}

/// Input for booking a new trade.
///
/// Amounts arrive optional so that absence is reported as a validation
/// violation rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeDraft {
    /// Date the deal was struck.
    pub trade_date: NaiveDate,
    /// Settlement date.
    pub value_date: NaiveDate,
    /// Buy or sell the base currency.
    pub direction: Direction,
    /// ISO 4217 code of the base currency.
    pub base_currency: String,
    /// ISO 4217 code of the quote currency.
    pub quote_currency: String,
    /// Amount in base currency.
    pub base_amount: Option<Decimal>,
    /// Agreed rate.
    pub exchange_rate: Option<Decimal>,
    /// Quote amount; computed from amount and rate when absent.
    pub quote_amount: Option<Decimal>,
    /// Counterparty name.
    pub counterparty: Option<String>,
    /// Booking trader.
    pub trader: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Partial update for an existing trade.
///
/// Only these fields are mutable after booking; everything else is fixed at
/// creation. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeUpdate {
    /// New lifecycle status.
    pub status: Option<TradeStatus>,
    /// New notes.
    pub notes: Option<String>,
    /// New counterparty name.
    pub counterparty: Option<String>,
}

impl TradeUpdate {
    /// Returns true if the update carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.counterparty.is_none()
    }
}

/// Derive the quote amount from base amount and rate.
///
/// Exact decimal multiplication, rounded half-up to scale 4. No floating
/// point is involved at any step.
#[must_use]
pub fn derive_quote_amount(base_amount: Decimal, exchange_rate: Decimal) -> Decimal {
    // round_dp leaves values with fewer fractional digits untouched, so
    // rescale afterwards to pin the canonical scale.
    rescaled(
        (base_amount * exchange_rate)
            .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero),
        AMOUNT_SCALE,
    )
}

/// Rescale a decimal to a fixed scale, preserving value.
///
/// Callers must have validated that the value does not carry more fractional
/// digits than `scale`; rescaling then only appends trailing zeros.
#[must_use]
pub fn rescaled(value: Decimal, scale: u32) -> Decimal {
    let mut out = value;
    out.rescale(scale);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quote_amount_is_exact_at_scale_four() {
        let quote = derive_quote_amount(dec!(1000000.00), dec!(1.085000));
        assert_eq!(quote.to_string(), "1085000.0000");
        assert_eq!(quote.scale(), AMOUNT_SCALE);
    }

    #[test]
    fn quote_amount_small_values() {
        let quote = derive_quote_amount(dec!(0.01), dec!(1.5));
        assert_eq!(quote.to_string(), "0.0150");
    }

    #[test]
    fn quote_amount_rounds_half_up() {
        // 3333.33 * 1.000015 = 3333.37999995 -> 3333.3800
        let quote = derive_quote_amount(dec!(3333.33), dec!(1.000015));
        assert_eq!(quote.to_string(), "3333.3800");

        // midpoint at the 5th fractional digit rounds away from zero
        let quote = derive_quote_amount(dec!(0.00005), dec!(1));
        assert_eq!(quote.to_string(), "0.0001");
    }

    #[test]
    fn rescale_appends_trailing_zeros() {
        assert_eq!(rescaled(dec!(1000000.00), AMOUNT_SCALE).to_string(), "1000000.0000");
        assert_eq!(rescaled(dec!(1.085), RATE_SCALE).to_string(), "1.085000");
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TradeUpdate::default().is_empty());
        let update = TradeUpdate {
            notes: Some("called the desk".to_string()),
            ..TradeUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
