//! Trade reference formatting.
//!
//! The reference format `FX-YYYYMMDD-NNNN` is a wire/display contract and
//! must stay stable: downstream systems key on it.

use chrono::NaiveDate;

/// Format a trade reference from its date and allocated sequence number.
///
/// Pure and deterministic. The sequence is zero-padded to four digits;
/// sequences of 10000 and above widen the field rather than truncate.
#[must_use]
pub fn format_trade_reference(trade_date: NaiveDate, sequence: u32) -> String {
    format!("FX-{}-{:04}", trade_date.format("%Y%m%d"), sequence)
}
