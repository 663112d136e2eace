//! Trade input validation.
//!
//! The rules are composed from small pure predicates, each yielding a
//! field-level [`Violation`] descriptor. All rules run; the caller gets the
//! complete list of violations in one pass, not just the first.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::{rescaled, TradeDraft, TradeUpdate, AMOUNT_SCALE, RATE_SCALE};
use super::errors::{ValidationFailure, Violation};

/// Maximum counterparty name length.
pub const MAX_COUNTERPARTY_LEN: usize = 100;

/// Maximum trader name length.
pub const MAX_TRADER_LEN: usize = 50;

/// Maximum notes length.
pub const MAX_NOTES_LEN: usize = 500;

/// Configured bounds for trade validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeLimits {
    /// Minimum base amount; also rejects zero and negatives.
    pub min_trade_amount: Decimal,
    /// Maximum base amount.
    pub max_trade_amount: Decimal,
    /// Minimum exchange rate; also rejects zero and negatives.
    pub min_exchange_rate: Decimal,
    /// Maximum exchange rate (sanity bound for typos).
    pub max_exchange_rate: Decimal,
    /// Currency codes trades may be booked in.
    pub allowed_currencies: Vec<String>,
    /// How many days into the future a trade date may lie.
    pub max_future_days: i64,
    /// How many days into the past a trade date may lie.
    pub max_past_days: i64,
    /// Maximum value date offset from the trade date.
    pub max_value_date_offset_days: i64,
}

impl Default for TradeLimits {
    fn default() -> Self {
        Self {
            min_trade_amount: Decimal::new(1, 2),          // 0.01
            max_trade_amount: Decimal::new(10_000_000, 0), // 10,000,000
            min_exchange_rate: Decimal::new(1, 6),         // 0.000001
            max_exchange_rate: Decimal::new(1_000_000, 0), // 1,000,000
            allowed_currencies: [
                "EUR", "USD", "GBP", "JPY", "CHF", "AUD", "CAD", "NZD", "SEK", "NOK", "DKK",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            max_future_days: 0,
            max_past_days: 365,
            max_value_date_offset_days: 7,
        }
    }
}

/// Economics of a draft after validation, normalized to storage scales.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedEconomics {
    /// Base amount at scale 4.
    pub base_amount: Decimal,
    /// Exchange rate at scale 6.
    pub exchange_rate: Decimal,
    /// Supplied quote amount at scale 4, if any.
    pub quote_amount: Option<Decimal>,
}

/// Validate a booking draft against the configured limits.
///
/// # Errors
///
/// Returns every violated rule; nothing about the draft is persisted on
/// failure.
pub fn validate_draft(
    draft: &TradeDraft,
    limits: &TradeLimits,
    today: NaiveDate,
) -> Result<NormalizedEconomics, ValidationFailure> {
    let mut violations = Vec::new();

    if let Some(v) = base_amount_rule(draft.base_amount, limits) {
        violations.push(v);
    }
    if let Some(v) = exchange_rate_rule(draft.exchange_rate, limits) {
        violations.push(v);
    }
    if let Some(v) = quote_amount_rule(draft.quote_amount) {
        violations.push(v);
    }
    if let Some(v) = currency_rule("base_currency", &draft.base_currency, limits) {
        violations.push(v);
    }
    if let Some(v) = currency_rule("quote_currency", &draft.quote_currency, limits) {
        violations.push(v);
    }
    if let Some(v) = trade_date_rule(draft.trade_date, today, limits) {
        violations.push(v);
    }
    violations.extend(value_date_rules(draft.trade_date, draft.value_date, limits));
    if let Some(v) = text_rule("counterparty", draft.counterparty.as_deref(), MAX_COUNTERPARTY_LEN)
    {
        violations.push(v);
    }
    if let Some(v) = text_rule("trader", draft.trader.as_deref(), MAX_TRADER_LEN) {
        violations.push(v);
    }
    if let Some(v) = text_rule("notes", draft.notes.as_deref(), MAX_NOTES_LEN) {
        violations.push(v);
    }

    match (draft.base_amount, draft.exchange_rate) {
        (Some(base), Some(rate)) if violations.is_empty() => Ok(NormalizedEconomics {
            base_amount: rescaled(base, AMOUNT_SCALE),
            exchange_rate: rescaled(rate, RATE_SCALE),
            quote_amount: draft.quote_amount.map(|q| rescaled(q, AMOUNT_SCALE)),
        }),
        _ => Err(ValidationFailure::new(violations)),
    }
}

/// Validate a partial update's free-text bounds.
///
/// Status transitions are checked separately by the state machine.
///
/// # Errors
///
/// Returns every violated rule.
pub fn validate_update(update: &TradeUpdate) -> Result<(), ValidationFailure> {
    let mut violations = Vec::new();

    if let Some(v) = text_rule("counterparty", update.counterparty.as_deref(), MAX_COUNTERPARTY_LEN)
    {
        violations.push(v);
    }
    if let Some(v) = text_rule("notes", update.notes.as_deref(), MAX_NOTES_LEN) {
        violations.push(v);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::new(violations))
    }
}

fn base_amount_rule(amount: Option<Decimal>, limits: &TradeLimits) -> Option<Violation> {
    let Some(amount) = amount else {
        return Some(Violation::new(
            "base_amount",
            "required",
            "base amount is required",
        ));
    };
    if amount.scale() > AMOUNT_SCALE {
        return Some(Violation::new(
            "base_amount",
            "scale",
            format!("base amount carries more than {AMOUNT_SCALE} decimal places"),
        ));
    }
    if amount < limits.min_trade_amount {
        return Some(Violation::new(
            "base_amount",
            "min",
            format!("base amount must be at least {}", limits.min_trade_amount),
        ));
    }
    if amount > limits.max_trade_amount {
        return Some(Violation::new(
            "base_amount",
            "max",
            format!("base amount cannot exceed {}", limits.max_trade_amount),
        ));
    }
    None
}

fn exchange_rate_rule(rate: Option<Decimal>, limits: &TradeLimits) -> Option<Violation> {
    let Some(rate) = rate else {
        return Some(Violation::new(
            "exchange_rate",
            "required",
            "exchange rate is required",
        ));
    };
    if rate.scale() > RATE_SCALE {
        return Some(Violation::new(
            "exchange_rate",
            "scale",
            format!("exchange rate carries more than {RATE_SCALE} decimal places"),
        ));
    }
    if rate < limits.min_exchange_rate {
        return Some(Violation::new(
            "exchange_rate",
            "min",
            format!("exchange rate must be at least {}", limits.min_exchange_rate),
        ));
    }
    if rate > limits.max_exchange_rate {
        return Some(Violation::new(
            "exchange_rate",
            "max",
            format!("exchange rate cannot exceed {}", limits.max_exchange_rate),
        ));
    }
    None
}

fn quote_amount_rule(quote: Option<Decimal>) -> Option<Violation> {
    let quote = quote?;
    if quote.scale() > AMOUNT_SCALE {
        return Some(Violation::new(
            "quote_amount",
            "scale",
            format!("quote amount carries more than {AMOUNT_SCALE} decimal places"),
        ));
    }
    if quote <= Decimal::ZERO {
        return Some(Violation::new(
            "quote_amount",
            "min",
            "quote amount must be positive",
        ));
    }
    None
}

fn currency_rule(field: &'static str, code: &str, limits: &TradeLimits) -> Option<Violation> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(Violation::new(
            field,
            "format",
            format!("'{code}' is not a 3-letter uppercase currency code"),
        ));
    }
    if !limits.allowed_currencies.iter().any(|c| c == code) {
        return Some(Violation::new(
            field,
            "unknown_currency",
            format!("currency '{code}' is not in the allowed set"),
        ));
    }
    None
}

fn trade_date_rule(trade_date: NaiveDate, today: NaiveDate, limits: &TradeLimits) -> Option<Violation> {
    if trade_date > today + Duration::days(limits.max_future_days) {
        return Some(Violation::new(
            "trade_date",
            "too_far_future",
            format!(
                "trade date is more than {} day(s) in the future",
                limits.max_future_days
            ),
        ));
    }
    if trade_date < today - Duration::days(limits.max_past_days) {
        return Some(Violation::new(
            "trade_date",
            "too_far_past",
            format!(
                "trade date is more than {} day(s) in the past",
                limits.max_past_days
            ),
        ));
    }
    None
}

fn value_date_rules(
    trade_date: NaiveDate,
    value_date: NaiveDate,
    limits: &TradeLimits,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if value_date < trade_date {
        violations.push(Violation::new(
            "value_date",
            "before_trade_date",
            "value date cannot precede the trade date",
        ));
    } else if value_date > trade_date + Duration::days(limits.max_value_date_offset_days) {
        violations.push(Violation::new(
            "value_date",
            "max_offset",
            format!(
                "value date is more than {} day(s) after the trade date",
                limits.max_value_date_offset_days
            ),
        ));
    }
    violations
}

fn text_rule(field: &'static str, value: Option<&str>, max_len: usize) -> Option<Violation> {
    let value = value?;
    if value.chars().count() > max_len {
        return Some(Violation::new(
            field,
            "max_length",
            format!("{field} cannot exceed {max_len} characters"),
        ));
    }
    None
}
