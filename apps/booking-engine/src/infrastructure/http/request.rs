//! HTTP request DTOs.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::trade::value_objects::TradeStatus;

/// Query parameters for the trade listing.
///
/// A complete date range takes precedence over a status filter; with
/// neither, the full listing is returned.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListTradesQuery {
    /// Inclusive range start.
    pub start_date: Option<NaiveDate>,
    /// Inclusive range end.
    pub end_date: Option<NaiveDate>,
    /// Lifecycle status filter.
    pub status: Option<TradeStatus>,
}
