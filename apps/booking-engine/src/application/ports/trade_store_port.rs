//! Trade Store Port (Driven Port)
//!
//! Interface for persisting and querying trades. The write methods persist
//! the trade row and its audit entry in one atomic unit of work: either both
//! commit or neither does. A trade without an audit entry, or an audit entry
//! for a trade that was rolled back, is never observable.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::trade::value_objects::TradeStatus;
use crate::domain::trade::{Trade, TradeError};

/// Port for trade persistence.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Persist a new trade together with its CREATE audit entry.
    ///
    /// Assigns the surrogate id and returns the persisted state. The audit
    /// entry is built from the persisted state (null before-snapshot) and
    /// written in the same transaction.
    ///
    /// # Errors
    ///
    /// [`TradeError::UniquenessViolation`] if the trade reference collides;
    /// with a correct allocator this indicates an allocator bug and is not
    /// retryable.
    async fn insert_with_audit(&self, trade: Trade, acting_user: &str)
        -> Result<Trade, TradeError>;

    /// Persist a mutated trade together with its UPDATE audit entry.
    ///
    /// The write is guarded by an optimistic version check against
    /// `before.version`: if the persisted version has moved, nothing is
    /// written and the caller gets [`TradeError::ConcurrencyConflict`].
    /// `after` must carry the incremented version and fresh provenance
    /// stamps. The audit entry captures both states and is written in the
    /// same transaction.
    async fn update_with_audit(
        &self,
        before: &Trade,
        after: Trade,
        acting_user: &str,
    ) -> Result<Trade, TradeError>;

    /// Look up a trade by surrogate id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Trade>, TradeError>;

    /// Look up a trade by its unique reference.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Trade>, TradeError>;

    /// Trades with a trade date in `[start, end]`, trade date descending.
    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Trade>, TradeError>;

    /// Trades in the given lifecycle status, trade date descending.
    async fn find_by_status(&self, status: TradeStatus) -> Result<Vec<Trade>, TradeError>;

    /// All trades, trade date descending.
    async fn list_all(&self) -> Result<Vec<Trade>, TradeError>;

    /// Number of trades booked for a trade date.
    async fn count_for_date(&self, trade_date: NaiveDate) -> Result<u64, TradeError>;
}
