//! Sequence Allocator Port (Driven Port)
//!
//! Interface for allocating date-scoped trade sequence numbers.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::trade::TradeError;

/// Port for allocating the next sequence number for a calendar date.
///
/// For a given date, allocations return exactly 1, 2, 3, … in allocation
/// order; two callers never receive the same value, no matter how they
/// interleave. The read-increment-persist step is indivisible: if the
/// incremented counter cannot be persisted, the caller gets an error, not a
/// sequence number. Allocators for different dates operate independently.
///
/// An allocated sequence that is never committed to a trade leaves a gap in
/// the issued references. That is acceptable; uniqueness is the contract,
/// not density.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Allocate the next sequence number for `trade_date`.
    async fn allocate(&self, trade_date: NaiveDate) -> Result<u32, TradeError>;
}
