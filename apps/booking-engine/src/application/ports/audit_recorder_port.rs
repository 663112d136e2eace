//! Audit Recorder Port (Driven Port)
//!
//! Read interface over the append-only audit trail. Audit entries are
//! written through [`TradeStore`](super::TradeStore)'s write methods, inside
//! the same transaction as the trade row; this port only reads them back.

use async_trait::async_trait;

use crate::domain::audit::TradeAudit;
use crate::domain::trade::TradeError;

/// Port for reading the audit history of a trade.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Full audit history for a trade, most-recent-first by
    /// `(audit_timestamp, id)`.
    ///
    /// An unknown trade id yields an empty list, not an error.
    async fn history(&self, trade_id: i64) -> Result<Vec<TradeAudit>, TradeError>;
}
