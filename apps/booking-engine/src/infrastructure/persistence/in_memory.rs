//! In-memory storage adapter for testing.
//!
//! Implements all three storage ports behind one `RwLock`, with the same
//! atomicity contract as the SQLite adapter: a trade write and its audit
//! entry land together or not at all. `fail_next_audit_write` injects a
//! deterministic audit failure so tests can observe the rollback behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::application::ports::{AuditRecorder, SequenceAllocator, TradeStore};
use crate::domain::audit::{NewAuditEntry, TradeAudit};
use crate::domain::trade::value_objects::TradeStatus;
use crate::domain::trade::{Trade, TradeError};

#[derive(Debug, Default)]
struct Inner {
    trades: HashMap<i64, Trade>,
    audits: Vec<TradeAudit>,
    sequences: HashMap<NaiveDate, u32>,
    next_trade_id: i64,
    next_audit_id: i64,
}

/// In-memory implementation of the storage ports.
///
/// Suitable for testing and development. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    fail_next_audit: AtomicBool,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next audit write fail, rolling back its unit of work.
    pub fn fail_next_audit_write(&self) {
        self.fail_next_audit.store(true, Ordering::SeqCst);
    }

    /// Number of persisted trades.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.inner.read().trades.len()
    }

    /// Number of persisted audit entries.
    #[must_use]
    pub fn audit_count(&self) -> usize {
        self.inner.read().audits.len()
    }

    fn record_audit(&self, inner: &mut Inner, entry: NewAuditEntry) -> Result<(), TradeError> {
        if self.fail_next_audit.swap(false, Ordering::SeqCst) {
            return Err(TradeError::Storage(
                "injected audit write failure".to_string(),
            ));
        }
        inner.next_audit_id += 1;
        inner.audits.push(TradeAudit {
            id: inner.next_audit_id,
            trade_id: entry.trade_id,
            trade_reference: entry.trade_reference,
            audit_timestamp: entry.audit_timestamp,
            audit_user: entry.audit_user,
            action: entry.action,
            change_details: entry.change_details,
            before_snapshot: entry.before_snapshot,
            after_snapshot: entry.after_snapshot,
        });
        Ok(())
    }
}

#[async_trait]
impl SequenceAllocator for InMemoryStore {
    async fn allocate(&self, trade_date: NaiveDate) -> Result<u32, TradeError> {
        let mut inner = self.inner.write();
        let next = inner.sequences.entry(trade_date).or_insert(1);
        let allocated = *next;
        *next += 1;
        Ok(allocated)
    }
}

#[async_trait]
impl TradeStore for InMemoryStore {
    async fn insert_with_audit(
        &self,
        mut trade: Trade,
        acting_user: &str,
    ) -> Result<Trade, TradeError> {
        let mut inner = self.inner.write();
        if inner
            .trades
            .values()
            .any(|t| t.trade_reference == trade.trade_reference)
        {
            return Err(TradeError::UniquenessViolation {
                reference: trade.trade_reference,
            });
        }

        inner.next_trade_id += 1;
        trade.id = inner.next_trade_id;

        let entry = NewAuditEntry::for_create(&trade, acting_user, trade.created_at)?;
        self.record_audit(&mut inner, entry)?;
        inner.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    async fn update_with_audit(
        &self,
        before: &Trade,
        after: Trade,
        acting_user: &str,
    ) -> Result<Trade, TradeError> {
        let mut inner = self.inner.write();
        let persisted_version = match inner.trades.get(&after.id) {
            Some(current) => current.version,
            None => return Err(TradeError::NotFound { id: after.id }),
        };
        if persisted_version != before.version {
            return Err(TradeError::ConcurrencyConflict {
                id: after.id,
                expected: before.version,
                persisted: persisted_version,
            });
        }

        let entry = NewAuditEntry::for_update(before, &after, acting_user, after.updated_at)?;
        self.record_audit(&mut inner, entry)?;
        inner.trades.insert(after.id, after.clone());
        Ok(after)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Trade>, TradeError> {
        Ok(self.inner.read().trades.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Trade>, TradeError> {
        Ok(self
            .inner
            .read()
            .trades
            .values()
            .find(|t| t.trade_reference == reference)
            .cloned())
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Trade>, TradeError> {
        let mut trades: Vec<Trade> = self
            .inner
            .read()
            .trades
            .values()
            .filter(|t| t.trade_date >= start && t.trade_date <= end)
            .cloned()
            .collect();
        sort_listing(&mut trades);
        Ok(trades)
    }

    async fn find_by_status(&self, status: TradeStatus) -> Result<Vec<Trade>, TradeError> {
        let mut trades: Vec<Trade> = self
            .inner
            .read()
            .trades
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        sort_listing(&mut trades);
        Ok(trades)
    }

    async fn list_all(&self) -> Result<Vec<Trade>, TradeError> {
        let mut trades: Vec<Trade> = self.inner.read().trades.values().cloned().collect();
        sort_listing(&mut trades);
        Ok(trades)
    }

    async fn count_for_date(&self, trade_date: NaiveDate) -> Result<u64, TradeError> {
        Ok(self
            .inner
            .read()
            .trades
            .values()
            .filter(|t| t.trade_date == trade_date)
            .count() as u64)
    }
}

#[async_trait]
impl AuditRecorder for InMemoryStore {
    async fn history(&self, trade_id: i64) -> Result<Vec<TradeAudit>, TradeError> {
        let mut entries: Vec<TradeAudit> = self
            .inner
            .read()
            .audits
            .iter()
            .filter(|a| a.trade_id == trade_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            (b.audit_timestamp, b.id).cmp(&(a.audit_timestamp, a.id))
        });
        Ok(entries)
    }
}

/// Trade date descending, newest id first within a date.
fn sort_listing(trades: &mut [Trade]) {
    trades.sort_by(|a, b| (b.trade_date, b.id).cmp(&(a.trade_date, a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::value_objects::Direction;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn trade(date: NaiveDate, reference: &str) -> Trade {
        let now = Utc::now();
        Trade {
            id: 0,
            trade_reference: reference.to_string(),
            trade_date: date,
            value_date: date + Duration::days(2),
            direction: Direction::Sell,
            base_currency: "GBP".to_string(),
            quote_currency: "USD".to_string(),
            base_amount: dec!(500.0000),
            exchange_rate: dec!(1.270000),
            quote_amount: dec!(635.0000),
            counterparty: None,
            trader: None,
            notes: None,
            status: TradeStatus::Pending,
            created_at: now,
            created_by: "test".to_string(),
            updated_at: now,
            updated_by: "test".to_string(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn allocations_are_sequential_per_date() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let other = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        assert_eq!(store.allocate(date).await.unwrap(), 1);
        assert_eq!(store.allocate(date).await.unwrap(), 2);
        assert_eq!(store.allocate(other).await.unwrap(), 1);
        assert_eq!(store.allocate(date).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_reference_is_rejected() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        store
            .insert_with_audit(trade(date, "FX-20260309-0001"), "test")
            .await
            .unwrap();

        let err = store
            .insert_with_audit(trade(date, "FX-20260309-0001"), "test")
            .await
            .unwrap_err();
        assert!(matches!(err, TradeError::UniquenessViolation { .. }));
        assert_eq!(store.trade_count(), 1);
        assert_eq!(store.audit_count(), 1);
    }

    #[tokio::test]
    async fn injected_audit_failure_leaves_no_trade() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        store.fail_next_audit_write();
        let err = store
            .insert_with_audit(trade(date, "FX-20260309-0001"), "test")
            .await
            .unwrap_err();
        assert!(matches!(err, TradeError::Storage(_)));
        assert_eq!(store.trade_count(), 0);
        assert_eq!(store.audit_count(), 0);
    }

    #[tokio::test]
    async fn stale_version_update_conflicts() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let booked = store
            .insert_with_audit(trade(date, "FX-20260309-0001"), "test")
            .await
            .unwrap();

        let mut first = booked.clone();
        first.notes = Some("first".to_string());
        first.version = booked.version + 1;
        store
            .update_with_audit(&booked, first, "test")
            .await
            .unwrap();

        let mut second = booked.clone();
        second.notes = Some("second".to_string());
        second.version = booked.version + 1;
        let err = store
            .update_with_audit(&booked, second, "test")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TradeError::ConcurrencyConflict {
                expected: 1,
                persisted: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn listing_is_trade_date_descending() {
        let store = InMemoryStore::new();
        let early = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let late = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        store
            .insert_with_audit(trade(early, "FX-20260302-0001"), "test")
            .await
            .unwrap();
        store
            .insert_with_audit(trade(late, "FX-20260305-0001"), "test")
            .await
            .unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed[0].trade_date, late);
        assert_eq!(listed[1].trade_date, early);
    }
}
