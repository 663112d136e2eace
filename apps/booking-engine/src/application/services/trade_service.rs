//! Trade service: the write-path orchestrator.
//!
//! Composes validation, sequence allocation, reference formatting, derived
//! amount computation and the audited persistence calls. The acting user is
//! always an explicit parameter; the service never reaches into ambient
//! context to find out who is calling.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::application::ports::{AuditRecorder, SequenceAllocator, TradeStore};
use crate::domain::audit::TradeAudit;
use crate::domain::trade::services::StatusStateMachine;
use crate::domain::trade::validation::{validate_draft, validate_update, TradeLimits};
use crate::domain::trade::value_objects::TradeStatus;
use crate::domain::trade::{
    derive_quote_amount, format_trade_reference, Trade, TradeDraft, TradeError, TradeUpdate,
};

/// Listing filter. A date range takes precedence over a status filter; with
/// neither, the full listing is returned (trade date descending).
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeFilter {
    /// Inclusive trade date range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Lifecycle status.
    pub status: Option<TradeStatus>,
}

/// Orchestrator for trade booking, mutation and queries.
pub struct TradeService<A, S, R>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    allocator: Arc<A>,
    store: Arc<S>,
    audit: Arc<R>,
    limits: TradeLimits,
}

impl<A, S, R> TradeService<A, S, R>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    /// Create a new trade service over the given ports.
    pub fn new(allocator: Arc<A>, store: Arc<S>, audit: Arc<R>, limits: TradeLimits) -> Self {
        Self {
            allocator,
            store,
            audit,
            limits,
        }
    }

    /// Book a new trade.
    ///
    /// Validates the draft, allocates a date-scoped reference, derives the
    /// quote amount when not supplied, stamps provenance with `acting_user`
    /// and persists the trade together with its CREATE audit entry in one
    /// atomic unit of work.
    ///
    /// # Errors
    ///
    /// [`TradeError::Validation`] with the full set of violated rules when
    /// the draft is rejected; storage errors from the allocation or the
    /// insert, in which case nothing was persisted.
    pub async fn record_trade(
        &self,
        draft: TradeDraft,
        acting_user: &str,
    ) -> Result<Trade, TradeError> {
        let today = Utc::now().date_naive();
        let economics =
            validate_draft(&draft, &self.limits, today).map_err(TradeError::Validation)?;

        let sequence = self.allocator.allocate(draft.trade_date).await?;
        let trade_reference = format_trade_reference(draft.trade_date, sequence);

        let quote_amount = economics
            .quote_amount
            .unwrap_or_else(|| derive_quote_amount(economics.base_amount, economics.exchange_rate));

        let now = Utc::now();
        let trade = Trade {
            id: 0,
            trade_reference,
            trade_date: draft.trade_date,
            value_date: draft.value_date,
            direction: draft.direction,
            base_currency: draft.base_currency,
            quote_currency: draft.quote_currency,
            base_amount: economics.base_amount,
            exchange_rate: economics.exchange_rate,
            quote_amount,
            counterparty: draft.counterparty,
            trader: draft.trader,
            notes: draft.notes,
            status: TradeStatus::Pending,
            created_at: now,
            created_by: acting_user.to_string(),
            updated_at: now,
            updated_by: acting_user.to_string(),
            version: 1,
        };

        let persisted = self.store.insert_with_audit(trade, acting_user).await?;
        tracing::info!(
            trade_reference = %persisted.trade_reference,
            trade_id = persisted.id,
            user = acting_user,
            "booked trade"
        );
        Ok(persisted)
    }

    /// Apply a partial update to an existing trade.
    ///
    /// Only status, notes and counterparty are mutable; absent fields are
    /// left untouched. The full before-state is captured first, the status
    /// transition is checked against the forward-only lifecycle, and the
    /// write is guarded by an optimistic version check. Exactly one UPDATE
    /// audit entry with both snapshots is written in the same transaction.
    ///
    /// # Errors
    ///
    /// [`TradeError::NotFound`] for an unknown id,
    /// [`TradeError::Validation`] for text bounds or a backward status move,
    /// [`TradeError::ConcurrencyConflict`] when a concurrent update won the
    /// version race (re-read and retry).
    pub async fn update_trade(
        &self,
        id: i64,
        update: TradeUpdate,
        acting_user: &str,
    ) -> Result<Trade, TradeError> {
        validate_update(&update).map_err(TradeError::Validation)?;

        let before = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(TradeError::NotFound { id })?;

        if let Some(new_status) = update.status {
            StatusStateMachine::validate_transition(before.status, new_status)?;
        }

        let mut after = before.clone();
        if let Some(status) = update.status {
            after.status = status;
        }
        if let Some(notes) = update.notes {
            after.notes = Some(notes);
        }
        if let Some(counterparty) = update.counterparty {
            after.counterparty = Some(counterparty);
        }
        after.updated_at = Utc::now();
        after.updated_by = acting_user.to_string();
        after.version = before.version + 1;

        let persisted = self.store.update_with_audit(&before, after, acting_user).await?;
        tracing::info!(
            trade_reference = %persisted.trade_reference,
            trade_id = persisted.id,
            version = persisted.version,
            user = acting_user,
            "updated trade"
        );
        Ok(persisted)
    }

    /// Look up a trade by id.
    ///
    /// # Errors
    ///
    /// [`TradeError::NotFound`] when no trade has the given id.
    pub async fn find_by_id(&self, id: i64) -> Result<Trade, TradeError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(TradeError::NotFound { id })
    }

    /// Look up a trade by its unique reference.
    pub async fn find_by_reference(&self, reference: &str) -> Result<Option<Trade>, TradeError> {
        self.store.find_by_reference(reference).await
    }

    /// List trades matching the filter.
    pub async fn list_trades(&self, filter: TradeFilter) -> Result<Vec<Trade>, TradeError> {
        if let Some((start, end)) = filter.date_range {
            self.store.find_by_date_range(start, end).await
        } else if let Some(status) = filter.status {
            self.store.find_by_status(status).await
        } else {
            self.store.list_all().await
        }
    }

    /// Number of trades booked for a trade date.
    pub async fn count_for_date(&self, trade_date: NaiveDate) -> Result<u64, TradeError> {
        self.store.count_for_date(trade_date).await
    }

    /// Audit history for a trade, most-recent-first.
    ///
    /// An unknown id yields an empty history, not an error.
    pub async fn audit_history(&self, trade_id: i64) -> Result<Vec<TradeAudit>, TradeError> {
        self.audit.history(trade_id).await
    }
}
