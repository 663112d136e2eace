//! SQLite storage adapter.
//!
//! The engine runs in WAL mode: readers proceed concurrently with an
//! in-flight write, writes are serialized. One long-lived writer connection
//! is guarded by a mutex so in-process writers queue on the lock; every
//! write runs as an immediate transaction, which takes the database write
//! lock up front and makes the whole unit of work indivisible. Cross-process
//! writers queue on SQLite's own lock, bounded by `busy_timeout`; exceeding
//! the bound surfaces as a retryable [`TradeError::Busy`], never a hang.
//!
//! Reads open short-lived read-only connections so queries never wait behind
//! the in-process writer mutex.
//!
//! Decimals are stored as canonical text at their fixed scales, dates as
//! ISO-8601 text, timestamps as RFC 3339 text; round-trips preserve value
//! and scale exactly.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use rust_decimal::Decimal;

use crate::application::ports::{AuditRecorder, SequenceAllocator, TradeStore};
use crate::domain::audit::{AuditAction, NewAuditEntry, TradeAudit};
use crate::domain::trade::value_objects::{Direction, TradeStatus};
use crate::domain::trade::{Trade, TradeError};

const TRADE_COLUMNS: &str = "id, trade_reference, trade_date, value_date, direction, \
     base_currency, quote_currency, base_amount, exchange_rate, quote_amount, \
     counterparty, trader, notes, status, created_at, created_by, updated_at, \
     updated_by, version";

const AUDIT_COLUMNS: &str = "id, trade_id, trade_reference, audit_timestamp, audit_user, \
     action, change_details, before_snapshot, after_snapshot";

/// SQLite implementation of the storage ports.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and prepare the schema.
    ///
    /// # Errors
    ///
    /// [`TradeError::Storage`] if the database cannot be opened or the
    /// schema cannot be applied.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, TradeError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(storage_error)?;
        configure(&conn, busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(storage_error)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(storage_error)?;
        init_schema(&conn)?;
        Ok(Self {
            writer: Mutex::new(conn),
            path,
            busy_timeout,
        })
    }

    /// Short-lived read-only connection for the non-blocking read path.
    fn open_reader(&self) -> Result<Connection, TradeError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(storage_error)?;
        configure(&conn, self.busy_timeout)?;
        Ok(conn)
    }

    fn query_trades(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Trade>, TradeError> {
        let conn = self.open_reader()?;
        let mut stmt = conn.prepare(sql).map_err(storage_error)?;
        let rows = stmt
            .query_map(params, trade_from_row)
            .map_err(storage_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error)
    }
}

#[async_trait]
impl SequenceAllocator for SqliteStore {
    async fn allocate(&self, trade_date: NaiveDate) -> Result<u32, TradeError> {
        let mut conn = self.writer.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;

        let date_key = date_text(trade_date);
        let current: Option<u32> = tx
            .query_row(
                "SELECT next_sequence FROM trade_sequence WHERE trade_date = ?1",
                params![date_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_error)?;

        let now = timestamp_text(Utc::now());
        let allocated = match current {
            Some(value) => {
                tx.execute(
                    "UPDATE trade_sequence SET next_sequence = ?1, last_updated = ?2 \
                     WHERE trade_date = ?3",
                    params![value + 1, now, date_key],
                )
                .map_err(storage_error)?;
                value
            }
            None => {
                // First allocation of the day: hand out 1, persist 2 as next.
                tx.execute(
                    "INSERT INTO trade_sequence (trade_date, next_sequence, last_updated) \
                     VALUES (?1, 2, ?2)",
                    params![date_key, now],
                )
                .map_err(storage_error)?;
                1
            }
        };

        tx.commit().map_err(storage_error)?;
        Ok(allocated)
    }
}

#[async_trait]
impl TradeStore for SqliteStore {
    async fn insert_with_audit(
        &self,
        mut trade: Trade,
        acting_user: &str,
    ) -> Result<Trade, TradeError> {
        let mut conn = self.writer.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;

        let inserted = tx.execute(
            "INSERT INTO trades (trade_reference, trade_date, value_date, direction, \
             base_currency, quote_currency, base_amount, exchange_rate, quote_amount, \
             counterparty, trader, notes, status, created_at, created_by, updated_at, \
             updated_by, version) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
             ?16, ?17, ?18)",
            params![
                trade.trade_reference,
                date_text(trade.trade_date),
                date_text(trade.value_date),
                trade.direction.as_str(),
                trade.base_currency,
                trade.quote_currency,
                trade.base_amount.to_string(),
                trade.exchange_rate.to_string(),
                trade.quote_amount.to_string(),
                trade.counterparty,
                trade.trader,
                trade.notes,
                trade.status.as_str(),
                timestamp_text(trade.created_at),
                trade.created_by,
                timestamp_text(trade.updated_at),
                trade.updated_by,
                trade.version,
            ],
        );
        if let Err(err) = inserted {
            if is_reference_collision(&err) {
                return Err(TradeError::UniquenessViolation {
                    reference: trade.trade_reference,
                });
            }
            return Err(storage_error(err));
        }
        trade.id = tx.last_insert_rowid();

        let entry = NewAuditEntry::for_create(&trade, acting_user, trade.created_at)?;
        insert_audit(&tx, &entry)?;

        tx.commit().map_err(storage_error)?;
        Ok(trade)
    }

    async fn update_with_audit(
        &self,
        before: &Trade,
        after: Trade,
        acting_user: &str,
    ) -> Result<Trade, TradeError> {
        let mut conn = self.writer.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;

        let changed = tx
            .execute(
                "UPDATE trades SET status = ?1, notes = ?2, counterparty = ?3, \
                 updated_at = ?4, updated_by = ?5, version = ?6 \
                 WHERE id = ?7 AND version = ?8",
                params![
                    after.status.as_str(),
                    after.notes,
                    after.counterparty,
                    timestamp_text(after.updated_at),
                    after.updated_by,
                    after.version,
                    after.id,
                    before.version,
                ],
            )
            .map_err(storage_error)?;

        if changed == 0 {
            let persisted: Option<i64> = tx
                .query_row(
                    "SELECT version FROM trades WHERE id = ?1",
                    params![after.id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_error)?;
            return Err(match persisted {
                Some(version) => TradeError::ConcurrencyConflict {
                    id: after.id,
                    expected: before.version,
                    persisted: version,
                },
                None => TradeError::NotFound { id: after.id },
            });
        }

        let entry = NewAuditEntry::for_update(before, &after, acting_user, after.updated_at)?;
        insert_audit(&tx, &entry)?;

        tx.commit().map_err(storage_error)?;
        Ok(after)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Trade>, TradeError> {
        let conn = self.open_reader()?;
        conn.query_row(
            &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1"),
            params![id],
            trade_from_row,
        )
        .optional()
        .map_err(storage_error)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Trade>, TradeError> {
        let conn = self.open_reader()?;
        conn.query_row(
            &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE trade_reference = ?1"),
            params![reference],
            trade_from_row,
        )
        .optional()
        .map_err(storage_error)
    }

    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Trade>, TradeError> {
        self.query_trades(
            &format!(
                "SELECT {TRADE_COLUMNS} FROM trades \
                 WHERE trade_date >= ?1 AND trade_date <= ?2 \
                 ORDER BY trade_date DESC, id DESC"
            ),
            &[&date_text(start), &date_text(end)],
        )
    }

    async fn find_by_status(&self, status: TradeStatus) -> Result<Vec<Trade>, TradeError> {
        self.query_trades(
            &format!(
                "SELECT {TRADE_COLUMNS} FROM trades WHERE status = ?1 \
                 ORDER BY trade_date DESC, id DESC"
            ),
            &[&status.as_str()],
        )
    }

    async fn list_all(&self) -> Result<Vec<Trade>, TradeError> {
        self.query_trades(
            &format!("SELECT {TRADE_COLUMNS} FROM trades ORDER BY trade_date DESC, id DESC"),
            &[],
        )
    }

    async fn count_for_date(&self, trade_date: NaiveDate) -> Result<u64, TradeError> {
        let conn = self.open_reader()?;
        conn.query_row(
            "SELECT COUNT(*) FROM trades WHERE trade_date = ?1",
            params![date_text(trade_date)],
            |row| row.get(0),
        )
        .map_err(storage_error)
    }
}

#[async_trait]
impl AuditRecorder for SqliteStore {
    async fn history(&self, trade_id: i64) -> Result<Vec<TradeAudit>, TradeError> {
        let conn = self.open_reader()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {AUDIT_COLUMNS} FROM trade_audit WHERE trade_id = ?1 \
                 ORDER BY audit_timestamp DESC, id DESC"
            ))
            .map_err(storage_error)?;
        let rows = stmt
            .query_map(params![trade_id], audit_from_row)
            .map_err(storage_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error)
    }
}

fn configure(conn: &Connection, busy_timeout: Duration) -> Result<(), TradeError> {
    conn.busy_timeout(busy_timeout).map_err(storage_error)?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(storage_error)?;
    Ok(())
}

fn init_schema(conn: &Connection) -> Result<(), TradeError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trade_reference TEXT NOT NULL UNIQUE,
            trade_date TEXT NOT NULL,
            value_date TEXT NOT NULL,
            direction TEXT NOT NULL,
            base_currency TEXT NOT NULL,
            quote_currency TEXT NOT NULL,
            base_amount TEXT NOT NULL,
            exchange_rate TEXT NOT NULL,
            quote_amount TEXT NOT NULL,
            counterparty TEXT,
            trader TEXT,
            notes TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            created_by TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            updated_by TEXT NOT NULL,
            version INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_trades_trade_date ON trades(trade_date DESC);
        CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status);

        CREATE TABLE IF NOT EXISTS trade_audit (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trade_id INTEGER NOT NULL REFERENCES trades(id),
            trade_reference TEXT NOT NULL,
            audit_timestamp TEXT NOT NULL,
            audit_user TEXT NOT NULL,
            action TEXT NOT NULL,
            change_details TEXT,
            before_snapshot TEXT,
            after_snapshot TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_trade_audit_history
            ON trade_audit(trade_id, audit_timestamp DESC, id DESC);

        CREATE TABLE IF NOT EXISTS trade_sequence (
            trade_date TEXT PRIMARY KEY,
            next_sequence INTEGER NOT NULL,
            last_updated TEXT NOT NULL
        );",
    )
    .map_err(storage_error)
}

fn insert_audit(tx: &Transaction<'_>, entry: &NewAuditEntry) -> Result<(), TradeError> {
    tx.execute(
        "INSERT INTO trade_audit (trade_id, trade_reference, audit_timestamp, audit_user, \
         action, change_details, before_snapshot, after_snapshot) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.trade_id,
            entry.trade_reference,
            timestamp_text(entry.audit_timestamp),
            entry.audit_user,
            entry.action.as_str(),
            entry.change_details,
            entry.before_snapshot,
            entry.after_snapshot,
        ],
    )
    .map_err(storage_error)?;
    Ok(())
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        trade_reference: row.get(1)?,
        trade_date: parse_date(2, &row.get::<_, String>(2)?)?,
        value_date: parse_date(3, &row.get::<_, String>(3)?)?,
        direction: parse_text(4, Direction::from_str(&row.get::<_, String>(4)?))?,
        base_currency: row.get(5)?,
        quote_currency: row.get(6)?,
        base_amount: parse_text(7, Decimal::from_str(&row.get::<_, String>(7)?))?,
        exchange_rate: parse_text(8, Decimal::from_str(&row.get::<_, String>(8)?))?,
        quote_amount: parse_text(9, Decimal::from_str(&row.get::<_, String>(9)?))?,
        counterparty: row.get(10)?,
        trader: row.get(11)?,
        notes: row.get(12)?,
        status: parse_text(13, TradeStatus::from_str(&row.get::<_, String>(13)?))?,
        created_at: parse_timestamp(14, &row.get::<_, String>(14)?)?,
        created_by: row.get(15)?,
        updated_at: parse_timestamp(16, &row.get::<_, String>(16)?)?,
        updated_by: row.get(17)?,
        version: row.get(18)?,
    })
}

fn audit_from_row(row: &Row<'_>) -> rusqlite::Result<TradeAudit> {
    Ok(TradeAudit {
        id: row.get(0)?,
        trade_id: row.get(1)?,
        trade_reference: row.get(2)?,
        audit_timestamp: parse_timestamp(3, &row.get::<_, String>(3)?)?,
        audit_user: row.get(4)?,
        action: parse_text(5, AuditAction::from_str(&row.get::<_, String>(5)?))?,
        change_details: row.get(6)?,
        before_snapshot: row.get(7)?,
        after_snapshot: row.get(8)?,
    })
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn parse_date(idx: usize, text: &str) -> rusqlite::Result<NaiveDate> {
    parse_text(idx, NaiveDate::parse_from_str(text, "%Y-%m-%d"))
}

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_text(
        idx,
        DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc)),
    )
}

fn parse_text<T, E>(idx: usize, parsed: Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parsed.map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Lock-wait exhaustion maps to the retryable busy error; everything else is
/// an opaque storage failure.
fn storage_error(err: rusqlite::Error) -> TradeError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            TradeError::Busy(err.to_string())
        }
        _ => TradeError::Storage(err.to_string()),
    }
}

fn is_reference_collision(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation && msg.contains("trade_reference")
    )
}
