//! Audit trail domain: immutable before/after records of every mutation.
//!
//! Snapshots are built from immutable clones of the entity taken before and
//! after the mutation, then serialized independently; the audit entry never
//! aliases live state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::trade::value_objects::ParseValueError;
use crate::domain::trade::{Trade, TradeError};

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Trade was booked.
    Create,
    /// Trade was mutated.
    Update,
}

impl AuditAction {
    /// Canonical storage/display form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            other => Err(ParseValueError::new("audit action", other)),
        }
    }
}

/// An audit entry ready to be persisted (id not yet assigned).
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// Trade the entry belongs to.
    pub trade_id: i64,
    /// Denormalized reference for query convenience.
    pub trade_reference: String,
    /// When the mutation was recorded.
    pub audit_timestamp: DateTime<Utc>,
    /// Identity that performed the mutation.
    pub audit_user: String,
    /// What the mutation did.
    pub action: AuditAction,
    /// Changed field names, comma-joined; absent for CREATE.
    pub change_details: Option<String>,
    /// Full entity state before the mutation; absent for CREATE.
    pub before_snapshot: Option<String>,
    /// Full entity state after the mutation.
    pub after_snapshot: String,
}

impl NewAuditEntry {
    /// Build the CREATE entry for a freshly persisted trade.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot cannot be serialized.
    pub fn for_create(
        trade: &Trade,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, TradeError> {
        Ok(Self {
            trade_id: trade.id,
            trade_reference: trade.trade_reference.clone(),
            audit_timestamp: at,
            audit_user: acting_user.to_string(),
            action: AuditAction::Create,
            change_details: None,
            before_snapshot: None,
            after_snapshot: snapshot(trade)?,
        })
    }

    /// Build the UPDATE entry from the states before and after a mutation.
    ///
    /// # Errors
    ///
    /// Fails if either snapshot cannot be serialized.
    pub fn for_update(
        before: &Trade,
        after: &Trade,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, TradeError> {
        let changed = changed_fields(before, after);
        Ok(Self {
            trade_id: after.id,
            trade_reference: after.trade_reference.clone(),
            audit_timestamp: at,
            audit_user: acting_user.to_string(),
            action: AuditAction::Update,
            change_details: if changed.is_empty() {
                None
            } else {
                Some(changed.join(", "))
            },
            before_snapshot: Some(snapshot(before)?),
            after_snapshot: snapshot(after)?,
        })
    }
}

/// A persisted audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeAudit {
    /// Surrogate id.
    pub id: i64,
    /// Trade the entry belongs to.
    pub trade_id: i64,
    /// Denormalized reference for query convenience.
    pub trade_reference: String,
    /// When the mutation was recorded.
    pub audit_timestamp: DateTime<Utc>,
    /// Identity that performed the mutation.
    pub audit_user: String,
    /// What the mutation did.
    pub action: AuditAction,
    /// Changed field names, comma-joined; absent for CREATE.
    pub change_details: Option<String>,
    /// Full entity state before the mutation; absent for CREATE.
    pub before_snapshot: Option<String>,
    /// Full entity state after the mutation.
    pub after_snapshot: String,
}

/// Serialize the full entity state for an audit snapshot.
///
/// # Errors
///
/// Fails if serialization fails (structurally impossible for [`Trade`], but
/// never silently swallowed).
pub fn snapshot(trade: &Trade) -> Result<String, TradeError> {
    serde_json::to_string(trade).map_err(|e| TradeError::Snapshot(e.to_string()))
}

/// Names of the fields that differ between two states of a trade.
///
/// Provenance stamps (`updated_at`, `updated_by`, `version`) are excluded:
/// they change on every mutation and carry no information.
#[must_use]
pub fn changed_fields(before: &Trade, after: &Trade) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if before.status != after.status {
        changed.push("status");
    }
    if before.notes != after.notes {
        changed.push("notes");
    }
    if before.counterparty != after.counterparty {
        changed.push("counterparty");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::value_objects::{Direction, TradeStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade() -> Trade {
        let booked_at = DateTime::parse_from_rfc3339("2026-03-06T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Trade {
            id: 42,
            trade_reference: "FX-20260306-0007".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            value_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            direction: Direction::Buy,
            base_currency: "EUR".to_string(),
            quote_currency: "USD".to_string(),
            base_amount: dec!(1000000.0000),
            exchange_rate: dec!(1.085000),
            quote_amount: dec!(1085000.0000),
            counterparty: Some("ACME Bank".to_string()),
            trader: Some("jsmith".to_string()),
            notes: None,
            status: TradeStatus::Pending,
            created_at: booked_at,
            created_by: "jsmith".to_string(),
            updated_at: booked_at,
            updated_by: "jsmith".to_string(),
            version: 1,
        }
    }

    #[test]
    fn create_entry_has_no_before_state() {
        let t = trade();
        let entry = NewAuditEntry::for_create(&t, "jsmith", Utc::now()).unwrap();
        assert_eq!(entry.action, AuditAction::Create);
        assert!(entry.before_snapshot.is_none());
        assert!(entry.change_details.is_none());
        assert!(entry.after_snapshot.contains("FX-20260306-0007"));
        assert!(entry.after_snapshot.contains("PENDING"));
    }

    #[test]
    fn update_entry_captures_both_states() {
        let before = trade();
        let mut after = before.clone();
        after.status = TradeStatus::Confirmed;
        after.version = 2;

        let entry = NewAuditEntry::for_update(&before, &after, "ops", Utc::now()).unwrap();
        assert_eq!(entry.action, AuditAction::Update);
        assert!(entry.before_snapshot.as_deref().unwrap().contains("PENDING"));
        assert!(entry.after_snapshot.contains("CONFIRMED"));
        assert_eq!(entry.change_details.as_deref(), Some("status"));
    }

    #[test]
    fn snapshot_preserves_amount_text() {
        let json = snapshot(&trade()).unwrap();
        assert!(json.contains("1085000.0000"));
        assert!(json.contains("1.085000"));
    }

    #[test]
    fn changed_fields_ignores_provenance() {
        let before = trade();
        let mut after = before.clone();
        after.updated_by = "someone-else".to_string();
        after.version = 2;
        assert!(changed_fields(&before, &after).is_empty());

        after.notes = Some("re-papered".to_string());
        after.counterparty = Some("Other Bank".to_string());
        assert_eq!(
            changed_fields(&before, &after),
            vec!["notes", "counterparty"]
        );
    }

    #[test]
    fn audit_action_parse_roundtrip() {
        assert_eq!("CREATE".parse::<AuditAction>().unwrap(), AuditAction::Create);
        assert_eq!("UPDATE".parse::<AuditAction>().unwrap(), AuditAction::Update);
        assert!("DELETE".parse::<AuditAction>().is_err());
    }
}
