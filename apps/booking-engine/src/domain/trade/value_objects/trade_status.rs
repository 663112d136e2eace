//! Trade lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseValueError;

/// Lifecycle status of a booked trade.
///
/// The lifecycle is strictly forward-only: PENDING → CONFIRMED → SETTLED.
/// Settlement is irreversible, so a settled trade never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    /// Booked, awaiting confirmation.
    Pending,
    /// Confirmed with the counterparty.
    Confirmed,
    /// Settled; terminal.
    Settled,
}

impl TradeStatus {
    /// Position of this status in the forward-only lifecycle.
    #[must_use]
    pub const fn stage(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Settled => 2,
        }
    }

    /// Returns true if the trade is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled)
    }

    /// Canonical storage/display form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Settled => "SETTLED",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SETTLED" => Ok(Self::Settled),
            other => Err(ParseValueError::new("trade status", other)),
        }
    }
}
