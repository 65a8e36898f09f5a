use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Address;
use crate::units::{amount_string, Amount};

/// Observable ledger and settlement events
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Minted {
        to: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    Burned {
        from: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    Transferred {
        from: Address,
        to: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    LoanSettled {
        borrower: Address,
        #[serde(with = "amount_string")]
        principal: Amount,
        #[serde(with = "amount_string")]
        fee: Amount,
        success: bool,
    },
}

/// Journal entry wrapping an event with its sequence number and wall time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

impl EventRecord {
    pub(crate) fn new(seq: u64, event: LedgerEvent) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            event,
        }
    }
}
