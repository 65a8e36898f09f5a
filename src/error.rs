use thiserror::Error;

use crate::ledger::Address;
use crate::units::Amount;

/// Errors that may be returned by the ledger, the lender, the liquidity
/// source and the flash swap borrower
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FlashError {
    /// Zero, malformed or out-of-range amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Caller lacks the role required for the action
    #[error("{caller} is not authorized to {action}")]
    Authorization {
        /// Account that attempted the action
        caller: Address,
        /// What was attempted
        action: &'static str,
    },

    /// A burn, transfer or debit exceeds the account balance
    #[error("Insufficient balance in {account}: available {available}, required {required}")]
    InsufficientBalance {
        /// Debited account
        account: Address,
        /// Balance at the time of the debit
        available: Amount,
        /// Amount that was requested
        required: Amount,
    },

    /// Liquidity source cannot satisfy a release request
    #[error("Liquidity source {faucet} holds {available}, cannot release {requested}")]
    InsufficientReserve {
        /// Liquidity source account
        faucet: Address,
        /// Reserve at the time of the request
        available: Amount,
        /// Amount that was requested
        requested: Amount,
    },

    /// Flash loan not repaid
    #[error("Flash loan was not fully repaid by {borrower}: due {due}, balance {balance}")]
    RepaymentShortfall {
        /// Borrower account
        borrower: Address,
        /// Principal plus fee
        due: Amount,
        /// Borrower balance after the callback returned
        balance: Amount,
    },

    /// A flash loan is already in flight on the lender
    #[error("Flash loan already in progress on lender {lender}")]
    Reentrancy {
        /// Lender that rejected the nested loan
        lender: Address,
    },

    /// Callback data could not be decoded or names an unknown liquidity source
    #[error("Invalid callback data: {0}")]
    InvalidCallbackData(String),

    /// Borrower callback failed outside the error kinds above
    #[error("Flash loan callback failed: {0}")]
    CallbackFailed(String),

    /// Math overflow
    #[error("Math overflow")]
    MathOverflow,

    /// Token configuration rejected
    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),
}

impl FlashError {
    /// Short stable name of the error kind, used in logs and exit reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FlashError::InvalidAmount(_) => "InvalidAmountError",
            FlashError::Authorization { .. } => "AuthorizationError",
            FlashError::InsufficientBalance { .. } => "InsufficientBalanceError",
            FlashError::InsufficientReserve { .. } => "InsufficientReserveError",
            FlashError::RepaymentShortfall { .. } => "RepaymentShortfallError",
            FlashError::Reentrancy { .. } => "ReentrancyError",
            FlashError::InvalidCallbackData(_) => "InvalidCallbackDataError",
            FlashError::CallbackFailed(_) => "CallbackFailedError",
            FlashError::MathOverflow => "MathOverflowError",
            FlashError::InvalidConfig(_) => "InvalidConfigError",
        }
    }
}

/// Result alias used across the crate
pub type FlashResult<T> = Result<T, FlashError>;
