//! Flash Swap Demo - deploy a flash-mintable token and run one flash swap
//!
//! Plays the part of a deployment script against the in-process ledger: the
//! token, lender, borrower and liquidity source are created, the source is
//! funded, and a single flash borrow is executed with balances reported
//! before and after.
//!
//! # Example Usage
//!
//! ```
//! use flash_swap_demo::prelude::*;
//!
//! let mut deployment = Deployment::deploy(TokenConfig::new("Stonks Token", "Stt", 100), tokens(10))
//!     .unwrap();
//! let outcome = deployment.run_flash_swap(tokens(10), tokens(5)).unwrap();
//! assert_eq!(format_units(outcome.loan.fee), "0.1");
//! println!("{}", deployment.balances());
//! ```

pub mod deployment;
pub mod report;

pub use deployment::{Deployment, RESERVE_MULTIPLIER};
pub use report::BalanceReport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::deployment::{Deployment, RESERVE_MULTIPLIER};
    pub use crate::report::BalanceReport;
    pub use flash_mint_sdk::prelude::*;
}
