//! Flash Mint SDK - atomic flash loan and flash swap settlement
//!
//! A token ledger that can issue uncollateralized loans which must be repaid,
//! with a fee, before the operation that issued them completes. If the
//! borrower comes up short, the issuance and everything the borrower did with
//! it is rolled back.
//!
//! # Example Usage
//!
//! ```
//! use flash_mint_sdk::prelude::*;
//!
//! fn main() -> Result<(), FlashError> {
//!     let owner = Address::new_unique();
//!     let ledger = Ledger::new(TokenConfig::new("Stonks Token", "Stt", 100), owner)?;
//!
//!     let lender = FlashLender::new(ledger.clone(), Address::new_unique())?;
//!     ledger.grant_minter(&owner, lender.address())?;
//!
//!     let faucet = LiquiditySource::new(ledger.clone(), Address::new_unique());
//!     ledger.mint(&owner, &faucet.address(), tokens(1_000))?;
//!
//!     let mut borrower = FlashSwap::new(ledger.clone(), Address::new_unique());
//!     let outcome = borrower.flash_borrow(&lender, tokens(10), &faucet, tokens(5))?;
//!
//!     assert_eq!(format_units(outcome.profit), "4.9");
//!     assert_eq!(format_units(ledger.total_supply()), "999.9");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod flash_loan;
pub mod ledger;
pub mod units;

// Re-export commonly used types
pub use error::{FlashError, FlashResult};
pub use flash_loan::{
    BorrowerInstruction, FeeRate, FlashLender, FlashLoanReceiver, FlashSwap, LiquiditySource,
    Loan, LoanContext, SwapOutcome,
};
pub use ledger::{Address, EventRecord, Ledger, LedgerEvent, LedgerTransaction, TokenConfig};
pub use units::{format_units, parse_units, tokens, Amount};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{FlashError, FlashResult};
    pub use crate::flash_loan::{
        FeeRate, FlashLender, FlashLoanReceiver, FlashSwap, LiquiditySource, Loan, LoanContext,
        SwapOutcome,
    };
    pub use crate::ledger::{Address, EventRecord, Ledger, LedgerEvent, TokenConfig};
    pub use crate::units::{format_units, parse_units, tokens, Amount, WAD};
}
