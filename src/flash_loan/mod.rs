/// Flash loan settlement
///
/// This module provides:
/// - The lender that mints, calls back and verifies repayment atomically
/// - The receiver capability a borrower implements, and the packed callback data
/// - A liquidity source and a flash swap borrower that draws from it

pub mod borrower;
pub mod faucet;
pub mod fees;
pub mod instruction;
pub mod provider;
pub mod receiver;

pub use borrower::{FlashSwap, SwapOutcome};
pub use faucet::LiquiditySource;
pub use fees::{FeeQuote, FeeRate, MAX_BASIS_POINTS};
pub use instruction::BorrowerInstruction;
pub use provider::{FlashLender, Loan};
pub use receiver::{FlashLoanReceiver, LoanContext};
