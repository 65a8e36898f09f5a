use crate::error::{FlashError, FlashResult};
use crate::flash_loan::faucet::LiquiditySource;
use crate::flash_loan::provider::Loan;
use crate::ledger::{Address, Ledger};
use crate::units::Amount;

/// Callback capability a borrower hands to [`super::FlashLender::flash_loan`].
///
/// The lender mints the principal to [`address`](Self::address), calls
/// [`on_flash_loan`](Self::on_flash_loan) once, and afterwards burns
/// principal plus fee from that account itself. The receiver never repays
/// explicitly; it only has to leave enough tokens behind.
pub trait FlashLoanReceiver {
    /// Account that receives the principal and is charged the repayment
    fn address(&self) -> Address;

    /// Runs while the loan is live. Any error, or a panic, rolls the whole loan back.
    fn on_flash_loan(
        &mut self,
        ctx: &LoanContext<'_>,
        amount: Amount,
        fee: Amount,
        data: &[u8],
    ) -> FlashResult<()>;
}

/// Everything a receiver may do while its loan is live
pub struct LoanContext<'a> {
    ledger: &'a Ledger,
    lender: Address,
    loan: Loan,
}

impl<'a> LoanContext<'a> {
    pub(crate) fn new(ledger: &'a Ledger, lender: Address, loan: Loan) -> Self {
        Self {
            ledger,
            lender,
            loan,
        }
    }

    pub fn lender(&self) -> Address {
        self.lender
    }

    pub fn loan(&self) -> &Loan {
        &self.loan
    }

    /// Borrower's current balance, principal included
    pub fn balance(&self) -> Amount {
        self.ledger.balance_of(&self.loan.borrower)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    /// Move tokens out of the borrower account
    pub fn transfer(&self, to: &Address, amount: Amount) -> FlashResult<()> {
        self.ledger.transfer(&self.loan.borrower, to, amount)
    }

    /// Pull `amount` from a liquidity source into the borrower account
    pub fn draw_liquidity(&self, source: &LiquiditySource, amount: Amount) -> FlashResult<()> {
        if !source.ledger().same_ledger(self.ledger) {
            return Err(FlashError::InvalidCallbackData(format!(
                "liquidity source {} holds a different token",
                source.address()
            )));
        }
        source.release(&self.loan.borrower, &self.loan.borrower, amount)
    }
}
