use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{FlashError, FlashResult};
use crate::flash_loan::fees::{FeeQuote, FeeRate};
use crate::flash_loan::receiver::{FlashLoanReceiver, LoanContext};
use crate::ledger::{Address, Ledger, LedgerEvent};
use crate::units::{amount_string, Amount};

/// Loan record, alive for one flash loan and returned as its receipt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub borrower: Address,
    #[serde(with = "amount_string")]
    pub principal: Amount,
    #[serde(with = "amount_string")]
    pub fee: Amount,
    /// Principal plus fee
    #[serde(with = "amount_string")]
    pub due: Amount,
}

/// Issues uncollateralized same-operation loans by minting on the ledger.
///
/// The lender needs the ledger's minter role.
pub struct FlashLender {
    address: Address,
    ledger: Ledger,
    fee_rate: FeeRate,
    fee_recipient: Option<Address>,
    in_flight: AtomicBool,
}

impl FlashLender {
    /// Create a lender for `ledger`, charging the token's configured fee rate
    pub fn new(ledger: Ledger, address: Address) -> FlashResult<Self> {
        let fee_rate = FeeRate::new(ledger.fee_basis_points())?;
        Ok(Self {
            address,
            ledger,
            fee_rate,
            fee_recipient: None,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Credit fees to `recipient` instead of burning them
    pub fn with_fee_recipient(mut self, recipient: Address) -> Self {
        self.fee_recipient = Some(recipient);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn fee_rate(&self) -> FeeRate {
        self.fee_rate
    }

    pub fn fee_recipient(&self) -> Option<Address> {
        self.fee_recipient
    }

    /// Largest principal that can be minted without overflowing the supply
    pub fn max_flash_loan(&self) -> Amount {
        Amount::MAX - self.ledger.total_supply()
    }

    /// Fee charged for a loan of `amount`
    pub fn flash_fee(&self, amount: Amount) -> FlashResult<Amount> {
        self.fee_rate.fee_for(amount)
    }

    /// Lend `amount` to `receiver` for the duration of its callback.
    ///
    /// Either the whole loan commits (principal minted and burned back, fee
    /// collected) or nothing it caused is left on the ledger.
    pub fn flash_loan<R>(&self, receiver: &mut R, amount: Amount, data: &[u8]) -> FlashResult<Loan>
    where
        R: FlashLoanReceiver + ?Sized,
    {
        if amount == 0 {
            return Err(FlashError::InvalidAmount("flash loan amount must be positive".to_string()));
        }

        let _in_flight = self.enter()?;

        let max = self.max_flash_loan();
        if amount > max {
            return Err(FlashError::InvalidAmount(format!(
                "flash loan of {} exceeds maximum {}",
                amount, max
            )));
        }

        let FeeQuote { fee, due } = self.fee_rate.quote(amount)?;
        let loan = Loan {
            borrower: receiver.address(),
            principal: amount,
            fee,
            due,
        };

        log::info!(
            "Flash loan: borrower={}, amount={}, fee={}, repay={}",
            loan.borrower,
            amount,
            fee,
            due
        );

        let tx = self.ledger.begin();
        match self.settle(receiver, &loan, data) {
            Ok(()) => {
                tx.commit();
                log::info!("Flash loan settled for {}", loan.borrower);
                Ok(loan)
            }
            Err(err) => {
                tx.rollback();
                log::warn!("Flash loan to {} rolled back: {}", loan.borrower, err);
                self.ledger.record(LedgerEvent::LoanSettled {
                    borrower: loan.borrower,
                    principal: loan.principal,
                    fee: loan.fee,
                    success: false,
                });
                Err(err)
            }
        }
    }

    /// Mint, run the callback, check the balance, collect. Runs inside the loan transaction.
    fn settle<R>(&self, receiver: &mut R, loan: &Loan, data: &[u8]) -> FlashResult<()>
    where
        R: FlashLoanReceiver + ?Sized,
    {
        // Step 1: Issue the principal
        self.ledger.mint(&self.address, &loan.borrower, loan.principal)?;

        // Step 2: Hand control to the borrower
        let ctx = LoanContext::new(&self.ledger, self.address, *loan);
        panic::catch_unwind(AssertUnwindSafe(|| {
            receiver.on_flash_loan(&ctx, loan.principal, loan.fee, data)
        }))
        .map_err(|payload| FlashError::CallbackFailed(panic_message(payload.as_ref())))??;

        // Step 3: Verify repayment
        let balance = self.ledger.balance_of(&loan.borrower);
        if balance < loan.due {
            log::warn!(
                "Flash loan not repaid! Expected: {}, Got: {}",
                loan.due,
                balance
            );
            return Err(FlashError::RepaymentShortfall {
                borrower: loan.borrower,
                due: loan.due,
                balance,
            });
        }

        // Step 4: Collect principal and fee
        match self.fee_recipient {
            Some(recipient) if loan.fee > 0 => {
                self.ledger.burn(&self.address, &loan.borrower, loan.principal)?;
                self.ledger.transfer(&loan.borrower, &recipient, loan.fee)?;
            }
            _ => self.ledger.burn(&self.address, &loan.borrower, loan.due)?,
        }

        self.ledger.record(LedgerEvent::LoanSettled {
            borrower: loan.borrower,
            principal: loan.principal,
            fee: loan.fee,
            success: true,
        });
        Ok(())
    }

    fn enter(&self) -> FlashResult<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                log::warn!("Rejected nested flash loan on lender {}", self.address);
                FlashError::Reentrancy {
                    lender: self.address,
                }
            })?;
        Ok(InFlight(&self.in_flight))
    }
}

/// Clears the in-flight flag when the loan ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("callback panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("callback panicked: {}", msg)
    } else {
        "callback panicked".to_string()
    }
}
