use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{FlashError, FlashResult};
use crate::flash_loan::faucet::LiquiditySource;
use crate::flash_loan::instruction::BorrowerInstruction;
use crate::flash_loan::provider::{FlashLender, Loan};
use crate::flash_loan::receiver::{FlashLoanReceiver, LoanContext};
use crate::ledger::{Address, Ledger};
use crate::units::{amount_string, Amount};

/// Result of one successful flash swap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SwapOutcome {
    pub loan: Loan,
    /// Tokens drawn from the liquidity source during the loan
    #[serde(with = "amount_string")]
    pub extracted: Amount,
    /// `extracted - fee` when the extraction covered the fee
    #[serde(with = "amount_string")]
    pub profit: Amount,
    /// `fee - extracted` paid out of the borrower's prior holdings
    #[serde(with = "amount_string")]
    pub subsidy: Amount,
}

/// Borrower that uses a flash loan to draw from a liquidity source
pub struct FlashSwap {
    address: Address,
    ledger: Ledger,
    faucets: BTreeMap<Address, LiquiditySource>,
    last_extraction: Amount,
}

impl FlashSwap {
    pub fn new(ledger: Ledger, address: Address) -> Self {
        Self {
            address,
            ledger,
            faucets: BTreeMap::new(),
            last_extraction: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn balance(&self) -> Amount {
        self.ledger.balance_of(&self.address)
    }

    /// Make a liquidity source reachable from callback data and register with it
    pub fn connect(&mut self, faucet: &LiquiditySource) -> FlashResult<()> {
        if !faucet.ledger().same_ledger(&self.ledger) {
            return Err(FlashError::InvalidConfig(format!(
                "liquidity source {} holds a different token",
                faucet.address()
            )));
        }
        faucet.register_borrower(self.address);
        self.faucets.insert(faucet.address(), faucet.clone());
        Ok(())
    }

    /// Borrow `principal` from `lender` and draw `extraction` from `faucet` while the loan is live.
    ///
    /// The loan is repaid out of the borrower account afterwards, so the
    /// extraction plus any prior holdings must cover the fee.
    pub fn flash_borrow(
        &mut self,
        lender: &FlashLender,
        principal: Amount,
        faucet: &LiquiditySource,
        extraction: Amount,
    ) -> FlashResult<SwapOutcome> {
        if !self.faucets.contains_key(&faucet.address()) {
            self.connect(faucet)?;
        }

        let data = BorrowerInstruction::FlashSwap {
            faucet: faucet.address(),
            extraction,
        }
        .pack();

        log::debug!(
            "Flash swap: borrower={}, principal={}, faucet={}, extraction={}",
            self.address,
            principal,
            faucet.address(),
            extraction
        );

        self.last_extraction = 0;
        let loan = lender.flash_loan(self, principal, &data)?;
        let extracted = self.last_extraction;

        Ok(SwapOutcome {
            loan,
            extracted,
            profit: extracted.saturating_sub(loan.fee),
            subsidy: loan.fee.saturating_sub(extracted),
        })
    }
}

impl FlashLoanReceiver for FlashSwap {
    fn address(&self) -> Address {
        self.address
    }

    fn on_flash_loan(
        &mut self,
        ctx: &LoanContext<'_>,
        amount: Amount,
        fee: Amount,
        data: &[u8],
    ) -> FlashResult<()> {
        log::debug!("Received flash loan: amount={}, fee={}", amount, fee);

        match BorrowerInstruction::unpack(data)? {
            BorrowerInstruction::FlashSwap { faucet, extraction } => {
                let source = self.faucets.get(&faucet).ok_or_else(|| {
                    FlashError::InvalidCallbackData(format!("unknown liquidity source {}", faucet))
                })?;
                if extraction > 0 {
                    ctx.draw_liquidity(source, extraction)?;
                }
                self.last_extraction = extraction;
            }
        }

        log::debug!(
            "Flash swap callback done, balance {} against {} due",
            ctx.balance(),
            ctx.loan().due
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TokenConfig;
    use crate::units::{parse_units, tokens};

    struct Market {
        ledger: Ledger,
        lender: FlashLender,
        faucet: LiquiditySource,
        borrower: FlashSwap,
    }

    fn market(reserve: Amount) -> Market {
        let owner = Address::new_unique();
        let ledger = Ledger::new(TokenConfig::new("Stonks Token", "Stt", 100), owner).unwrap();
        let lender = FlashLender::new(ledger.clone(), Address::new_unique()).unwrap();
        ledger.grant_minter(&owner, lender.address()).unwrap();
        let faucet = LiquiditySource::new(ledger.clone(), Address::new_unique());
        ledger.mint(&owner, &faucet.address(), reserve).unwrap();
        let borrower = FlashSwap::new(ledger.clone(), Address::new_unique());
        Market {
            ledger,
            lender,
            faucet,
            borrower,
        }
    }

    #[test]
    fn test_profitable_swap() {
        let mut m = market(tokens(1_000));

        let outcome = m
            .borrower
            .flash_borrow(&m.lender, tokens(10), &m.faucet, tokens(5))
            .unwrap();

        assert_eq!(outcome.extracted, tokens(5));
        assert_eq!(outcome.profit, parse_units("4.9").unwrap());
        assert_eq!(outcome.subsidy, 0);
        assert_eq!(m.borrower.balance(), parse_units("4.9").unwrap());
        assert_eq!(m.faucet.reserve(), tokens(995));
        assert_eq!(m.ledger.total_supply(), parse_units("999.9").unwrap());
    }

    #[test]
    fn test_unfunded_swap_reverts() {
        let mut m = market(tokens(1_000));

        let err = m
            .borrower
            .flash_borrow(&m.lender, tokens(10), &m.faucet, parse_units("0.05").unwrap())
            .unwrap_err();

        assert!(matches!(err, FlashError::RepaymentShortfall { .. }));
        assert_eq!(m.borrower.balance(), 0);
        assert_eq!(m.faucet.reserve(), tokens(1_000));
        assert_eq!(m.ledger.total_supply(), tokens(1_000));
    }

    #[test]
    fn test_subsidized_swap() {
        let mut m = market(tokens(1_000));
        // Prior holdings cover the part of the fee the extraction does not
        m.borrower.connect(&m.faucet).unwrap();
        m.faucet
            .release(&m.borrower.address(), &m.borrower.address(), tokens(1))
            .unwrap();

        let outcome = m
            .borrower
            .flash_borrow(&m.lender, tokens(10), &m.faucet, parse_units("0.04").unwrap())
            .unwrap();

        assert_eq!(outcome.profit, 0);
        assert_eq!(outcome.subsidy, parse_units("0.06").unwrap());
        assert_eq!(m.borrower.balance(), parse_units("0.94").unwrap());
    }

    #[test]
    fn test_unknown_faucet_in_callback_data() {
        let mut m = market(tokens(1_000));
        let data = BorrowerInstruction::FlashSwap {
            faucet: Address::new_unique(),
            extraction: tokens(1),
        }
        .pack();

        let err = m.lender.flash_loan(&mut m.borrower, tokens(10), &data).unwrap_err();

        assert!(matches!(err, FlashError::InvalidCallbackData(_)));
        assert_eq!(m.ledger.total_supply(), tokens(1_000));
    }

    #[test]
    fn test_faucet_on_other_ledger_rejected() {
        let mut m = market(tokens(1_000));
        let other = market(tokens(1_000));
        assert!(matches!(
            m.borrower.connect(&other.faucet),
            Err(FlashError::InvalidConfig(_))
        ));
    }
}
