use flash_mint_sdk::prelude::*;

use crate::report::BalanceReport;

/// The liquidity source is funded with this many times the loan amount
pub const RESERVE_MULTIPLIER: Amount = 100;

/// Every actor of one flash swap run, wired to a single ledger
pub struct Deployment {
    pub owner: Address,
    pub ledger: Ledger,
    pub lender: FlashLender,
    pub faucet: LiquiditySource,
    pub borrower: FlashSwap,
}

impl Deployment {
    /// Deploy token, lender, borrower and liquidity source, then fund the
    /// source with `loan_amount * RESERVE_MULTIPLIER` tokens
    pub fn deploy(config: TokenConfig, loan_amount: Amount) -> FlashResult<Self> {
        let owner = Address::new_random();

        log::info!("Deploying token {} ({})", config.name, config.symbol);
        let ledger = Ledger::new(config, owner)?;

        log::info!("Deploying flash lender");
        let lender = FlashLender::new(ledger.clone(), Address::new_random())?;
        ledger.grant_minter(&owner, lender.address())?;
        log::info!("Flash lender deployed at {}", lender.address());

        log::info!("Deploying flash swap borrower");
        let mut borrower = FlashSwap::new(ledger.clone(), Address::new_random());
        log::info!("Flash swap borrower deployed at {}", borrower.address());

        log::info!("Deploying liquidity source");
        let faucet = LiquiditySource::new(ledger.clone(), Address::new_random());
        borrower.connect(&faucet)?;
        log::info!("Liquidity source deployed at {}", faucet.address());

        let reserve = loan_amount
            .checked_mul(RESERVE_MULTIPLIER)
            .ok_or(FlashError::MathOverflow)?;
        log::info!("Minting {} tokens to the liquidity source", format_units(reserve));
        ledger.mint(&owner, &faucet.address(), reserve)?;

        Ok(Self {
            owner,
            ledger,
            lender,
            faucet,
            borrower,
        })
    }

    pub fn balances(&self) -> BalanceReport {
        BalanceReport {
            total_supply: self.ledger.total_supply(),
            borrower: self.borrower.balance(),
            faucet: self.faucet.reserve(),
        }
    }

    /// Borrow `amount` and try to extract `extraction` from the liquidity source
    pub fn run_flash_swap(&mut self, amount: Amount, extraction: Amount) -> FlashResult<SwapOutcome> {
        log::info!(
            "Initiating flash swap to borrow {} tokens trying to profit {}",
            format_units(amount),
            format_units(extraction)
        );
        self.borrower
            .flash_borrow(&self.lender, amount, &self.faucet, extraction)
    }
}
