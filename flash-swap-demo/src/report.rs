use flash_mint_sdk::units::{format_units, Amount};
use std::fmt;

/// Balances printed around a flash swap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceReport {
    pub total_supply: Amount,
    pub borrower: Amount,
    pub faucet: Amount,
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total supply of tokens: {}", format_units(self.total_supply))?;
        writeln!(
            f,
            "Current token balance inside the swap contract: {}",
            format_units(self.borrower)
        )?;
        write!(
            f,
            "Current token balance inside the liquidity source: {}",
            format_units(self.faucet)
        )
    }
}
