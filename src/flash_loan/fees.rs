use serde::{Deserialize, Serialize};

use crate::error::{FlashError, FlashResult};
use crate::units::Amount;

/// Basis points in 100%
pub const MAX_BASIS_POINTS: u16 = 10_000;

/// Immutable flash loan fee rate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    basis_points: u16,
}

/// Fee and repayment due for one principal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee: Amount,
    pub due: Amount,
}

impl FeeRate {
    pub fn new(basis_points: u16) -> FlashResult<Self> {
        if basis_points > MAX_BASIS_POINTS {
            return Err(FlashError::InvalidConfig(format!(
                "fee of {} bps exceeds {}",
                basis_points, MAX_BASIS_POINTS
            )));
        }
        Ok(Self { basis_points })
    }

    pub fn basis_points(&self) -> u16 {
        self.basis_points
    }

    /// Rate as a percentage, e.g. `1.00%` for 100 bps
    pub fn as_percent(&self) -> String {
        format!("{:.2}%", self.basis_points as f64 / 100.0)
    }

    /// `floor(amount * bps / 10000)`
    pub fn fee_for(&self, amount: Amount) -> FlashResult<Amount> {
        // Split the division so large principals do not overflow the multiplication
        let bps = self.basis_points as Amount;
        let denominator = MAX_BASIS_POINTS as Amount;
        let whole = (amount / denominator)
            .checked_mul(bps)
            .ok_or(FlashError::MathOverflow)?;
        let rest = (amount % denominator) * bps / denominator;
        whole.checked_add(rest).ok_or(FlashError::MathOverflow)
    }

    /// Calculate fee and repayment due
    pub fn quote(&self, amount: Amount) -> FlashResult<FeeQuote> {
        let fee = self.fee_for(amount)?;
        let due = amount.checked_add(fee).ok_or(FlashError::MathOverflow)?;
        Ok(FeeQuote { fee, due })
    }
}
