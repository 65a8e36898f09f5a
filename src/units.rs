//! Fixed-point token amounts with 18 fractional digits
//!
//! Mirrors the `parseEther` / `formatEther` helpers deployment scripts use so
//! amounts can be given and printed as decimal strings.

use crate::error::{FlashError, FlashResult};

/// Token amount in base units (`1 token == WAD`)
pub type Amount = u128;

/// Number of fractional digits of every ledger amount
pub const DECIMALS: u32 = 18;

/// One whole token in base units
pub const WAD: Amount = 1_000_000_000_000_000_000;

/// Whole tokens to base units
pub fn tokens(whole: u64) -> Amount {
    whole as Amount * WAD
}

/// Parse a decimal string such as `"10"`, `"0.05"` or `"4.9"` into base units
pub fn parse_units(value: &str) -> FlashResult<Amount> {
    let value = value.trim();
    let (int_part, frac_part) = match value.split_once('.') {
        Some((i, f)) => (i, f),
        None => (value, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(FlashError::InvalidAmount(format!("'{}' is not a number", value)));
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(FlashError::InvalidAmount(format!(
            "'{}' must be a non-negative decimal",
            value
        )));
    }
    if frac_part.len() > DECIMALS as usize {
        return Err(FlashError::InvalidAmount(format!(
            "'{}' has more than {} fractional digits",
            value, DECIMALS
        )));
    }

    let whole = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse::<Amount>()
            .map_err(|_| FlashError::MathOverflow)?
    };

    // Right-pad the fraction to 18 digits
    let mut frac: Amount = 0;
    for digit in frac_part
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(DECIMALS as usize)
    {
        frac = frac * 10 + (digit - b'0') as Amount;
    }

    whole
        .checked_mul(WAD)
        .and_then(|v| v.checked_add(frac))
        .ok_or(FlashError::MathOverflow)
}

/// Shortest exact decimal rendering, always with one fractional digit
pub fn format_units(amount: Amount) -> String {
    let whole = amount / WAD;
    let frac = amount % WAD;
    if frac == 0 {
        return format!("{}.0", whole);
    }
    let digits = format!("{:018}", frac);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Serde helper writing amounts as decimal strings of base units, since
/// JSON numbers cannot carry the full `u128` range through tagged enums.
pub mod amount_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(D::Error::custom)
    }
}
