use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Account identifier on the ledger (20 bytes, shown as `0x`-prefixed hex)
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; Address::LEN]);

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(1);

impl Address {
    /// Byte length of an address
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Unique address for tests and simulations, never repeats within a process
    pub fn new_unique() -> Self {
        let n = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; Self::LEN];
        bytes[Self::LEN - 8..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Random address, used by deployments that do not care about the value
    pub fn new_random() -> Self {
        Self(rand::random())
    }

    pub fn to_bytes(self) -> [u8; Self::LEN] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseAddressError {
    #[error("address must be {len} bytes, got {0}", len = Address::LEN)]
    WrongLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| ParseAddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; Self::LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseAddressError::WrongLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
