use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{FlashError, FlashResult};
use crate::ledger::{Address, Ledger};
use crate::units::Amount;

/// Passive pool of tokens standing in for market liquidity.
///
/// The reserve is simply the ledger balance of the source's own account.
/// Releases are one-way: nothing records a debt for the recipient.
#[derive(Clone)]
pub struct LiquiditySource {
    inner: Arc<Inner>,
}

struct Inner {
    address: Address,
    ledger: Ledger,
    borrowers: RwLock<BTreeSet<Address>>,
}

impl LiquiditySource {
    pub fn new(ledger: Ledger, address: Address) -> Self {
        Self {
            inner: Arc::new(Inner {
                address,
                ledger,
                borrowers: RwLock::new(BTreeSet::new()),
            }),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn ledger(&self) -> &Ledger {
        &self.inner.ledger
    }

    /// Tokens currently available for release
    pub fn reserve(&self) -> Amount {
        self.inner.ledger.balance_of(&self.inner.address)
    }

    pub fn register_borrower(&self, borrower: Address) {
        if self.inner.borrowers.write().insert(borrower) {
            log::debug!("Liquidity source {} registered borrower {}", self.inner.address, borrower);
        }
    }

    pub fn is_registered(&self, borrower: &Address) -> bool {
        self.inner.borrowers.read().contains(borrower)
    }

    /// Release `amount` of the reserve to `to` on behalf of a registered borrower
    pub fn release(&self, caller: &Address, to: &Address, amount: Amount) -> FlashResult<()> {
        if amount == 0 {
            return Err(FlashError::InvalidAmount("release amount must be positive".to_string()));
        }
        if !self.is_registered(caller) {
            return Err(FlashError::Authorization {
                caller: *caller,
                action: "draw from the liquidity source",
            });
        }

        let ledger = &self.inner.ledger;
        let tx = ledger.begin();
        let available = ledger.balance_of(&self.inner.address);
        if available < amount {
            log::warn!(
                "Liquidity source {} cannot release {}: reserve {}",
                self.inner.address,
                amount,
                available
            );
            return Err(FlashError::InsufficientReserve {
                faucet: self.inner.address,
                available,
                requested: amount,
            });
        }
        ledger.transfer(&self.inner.address, to, amount)?;
        tx.commit();

        log::info!("Liquidity source {} released {} to {}", self.inner.address, amount, to);
        Ok(())
    }
}
