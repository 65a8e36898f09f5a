//! Token ledger: balances, total supply and the minter role
//!
//! This module provides:
//! - A shared [`Ledger`] handle that every component holds instead of a copy of balances
//! - Scoped [`LedgerTransaction`]s that commit or roll back as a unit
//! - The event journal and subscriptions for telemetry collaborators

pub mod address;
pub mod events;
pub mod state;
pub mod transaction;

pub use address::{Address, ParseAddressError};
pub use events::{EventRecord, LedgerEvent};
pub use state::{LedgerState, TokenConfig};
pub use transaction::LedgerTransaction;

use crossbeam::channel::{unbounded, Receiver};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::FlashResult;
use crate::units::{Amount, DECIMALS};

/// Cloneable handle to one token ledger
///
/// Every operation is atomic on its own. Multi-step work that must be
/// all-or-nothing runs inside [`Ledger::begin`].
#[derive(Clone)]
pub struct Ledger {
    state: Arc<ReentrantMutex<RefCell<LedgerState>>>,
}

impl Ledger {
    /// Create a token ledger owned by `owner`, who starts as the only minter
    pub fn new(config: TokenConfig, owner: Address) -> FlashResult<Self> {
        let state = LedgerState::new(config, owner)?;
        log::info!(
            "Token ledger created: {} ({}), owner {}",
            state.config().name,
            state.config().symbol,
            owner
        );
        Ok(Self {
            state: Arc::new(ReentrantMutex::new(RefCell::new(state))),
        })
    }

    pub fn name(&self) -> String {
        self.read(|s| s.config().name.clone())
    }

    pub fn symbol(&self) -> String {
        self.read(|s| s.config().symbol.clone())
    }

    pub fn decimals(&self) -> u32 {
        DECIMALS
    }

    pub fn fee_basis_points(&self) -> u16 {
        self.read(|s| s.config().fee_basis_points)
    }

    pub fn config(&self) -> TokenConfig {
        self.read(|s| s.config().clone())
    }

    pub fn owner(&self) -> Address {
        self.read(|s| s.owner())
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.read(|s| s.is_minter(account))
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.read(|s| s.balance_of(account))
    }

    pub fn total_supply(&self) -> Amount {
        self.read(|s| s.total_supply())
    }

    /// Copy of the balance table
    pub fn balances(&self) -> BTreeMap<Address, Amount> {
        self.read(|s| s.balances().clone())
    }

    /// Copy of the event journal
    pub fn events(&self) -> Vec<EventRecord> {
        self.read(|s| s.journal().to_vec())
    }

    pub fn is_conserved(&self) -> bool {
        self.read(|s| s.is_conserved())
    }

    /// Owner-only: allow `account` to mint and burn
    pub fn grant_minter(&self, caller: &Address, account: Address) -> FlashResult<()> {
        self.write(|s| s.grant_minter(caller, account))
    }

    pub fn mint(&self, caller: &Address, to: &Address, amount: Amount) -> FlashResult<()> {
        self.write(|s| s.mint(caller, to, amount))
    }

    pub fn burn(&self, caller: &Address, from: &Address, amount: Amount) -> FlashResult<()> {
        self.write(|s| s.burn(caller, from, amount))
    }

    pub fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> FlashResult<()> {
        self.write(|s| s.transfer(from, to, amount))
    }

    /// Receive every event committed from now on
    pub fn subscribe(&self) -> Receiver<EventRecord> {
        let (tx, rx) = unbounded();
        let guard = self.state.lock();
        guard.borrow_mut().subscribe(tx);
        rx
    }

    /// Open a scoped transaction; see [`LedgerTransaction`]
    pub fn begin(&self) -> LedgerTransaction<'_> {
        LedgerTransaction::begin(self.state.lock())
    }

    /// Whether both handles point at the same ledger
    pub fn same_ledger(&self, other: &Ledger) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn record(&self, event: LedgerEvent) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.record(event);
        state.publish_pending();
    }

    fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut LedgerState) -> FlashResult<R>) -> FlashResult<R> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let result = f(&mut state);
        state.publish_pending();
        result
    }
}
