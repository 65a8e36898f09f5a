use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Address, EventRecord, LedgerEvent};
use crate::error::{FlashError, FlashResult};
use crate::flash_loan::fees::FeeRate;
use crate::units::Amount;

/// Token construction parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    /// Flash loan fee rate in basis points (0..=10000)
    pub fee_basis_points: u16,
}

impl TokenConfig {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, fee_basis_points: u16) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            fee_basis_points,
        }
    }

    pub fn validate(&self) -> FlashResult<()> {
        if self.name.trim().is_empty() {
            return Err(FlashError::InvalidConfig("token name is empty".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(FlashError::InvalidConfig("token symbol is empty".to_string()));
        }
        FeeRate::new(self.fee_basis_points).map(|_| ())
    }
}

/// Balance table plus total supply
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Book {
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
}

/// Everything a rollback has to put back
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    book: Book,
    minters: BTreeSet<Address>,
    journal_len: usize,
    next_seq: u64,
}

/// Authoritative token state. Reached through the [`super::Ledger`] handle.
pub struct LedgerState {
    config: TokenConfig,
    owner: Address,
    minters: BTreeSet<Address>,
    book: Book,
    journal: Vec<EventRecord>,
    next_seq: u64,
    published: usize,
    open_transactions: usize,
    subscribers: Vec<Sender<EventRecord>>,
}

impl LedgerState {
    pub(crate) fn new(config: TokenConfig, owner: Address) -> FlashResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            owner,
            minters: BTreeSet::from([owner]),
            book: Book::default(),
            journal: Vec::new(),
            next_seq: 0,
            published: 0,
            open_transactions: 0,
            subscribers: Vec::new(),
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.minters.contains(account)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.book.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.book.total_supply
    }

    pub fn balances(&self) -> &BTreeMap<Address, Amount> {
        &self.book.balances
    }

    pub fn journal(&self) -> &[EventRecord] {
        &self.journal
    }

    /// Sum of all balances equals total supply
    pub fn is_conserved(&self) -> bool {
        self.book
            .balances
            .values()
            .try_fold(0 as Amount, |acc, b| acc.checked_add(*b))
            == Some(self.book.total_supply)
    }

    pub(crate) fn grant_minter(&mut self, caller: &Address, account: Address) -> FlashResult<()> {
        if *caller != self.owner {
            return Err(FlashError::Authorization {
                caller: *caller,
                action: "grant the minter role",
            });
        }
        self.minters.insert(account);
        log::debug!("Minter role granted to {}", account);
        Ok(())
    }

    pub(crate) fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> FlashResult<()> {
        self.require_minter(caller, "mint")?;

        let supply = self
            .book
            .total_supply
            .checked_add(amount)
            .ok_or(FlashError::MathOverflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(FlashError::MathOverflow)?;

        self.book.total_supply = supply;
        self.book.balances.insert(*to, balance);
        log::debug!("Minted {} to {}", amount, to);
        self.record(LedgerEvent::Minted { to: *to, amount });
        debug_assert!(self.is_conserved());
        Ok(())
    }

    pub(crate) fn burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> FlashResult<()> {
        self.require_minter(caller, "burn")?;

        let balance = self.debited_balance(from, amount)?;
        let supply = self
            .book
            .total_supply
            .checked_sub(amount)
            .ok_or(FlashError::MathOverflow)?;

        self.book.total_supply = supply;
        self.book.balances.insert(*from, balance);
        log::debug!("Burned {} from {}", amount, from);
        self.record(LedgerEvent::Burned { from: *from, amount });
        debug_assert!(self.is_conserved());
        Ok(())
    }

    pub(crate) fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> FlashResult<()> {
        let from_balance = self.debited_balance(from, amount)?;
        if from != to {
            let to_balance = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(FlashError::MathOverflow)?;
            self.book.balances.insert(*from, from_balance);
            self.book.balances.insert(*to, to_balance);
        }
        log::debug!("Transferred {} from {} to {}", amount, from, to);
        self.record(LedgerEvent::Transferred {
            from: *from,
            to: *to,
            amount,
        });
        debug_assert!(self.is_conserved());
        Ok(())
    }

    pub(crate) fn record(&mut self, event: LedgerEvent) {
        self.journal.push(EventRecord::new(self.next_seq, event));
        self.next_seq += 1;
    }

    pub(crate) fn subscribe(&mut self, sender: Sender<EventRecord>) {
        self.subscribers.push(sender);
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            book: self.book.clone(),
            minters: self.minters.clone(),
            journal_len: self.journal.len(),
            next_seq: self.next_seq,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.book = snapshot.book;
        self.minters = snapshot.minters;
        self.journal.truncate(snapshot.journal_len);
        self.next_seq = snapshot.next_seq;
    }

    pub(crate) fn open_transaction(&mut self) {
        self.open_transactions += 1;
    }

    pub(crate) fn close_transaction(&mut self) {
        self.open_transactions = self.open_transactions.saturating_sub(1);
    }

    /// Hand journal entries to subscribers once no transaction is open
    pub(crate) fn publish_pending(&mut self) {
        if self.open_transactions > 0 || self.published >= self.journal.len() {
            return;
        }
        let pending = &self.journal[self.published..];
        self.subscribers
            .retain(|tx| pending.iter().all(|record| tx.send(record.clone()).is_ok()));
        self.published = self.journal.len();
    }

    fn require_minter(&self, caller: &Address, action: &'static str) -> FlashResult<()> {
        if !self.is_minter(caller) {
            return Err(FlashError::Authorization {
                caller: *caller,
                action,
            });
        }
        Ok(())
    }

    fn debited_balance(&self, account: &Address, amount: Amount) -> FlashResult<Amount> {
        let available = self.balance_of(account);
        available
            .checked_sub(amount)
            .ok_or(FlashError::InsufficientBalance {
                account: *account,
                available,
                required: amount,
            })
    }
}
