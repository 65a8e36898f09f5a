use parking_lot::ReentrantMutexGuard;
use std::cell::RefCell;

use super::state::{LedgerState, Snapshot};

/// Scoped all-or-nothing unit of work over the ledger.
///
/// Holds the ledger lock for its whole lifetime, so other threads observe
/// either the state before [`begin`](super::Ledger::begin) or the committed
/// result, never anything in between. The owning thread keeps full access
/// through its [`super::Ledger`] handle. Dropping the transaction without
/// calling [`commit`](Self::commit) restores the snapshot taken at `begin`.
#[must_use = "a transaction rolls back when dropped without commit"]
pub struct LedgerTransaction<'a> {
    guard: ReentrantMutexGuard<'a, RefCell<LedgerState>>,
    snapshot: Option<Snapshot>,
}

impl<'a> LedgerTransaction<'a> {
    pub(crate) fn begin(guard: ReentrantMutexGuard<'a, RefCell<LedgerState>>) -> Self {
        let snapshot = {
            let mut state = guard.borrow_mut();
            state.open_transaction();
            state.snapshot()
        };
        Self {
            guard,
            snapshot: Some(snapshot),
        }
    }

    /// Make every mutation since `begin` permanent
    pub fn commit(mut self) {
        self.snapshot = None;
    }

    /// Undo every mutation since `begin`
    pub fn rollback(self) {}
}

impl Drop for LedgerTransaction<'_> {
    fn drop(&mut self) {
        let mut state = self.guard.borrow_mut();
        if let Some(snapshot) = self.snapshot.take() {
            state.restore(snapshot);
            log::debug!("Ledger transaction rolled back");
        }
        state.close_transaction();
        state.publish_pending();
    }
}
