//! Thread-safe handle around a single ledger.
//!
//! Every mutation goes through the write lock, so at most one block append or
//! registry change is in flight. Queries share the read lock; long audits can
//! run against a [`SharedLedger::snapshot`] instead.

use crate::audit::{validate_state, AuditError, AuditOptions};
use crate::blockchain::{Block, Blockchain, TokenKind};
use crate::error::ChainError;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Blockchain>>,
}

impl SharedLedger {
    pub fn new(chain: Blockchain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    pub fn append_block(&self, block: Block) -> Result<(), ChainError> {
        self.inner.write().append_block(block)
    }

    pub fn add_token_type(
        &self,
        name: &str,
        symbol: &str,
        decimals: i32,
        kind: TokenKind,
        energy_binding_factor: f64,
    ) -> Result<usize, ChainError> {
        self.inner
            .write()
            .add_token_type(name, symbol, decimals, kind, energy_binding_factor)
    }

    pub fn find_or_create_wallet(&self, address: &str) -> Result<usize, ChainError> {
        self.inner.write().state.find_or_create_wallet(address)
    }

    /// Runs `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Blockchain) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock. `f` must leave the aggregate consistent.
    pub fn write<R>(&self, f: impl FnOnce(&mut Blockchain) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// A detached copy that later writes do not affect.
    pub fn snapshot(&self) -> Blockchain {
        self.inner.read().snapshot()
    }

    /// Audits a snapshot so writers are only blocked for the copy.
    pub fn audit(&self, options: &AuditOptions) -> Result<(), AuditError> {
        let snapshot = self.snapshot();
        validate_state(&snapshot, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::LedgerQuery;
    use crate::transaction::Transaction;
    use std::thread;

    #[test]
    fn test_concurrent_appends_are_serialized() {
        let mut chain = Blockchain::with_native_tokens().unwrap();
        chain.create_genesis(0).unwrap();
        chain.find_or_create_wallet("treasury").unwrap();
        let ledger = SharedLedger::new(chain);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        // Build and append under one write lock so the block links to the tip.
                        ledger
                            .write(|chain| {
                                let ts = chain.tip().map(|b| b.timestamp + 1).unwrap_or(0);
                                let block = chain.build_next_block(ts, vec![Transaction::mint("treasury", 1.0, 0)]);
                                chain.append_block(block)
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.read(|c| c.height()), 21);
        assert_eq!(ledger.read(|c| c.total_supply(0)), 20.0);
        assert_eq!(ledger.audit(&AuditOptions::default()), Ok(()));
    }

    #[test]
    fn test_stale_block_rejected_through_handle() {
        let ledger = SharedLedger::new(Blockchain::with_native_tokens().unwrap());
        ledger.write(|c| c.create_genesis(0)).unwrap();
        let stale = ledger.read(|c| c.build_next_block(1, vec![]));
        ledger.append_block(stale.clone()).unwrap();
        assert!(matches!(
            ledger.append_block(stale),
            Err(ChainError::InvalidIndex { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_snapshot_does_not_move() {
        let ledger = SharedLedger::new(Blockchain::with_native_tokens().unwrap());
        let before = ledger.snapshot();
        ledger.add_token_type("Extra", "XTR", 0, TokenKind::Generic, 0.0).unwrap();
        ledger.find_or_create_wallet("alice").unwrap();
        assert_eq!(before.state.token_count(), 3);
        assert_eq!(ledger.read(|c| c.state.token_count()), 4);
        assert_eq!(ledger.read(|c| c.state.wallets.len()), 1);
    }
}
