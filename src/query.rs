//! Read-only query surface over a ledger.
//!
//! View builders and other consumers go through [`LedgerQuery`] and never
//! mutate. [`Blockchain`] is the in-memory backing store.

use crate::audit::{validate_state, AuditError, AuditOptions};
use crate::blockchain::{Block, Blockchain, LiquidityPool, StakingPosition, TokenType, Wallet};
use crate::economics::{energy_split_for, EnergySplit};
use crate::transaction::Transaction;

pub trait LedgerQuery {
    fn token_types(&self) -> &[TokenType];

    fn token_type(&self, index: usize) -> Option<&TokenType> {
        self.token_types().get(index)
    }

    fn token_by_symbol(&self, symbol: &str) -> Option<(usize, &TokenType)> {
        self.token_types()
            .iter()
            .enumerate()
            .find(|(_, t)| t.symbol == symbol)
    }

    fn wallets(&self) -> &[Wallet];

    fn wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets().iter().find(|w| w.address == address)
    }

    fn wallet_balances(&self, address: &str) -> Option<&[f64]> {
        self.wallet(address).map(|w| w.balances.as_slice())
    }

    fn balance(&self, address: &str, token_index: usize) -> Option<f64> {
        self.wallet(address).and_then(|w| w.balance(token_index))
    }

    fn total_supply(&self, token_index: usize) -> f64 {
        self.wallets().iter().filter_map(|w| w.balance(token_index)).sum()
    }

    fn blocks(&self) -> &[Block];
    fn pools(&self) -> &[LiquidityPool];
    fn stakes(&self) -> &[StakingPosition];

    fn transaction_energy(&self, tx: &Transaction) -> f64 {
        tx.energy()
    }

    fn energy_split(&self, tx: &Transaction) -> Option<EnergySplit>;

    fn audit(&self, options: &AuditOptions) -> Result<(), AuditError>;
}

impl LedgerQuery for Blockchain {
    fn token_types(&self) -> &[TokenType] {
        &self.state.token_types
    }

    fn wallets(&self) -> &[Wallet] {
        &self.state.wallets
    }

    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn pools(&self) -> &[LiquidityPool] {
        &self.state.pools
    }

    fn stakes(&self) -> &[StakingPosition] {
        &self.state.stakes
    }

    fn energy_split(&self, tx: &Transaction) -> Option<EnergySplit> {
        energy_split_for(&self.state, tx)
    }

    fn audit(&self, options: &AuditOptions) -> Result<(), AuditError> {
        validate_state(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Blockchain {
        let mut chain = Blockchain::with_native_tokens().unwrap();
        chain.create_genesis(0).unwrap();
        chain.find_or_create_wallet("alice").unwrap();
        let block = chain.build_next_block(
            1,
            vec![Transaction::mint("alice", 30.0, 2), Transaction::transfer("alice", "bob", 5.0, 2)],
        );
        // Transfer is validated against the pre-block state, where alice holds nothing.
        assert!(chain.append_block(block).is_err());
        let block = chain.build_next_block(1, vec![Transaction::mint("alice", 30.0, 2)]);
        chain.append_block(block).unwrap();
        let block = chain.build_next_block(2, vec![Transaction::transfer("alice", "bob", 5.0, 2)]);
        chain.append_block(block).unwrap();
        chain
    }

    #[test]
    fn test_queries_read_the_aggregate() {
        let chain = sample();
        let q: &dyn LedgerQuery = &chain;

        assert_eq!(q.blocks().len(), 3);
        assert_eq!(q.token_types().len(), 3);
        let (idx, token) = q.token_by_symbol("ELTC").unwrap();
        assert_eq!(idx, 2);
        assert_eq!(token.symbol, "ELTC");
        assert!(q.token_by_symbol("NOPE").is_none());

        assert_eq!(q.wallet_balances("alice"), Some(&[0.0, 0.0, 25.0][..]));
        assert_eq!(q.balance("bob", 2), Some(5.0));
        assert_eq!(q.total_supply(2), 30.0);
        assert!(q.pools().is_empty());
        assert!(q.stakes().is_empty());
        assert_eq!(q.audit(&AuditOptions::default()), Ok(()));
    }

    #[test]
    fn test_energy_queries() {
        let chain = sample();
        let tx = Transaction::transfer("alice", "bob", 10.0, 0);
        assert_eq!(chain.transaction_energy(&tx), tx.energy());
        let split = chain.energy_split(&tx).unwrap();
        assert_eq!(split.total, tx.energy());
    }
}
