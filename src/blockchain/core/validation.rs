use crate::blockchain::core::chain::{Block, Blockchain};
use crate::blockchain::core::state::{LedgerState, MAX_WALLETS};
use crate::crypto::{hash_to_hex, is_valid_address, ZERO_HASH};
use crate::error::ChainError;
use crate::transaction::Transaction;
use std::collections::HashSet;

/// Checks where `block` would sit in `chain`: genesis rules, index sequence and
/// previous-hash linkage. Transactions and the stored hash are not looked at.
pub fn validate_block_header(chain: &Blockchain, block: &Block) -> Result<(), ChainError> {
    let Some(last) = chain.tip() else {
        if block.index != 0 {
            return Err(ChainError::EmptyChain);
        }
        if block.previous_hash != ZERO_HASH {
            return Err(ChainError::GenesisPreviousHash);
        }
        return Ok(());
    };

    if block.index == 0 {
        return Err(ChainError::GenesisAlreadyExists);
    }

    let expected = last.index.checked_add(1).ok_or_else(|| {
        ChainError::InvariantViolation(format!("block index {} cannot be extended", last.index))
    })?;
    if block.index != expected {
        return Err(ChainError::InvalidIndex {
            expected,
            actual: block.index,
        });
    }

    if block.previous_hash != last.hash {
        return Err(ChainError::PreviousHashMismatch {
            expected: hash_to_hex(&last.hash),
            actual: hash_to_hex(&block.previous_hash),
        });
    }

    Ok(())
}

/// Recomputes the header hash and compares it with the one the block carries.
pub fn verify_block_hash(block: &Block) -> Result<(), ChainError> {
    let recomputed = block.compute_hash();
    if recomputed != block.hash {
        return Err(ChainError::HashMismatch {
            expected: hash_to_hex(&recomputed),
            actual: hash_to_hex(&block.hash),
        });
    }
    Ok(())
}

/// Validates every transaction against the pre-block state.
pub fn validate_block_transactions(state: &LedgerState, block: &Block) -> Result<(), ChainError> {
    for (position, tx) in block.transactions.iter().enumerate() {
        tx.validate(state).map_err(|e| e.at_position(position))?;
    }
    Ok(())
}

/// Checks a TRANSFER, SWAP or BURN against the sender's balance in `staged`,
/// the registry with every earlier transaction of the block already applied.
pub fn check_staged_debit(staged: &LedgerState, tx: &Transaction) -> Result<(), ChainError> {
    if !tx.kind.debits_sender() {
        return Ok(());
    }
    let token = staged.checked_token_index(tx.token_index)?;
    let available = staged.balance(&tx.from, token).unwrap_or(0.0);
    if tx.amount > available {
        return Err(ChainError::OverspendInBlock {
            address: tx.from.clone(),
            token_index: tx.token_index,
            required: tx.amount,
            available,
        });
    }
    Ok(())
}

/// Every wallet the block would create must have a well-formed address, and the
/// registry must have room for all of them.
pub fn check_wallet_admission(state: &LedgerState, block: &Block) -> Result<(), ChainError> {
    let mut new_wallets: HashSet<&str> = HashSet::new();
    for tx in &block.transactions {
        for address in [tx.from.as_str(), tx.to.as_str()] {
            if state.find_wallet(address).is_some() || new_wallets.contains(address) {
                continue;
            }
            if !is_valid_address(address) {
                return Err(ChainError::InvalidAddress(address.to_string()));
            }
            new_wallets.insert(address);
        }
    }

    if state.wallets.len() + new_wallets.len() > MAX_WALLETS {
        return Err(ChainError::CapacityExceeded {
            resource: "wallets",
            limit: MAX_WALLETS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Transaction, TxKind};

    fn chain_with_alice(balance: f64) -> Blockchain {
        let mut chain = Blockchain::with_native_tokens().unwrap();
        chain.create_genesis(0).unwrap();
        chain.find_or_create_wallet("alice").unwrap();
        if balance > 0.0 {
            let block = chain.build_next_block(1, vec![Transaction::mint("alice", balance, 0)]);
            chain.append_block(block).unwrap();
        }
        chain
    }

    #[test]
    fn test_header_linkage_errors() {
        let chain = chain_with_alice(0.0);
        let tip = chain.tip().unwrap().clone();

        let skipped = Block::seal(tip.index + 2, 10, tip.hash, vec![]);
        assert_eq!(
            validate_block_header(&chain, &skipped),
            Err(ChainError::InvalidIndex { expected: 1, actual: 2 })
        );

        let unlinked = Block::seal(tip.index + 1, 10, [9u8; 32], vec![]);
        assert!(matches!(
            validate_block_header(&chain, &unlinked),
            Err(ChainError::PreviousHashMismatch { .. })
        ));

        let good = chain.build_next_block(10, vec![]);
        assert!(validate_block_header(&chain, &good).is_ok());
    }

    #[test]
    fn test_tampered_hash_detected() {
        let chain = chain_with_alice(0.0);
        let mut block = chain.build_next_block(10, vec![]);
        assert!(verify_block_hash(&block).is_ok());
        block.hash[0] ^= 0xFF;
        assert!(matches!(verify_block_hash(&block), Err(ChainError::HashMismatch { .. })));
    }

    #[test]
    fn test_combined_debits_cannot_overspend() {
        let chain = chain_with_alice(10.0);
        let block = chain.build_next_block(
            5,
            vec![
                Transaction::transfer("alice", "bob", 6.0, 0),
                Transaction::burn("alice", 6.0, 0),
            ],
        );
        // Each transaction is fine on its own against the pre-block state.
        assert!(validate_block_transactions(&chain.state, &block).is_ok());
        assert!(matches!(
            chain.validate_block(&block),
            Err(ChainError::OverspendInBlock { required, available, .. }) if required == 6.0 && available == 4.0
        ));
    }

    #[test]
    fn test_staged_debit_sees_earlier_inflows() {
        let mut staged = chain_with_alice(10.0).state;
        let spend = Transaction::transfer("alice", "carol", 12.0, 0);
        assert!(matches!(
            check_staged_debit(&staged, &spend),
            Err(ChainError::OverspendInBlock { required, available, .. }) if required == 12.0 && available == 10.0
        ));

        let alice = staged.find_wallet("alice").unwrap();
        staged.wallets[alice].balances[0] += 5.0;
        assert!(check_staged_debit(&staged, &spend).is_ok());

        // Credits never need cover.
        assert!(check_staged_debit(&staged, &Transaction::mint("alice", 1_000.0, 0)).is_ok());
    }

    #[test]
    fn test_stake_does_not_count_as_debit() {
        let chain = chain_with_alice(10.0);
        let block = chain.build_next_block(
            5,
            vec![
                Transaction::new("alice", "alice", 10.0, 0, TxKind::Stake),
                Transaction::transfer("alice", "bob", 10.0, 0),
            ],
        );
        assert!(chain.validate_block(&block).is_ok());
    }

    #[test]
    fn test_invalid_transaction_reports_position() {
        let chain = chain_with_alice(10.0);
        let block = chain.build_next_block(
            5,
            vec![
                Transaction::transfer("alice", "bob", 1.0, 0),
                Transaction::transfer("bob", "alice", 1.0, 0),
            ],
        );
        match validate_block_transactions(&chain.state, &block) {
            Err(ChainError::InvalidTransaction { position, source }) => {
                assert_eq!(position, 1);
                assert_eq!(*source, ChainError::UnknownSender("bob".to_string()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_wallet_admission() {
        let chain = chain_with_alice(10.0);
        let bad = chain.build_next_block(5, vec![Transaction::transfer("alice", "bad\naddr", 1.0, 0)]);
        assert!(matches!(
            check_wallet_admission(&chain.state, &bad),
            Err(ChainError::InvalidAddress(_))
        ));

        let mut crowded = chain.state.clone();
        while crowded.wallets.len() < MAX_WALLETS - 1 {
            let address = format!("filler{}", crowded.wallets.len());
            crowded.find_or_create_wallet(&address).unwrap();
        }
        let one_new = chain.build_next_block(5, vec![Transaction::transfer("alice", "bob", 1.0, 0)]);
        assert!(check_wallet_admission(&crowded, &one_new).is_ok());

        let two_new = chain.build_next_block(
            5,
            vec![
                Transaction::transfer("alice", "bob", 1.0, 0),
                Transaction::transfer("alice", "carol", 1.0, 0),
            ],
        );
        assert!(matches!(
            check_wallet_admission(&crowded, &two_new),
            Err(ChainError::CapacityExceeded { .. })
        ));
    }
}
