//! Full-state audit of a ledger snapshot.
//!
//! The audit is read-only and independent of the append path: it re-checks
//! tokens, wallets, pools, stakes and the block sequence in that order and
//! reports the first violated invariant.

use crate::blockchain::{is_finite_non_negative, Block, Blockchain, LedgerState, MAX_TX_PER_BLOCK};
use crate::crypto::{is_valid_address, Sha256Hash, ZERO_HASH};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    #[error("Token symbol {symbol:?} is registered more than once")]
    TokenSymbolDuplicate { symbol: String },

    #[error("Wallet #{wallet} has a malformed address {address:?}")]
    WalletAddressInvalid { wallet: usize, address: String },

    #[error("Wallet {address:?} covers {token_count} token types but only {registered} exist")]
    WalletTokenCount {
        address: String,
        token_count: usize,
        registered: usize,
    },

    #[error("Wallet {address:?} holds {balances} balances for {token_count} token types")]
    WalletBalancesMisaligned {
        address: String,
        token_count: usize,
        balances: usize,
    },

    #[error("Wallet {address:?} has invalid balance {balance} on token {token_index}")]
    WalletBalanceNegative {
        address: String,
        token_index: usize,
        balance: f64,
    },

    #[error("Pool #{pool} references token {token_index} outside the registry")]
    PoolIndexInvalid { pool: usize, token_index: i32 },

    #[error("Pool #{pool} has invalid reserves ({reserve_x}, {reserve_y})")]
    PoolReserveNegative { pool: usize, reserve_x: f64, reserve_y: f64 },

    #[error("Stake #{stake} has a malformed owner {owner:?}")]
    StakeOwnerInvalid { stake: usize, owner: String },

    #[error("Stake #{stake} references token {token_index} outside the registry")]
    StakeTokenIndexInvalid { stake: usize, token_index: i32 },

    #[error("Stake #{stake} has invalid amount {amount}")]
    StakeAmountNegative { stake: usize, amount: f64 },

    #[error("Stake #{stake} is locked until {lock_until}, before its start {start_timestamp}")]
    StakeTimeInconsistent {
        stake: usize,
        start_timestamp: u64,
        lock_until: u64,
    },

    #[error("Chain has no blocks")]
    NoBlocks,

    #[error("Genesis block does not reference the all-zero previous hash")]
    GenesisPrevHash,

    #[error("Block at height {height} has index {actual}, expected {expected}")]
    BlockIndexSequence { height: usize, expected: u32, actual: u32 },

    #[error("Block #{index} does not link to the hash of its predecessor")]
    BlockPrevHashMismatch { index: u32 },

    #[error("Block #{index} carries a hash that does not match its header")]
    BlockHashMismatch { index: u32 },

    #[error("Block #{index} timestamp {timestamp} precedes the previous block's {previous}")]
    TimestampNonMonotonic { index: u32, previous: u64, timestamp: u64 },

    #[error("Block #{index} carries {count} transactions (max: {max})")]
    BlockTooManyTransactions { index: u32, count: usize, max: usize },

    #[error("Transaction #{position} of block #{block} uses token index {token_index} outside the registry")]
    TxTokenIndexInvalid { block: u32, position: usize, token_index: i32 },

    #[error("Transaction #{position} of block #{block} has invalid amount {amount}")]
    TxAmountNegative { block: u32, position: usize, amount: f64 },

    #[error("Transaction #{position} of block #{block} has a malformed address {address:?}")]
    TxAddressInvalid { block: u32, position: usize, address: String },

    #[error("Transaction #{position} of block #{block} duplicates transaction #{first}")]
    TxReplayDuplicateInBlock { block: u32, first: usize, position: usize },
}

impl AuditError {
    /// Stable machine-readable code for the violated check.
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::TokenSymbolDuplicate { .. } => "TOKEN_SYMBOL_DUPLICATE",
            AuditError::WalletAddressInvalid { .. } => "WALLET_ADDRESS_INVALID",
            AuditError::WalletTokenCount { .. } => "WALLET_TOKEN_COUNT",
            AuditError::WalletBalancesMisaligned { .. } => "WALLET_BALANCES_MISALIGNED",
            AuditError::WalletBalanceNegative { .. } => "WALLET_BALANCE_NEGATIVE",
            AuditError::PoolIndexInvalid { .. } => "POOL_INDEX_INVALID",
            AuditError::PoolReserveNegative { .. } => "POOL_RESERVE_NEGATIVE",
            AuditError::StakeOwnerInvalid { .. } => "STAKE_OWNER_INVALID",
            AuditError::StakeTokenIndexInvalid { .. } => "STAKE_TOKEN_INDEX_INVALID",
            AuditError::StakeAmountNegative { .. } => "STAKE_AMOUNT_NEGATIVE",
            AuditError::StakeTimeInconsistent { .. } => "STAKE_TIME_INCONSISTENT",
            AuditError::NoBlocks => "NO_BLOCKS",
            AuditError::GenesisPrevHash => "GENESIS_PREV_HASH",
            AuditError::BlockIndexSequence { .. } => "BLOCK_INDEX_SEQUENCE",
            AuditError::BlockPrevHashMismatch { .. } => "BLOCK_PREV_HASH_MISMATCH",
            AuditError::BlockHashMismatch { .. } => "BLOCK_HASH_MISMATCH",
            AuditError::TimestampNonMonotonic { .. } => "TIMESTAMP_NON_MONOTONIC",
            AuditError::BlockTooManyTransactions { .. } => "BLOCK_TOO_MANY_TRANSACTIONS",
            AuditError::TxTokenIndexInvalid { .. } => "TX_TOKEN_INDEX_INVALID",
            AuditError::TxAmountNegative { .. } => "TX_AMOUNT_NEGATIVE",
            AuditError::TxAddressInvalid { .. } => "TX_ADDRESS_INVALID",
            AuditError::TxReplayDuplicateInBlock { .. } => "TX_REPLAY_DUPLICATE_IN_BLOCK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditOptions {
    /// Recompute every block's header hash. When off, only linkage fields are
    /// compared and stored hashes are trusted.
    pub verify_block_hashes: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            verify_block_hashes: true,
        }
    }
}

/// Runs every check over `chain` and returns the first violation found.
pub fn validate_state(chain: &Blockchain, options: &AuditOptions) -> Result<(), AuditError> {
    check_token_symbols(&chain.state)?;
    check_wallets(&chain.state)?;
    check_pools(&chain.state)?;
    check_stakes(&chain.state)?;
    check_chain(&chain.blocks, &chain.state, options)
}

/// [`validate_state`] with default options.
pub fn audit(chain: &Blockchain) -> Result<(), AuditError> {
    validate_state(chain, &AuditOptions::default())
}

fn in_registry(state: &LedgerState, token_index: i32) -> bool {
    state.checked_token_index(token_index).is_ok()
}

fn check_token_symbols(state: &LedgerState) -> Result<(), AuditError> {
    let mut seen = HashSet::new();
    for token in &state.token_types {
        if !seen.insert(token.symbol.as_str()) {
            return Err(AuditError::TokenSymbolDuplicate {
                symbol: token.symbol.clone(),
            });
        }
    }
    Ok(())
}

fn check_wallets(state: &LedgerState) -> Result<(), AuditError> {
    let registered = state.token_count();
    for (i, wallet) in state.wallets.iter().enumerate() {
        if !is_valid_address(&wallet.address) {
            return Err(AuditError::WalletAddressInvalid {
                wallet: i,
                address: wallet.address.clone(),
            });
        }
        if wallet.token_count > registered {
            return Err(AuditError::WalletTokenCount {
                address: wallet.address.clone(),
                token_count: wallet.token_count,
                registered,
            });
        }
        if wallet.balances.len() < wallet.token_count {
            return Err(AuditError::WalletBalancesMisaligned {
                address: wallet.address.clone(),
                token_count: wallet.token_count,
                balances: wallet.balances.len(),
            });
        }
        if let Some((token_index, &balance)) = wallet.balances[..wallet.token_count]
            .iter()
            .enumerate()
            .find(|(_, b)| !is_finite_non_negative(**b))
        {
            return Err(AuditError::WalletBalanceNegative {
                address: wallet.address.clone(),
                token_index,
                balance,
            });
        }
    }
    Ok(())
}

fn check_pools(state: &LedgerState) -> Result<(), AuditError> {
    for (i, pool) in state.pools.iter().enumerate() {
        for token_index in [pool.token_x_index, pool.token_y_index, pool.lp_token_index] {
            if !in_registry(state, token_index) {
                return Err(AuditError::PoolIndexInvalid { pool: i, token_index });
            }
        }
        if !(is_finite_non_negative(pool.reserve_x) && is_finite_non_negative(pool.reserve_y)) {
            return Err(AuditError::PoolReserveNegative {
                pool: i,
                reserve_x: pool.reserve_x,
                reserve_y: pool.reserve_y,
            });
        }
    }
    Ok(())
}

fn check_stakes(state: &LedgerState) -> Result<(), AuditError> {
    for (i, stake) in state.stakes.iter().enumerate() {
        if !is_valid_address(&stake.owner) {
            return Err(AuditError::StakeOwnerInvalid {
                stake: i,
                owner: stake.owner.clone(),
            });
        }
        if !in_registry(state, stake.token_index) {
            return Err(AuditError::StakeTokenIndexInvalid {
                stake: i,
                token_index: stake.token_index,
            });
        }
        if !is_finite_non_negative(stake.amount) {
            return Err(AuditError::StakeAmountNegative {
                stake: i,
                amount: stake.amount,
            });
        }
        if stake.lock_until < stake.start_timestamp {
            return Err(AuditError::StakeTimeInconsistent {
                stake: i,
                start_timestamp: stake.start_timestamp,
                lock_until: stake.lock_until,
            });
        }
    }
    Ok(())
}

fn check_chain(blocks: &[Block], state: &LedgerState, options: &AuditOptions) -> Result<(), AuditError> {
    let Some(genesis) = blocks.first() else {
        return Err(AuditError::NoBlocks);
    };
    if genesis.previous_hash != ZERO_HASH {
        return Err(AuditError::GenesisPrevHash);
    }
    if genesis.index != 0 {
        return Err(AuditError::BlockIndexSequence {
            height: 0,
            expected: 0,
            actual: genesis.index,
        });
    }

    let mut previous: Option<&Block> = None;
    for (height, block) in blocks.iter().enumerate() {
        if let Some(prev) = previous {
            let expected = prev.index.wrapping_add(1);
            if block.index != expected {
                return Err(AuditError::BlockIndexSequence {
                    height,
                    expected,
                    actual: block.index,
                });
            }
            if block.previous_hash != prev.hash {
                return Err(AuditError::BlockPrevHashMismatch { index: block.index });
            }
        }

        if options.verify_block_hashes && block.compute_hash() != block.hash {
            return Err(AuditError::BlockHashMismatch { index: block.index });
        }

        if let Some(prev) = previous {
            if block.timestamp < prev.timestamp {
                return Err(AuditError::TimestampNonMonotonic {
                    index: block.index,
                    previous: prev.timestamp,
                    timestamp: block.timestamp,
                });
            }
        }

        check_block_transactions(block, state)?;
        previous = Some(block);
    }
    Ok(())
}

fn check_block_transactions(block: &Block, state: &LedgerState) -> Result<(), AuditError> {
    if block.transactions.len() > MAX_TX_PER_BLOCK {
        return Err(AuditError::BlockTooManyTransactions {
            index: block.index,
            count: block.transactions.len(),
            max: MAX_TX_PER_BLOCK,
        });
    }

    let mut seen: Vec<(Sha256Hash, usize)> = Vec::with_capacity(block.transactions.len());
    for (position, tx) in block.transactions.iter().enumerate() {
        if !in_registry(state, tx.token_index) {
            return Err(AuditError::TxTokenIndexInvalid {
                block: block.index,
                position,
                token_index: tx.token_index,
            });
        }
        if !is_finite_non_negative(tx.amount) {
            return Err(AuditError::TxAmountNegative {
                block: block.index,
                position,
                amount: tx.amount,
            });
        }
        for address in [&tx.from, &tx.to] {
            if !is_valid_address(address) {
                return Err(AuditError::TxAddressInvalid {
                    block: block.index,
                    position,
                    address: address.clone(),
                });
            }
        }

        let fingerprint = tx.fingerprint();
        if let Some(&(_, first)) = seen.iter().find(|(fp, _)| *fp == fingerprint) {
            return Err(AuditError::TxReplayDuplicateInBlock {
                block: block.index,
                first,
                position,
            });
        }
        seen.push((fingerprint, position));
    }
    Ok(())
}
