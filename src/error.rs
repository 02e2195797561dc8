//! Error types for LedgerChain

use crate::transaction::TxKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("Capacity exceeded: at most {limit} {resource}")]
    CapacityExceeded { resource: &'static str, limit: usize },

    #[error("Invalid address {0:?}")]
    InvalidAddress(String),

    #[error("Token index {index} out of range (token types: {count})")]
    TokenIndexOutOfRange { index: i32, count: usize },

    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(f64),

    #[error("Amount must be a finite number, got {0}")]
    NonFiniteAmount(f64),

    #[error("{kind} requires a positive amount, got {amount}")]
    NonPositiveAmount { kind: TxKind, amount: f64 },

    #[error("Sender wallet {0:?} does not exist")]
    UnknownSender(String),

    #[error("Recipient wallet {0:?} does not exist")]
    UnknownRecipient(String),

    #[error("Insufficient balance for {address:?} on token {token_index}: required {required}, available {available}")]
    InsufficientBalance {
        address: String,
        token_index: i32,
        required: f64,
        available: f64,
    },

    #[error("Block debits {required} from {address:?} on token {token_index} but only {available} is available")]
    OverspendInBlock {
        address: String,
        token_index: i32,
        required: f64,
        available: f64,
    },

    #[error("Unknown transaction kind code {0}")]
    UnknownTransactionKind(i32),

    #[error("Unknown transaction kind name {0:?}")]
    UnknownKindName(String),

    #[error("Memo is {len} characters long (max: {max})")]
    MemoTooLong { len: usize, max: usize },

    #[error("Block carries {count} transactions (max: {max})")]
    TooManyTransactions { count: usize, max: usize },

    #[error("Cannot append non-genesis block; the chain is empty")]
    EmptyChain,

    #[error("Genesis block can only be appended to an empty chain")]
    GenesisAlreadyExists,

    #[error("Genesis block must reference the all-zero previous hash")]
    GenesisPreviousHash,

    #[error("Invalid block index. Expected {expected}, but got {actual}")]
    InvalidIndex { expected: u32, actual: u32 },

    #[error("Invalid previous block hash. Expected {expected}, but got {actual}")]
    PreviousHashMismatch { expected: String, actual: String },

    #[error("Block hash mismatch. Recomputed {expected}, but block carries {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Block timestamp {actual} precedes the chain tip timestamp {previous}")]
    TimestampRegression { previous: u64, actual: u64 },

    #[error("Transaction #{position} rejected: {source}")]
    InvalidTransaction {
        position: usize,
        #[source]
        source: Box<ChainError>,
    },

    #[error("Liquidity pool {0} not found")]
    PoolNotFound(usize),

    #[error("Staking position {0} not found")]
    StakeNotFound(usize),

    #[error("Invalid liquidity pool: {0}")]
    InvalidPool(String),

    #[error("Invalid staking position: {0}")]
    InvalidStake(String),

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChainError {
    /// Wraps a transaction-level failure with the transaction's position in its block.
    pub fn at_position(self, position: usize) -> Self {
        ChainError::InvalidTransaction {
            position,
            source: Box::new(self),
        }
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}
