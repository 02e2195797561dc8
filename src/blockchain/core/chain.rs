use crate::blockchain::core::state::{LedgerState, TokenKind, Wallet};
use crate::blockchain::core::validation::{
    check_staged_debit, check_wallet_admission, validate_block_header, validate_block_transactions,
    verify_block_hash,
};
use crate::config::{GenesisConfig, TokenSpec};
use crate::crypto::{hash_to_hex, sha256, Sha256Hash, ZERO_HASH};
use crate::error::ChainError;
use crate::transaction::Transaction;
use tracing::{debug, info, warn};

pub const MAX_TX_PER_BLOCK: usize = 256;

/// The hashed part of a block. Only the transaction *count* is committed to;
/// transaction contents are not part of the header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockHeader {
    pub index: u32,
    pub timestamp: u64,
    pub previous_hash: Sha256Hash,
    pub tx_count: u64,
}

impl BlockHeader {
    /// `index u32 BE | timestamp u64 BE | previous_hash | tx_count u64 BE` (52 bytes).
    pub fn canonical_bytes(&self) -> [u8; 52] {
        let mut out = [0u8; 52];
        out[0..4].copy_from_slice(&self.index.to_be_bytes());
        out[4..12].copy_from_slice(&self.timestamp.to_be_bytes());
        out[12..44].copy_from_slice(&self.previous_hash);
        out[44..52].copy_from_slice(&self.tx_count.to_be_bytes());
        out
    }

    pub fn hash(&self) -> Sha256Hash {
        sha256(&self.canonical_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u32,
    pub timestamp: u64,
    pub previous_hash: Sha256Hash,
    /// Stored hash; must equal the recomputed header hash to be appended.
    pub hash: Sha256Hash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Builds a block stamped with the current wall-clock time in milliseconds.
    pub fn new(index: u32, previous_hash: Sha256Hash, transactions: Vec<Transaction>) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::seal(index, timestamp, previous_hash, transactions)
    }

    /// Builds a block and stores its computed header hash.
    pub fn seal(index: u32, timestamp: u64, previous_hash: Sha256Hash, transactions: Vec<Transaction>) -> Self {
        let mut block = Block {
            index,
            timestamp,
            previous_hash,
            hash: ZERO_HASH,
            transactions,
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            index: self.index,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash,
            tx_count: self.transactions.len() as u64,
        }
    }

    pub fn compute_hash(&self) -> Sha256Hash {
        self.header().hash()
    }
}

/// Aggregate root: the block sequence plus the registry it drives.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Blockchain {
    pub blocks: Vec<Block>,
    pub state: LedgerState,
}

impl Blockchain {
    /// An empty chain with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty chain (no genesis yet) with the default native token types registered.
    pub fn with_native_tokens() -> Result<Self, ChainError> {
        let mut chain = Self::new();
        chain.register_tokens(&GenesisConfig::default().native_tokens)?;
        Ok(chain)
    }

    /// Registers the configured native tokens and appends the genesis block.
    pub fn from_config(config: &GenesisConfig) -> Result<Self, ChainError> {
        let mut chain = Self::new();
        chain.register_tokens(&config.native_tokens)?;
        chain.create_genesis(config.timestamp)?;
        Ok(chain)
    }

    /// Registers each token in order; stops at the first refusal.
    pub fn register_tokens(&mut self, tokens: &[TokenSpec]) -> Result<(), ChainError> {
        for token in tokens {
            self.add_token_type(
                &token.name,
                &token.symbol,
                token.decimals,
                token.kind,
                token.energy_binding_factor,
            )?;
        }
        Ok(())
    }

    /// Appends the empty genesis block (index 0, zero previous hash).
    pub fn create_genesis(&mut self, timestamp: u64) -> Result<Sha256Hash, ChainError> {
        let genesis = Block::seal(0, timestamp, ZERO_HASH, Vec::new());
        let hash = genesis.hash;
        self.append_block(genesis)?;
        info!("Created genesis block {}", hash_to_hex(&hash));
        Ok(hash)
    }

    pub fn add_token_type(
        &mut self,
        name: &str,
        symbol: &str,
        decimals: i32,
        kind: TokenKind,
        energy_binding_factor: f64,
    ) -> Result<usize, ChainError> {
        self.state.add_token_type(name, symbol, decimals, kind, energy_binding_factor)
    }

    pub fn find_or_create_wallet(&mut self, address: &str) -> Result<&Wallet, ChainError> {
        let idx = self.state.find_or_create_wallet(address)?;
        Ok(&self.state.wallets[idx])
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn height(&self) -> usize {
        self.blocks.len()
    }

    /// Seals a block carrying `transactions` that links onto the current tip.
    pub fn build_next_block(&self, timestamp: u64, transactions: Vec<Transaction>) -> Block {
        match self.tip() {
            Some(tip) => Block::seal(tip.index.wrapping_add(1), timestamp, tip.hash, transactions),
            None => Block::seal(0, timestamp, ZERO_HASH, transactions),
        }
    }

    /// Full append-time check of a candidate block against the current state.
    /// Never mutates.
    pub fn validate_block(&self, block: &Block) -> Result<(), ChainError> {
        self.stage_block(block).map(|_| ())
    }

    /// Validates the block, then appends it and applies its transactions in order.
    /// A rejected block leaves the chain and the registry untouched.
    pub fn append_block(&mut self, block: Block) -> Result<(), ChainError> {
        let staged = match self.stage_block(&block) {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Rejected block #{}: {}", block.index, e);
                return Err(e);
            }
        };

        debug!(
            "Appended block #{} ({} txs) {}",
            block.index,
            block.transactions.len(),
            hash_to_hex(&block.hash)
        );
        self.blocks.push(block);
        self.state = staged;
        Ok(())
    }

    /// Runs every append-time check and applies the block to a clone of the
    /// registry. Each debit is checked against the balance left by the
    /// transactions before it, so inflows earlier in the block count.
    fn stage_block(&self, block: &Block) -> Result<LedgerState, ChainError> {
        if block.transactions.len() > MAX_TX_PER_BLOCK {
            return Err(ChainError::TooManyTransactions {
                count: block.transactions.len(),
                max: MAX_TX_PER_BLOCK,
            });
        }

        validate_block_header(self, block)?;
        verify_block_hash(block)?;

        if let Some(tip) = self.tip() {
            if block.timestamp < tip.timestamp {
                return Err(ChainError::TimestampRegression {
                    previous: tip.timestamp,
                    actual: block.timestamp,
                });
            }
        }

        validate_block_transactions(&self.state, block)?;
        check_wallet_admission(&self.state, block)?;

        let mut staged = self.state.clone();
        for (position, tx) in block.transactions.iter().enumerate() {
            check_staged_debit(&staged, tx)?;
            staged.apply_transaction(tx).map_err(|e| e.at_position(position))?;
        }
        Ok(staged)
    }

    /// A cloned, non-moving copy of the whole aggregate.
    pub fn snapshot(&self) -> Blockchain {
        self.clone()
    }
}
