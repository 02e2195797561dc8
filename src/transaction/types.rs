//! Transaction types for LedgerChain

use crate::crypto::{sha256, Sha256Hash};
use crate::error::ChainError;
use std::fmt;

/// Maximum memo length in characters
pub const MAX_MEMO_LEN: usize = 128;

/// The thirteen transaction kinds. The discriminants are the wire codes of the
/// canonical serialization and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    Transfer = 0,
    Mint = 1,
    Burn = 2,
    CreateToken = 3,
    CreatePool = 4,
    AddLiquidity = 5,
    RemoveLiquidity = 6,
    Stake = 7,
    Unstake = 8,
    ClaimRewards = 9,
    Swap = 10,
    ProfileUpdate = 11,
    GovernanceProposal = 12,
}

impl TxKind {
    pub const ALL: [TxKind; 13] = [
        TxKind::Transfer,
        TxKind::Mint,
        TxKind::Burn,
        TxKind::CreateToken,
        TxKind::CreatePool,
        TxKind::AddLiquidity,
        TxKind::RemoveLiquidity,
        TxKind::Stake,
        TxKind::Unstake,
        TxKind::ClaimRewards,
        TxKind::Swap,
        TxKind::ProfileUpdate,
        TxKind::GovernanceProposal,
    ];

    /// Wire code used by the canonical serialization.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Transfer => "TRANSFER",
            TxKind::Mint => "MINT",
            TxKind::Burn => "BURN",
            TxKind::CreateToken => "CREATE_TOKEN",
            TxKind::CreatePool => "CREATE_POOL",
            TxKind::AddLiquidity => "ADD_LIQUIDITY",
            TxKind::RemoveLiquidity => "REMOVE_LIQUIDITY",
            TxKind::Stake => "STAKE",
            TxKind::Unstake => "UNSTAKE",
            TxKind::ClaimRewards => "CLAIM_REWARDS",
            TxKind::Swap => "SWAP",
            TxKind::ProfileUpdate => "PROFILE_UPDATE",
            TxKind::GovernanceProposal => "GOVERNANCE_PROPOSAL",
        }
    }

    /// Kinds that move value out of the sender's balance when applied.
    pub fn debits_sender(self) -> bool {
        matches!(self, TxKind::Transfer | TxKind::Swap | TxKind::Burn)
    }
}

impl TryFrom<i32> for TxKind {
    type Error = ChainError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        TxKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == code)
            .ok_or(ChainError::UnknownTransactionKind(code))
    }
}

impl std::str::FromStr for TxKind {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        TxKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ChainError::UnknownKindName(s.to_string()))
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value object moving `amount` of token `token_index` between two addresses.
/// It has no identity until it is included in a block.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub token_index: i32,
    pub kind: TxKind,
    #[serde(default)]
    pub memo: String,
}

impl Transaction {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        token_index: i32,
        kind: TxKind,
    ) -> Self {
        Transaction {
            from: from.into(),
            to: to.into(),
            amount,
            token_index,
            kind,
            memo: String::new(),
        }
    }

    pub fn transfer(from: impl Into<String>, to: impl Into<String>, amount: f64, token_index: i32) -> Self {
        Self::new(from, to, amount, token_index, TxKind::Transfer)
    }

    pub fn mint(to: impl Into<String>, amount: f64, token_index: i32) -> Self {
        let to = to.into();
        Self::new(to.clone(), to, amount, token_index, TxKind::Mint)
    }

    pub fn burn(from: impl Into<String>, amount: f64, token_index: i32) -> Self {
        let from = from.into();
        Self::new(from.clone(), from, amount, token_index, TxKind::Burn)
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Result<Self, ChainError> {
        let memo = memo.into();
        let len = memo.chars().count();
        if len > MAX_MEMO_LEN {
            return Err(ChainError::MemoTooLong { len, max: MAX_MEMO_LEN });
        }
        self.memo = memo;
        Ok(self)
    }

    /// Canonical byte layout:
    /// `from \0 | to \0 | amount f64 BE | token_index i32 BE | kind i32 BE | memo \0`.
    /// Energy values are defined over exactly these bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.extend_from_slice(self.from.as_bytes());
        out.push(0);
        out.extend_from_slice(self.to.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.amount.to_be_bytes());
        out.extend_from_slice(&self.token_index.to_be_bytes());
        out.extend_from_slice(&self.kind.code().to_be_bytes());
        out.extend_from_slice(self.memo.as_bytes());
        out.push(0);
        out
    }

    /// Length of [`Transaction::canonical_bytes`] without building the buffer.
    pub fn serialized_len(&self) -> usize {
        self.from.len() + 1 + self.to.len() + 1 + 8 + 4 + 4 + self.memo.len() + 1
    }

    /// Content fingerprint over (from, to, token index, amount, kind, memo) used to
    /// detect duplicate transactions inside one block. Every field is length
    /// prefixed and the digest is domain-separated from the energy hash.
    pub fn fingerprint(&self) -> Sha256Hash {
        let mut material = Vec::with_capacity(self.serialized_len() + 32);
        material.extend_from_slice(b"ledgerchain/tx-fingerprint/v1");
        for field in [self.from.as_bytes(), self.to.as_bytes()] {
            material.extend_from_slice(&(field.len() as u64).to_be_bytes());
            material.extend_from_slice(field);
        }
        material.extend_from_slice(&self.token_index.to_be_bytes());
        material.extend_from_slice(&self.amount.to_bits().to_be_bytes());
        material.extend_from_slice(&self.kind.code().to_be_bytes());
        material.extend_from_slice(&(self.memo.len() as u64).to_be_bytes());
        material.extend_from_slice(self.memo.as_bytes());
        sha256(&material)
    }
}
