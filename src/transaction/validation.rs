//! Validation logic for transactions separated from type definitions

use crate::blockchain::LedgerState;
use crate::error::ChainError;
use crate::transaction::types::{Transaction, TxKind};

impl Transaction {
    /// Validate this transaction against the current registry state. Never mutates.
    ///
    /// Only TRANSFER, SWAP, STAKE, MINT and BURN carry semantic checks; every other
    /// kind passes once the token index and amount sign are acceptable.
    pub fn validate(&self, state: &LedgerState) -> Result<(), ChainError> {
        let token = state.checked_token_index(self.token_index)?;

        if !self.amount.is_finite() {
            return Err(ChainError::NonFiniteAmount(self.amount));
        }
        if self.amount < 0.0 {
            return Err(ChainError::NegativeAmount(self.amount));
        }

        match self.kind {
            TxKind::Transfer | TxKind::Swap | TxKind::Stake | TxKind::Burn => {
                let sender = state
                    .wallet(&self.from)
                    .ok_or_else(|| ChainError::UnknownSender(self.from.clone()))?;
                self.require_positive()?;
                let available = sender.balances.get(token).copied().unwrap_or(0.0);
                if available < self.amount {
                    return Err(ChainError::InsufficientBalance {
                        address: self.from.clone(),
                        token_index: self.token_index,
                        required: self.amount,
                        available,
                    });
                }
            }
            TxKind::Mint => {
                if state.wallet(&self.to).is_none() {
                    return Err(ChainError::UnknownRecipient(self.to.clone()));
                }
                self.require_positive()?;
            }
            TxKind::CreateToken
            | TxKind::CreatePool
            | TxKind::AddLiquidity
            | TxKind::RemoveLiquidity
            | TxKind::Unstake
            | TxKind::ClaimRewards
            | TxKind::ProfileUpdate
            | TxKind::GovernanceProposal => {}
        }

        Ok(())
    }

    fn require_positive(&self) -> Result<(), ChainError> {
        if self.amount <= 0.0 {
            return Err(ChainError::NonPositiveAmount {
                kind: self.kind,
                amount: self.amount,
            });
        }
        Ok(())
    }
}
