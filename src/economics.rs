//! Economics module: how transaction energy is bound to native tokens

use crate::blockchain::LedgerState;
use crate::transaction::Transaction;

/// Share of a native-token transaction's energy bound to the token.
pub const BOUND_ENERGY_SHARE: f64 = 0.75;
/// Share of a native-token transaction's energy set aside as reward.
pub const REWARD_ENERGY_SHARE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySplit {
    pub total: f64,
    pub bound: f64,
    pub reward: f64,
}

/// Splits an energy value into its bound and reward shares.
pub fn split_energy(total: f64) -> EnergySplit {
    let bound = total * BOUND_ENERGY_SHARE;
    EnergySplit {
        total,
        bound,
        reward: total - bound,
    }
}

/// Energy split for a transaction moving a native token. Transactions on
/// generic or pool-share tokens, or on unknown indices, have no split.
pub fn energy_split_for(state: &LedgerState, tx: &Transaction) -> Option<EnergySplit> {
    let token = state.checked_token_index(tx.token_index).ok()?;
    let token_type = state.token_type(token)?;
    if !token_type.kind.is_native() {
        return None;
    }
    Some(split_energy(tx.energy()))
}
