use crate::crypto::is_valid_address;
use crate::error::ChainError;
use crate::transaction::{Transaction, TxKind};
use tracing::{debug, warn};

pub const MAX_TOKEN_SYMBOL_LEN: usize = 16;
pub const MAX_TOKEN_NAME_LEN: usize = 64;
pub const MAX_TOKEN_TYPES: usize = 64;
pub const MAX_WALLETS: usize = 1024;
pub const MAX_POOLS: usize = 256;
pub const MAX_STAKES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    NativeGovernance,
    NativeUtility,
    NativeReserve,
    Generic,
    LiquidityPoolShare,
}

impl TokenKind {
    pub fn is_native(self) -> bool {
        matches!(
            self,
            TokenKind::NativeGovernance | TokenKind::NativeUtility | TokenKind::NativeReserve
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TokenType {
    pub name: String,
    pub symbol: String,
    pub decimals: i32,
    pub kind: TokenKind,
    /// Reserved; no formula reads it yet.
    pub energy_binding_factor: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Wallet {
    pub address: String,
    /// Number of token types this wallet's balances cover.
    pub token_count: usize,
    /// One balance per registered token type, index-aligned with the registry.
    pub balances: Vec<f64>,
}

impl Wallet {
    pub fn balance(&self, token_index: usize) -> Option<f64> {
        self.balances.get(token_index).copied()
    }
}

/// Reserves are only ever changed through direct deltas; no pricing curve lives here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LiquidityPool {
    pub token_x_index: i32,
    pub token_y_index: i32,
    pub reserve_x: f64,
    pub reserve_y: f64,
    pub lp_token_index: i32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StakingPosition {
    pub owner: String,
    pub token_index: i32,
    pub amount: f64,
    pub start_timestamp: u64,
    pub lock_until: u64,
    pub accumulated_rewards: f64,
}

/// Token/wallet registry plus pool and stake books.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LedgerState {
    pub token_types: Vec<TokenType>,
    pub wallets: Vec<Wallet>,
    pub pools: Vec<LiquidityPool>,
    pub stakes: Vec<StakingPosition>,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// False for negative values, NaN and both infinities.
pub fn is_finite_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.token_types.len()
    }

    /// Maps a signed wire token index onto the registry, rejecting anything outside
    /// `[0, token_count)`.
    pub fn checked_token_index(&self, token_index: i32) -> Result<usize, ChainError> {
        usize::try_from(token_index)
            .ok()
            .filter(|&idx| idx < self.token_types.len())
            .ok_or(ChainError::TokenIndexOutOfRange {
                index: token_index,
                count: self.token_types.len(),
            })
    }

    /// Registers a token type and grows every existing wallet by one zero balance so
    /// balances stay index-aligned with the registry.
    pub fn add_token_type(
        &mut self,
        name: &str,
        symbol: &str,
        decimals: i32,
        kind: TokenKind,
        energy_binding_factor: f64,
    ) -> Result<usize, ChainError> {
        if self.token_types.len() >= MAX_TOKEN_TYPES {
            warn!("Token registry full; refusing token {:?}", symbol);
            return Err(ChainError::CapacityExceeded {
                resource: "token types",
                limit: MAX_TOKEN_TYPES,
            });
        }

        self.token_types.push(TokenType {
            name: truncate_chars(name, MAX_TOKEN_NAME_LEN),
            symbol: truncate_chars(symbol, MAX_TOKEN_SYMBOL_LEN),
            decimals,
            kind,
            energy_binding_factor,
        });
        let count = self.token_types.len();
        for wallet in &mut self.wallets {
            wallet.balances.resize(count, 0.0);
            wallet.token_count = count;
        }

        debug!("Registered token type #{} ({})", count - 1, symbol);
        Ok(count - 1)
    }

    pub fn token_type(&self, index: usize) -> Option<&TokenType> {
        self.token_types.get(index)
    }

    pub fn find_wallet(&self, address: &str) -> Option<usize> {
        self.wallets.iter().position(|w| w.address == address)
    }

    pub fn wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.address == address)
    }

    pub fn balance(&self, address: &str, token_index: usize) -> Option<f64> {
        self.wallet(address).and_then(|w| w.balance(token_index))
    }

    /// Returns the index of the wallet for `address`, creating it with a zeroed
    /// balance vector when it does not exist yet.
    pub fn find_or_create_wallet(&mut self, address: &str) -> Result<usize, ChainError> {
        if let Some(idx) = self.find_wallet(address) {
            return Ok(idx);
        }
        if !is_valid_address(address) {
            return Err(ChainError::InvalidAddress(address.to_string()));
        }
        if self.wallets.len() >= MAX_WALLETS {
            warn!("Wallet registry full; refusing {:?}", address);
            return Err(ChainError::CapacityExceeded {
                resource: "wallets",
                limit: MAX_WALLETS,
            });
        }

        let count = self.token_types.len();
        self.wallets.push(Wallet {
            address: address.to_string(),
            token_count: count,
            balances: vec![0.0; count],
        });
        Ok(self.wallets.len() - 1)
    }

    pub fn create_pool(
        &mut self,
        token_x_index: i32,
        token_y_index: i32,
        lp_token_index: i32,
    ) -> Result<usize, ChainError> {
        if self.pools.len() >= MAX_POOLS {
            return Err(ChainError::CapacityExceeded {
                resource: "liquidity pools",
                limit: MAX_POOLS,
            });
        }
        for index in [token_x_index, token_y_index, lp_token_index] {
            self.checked_token_index(index)?;
        }
        if token_x_index == token_y_index {
            return Err(ChainError::InvalidPool(format!(
                "pool pairs token {} with itself",
                token_x_index
            )));
        }

        self.pools.push(LiquidityPool {
            token_x_index,
            token_y_index,
            reserve_x: 0.0,
            reserve_y: 0.0,
            lp_token_index,
        });
        Ok(self.pools.len() - 1)
    }

    /// Applies signed deltas to both reserves of a pool. Rejected without effect if
    /// either reserve would drop below zero or stop being finite.
    pub fn adjust_pool_reserves(&mut self, pool_id: usize, delta_x: f64, delta_y: f64) -> Result<(), ChainError> {
        let pool = self.pools.get_mut(pool_id).ok_or(ChainError::PoolNotFound(pool_id))?;
        let reserve_x = pool.reserve_x + delta_x;
        let reserve_y = pool.reserve_y + delta_y;
        if !(is_finite_non_negative(reserve_x) && is_finite_non_negative(reserve_y)) {
            return Err(ChainError::InvalidPool(format!(
                "reserves of pool {} would become ({}, {})",
                pool_id, reserve_x, reserve_y
            )));
        }
        pool.reserve_x = reserve_x;
        pool.reserve_y = reserve_y;
        Ok(())
    }

    pub fn open_stake(&mut self, position: StakingPosition) -> Result<usize, ChainError> {
        if self.stakes.len() >= MAX_STAKES {
            return Err(ChainError::CapacityExceeded {
                resource: "staking positions",
                limit: MAX_STAKES,
            });
        }
        if !is_valid_address(&position.owner) {
            return Err(ChainError::InvalidAddress(position.owner));
        }
        self.checked_token_index(position.token_index)?;
        if !(is_finite_non_negative(position.amount) && is_finite_non_negative(position.accumulated_rewards)) {
            return Err(ChainError::InvalidStake(format!(
                "amount {} and rewards {} must be finite and not negative",
                position.amount, position.accumulated_rewards
            )));
        }
        if position.lock_until < position.start_timestamp {
            return Err(ChainError::InvalidStake(format!(
                "lock_until {} precedes start {}",
                position.lock_until, position.start_timestamp
            )));
        }

        self.stakes.push(position);
        Ok(self.stakes.len() - 1)
    }

    pub fn accrue_stake_rewards(&mut self, stake_id: usize, amount: f64) -> Result<(), ChainError> {
        if !amount.is_finite() {
            return Err(ChainError::NonFiniteAmount(amount));
        }
        if amount < 0.0 {
            return Err(ChainError::NegativeAmount(amount));
        }
        let stake = self.stakes.get_mut(stake_id).ok_or(ChainError::StakeNotFound(stake_id))?;
        let accumulated = stake.accumulated_rewards + amount;
        if !accumulated.is_finite() {
            return Err(ChainError::NonFiniteAmount(accumulated));
        }
        stake.accumulated_rewards = accumulated;
        Ok(())
    }

    /// Applies an already validated transaction. Both wallets are created on demand.
    ///
    /// A token index outside a wallet's balance vector means the caller skipped
    /// validation; it is reported as an invariant violation.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<(), ChainError> {
        let token = self
            .checked_token_index(tx.token_index)
            .map_err(|e| ChainError::InvariantViolation(format!("applying unvalidated transaction: {}", e)))?;
        let from_idx = self.find_or_create_wallet(&tx.from)?;
        let to_idx = self.find_or_create_wallet(&tx.to)?;

        match tx.kind {
            TxKind::Transfer | TxKind::Swap => {
                *self.balance_slot(from_idx, token)? -= tx.amount;
                *self.balance_slot(to_idx, token)? += tx.amount;
            }
            TxKind::Mint => {
                *self.balance_slot(to_idx, token)? += tx.amount;
            }
            TxKind::Burn => {
                *self.balance_slot(from_idx, token)? -= tx.amount;
            }
            TxKind::Stake
            | TxKind::Unstake
            | TxKind::ClaimRewards
            | TxKind::CreateToken
            | TxKind::CreatePool
            | TxKind::AddLiquidity
            | TxKind::RemoveLiquidity
            | TxKind::ProfileUpdate
            | TxKind::GovernanceProposal => {}
        }
        Ok(())
    }

    fn balance_slot(&mut self, wallet_idx: usize, token: usize) -> Result<&mut f64, ChainError> {
        let wallet = self
            .wallets
            .get_mut(wallet_idx)
            .ok_or_else(|| ChainError::InvariantViolation(format!("wallet #{} vanished", wallet_idx)))?;
        let address = wallet.address.clone();
        wallet.balances.get_mut(token).ok_or_else(|| {
            ChainError::InvariantViolation(format!(
                "wallet {:?} has no balance slot for token {}",
                address, token
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_tokens(n: usize) -> LedgerState {
        let mut state = LedgerState::new();
        for i in 0..n {
            state
                .add_token_type(&format!("Token {i}"), &format!("TK{i}"), 8, TokenKind::Generic, 0.75)
                .unwrap();
        }
        state
    }

    #[test]
    fn test_new_token_grows_existing_wallets() {
        let mut state = state_with_tokens(2);
        state.find_or_create_wallet("alice").unwrap();
        state.find_or_create_wallet("bob").unwrap();
        state.wallets[0].balances[1] = 5.0;

        let idx = state.add_token_type("Fresh", "FRSH", 2, TokenKind::Generic, 0.0).unwrap();
        assert_eq!(idx, 2);
        for wallet in &state.wallets {
            assert_eq!(wallet.balances.len(), 3);
            assert_eq!(wallet.token_count, 3);
            assert_eq!(wallet.balances[2], 0.0);
        }
        assert_eq!(state.wallets[0].balances[1], 5.0);
    }

    #[test]
    fn test_token_registry_capacity() {
        let mut state = state_with_tokens(MAX_TOKEN_TYPES);
        let err = state.add_token_type("One more", "MORE", 0, TokenKind::Generic, 0.0).unwrap_err();
        assert!(matches!(err, ChainError::CapacityExceeded { limit: MAX_TOKEN_TYPES, .. }));
        assert_eq!(state.token_count(), MAX_TOKEN_TYPES);
    }

    #[test]
    fn test_token_name_and_symbol_truncated() {
        let mut state = LedgerState::new();
        let long_name = "n".repeat(100);
        let long_symbol = "S".repeat(40);
        state.add_token_type(&long_name, &long_symbol, 0, TokenKind::Generic, 0.0).unwrap();
        assert_eq!(state.token_types[0].name.chars().count(), MAX_TOKEN_NAME_LEN);
        assert_eq!(state.token_types[0].symbol.chars().count(), MAX_TOKEN_SYMBOL_LEN);
    }

    #[test]
    fn test_find_or_create_wallet_is_idempotent() {
        let mut state = state_with_tokens(3);
        let a = state.find_or_create_wallet("alice").unwrap();
        let b = state.find_or_create_wallet("alice").unwrap();
        assert_eq!(a, b);
        assert_eq!(state.wallets.len(), 1);
        assert_eq!(state.wallets[0].balances, vec![0.0; 3]);
    }

    #[test]
    fn test_wallet_capacity_and_address_checks() {
        let mut state = state_with_tokens(1);
        for i in 0..MAX_WALLETS {
            state.find_or_create_wallet(&format!("w{i}")).unwrap();
        }
        let err = state.find_or_create_wallet("overflow").unwrap_err();
        assert!(matches!(err, ChainError::CapacityExceeded { limit: MAX_WALLETS, .. }));
        // Existing wallets are still found at capacity.
        assert!(state.find_or_create_wallet("w0").is_ok());

        let mut fresh = state_with_tokens(1);
        assert!(matches!(
            fresh.find_or_create_wallet(""),
            Err(ChainError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_apply_transfer_and_swap_move_balance() {
        let mut state = state_with_tokens(2);
        let alice = state.find_or_create_wallet("alice").unwrap();
        state.wallets[alice].balances[1] = 10.0;

        state.apply_transaction(&Transaction::transfer("alice", "bob", 4.0, 1)).unwrap();
        state
            .apply_transaction(&Transaction::new("alice", "bob", 1.0, 1, TxKind::Swap))
            .unwrap();

        assert_eq!(state.balance("alice", 1), Some(5.0));
        assert_eq!(state.balance("bob", 1), Some(5.0));
        assert_eq!(state.balance("bob", 0), Some(0.0));
    }

    #[test]
    fn test_apply_mint_burn_and_inert_kinds() {
        let mut state = state_with_tokens(1);
        state.apply_transaction(&Transaction::mint("carol", 7.5, 0)).unwrap();
        state.apply_transaction(&Transaction::burn("carol", 2.5, 0)).unwrap();
        state
            .apply_transaction(&Transaction::new("carol", "dave", 3.0, 0, TxKind::Stake))
            .unwrap();

        assert_eq!(state.balance("carol", 0), Some(5.0));
        // Inert kinds still register both parties.
        assert_eq!(state.balance("dave", 0), Some(0.0));
    }

    #[test]
    fn test_apply_rejects_unvalidated_token_index() {
        let mut state = state_with_tokens(1);
        let err = state.apply_transaction(&Transaction::transfer("a", "b", 1.0, 5)).unwrap_err();
        assert!(matches!(err, ChainError::InvariantViolation(_)));
        assert!(state.wallets.is_empty());
    }

    #[test]
    fn test_pool_reserve_deltas() {
        let mut state = state_with_tokens(3);
        let pool = state.create_pool(0, 1, 2).unwrap();
        state.adjust_pool_reserves(pool, 100.0, 50.0).unwrap();
        state.adjust_pool_reserves(pool, -40.0, 10.0).unwrap();
        assert_eq!(state.pools[pool].reserve_x, 60.0);
        assert_eq!(state.pools[pool].reserve_y, 60.0);

        assert!(state.adjust_pool_reserves(pool, -61.0, 0.0).is_err());
        assert_eq!(state.pools[pool].reserve_x, 60.0);
        assert!(matches!(state.adjust_pool_reserves(9, 1.0, 1.0), Err(ChainError::PoolNotFound(9))));
        assert!(matches!(
            state.create_pool(0, 7, 2),
            Err(ChainError::TokenIndexOutOfRange { index: 7, .. })
        ));
        assert!(matches!(state.create_pool(1, 1, 2), Err(ChainError::InvalidPool(_))));

        assert!(matches!(
            state.adjust_pool_reserves(pool, f64::INFINITY, 0.0),
            Err(ChainError::InvalidPool(_))
        ));
        assert!(state.adjust_pool_reserves(pool, 0.0, f64::NAN).is_err());
        assert_eq!(state.pools[pool].reserve_x, 60.0);
        assert_eq!(state.pools[pool].reserve_y, 60.0);
    }

    #[test]
    fn test_stake_book_checks() {
        let mut state = state_with_tokens(1);
        let position = StakingPosition {
            owner: "alice".to_string(),
            token_index: 0,
            amount: 10.0,
            start_timestamp: 100,
            lock_until: 200,
            accumulated_rewards: 0.0,
        };
        let id = state.open_stake(position.clone()).unwrap();
        state.accrue_stake_rewards(id, 1.5).unwrap();
        assert_eq!(state.stakes[id].accumulated_rewards, 1.5);
        assert!(state.accrue_stake_rewards(id, -1.0).is_err());
        assert_eq!(
            state.accrue_stake_rewards(id, f64::INFINITY),
            Err(ChainError::NonFiniteAmount(f64::INFINITY))
        );
        assert!(matches!(state.accrue_stake_rewards(id, f64::MAX), Ok(())));
        assert!(matches!(
            state.accrue_stake_rewards(id, f64::MAX),
            Err(ChainError::NonFiniteAmount(_))
        ));
        assert_eq!(state.stakes[id].accumulated_rewards, f64::MAX);
        let unbounded = StakingPosition { amount: f64::INFINITY, ..position.clone() };
        assert!(matches!(state.open_stake(unbounded), Err(ChainError::InvalidStake(_))));

        let early = StakingPosition { lock_until: 50, ..position.clone() };
        assert!(matches!(state.open_stake(early), Err(ChainError::InvalidStake(_))));
        let bad_owner = StakingPosition { owner: String::new(), ..position };
        assert!(matches!(state.open_stake(bad_owner), Err(ChainError::InvalidAddress(_))));
    }
}
