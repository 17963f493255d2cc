//! In-memory fungible token.
//!
//! This module implements a standard allowance-based token:
//! - Minting by the token owner
//! - Balance tracking
//! - Transfers and allowance-based transfers
//! - Pausing and per-account blocking, so rejections can be exercised
//!
//! It stands in for the external token contract the custody ledger manages.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::amount::TokenAmount;
use crate::core::token::{FungibleToken, TokenError, TokenResult};
use crate::utils::constants::{DEFAULT_DECIMALS, TOKEN_ADDRESS_TAG};
use crate::utils::crypto::{Address, Hash};

/// A standard fungible token held entirely in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardToken {
    /// Deployed address
    address: Address,
    /// Account allowed to mint, pause and block
    owner: Address,
    /// Token name
    name: String,
    /// Token symbol
    symbol: String,
    /// Decimal places
    decimals: u8,
    /// Total supply
    total_supply: TokenAmount,
    /// Balances by account
    balances: HashMap<Address, TokenAmount>,
    /// Allowances by owner, then spender
    allowances: HashMap<Address, HashMap<Address, TokenAmount>>,
    /// Whether transfers are paused
    paused: bool,
    /// Accounts that may neither send nor receive
    blocked: HashSet<Address>,
}

impl StandardToken {
    /// Create a token owned by `owner`; its address derives from owner and nonce
    pub fn new(owner: Address, nonce: u64, name: &str, symbol: &str) -> Self {
        Self {
            address: Address::derive(TOKEN_ADDRESS_TAG, &owner, nonce),
            owner,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: DEFAULT_DECIMALS,
            total_supply: TokenAmount::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            paused: false,
            blocked: HashSet::new(),
        }
    }

    /// Create a token and mint `initial_supply` to its owner
    pub fn deploy(
        owner: Address,
        nonce: u64,
        name: &str,
        symbol: &str,
        initial_supply: TokenAmount,
    ) -> TokenResult<Self> {
        let mut token = Self::new(owner, nonce, name, symbol);
        if !initial_supply.is_zero() {
            token.mint(&owner, &owner, initial_supply)?;
        }
        Ok(token)
    }

    /// Token owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether transfers are paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether an account is blocked
    pub fn is_blocked(&self, account: &Address) -> bool {
        self.blocked.contains(account)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OWNER OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mint new tokens to `to`
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: TokenAmount) -> TokenResult<()> {
        self.ensure_owner(caller, "mint")?;
        if amount.is_zero() {
            return Err(TokenError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert(*to, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Pause or unpause all transfers
    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> TokenResult<()> {
        self.ensure_owner(caller, "pause")?;
        self.paused = paused;
        Ok(())
    }

    /// Block or unblock an account
    pub fn set_blocked(&mut self, caller: &Address, account: Address, blocked: bool) -> TokenResult<()> {
        self.ensure_owner(caller, "block")?;
        if blocked {
            self.blocked.insert(account);
        } else {
            self.blocked.remove(&account);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get number of token holders
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Verify supply invariant (total_supply == sum of all balances)
    pub fn verify_supply_invariant(&self) -> bool {
        let sum = self
            .balances
            .values()
            .try_fold(TokenAmount::ZERO, |acc, b| acc.checked_add(*b));
        sum == Some(self.total_supply)
    }

    /// Compute state hash over supply and sorted balances
    pub fn state_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(self.address.as_bytes());
        data.extend_from_slice(&self.total_supply.units().to_be_bytes());

        let mut sorted_balances: Vec<_> = self.balances.iter().collect();
        sorted_balances.sort_by_key(|(k, _)| **k);

        for (account, balance) in sorted_balances {
            data.extend_from_slice(account.as_bytes());
            data.extend_from_slice(&balance.units().to_be_bytes());
        }

        Hash::sha256(&data)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    fn ensure_owner(&self, caller: &Address, what: &str) -> TokenResult<()> {
        if *caller != self.owner {
            return Err(TokenError::Unauthorized(format!("only the owner may {}", what)));
        }
        Ok(())
    }

    /// Validate a movement without touching state
    fn check_movement(&self, from: &Address, to: &Address, amount: TokenAmount) -> TokenResult<()> {
        if amount.is_zero() {
            return Err(TokenError::ZeroAmount);
        }
        if self.paused {
            return Err(TokenError::Paused);
        }
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if self.is_blocked(from) {
            return Err(TokenError::Blocked(*from));
        }
        if self.is_blocked(to) {
            return Err(TokenError::Blocked(*to));
        }

        let have = self.balance_of(from);
        if have < amount {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }
        if from != to && self.balance_of(to).checked_add(amount).is_none() {
            return Err(TokenError::Overflow);
        }
        Ok(())
    }

    /// Apply a movement already validated by `check_movement`
    fn apply_movement(&mut self, from: &Address, to: &Address, amount: TokenAmount) {
        if from == to {
            return;
        }

        let new_from = self.balance_of(from).saturating_sub(amount);
        if new_from.is_zero() {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, new_from);
        }

        let new_to = self.balance_of(to).saturating_add(amount);
        self.balances.insert(*to, new_to);
    }
}

impl FungibleToken for StandardToken {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    fn balance_of(&self, owner: &Address) -> TokenAmount {
        self.balances.get(owner).copied().unwrap_or(TokenAmount::ZERO)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    fn transfer(&mut self, caller: &Address, to: &Address, amount: TokenAmount) -> TokenResult<()> {
        self.check_movement(caller, to, amount)?;
        self.apply_movement(caller, to, amount);
        Ok(())
    }

    fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> TokenResult<()> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if amount.is_zero() {
            if let Some(spenders) = self.allowances.get_mut(caller) {
                spenders.remove(spender);
            }
        } else {
            self.allowances
                .entry(*caller)
                .or_default()
                .insert(*spender, amount);
        }
        Ok(())
    }

    fn transfer_from(
        &mut self,
        caller: &Address,
        owner: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> TokenResult<()> {
        let allowed = self.allowance(owner, caller);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance { have: allowed, need: amount });
        }
        self.check_movement(owner, to, amount)?;

        // An allowance of MAX never decreases.
        if allowed != TokenAmount::MAX {
            let remaining = allowed.saturating_sub(amount);
            if let Some(spenders) = self.allowances.get_mut(owner) {
                if remaining.is_zero() {
                    spenders.remove(caller);
                } else {
                    spenders.insert(*caller, remaining);
                }
            }
        }
        self.apply_movement(owner, to, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn mock_token() -> StandardToken {
        StandardToken::deploy(owner(), 0, "Mock Token", "MTK", TokenAmount::from_whole(10_000))
            .unwrap()
    }

    #[test]
    fn test_deploy_mints_to_owner() {
        let token = mock_token();
        assert_eq!(token.balance_of(&owner()), TokenAmount::from_whole(10_000));
        assert_eq!(token.total_supply(), TokenAmount::from_whole(10_000));
        assert_eq!(token.symbol(), "MTK");
        assert_eq!(token.decimals(), 18);
        assert!(!token.address().is_zero());
    }

    #[test]
    fn test_transfer() {
        let mut token = mock_token();
        token.transfer(&owner(), &alice(), TokenAmount::from_whole(300)).unwrap();

        assert_eq!(token.balance_of(&owner()), TokenAmount::from_whole(9_700));
        assert_eq!(token.balance_of(&alice()), TokenAmount::from_whole(300));
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_transfer_insufficient_balance_leaves_state() {
        let mut token = mock_token();
        let before = token.state_hash();

        let err = token
            .transfer(&alice(), &bob(), TokenAmount::from_units(1))
            .unwrap_err();

        assert_eq!(
            err,
            TokenError::InsufficientBalance {
                have: TokenAmount::ZERO,
                need: TokenAmount::from_units(1),
            }
        );
        assert_eq!(token.state_hash(), before);
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut token = mock_token();
        token.approve(&owner(), &alice(), TokenAmount::from_whole(100)).unwrap();
        token
            .transfer_from(&alice(), &owner(), &bob(), TokenAmount::from_whole(40))
            .unwrap();

        assert_eq!(token.balance_of(&bob()), TokenAmount::from_whole(40));
        assert_eq!(token.allowance(&owner(), &alice()), TokenAmount::from_whole(60));

        let err = token
            .transfer_from(&alice(), &owner(), &bob(), TokenAmount::from_whole(61))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));
    }

    #[test]
    fn test_paused_and_blocked() {
        let mut token = mock_token();

        token.set_paused(&owner(), true).unwrap();
        assert_eq!(
            token.transfer(&owner(), &alice(), TokenAmount::from_units(1)),
            Err(TokenError::Paused)
        );
        token.set_paused(&owner(), false).unwrap();

        token.set_blocked(&owner(), alice(), true).unwrap();
        assert_eq!(
            token.transfer(&owner(), &alice(), TokenAmount::from_units(1)),
            Err(TokenError::Blocked(alice()))
        );
    }

    #[test]
    fn test_owner_only_operations() {
        let mut token = mock_token();
        assert!(matches!(
            token.mint(&alice(), &alice(), TokenAmount::from_units(1)),
            Err(TokenError::Unauthorized(_))
        ));
        assert!(matches!(
            token.set_paused(&alice(), true),
            Err(TokenError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_zero_amount_and_self_transfer() {
        let mut token = mock_token();
        assert_eq!(
            token.transfer(&owner(), &alice(), TokenAmount::ZERO),
            Err(TokenError::ZeroAmount)
        );

        token.transfer(&owner(), &owner(), TokenAmount::from_whole(1)).unwrap();
        assert_eq!(token.balance_of(&owner()), TokenAmount::from_whole(10_000));
    }

    #[test]
    fn test_holder_count() {
        let mut token = mock_token();
        assert_eq!(token.holder_count(), 1);

        token.transfer(&owner(), &alice(), TokenAmount::from_whole(10_000)).unwrap();
        assert_eq!(token.holder_count(), 1);
        assert_eq!(token.balance_of(&owner()), TokenAmount::ZERO);
    }
}
