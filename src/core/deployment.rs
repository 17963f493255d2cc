//! Execution environment for a custody ledger.
//!
//! A [`Deployment`] bundles one ledger with the tokens it can see, the way a
//! chain bundles a contract with the contracts it calls. [`SharedDeployment`]
//! serializes access to it: one operation at a time, each applied fully or
//! not at all.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::core::amount::TokenAmount;
use crate::core::config::LedgerConfig;
use crate::core::ledger::{CustodyLedger, WithdrawalReceipt};
use crate::core::registry::TokenRegistry;
use crate::core::standard_token::StandardToken;
use crate::core::token::FungibleToken;
use crate::error::{Error, Result};
use crate::utils::crypto::{Address, Hash};

// ═══════════════════════════════════════════════════════════════════════════════
// DEPLOYMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A custody ledger plus the tokens deployed alongside it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// The custody ledger
    ledger: CustodyLedger,
    /// Deployed tokens
    tokens: TokenRegistry<StandardToken>,
    /// Nonce for the next token deployment
    next_nonce: u64,
}

impl Deployment {
    /// Deploy a new ledger administered by `admin`
    pub fn new(admin: Address, config: LedgerConfig) -> Result<Self> {
        Ok(Self {
            ledger: CustodyLedger::with_config(admin, 0, config)?,
            tokens: TokenRegistry::new(),
            next_nonce: 0,
        })
    }

    /// The custody ledger
    pub fn ledger(&self) -> &CustodyLedger {
        &self.ledger
    }

    /// Deployed tokens
    pub fn tokens(&self) -> &TokenRegistry<StandardToken> {
        &self.tokens
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TOKENS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deploy a token owned by `owner`, minting `initial_supply` to it
    pub fn deploy_token(
        &mut self,
        owner: Address,
        name: &str,
        symbol: &str,
        initial_supply: TokenAmount,
    ) -> Result<Address> {
        let nonce = self.next_nonce;
        let token = StandardToken::deploy(owner, nonce, name, symbol, initial_supply)
            .map_err(|e| Error::InvalidParameter {
                name: "token".into(),
                reason: e.to_string(),
            })?;
        let address = self.tokens.deploy(token)?;
        self.next_nonce += 1;
        Ok(address)
    }

    /// Balance of `owner` in `token`
    pub fn balance_of(&self, token: &Address, owner: &Address) -> Result<TokenAmount> {
        Ok(self.token(token)?.balance_of(owner))
    }

    /// Mint `amount` of `token` to `to` (token owner only)
    pub fn mint(
        &mut self,
        token: &Address,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        self.token_mut(token)?
            .mint(caller, to, amount)
            .map_err(|e| Error::from_token(*token, e))
    }

    /// Transfer `amount` of `token` from `caller` to `to`
    pub fn transfer(
        &mut self,
        token: &Address,
        caller: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        self.token_mut(token)?
            .transfer(caller, to, amount)
            .map_err(|e| Error::from_token(*token, e))
    }

    /// Approve `spender` for `amount` of `caller`'s `token`
    pub fn approve(
        &mut self,
        token: &Address,
        caller: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        self.token_mut(token)?
            .approve(caller, spender, amount)
            .map_err(|e| Error::from_token(*token, e))
    }

    /// Look up a concrete token
    pub fn token(&self, address: &Address) -> Result<&StandardToken> {
        self.tokens.get(address).ok_or(Error::UnknownToken(*address))
    }

    fn token_mut(&mut self, address: &Address) -> Result<&mut StandardToken> {
        self.tokens
            .get_mut(address)
            .ok_or(Error::UnknownToken(*address))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LEDGER
    // ═══════════════════════════════════════════════════════════════════════════

    /// See [`CustodyLedger::set_token_address`]
    pub fn set_token_address(&mut self, caller: &Address, token: Address) -> Result<()> {
        self.ledger.set_token_address(caller, token, &self.tokens)
    }

    /// See [`CustodyLedger::withdraw`]
    pub fn withdraw(
        &mut self,
        caller: &Address,
        token: &Address,
        amount: TokenAmount,
    ) -> Result<WithdrawalReceipt> {
        self.ledger.withdraw(caller, token, amount, &mut self.tokens)
    }

    /// See [`CustodyLedger::deposit`]
    pub fn deposit(&mut self, caller: &Address, amount: TokenAmount) -> Result<()> {
        self.ledger.deposit(caller, amount, &mut self.tokens)
    }

    /// See [`CustodyLedger::held_balance`]
    pub fn held_balance(&self) -> Result<TokenAmount> {
        self.ledger.held_balance(&self.tokens)
    }

    /// Hash over the ledger configuration and every token's balances
    pub fn state_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(self.ledger.address().as_bytes());
        data.extend_from_slice(self.ledger.admin().as_bytes());
        if let Some(token) = self.ledger.token_address() {
            data.extend_from_slice(token.as_bytes());
        }
        for token in self.tokens.iter() {
            data.extend_from_slice(token.state_hash().as_bytes());
        }
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED DEPLOYMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Thread-safe handle applying operations one at a time
#[derive(Debug, Clone)]
pub struct SharedDeployment {
    inner: Arc<Mutex<Deployment>>,
}

impl SharedDeployment {
    /// Wrap a deployment
    pub fn new(deployment: Deployment) -> Self {
        Self {
            inner: Arc::new(Mutex::new(deployment)),
        }
    }

    /// Apply an operation atomically.
    ///
    /// The operation runs on a working copy under the lock; the copy replaces
    /// the shared state only when the operation returns `Ok`.
    pub fn apply<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut Deployment) -> Result<R>,
    {
        let mut guard = self.inner.lock().map_err(|_| Error::Lock)?;
        let mut working = guard.clone();
        let output = op(&mut working)?;
        *guard = working;
        Ok(output)
    }

    /// Read the current state
    pub fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Deployment) -> R,
    {
        let guard = self.inner.lock().map_err(|_| Error::Lock)?;
        Ok(f(&guard))
    }

    /// Clone the current state
    pub fn snapshot(&self) -> Result<Deployment> {
        self.read(Deployment::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn setup() -> (Deployment, Address, Address) {
        let admin = Address::from_label("admin");
        let mut deployment = Deployment::new(admin, LedgerConfig::default()).unwrap();
        let token = deployment
            .deploy_token(admin, "Mock Token", "MTK", TokenAmount::from_whole(10_000))
            .unwrap();
        deployment.set_token_address(&admin, token).unwrap();
        (deployment, admin, token)
    }

    #[test]
    fn test_token_nonces_advance() {
        let (mut deployment, admin, first) = setup();
        let second = deployment
            .deploy_token(admin, "Other", "OTH", TokenAmount::ZERO)
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(deployment.tokens().len(), 2);
    }

    #[test]
    fn test_failed_apply_leaves_state_untouched() {
        let (deployment, admin, token) = setup();
        let shared = SharedDeployment::new(deployment);
        let before = shared.read(Deployment::state_hash).unwrap();

        let result = shared.apply(|d| {
            let ledger = d.ledger().address();
            d.transfer(&token, &admin, &ledger, TokenAmount::from_whole(5))?;
            d.withdraw(&admin, &token, TokenAmount::from_whole(6))
        });

        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(shared.read(Deployment::state_hash).unwrap(), before);
        assert_eq!(
            shared.read(|d| d.held_balance()).unwrap().unwrap(),
            TokenAmount::ZERO
        );
    }

    #[test]
    fn test_concurrent_withdrawals_serialize() {
        let (mut deployment, admin, token) = setup();
        let ledger = deployment.ledger().address();
        deployment
            .transfer(&token, &admin, &ledger, TokenAmount::from_units(100))
            .unwrap();
        let shared = SharedDeployment::new(deployment);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        let _ = shared.apply(|d| d.withdraw(&admin, &token, TokenAmount::from_units(1)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = shared.snapshot().unwrap();
        assert_eq!(snapshot.held_balance().unwrap(), TokenAmount::from_units(20));
        assert_eq!(snapshot.ledger().events().len(), 1 + 80);
        assert!(snapshot.token(&token).unwrap().verify_supply_invariant());
    }
}
