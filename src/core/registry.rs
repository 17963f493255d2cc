//! Token directory.
//!
//! The custody ledger stores only a token *address*. Resolving that address
//! to a live token is the job of the surrounding environment, modelled here
//! by the [`TokenDirectory`] trait.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::token::FungibleToken;
use crate::error::{Error, Result};
use crate::utils::crypto::Address;

/// Resolves token addresses to token instances
pub trait TokenDirectory {
    /// Look up a token for reading
    fn token(&self, address: &Address) -> Option<&dyn FungibleToken>;

    /// Look up a token for mutation
    fn token_mut(&mut self, address: &Address) -> Option<&mut dyn FungibleToken>;

    /// Check whether an address resolves to a token
    fn contains(&self, address: &Address) -> bool {
        self.token(address).is_some()
    }
}

/// In-memory directory of deployed tokens of one concrete type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRegistry<T> {
    tokens: BTreeMap<Address, T>,
}

impl<T> Default for TokenRegistry<T> {
    fn default() -> Self {
        Self {
            tokens: BTreeMap::new(),
        }
    }
}

impl<T: FungibleToken> TokenRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token under its own address
    pub fn deploy(&mut self, token: T) -> Result<Address> {
        let address = token.address();
        if address.is_zero() {
            return Err(Error::InvalidParameter {
                name: "token".into(),
                reason: "zero address".into(),
            });
        }
        if self.tokens.contains_key(&address) {
            return Err(Error::InvalidParameter {
                name: "token".into(),
                reason: format!("a token is already deployed at {}", address),
            });
        }
        self.tokens.insert(address, token);
        Ok(address)
    }

    /// Get a concrete token
    pub fn get(&self, address: &Address) -> Option<&T> {
        self.tokens.get(address)
    }

    /// Get a concrete token mutably
    pub fn get_mut(&mut self, address: &Address) -> Option<&mut T> {
        self.tokens.get_mut(address)
    }

    /// Iterate over deployed tokens in address order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tokens.values()
    }

    /// Number of deployed tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<T: FungibleToken> TokenDirectory for TokenRegistry<T> {
    fn token(&self, address: &Address) -> Option<&dyn FungibleToken> {
        self.tokens.get(address).map(|t| -> &dyn FungibleToken { t })
    }

    fn token_mut(&mut self, address: &Address) -> Option<&mut dyn FungibleToken> {
        self.tokens.get_mut(address).map(|t| -> &mut dyn FungibleToken { t })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amount::TokenAmount;
    use crate::core::standard_token::StandardToken;

    #[test]
    fn test_deploy_and_resolve() {
        let owner = Address::from_label("owner");
        let token = StandardToken::deploy(owner, 0, "Mock Token", "MTK", TokenAmount::from_whole(1))
            .unwrap();
        let mut registry = TokenRegistry::new();
        let address = registry.deploy(token).unwrap();

        assert!(registry.contains(&address));
        assert_eq!(
            registry.token(&address).unwrap().balance_of(&owner),
            TokenAmount::from_whole(1)
        );
        assert!(registry.token(&Address::from_label("nothing")).is_none());
    }

    #[test]
    fn test_duplicate_deploy_rejected() {
        let owner = Address::from_label("owner");
        let mut registry = TokenRegistry::new();
        registry.deploy(StandardToken::new(owner, 0, "A", "A")).unwrap();

        let err = registry.deploy(StandardToken::new(owner, 0, "B", "B")).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert_eq!(registry.len(), 1);
    }
}
