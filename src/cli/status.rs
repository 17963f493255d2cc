//! Ledger status report.
//!
//! Snapshot of a deployment's custody ledger as shown by `tsd status`.

use serde::Serialize;

use crate::core::amount::TokenAmount;
use crate::core::config::ReconfigurationPolicy;
use crate::core::deployment::Deployment;
use crate::core::ledger::LedgerState;
use crate::core::token::FungibleToken;
use crate::error::Result;
use crate::utils::crypto::{Address, Hash};

/// Status of a custody ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStatus {
    /// Ledger address
    pub ledger: Address,
    /// Administrator
    pub admin: Address,
    /// Managed token, if configured
    pub token: Option<Address>,
    /// Configuration state
    pub state: LedgerState,
    /// Held balance; `None` until a token is configured
    pub held: Option<TokenAmount>,
    /// Decimals of the managed token
    #[serde(skip)]
    pub decimals: Option<u8>,
    /// Reconfiguration policy
    pub reconfiguration: ReconfigurationPolicy,
    /// Retained event count
    pub events: usize,
    /// Deployment state hash
    pub state_hash: Hash,
}

impl LedgerStatus {
    /// Build the status of `deployment`
    pub fn of(deployment: &Deployment) -> Result<Self> {
        let ledger = deployment.ledger();
        let (held, decimals) = match ledger.token_address() {
            Some(token) => (
                Some(deployment.held_balance()?),
                Some(deployment.token(&token)?.decimals()),
            ),
            None => (None, None),
        };

        Ok(Self {
            ledger: ledger.address(),
            admin: ledger.admin(),
            token: ledger.token_address(),
            state: ledger.state(),
            held,
            decimals,
            reconfiguration: ledger.config().reconfiguration,
            events: ledger.events().len(),
            state_hash: deployment.state_hash(),
        })
    }

    /// Held balance formatted with the token's decimals
    pub fn held_display(&self) -> Option<String> {
        match (self.held, self.decimals) {
            (Some(held), Some(decimals)) => Some(held.to_decimal_string(decimals)),
            _ => None,
        }
    }
}
