//! Fungible token capability.
//!
//! The custody ledger never keeps its own balance book. It talks to an
//! external token through this trait:
//! - Balance and allowance queries
//! - Transfers on behalf of a caller
//! - Allowance-based transfers
//!
//! Implementations must leave their state untouched when they return an error.

use thiserror::Error;

use crate::core::amount::TokenAmount;
use crate::utils::crypto::Address;

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure reported by a fungible token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Sender balance is too small
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance
        have: TokenAmount,
        /// Requested amount
        need: TokenAmount,
    },

    /// Spender allowance is too small
    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance {
        /// Current allowance
        have: TokenAmount,
        /// Requested amount
        need: TokenAmount,
    },

    /// Token transfers are paused
    #[error("token is paused")]
    Paused,

    /// Account is blocked from sending or receiving
    #[error("account {0} is blocked")]
    Blocked(Address),

    /// Transfer to or from the zero address
    #[error("zero address not allowed")]
    ZeroAddress,

    /// Zero-amount movement
    #[error("zero amount not allowed")]
    ZeroAmount,

    /// Balance or supply would overflow
    #[error("arithmetic overflow")]
    Overflow,

    /// Caller lacks a token-level privilege (mint, pause, block)
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

// ═══════════════════════════════════════════════════════════════════════════════
// FUNGIBLE TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// An external fungible-token ledger.
///
/// Every mutating call names its `caller` explicitly; the surrounding
/// execution context is responsible for establishing who that is.
pub trait FungibleToken: Send + Sync {
    /// Address this token is deployed at
    fn address(&self) -> Address;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Ticker symbol
    fn symbol(&self) -> &str;

    /// Decimal places used for display
    fn decimals(&self) -> u8;

    /// Total amount in circulation
    fn total_supply(&self) -> TokenAmount;

    /// Balance held by `owner`
    fn balance_of(&self, owner: &Address) -> TokenAmount;

    /// Amount `spender` may still move out of `owner`'s balance
    fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount;

    /// Move `amount` from `caller` to `to`
    fn transfer(&mut self, caller: &Address, to: &Address, amount: TokenAmount) -> TokenResult<()>;

    /// Let `spender` move up to `amount` from `caller`'s balance
    fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> TokenResult<()>;

    /// Move `amount` from `owner` to `to`, spending `caller`'s allowance
    fn transfer_from(
        &mut self,
        caller: &Address,
        owner: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> TokenResult<()>;
}
