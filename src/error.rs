//! Error types for the custody ledger.
//!
//! This module defines all error types surfaced by the ledger,
//! providing clear and actionable error messages.

use thiserror::Error;

use crate::core::amount::TokenAmount;
use crate::core::token::TokenError;
use crate::utils::crypto::Address;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Privileged ledger actions, carried by [`Error::Unauthorized`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Changing the managed token reference
    SetTokenAddress,
    /// Releasing funds to the administrator
    Withdraw,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::SetTokenAddress => write!(f, "set the token address"),
            Action::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// Main error type for the custody ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Caller is not the administrator
    #[error("admin only: {caller} may not {action}")]
    Unauthorized {
        /// The rejected caller
        caller: Address,
        /// What the caller attempted
        action: Action,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════════

    /// No managed token reference has been set yet
    #[error("token address is not configured")]
    NotConfigured,

    /// Requested token differs from the managed one
    #[error("token mismatch: ledger manages {configured}, got {requested}")]
    TokenMismatch {
        /// Managed token reference
        configured: Address,
        /// Token named by the caller
        requested: Address,
    },

    /// Token reference does not resolve to a deployed token
    #[error("unknown token: {0}")]
    UnknownToken(Address),

    /// Reconfiguration refused because the current token still has a balance
    #[error("cannot replace token {token} while the ledger holds {held}")]
    FundsStillHeld {
        /// Currently managed token
        token: Address,
        /// Balance still held
        held: TokenAmount,
    },

    /// Reconfiguration refused by policy
    #[error("token address is already set to {0} and cannot be changed")]
    ReconfigurationDisabled(Address),

    // ═══════════════════════════════════════════════════════════════════
    // Funds Errors (forwarded from the token)
    // ═══════════════════════════════════════════════════════════════════

    /// The ledger does not hold enough of the token
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Requested amount
        required: TokenAmount,
        /// Amount actually held
        available: TokenAmount,
    },

    /// The token declined the transfer for its own reasons
    #[error("transfer rejected by token {token}: {source}")]
    TransferRejected {
        /// Token that rejected the transfer
        token: Address,
        /// The token's own error, unmodified
        source: TokenError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Amount is zero
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Lock acquisition failed
    #[error("Failed to acquire lock")]
    Lock,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Map a token failure raised while moving funds on `token`.
    ///
    /// Balance shortfalls become [`Error::InsufficientFunds`]; everything else
    /// is forwarded untouched inside [`Error::TransferRejected`].
    pub fn from_token(token: Address, err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance { have, need } => Error::InsufficientFunds {
                required: need,
                available: have,
            },
            other => Error::TransferRejected {
                token,
                source: other,
            },
        }
    }

    /// Returns true if the caller lacked the administrator role
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Returns true if the failure originated in the external token
    pub fn is_forwarded(&self) -> bool {
        matches!(
            self,
            Error::InsufficientFunds { .. } | Error::TransferRejected { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Authorization errors: 1xxx
            Error::Unauthorized { .. } => 1001,

            // Configuration errors: 2xxx
            Error::NotConfigured => 2001,
            Error::TokenMismatch { .. } => 2002,
            Error::UnknownToken(_) => 2003,
            Error::FundsStillHeld { .. } => 2004,
            Error::ReconfigurationDisabled(_) => 2005,

            // Funds errors: 3xxx
            Error::InsufficientFunds { .. } => 3001,
            Error::TransferRejected { .. } => 3002,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,
            Error::ZeroAmount => 5002,
            Error::Overflow { .. } => 5003,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,

            // Internal errors: 9xxx
            Error::Lock => 9002,
            Error::Storage(_) => 9003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let addr = Address::zero();
        let codes = vec![
            Error::Unauthorized { caller: addr, action: Action::Withdraw }.code(),
            Error::NotConfigured.code(),
            Error::TokenMismatch { configured: addr, requested: addr }.code(),
            Error::UnknownToken(addr).code(),
            Error::InsufficientFunds {
                required: TokenAmount::ZERO,
                available: TokenAmount::ZERO,
            }
            .code(),
            Error::TransferRejected { token: addr, source: TokenError::Paused }.code(),
            Error::ZeroAmount.code(),
            Error::Lock.code(),
            Error::Storage(String::new()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_unauthorized_message() {
        let err = Error::Unauthorized {
            caller: Address::new([0x11; 20]),
            action: Action::Withdraw,
        };
        assert!(err.to_string().starts_with("admin only"));
        assert!(err.to_string().contains("1111"));
        assert!(err.is_authorization());
    }

    #[test]
    fn test_from_token_maps_shortfall() {
        let err = Error::from_token(
            Address::zero(),
            TokenError::InsufficientBalance {
                have: TokenAmount::from_units(5),
                need: TokenAmount::from_units(10),
            },
        );
        assert_eq!(
            err,
            Error::InsufficientFunds {
                required: TokenAmount::from_units(10),
                available: TokenAmount::from_units(5),
            }
        );
        assert!(err.is_forwarded());
    }

    #[test]
    fn test_from_token_forwards_rejection_verbatim() {
        let token = Address::new([0x22; 20]);
        let err = Error::from_token(token, TokenError::Paused);
        assert_eq!(err, Error::TransferRejected { token, source: TokenError::Paused });
        assert!(err.to_string().contains(&TokenError::Paused.to_string()));
        assert!(std::error::Error::source(&err).is_some());
    }
}
