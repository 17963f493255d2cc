//! Input validation utilities.
//!
//! This module provides validation functions to ensure inputs meet
//! ledger requirements before any state is touched.

use crate::core::amount::TokenAmount;
use crate::error::{Error, Result};
use crate::utils::crypto::Address;

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that an amount is non-zero
pub fn validate_non_zero(amount: TokenAmount) -> Result<()> {
    if amount.is_zero() {
        return Err(Error::ZeroAmount);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that an address is set (not the zero address)
pub fn validate_address(address: &Address, name: &str) -> Result<()> {
    if address.is_zero() {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: "zero address".into(),
        });
    }
    Ok(())
}
