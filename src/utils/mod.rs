//! Utility modules.
//!
//! This module contains shared utilities used across the crate:
//! - Identity and hashing primitives
//! - Validation helpers
//! - Constants

pub mod constants;
pub mod crypto;
pub mod validation;

pub use constants::*;
pub use crypto::*;
pub use validation::*;
