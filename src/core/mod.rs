//! Core modules for the custody ledger.
//!
//! This module contains the fundamental building blocks:
//! - Token amounts and the fungible-token capability
//! - An in-memory standard token and token directory
//! - The custody ledger and its configuration
//! - Deployments bundling a ledger with its tokens

pub mod amount;
pub mod config;
pub mod deployment;
pub mod ledger;
pub mod registry;
pub mod standard_token;
pub mod token;

pub use amount::*;
pub use config::*;
pub use deployment::*;
pub use ledger::*;
pub use registry::*;
pub use standard_token::*;
pub use token::*;
