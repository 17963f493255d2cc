//! # Token Sale Distributor
//!
//! An access-controlled custody ledger for a single fungible token. The
//! ledger holds funds on behalf of one administrator, fixed at creation,
//! who alone may choose the managed token and withdraw to themselves.
//!
//! ## Architecture
//!
//! - **Core**: Amounts, the fungible-token capability, the custody ledger
//!   and deployments bundling a ledger with its tokens
//! - **Storage**: Pluggable key-value backends and deployment snapshots
//! - **CLI**: Configuration and output for the `tsd` operator tool
//!
//! ## Example
//!
//! ```rust
//! use token_sale_distributor::prelude::*;
//!
//! let admin = Address::from_label("admin");
//! let mut deployment = Deployment::new(admin, LedgerConfig::default()).unwrap();
//! let token = deployment
//!     .deploy_token(admin, "Mock Token", "MTK", TokenAmount::from_whole(1000))
//!     .unwrap();
//!
//! let ledger = deployment.ledger().address();
//! deployment.transfer(&token, &admin, &ledger, TokenAmount::from_whole(1000)).unwrap();
//! deployment.set_token_address(&admin, token).unwrap();
//! deployment.withdraw(&admin, &token, TokenAmount::from_whole(1000)).unwrap();
//!
//! assert_eq!(deployment.balance_of(&token, &admin).unwrap(), TokenAmount::from_whole(1000));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cli;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        amount::TokenAmount,
        config::{LedgerConfig, ReconfigurationPolicy},
        deployment::{Deployment, SharedDeployment},
        ledger::{CustodyLedger, LedgerEvent, LedgerEventKind, LedgerState, WithdrawalReceipt},
        registry::{TokenDirectory, TokenRegistry},
        standard_token::StandardToken,
        token::{FungibleToken, TokenError, TokenResult},
    };
    pub use crate::error::{Action, Error, Result};
    pub use crate::utils::crypto::{Address, Hash};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "token-sale-distributor";
