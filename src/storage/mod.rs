//! Storage module for persistent data management.
//!
//! This module persists deployments between CLI invocations:
//! - Key-value backends (in-memory and JSON file)
//! - A bincode typed wrapper
//! - Named deployment snapshots with integrity metadata
//!
//! ## Usage
//!
//! ```rust,ignore
//! use token_sale_distributor::storage::{DeploymentStore, FileStore};
//!
//! let store = DeploymentStore::new(FileStore::new("/path/to/data")?);
//! store.save("default", &deployment)?;
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
