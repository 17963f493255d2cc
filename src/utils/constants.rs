//! Ledger constants and magic numbers.
//!
//! All crate-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Address length in bytes (principals, ledgers and tokens share one format)
pub const ADDRESS_LENGTH: usize = 20;

/// Hash length in bytes (SHA-256)
pub const HASH_LENGTH: usize = 32;

/// Domain tag mixed into derived ledger addresses
pub const LEDGER_ADDRESS_TAG: &str = "TokenSaleDistributor/ledger";

/// Domain tag mixed into derived token addresses
pub const TOKEN_ADDRESS_TAG: &str = "TokenSaleDistributor/token";

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default token decimals (matches the common 18-decimal convention)
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest decimals value whose unit still fits in a u128
pub const MAX_DECIMALS: u8 = 38;

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of ledger events kept in memory
pub const DEFAULT_MAX_EVENTS: usize = 1000;

/// Snapshot format version written by the deployment store
pub const SNAPSHOT_VERSION: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// CLI CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Environment variable prefix for CLI overrides
pub const ENV_PREFIX: &str = "TSD_";

/// Default data directory name (under the user's home)
pub const DEFAULT_DATA_DIR_NAME: &str = ".tsd";
