//! Custody ledger.
//!
//! Holds funds of one managed fungible token on behalf of a single
//! administrator:
//! - The administrator is fixed to the creator at construction
//! - Only the administrator may configure the managed token
//! - Only the administrator may withdraw, and always to themselves
//!
//! The ledger keeps no balance of its own. What it holds is whatever the
//! token reports for the ledger's address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::amount::TokenAmount;
use crate::core::config::{LedgerConfig, ReconfigurationPolicy};
use crate::core::registry::TokenDirectory;
use crate::error::{Action, Error, Result};
use crate::utils::constants::LEDGER_ADDRESS_TAG;
use crate::utils::crypto::Address;
use crate::utils::validation::{validate_address, validate_non_zero};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration state of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    /// No managed token yet; nothing can move
    TokenUnconfigured,
    /// A managed token is set
    TokenConfigured,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// What happened to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// Managed token set or replaced
    TokenConfigured {
        /// Previous token, if any
        previous: Option<Address>,
        /// New token
        token: Address,
    },
    /// Funds pulled in from a depositor
    Deposit {
        /// Token deposited
        token: Address,
        /// Depositor
        from: Address,
        /// Amount deposited
        amount: TokenAmount,
    },
    /// Funds released to the administrator
    Withdrawal {
        /// Token withdrawn
        token: Address,
        /// Recipient (always the administrator)
        to: Address,
        /// Amount withdrawn
        amount: TokenAmount,
    },
}

/// Record of a ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Monotonic sequence number, starting at 0
    pub sequence: u64,
    /// When the operation was applied
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub kind: LedgerEventKind,
}

/// Result of a successful withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Token withdrawn
    pub token: Address,
    /// Recipient
    pub recipient: Address,
    /// Amount withdrawn
    pub amount: TokenAmount,
    /// Sequence number of the withdrawal event
    pub sequence: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CUSTODY LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Access-controlled custody of one managed token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyLedger {
    /// Address the ledger holds funds under
    address: Address,
    /// Sole administrator, fixed at creation
    admin: Address,
    /// Managed token reference
    token: Option<Address>,
    /// Ledger configuration
    config: LedgerConfig,
    /// Recent events
    events: Vec<LedgerEvent>,
    /// Sequence number for the next event
    next_sequence: u64,
}

impl CustodyLedger {
    /// Create a ledger administered by `creator` with default configuration.
    ///
    /// The ledger address derives from the creator and `nonce`, so one creator
    /// can run several independent ledgers.
    pub fn new(creator: Address, nonce: u64) -> Result<Self> {
        Self::with_config(creator, nonce, LedgerConfig::default())
    }

    /// Create a ledger with an explicit configuration
    pub fn with_config(creator: Address, nonce: u64, config: LedgerConfig) -> Result<Self> {
        validate_address(&creator, "creator")?;
        config.validate()?;
        Ok(Self::build(creator, nonce, config))
    }

    fn build(creator: Address, nonce: u64, config: LedgerConfig) -> Self {
        let address = Address::derive(LEDGER_ADDRESS_TAG, &creator, nonce);
        info!(ledger = %address, admin = %creator, "custody ledger created");
        Self {
            address,
            admin: creator,
            token: None,
            config,
            events: Vec::new(),
            next_sequence: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Address funds are held under
    pub fn address(&self) -> Address {
        self.address
    }

    /// The administrator
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Check whether `who` is the administrator
    pub fn is_admin(&self, who: &Address) -> bool {
        *who == self.admin
    }

    /// Managed token reference, if configured
    pub fn token_address(&self) -> Option<Address> {
        self.token
    }

    /// Current configuration state
    pub fn state(&self) -> LedgerState {
        match self.token {
            Some(_) => LedgerState::TokenConfigured,
            None => LedgerState::TokenUnconfigured,
        }
    }

    /// Ledger configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Amount of the managed token the ledger holds, as reported by the token
    pub fn held_balance(&self, tokens: &dyn TokenDirectory) -> Result<TokenAmount> {
        let token = self.token.ok_or(Error::NotConfigured)?;
        let resource = tokens.token(&token).ok_or(Error::UnknownToken(token))?;
        Ok(resource.balance_of(&self.address))
    }

    /// Recent events, oldest first
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events with a sequence number of at least `sequence`
    pub fn events_since(&self, sequence: u64) -> &[LedgerEvent] {
        let start = self.events.partition_point(|e| e.sequence < sequence);
        &self.events[start..]
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ADMINISTRATOR OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Set or replace the managed token reference.
    ///
    /// Replacing a configured token is subject to the ledger's
    /// [`ReconfigurationPolicy`]. Setting the current token again succeeds
    /// without recording an event.
    pub fn set_token_address(
        &mut self,
        caller: &Address,
        token: Address,
        tokens: &dyn TokenDirectory,
    ) -> Result<()> {
        self.ensure_admin(caller, Action::SetTokenAddress)?;
        validate_address(&token, "token")?;
        if !tokens.contains(&token) {
            return Err(Error::UnknownToken(token));
        }

        let previous = self.token;
        if let Some(current) = previous {
            if current == token {
                return Ok(());
            }
            self.check_reconfiguration(current, tokens)?;
        }

        self.token = Some(token);
        self.record(LedgerEventKind::TokenConfigured { previous, token });
        info!(ledger = %self.address, token = %token, "managed token configured");
        Ok(())
    }

    /// Release `amount` of the managed token to the administrator.
    ///
    /// `token` must name the managed token. Failures reported by the token
    /// are forwarded, not retried.
    pub fn withdraw(
        &mut self,
        caller: &Address,
        token: &Address,
        amount: TokenAmount,
        tokens: &mut dyn TokenDirectory,
    ) -> Result<WithdrawalReceipt> {
        self.ensure_admin(caller, Action::Withdraw)?;
        let configured = self.token.ok_or(Error::NotConfigured)?;
        validate_non_zero(amount)?;
        if *token != configured {
            return Err(Error::TokenMismatch {
                configured,
                requested: *token,
            });
        }

        let resource = tokens
            .token_mut(&configured)
            .ok_or(Error::UnknownToken(configured))?;
        resource
            .transfer(&self.address, &self.admin, amount)
            .map_err(|e| Error::from_token(configured, e))?;

        let sequence = self.record(LedgerEventKind::Withdrawal {
            token: configured,
            to: self.admin,
            amount,
        });
        info!(ledger = %self.address, token = %configured, %amount, "withdrawal");

        Ok(WithdrawalReceipt {
            token: configured,
            recipient: self.admin,
            amount,
            sequence,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DEPOSITS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Pull `amount` of the managed token from `caller` into the ledger.
    ///
    /// Anyone may deposit. The caller must first approve the ledger address
    /// as a spender. Plain transfers to [`CustodyLedger::address`] fund the
    /// ledger too, without a ledger call or an event.
    pub fn deposit(
        &mut self,
        caller: &Address,
        amount: TokenAmount,
        tokens: &mut dyn TokenDirectory,
    ) -> Result<()> {
        let token = self.token.ok_or(Error::NotConfigured)?;
        validate_non_zero(amount)?;

        let resource = tokens.token_mut(&token).ok_or(Error::UnknownToken(token))?;
        resource
            .transfer_from(&self.address, caller, &self.address, amount)
            .map_err(|e| Error::from_token(token, e))?;

        self.record(LedgerEventKind::Deposit {
            token,
            from: *caller,
            amount,
        });
        debug!(ledger = %self.address, from = %caller, %amount, "deposit");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    fn ensure_admin(&self, caller: &Address, action: Action) -> Result<()> {
        if !self.is_admin(caller) {
            warn!(ledger = %self.address, caller = %caller, %action, "rejected non-admin call");
            return Err(Error::Unauthorized {
                caller: *caller,
                action,
            });
        }
        Ok(())
    }

    fn check_reconfiguration(&self, current: Address, tokens: &dyn TokenDirectory) -> Result<()> {
        match self.config.reconfiguration {
            ReconfigurationPolicy::Always => Ok(()),
            ReconfigurationPolicy::Never => Err(Error::ReconfigurationDisabled(current)),
            ReconfigurationPolicy::WhenEmpty => {
                let held = tokens
                    .token(&current)
                    .map(|t| t.balance_of(&self.address))
                    .unwrap_or(TokenAmount::ZERO);
                if held.is_zero() {
                    Ok(())
                } else {
                    Err(Error::FundsStillHeld {
                        token: current,
                        held,
                    })
                }
            }
        }
    }

    /// Append an event (with pruning) and return its sequence number
    fn record(&mut self, kind: LedgerEventKind) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(LedgerEvent {
            sequence,
            timestamp: Utc::now(),
            kind,
        });

        if self.events.len() > self.config.max_events {
            self.events.drain(0..self.events.len() - self.config.max_events);
        }
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::TokenRegistry;
    use crate::core::standard_token::StandardToken;
    use crate::core::token::{FungibleToken, TokenError};

    struct Fixture {
        admin: Address,
        user: Address,
        token: Address,
        tokens: TokenRegistry<StandardToken>,
        ledger: CustodyLedger,
    }

    fn setup_with(config: LedgerConfig) -> Fixture {
        let admin = Address::from_label("admin");
        let user = Address::from_label("user");
        let mut tokens = TokenRegistry::new();
        let token = tokens
            .deploy(
                StandardToken::deploy(admin, 0, "Mock Token", "MTK", TokenAmount::from_whole(10_000))
                    .unwrap(),
            )
            .unwrap();
        let ledger = CustodyLedger::with_config(admin, 0, config).unwrap();
        Fixture {
            admin,
            user,
            token,
            tokens,
            ledger,
        }
    }

    fn setup() -> Fixture {
        setup_with(LedgerConfig::default())
    }

    fn fund(f: &mut Fixture, amount: TokenAmount) {
        let ledger = f.ledger.address();
        f.tokens
            .get_mut(&f.token)
            .unwrap()
            .transfer(&f.admin, &ledger, amount)
            .unwrap();
    }

    fn balance(f: &Fixture, who: &Address) -> TokenAmount {
        f.tokens.get(&f.token).unwrap().balance_of(who)
    }

    #[test]
    fn test_new_ledger_is_unconfigured() {
        let f = setup();
        assert_eq!(f.ledger.admin(), f.admin);
        assert_eq!(f.ledger.token_address(), None);
        assert_eq!(f.ledger.state(), LedgerState::TokenUnconfigured);
        assert_eq!(f.ledger.held_balance(&f.tokens), Err(Error::NotConfigured));
        assert!(f.ledger.events().is_empty());
    }

    #[test]
    fn test_ledgers_from_same_creator_are_distinct() {
        let admin = Address::from_label("admin");
        assert_ne!(
            CustodyLedger::new(admin, 0).unwrap().address(),
            CustodyLedger::new(admin, 1).unwrap().address()
        );
    }

    #[test]
    fn test_zero_creator_rejected() {
        assert!(matches!(
            CustodyLedger::new(Address::zero(), 0),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(CustodyLedger::with_config(Address::zero(), 0, LedgerConfig::default()).is_err());
    }

    #[test]
    fn test_set_token_address_by_admin() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();

        assert_eq!(f.ledger.token_address(), Some(f.token));
        assert_eq!(f.ledger.state(), LedgerState::TokenConfigured);
        assert_eq!(
            f.ledger.events()[0].kind,
            LedgerEventKind::TokenConfigured {
                previous: None,
                token: f.token
            }
        );
    }

    #[test]
    fn test_set_token_address_rejects_non_admin() {
        let mut f = setup();
        let err = f
            .ledger
            .set_token_address(&f.user, f.token, &f.tokens)
            .unwrap_err();

        assert_eq!(
            err,
            Error::Unauthorized {
                caller: f.user,
                action: Action::SetTokenAddress
            }
        );
        assert!(err.to_string().starts_with("admin only"));
        assert_eq!(f.ledger.token_address(), None);
    }

    #[test]
    fn test_set_token_address_validates_reference() {
        let mut f = setup();
        assert!(matches!(
            f.ledger.set_token_address(&f.admin, Address::zero(), &f.tokens),
            Err(Error::InvalidParameter { .. })
        ));

        let stranger = Address::from_label("not a token");
        assert_eq!(
            f.ledger.set_token_address(&f.admin, stranger, &f.tokens),
            Err(Error::UnknownToken(stranger))
        );
        assert_eq!(f.ledger.token_address(), None);
    }

    #[test]
    fn test_withdraw_before_configuration() {
        let mut f = setup();
        let token = f.token;
        let err = f
            .ledger
            .withdraw(&f.admin, &token, TokenAmount::from_whole(1), &mut f.tokens)
            .unwrap_err();
        assert_eq!(err, Error::NotConfigured);
    }

    #[test]
    fn test_withdraw_rejects_non_admin() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_whole(100));

        let token = f.token;
        let user = f.user;
        let err = f
            .ledger
            .withdraw(&user, &token, TokenAmount::from_whole(100), &mut f.tokens)
            .unwrap_err();

        assert!(err.is_authorization());
        assert!(err.to_string().starts_with("admin only"));
        assert_eq!(balance(&f, &f.ledger.address()), TokenAmount::from_whole(100));
        assert_eq!(balance(&f, &user), TokenAmount::ZERO);
    }

    #[test]
    fn test_withdraw_moves_exact_amount() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_whole(1000));

        let admin_before = balance(&f, &f.admin);
        let token = f.token;
        let admin = f.admin;
        let receipt = f
            .ledger
            .withdraw(&admin, &token, TokenAmount::from_whole(400), &mut f.tokens)
            .unwrap();

        assert_eq!(receipt.recipient, admin);
        assert_eq!(receipt.amount, TokenAmount::from_whole(400));
        assert_eq!(
            balance(&f, &admin),
            admin_before.saturating_add(TokenAmount::from_whole(400))
        );
        assert_eq!(f.ledger.held_balance(&f.tokens).unwrap(), TokenAmount::from_whole(600));
    }

    #[test]
    fn test_repeated_withdrawals_are_independent() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_whole(10));

        let token = f.token;
        let admin = f.admin;
        let first = f
            .ledger
            .withdraw(&admin, &token, TokenAmount::from_whole(3), &mut f.tokens)
            .unwrap();
        let second = f
            .ledger
            .withdraw(&admin, &token, TokenAmount::from_whole(3), &mut f.tokens)
            .unwrap();

        assert_ne!(first.sequence, second.sequence);
        assert_eq!(f.ledger.held_balance(&f.tokens).unwrap(), TokenAmount::from_whole(4));
    }

    #[test]
    fn test_withdraw_insufficient_funds() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_whole(5));

        let admin_before = balance(&f, &f.admin);
        let token = f.token;
        let admin = f.admin;
        let err = f
            .ledger
            .withdraw(&admin, &token, TokenAmount::from_whole(6), &mut f.tokens)
            .unwrap_err();

        assert_eq!(
            err,
            Error::InsufficientFunds {
                required: TokenAmount::from_whole(6),
                available: TokenAmount::from_whole(5),
            }
        );
        assert_eq!(balance(&f, &admin), admin_before);
        assert_eq!(f.ledger.held_balance(&f.tokens).unwrap(), TokenAmount::from_whole(5));
    }

    #[test]
    fn test_withdraw_forwards_token_rejection() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_whole(5));
        let admin = f.admin;
        f.tokens.get_mut(&f.token).unwrap().set_paused(&admin, true).unwrap();

        let token = f.token;
        let err = f
            .ledger
            .withdraw(&admin, &token, TokenAmount::from_whole(1), &mut f.tokens)
            .unwrap_err();

        assert_eq!(
            err,
            Error::TransferRejected {
                token,
                source: TokenError::Paused
            }
        );
    }

    #[test]
    fn test_withdraw_zero_and_mismatched_token() {
        let mut f = setup();
        f.ledger.set_token_address(&f.admin, f.token, &f.tokens).unwrap();
        let token = f.token;
        let admin = f.admin;

        assert_eq!(
            f.ledger.withdraw(&admin, &token, TokenAmount::ZERO, &mut f.tokens),
            Err(Error::ZeroAmount)
        );

        let other = Address::from_label("other");
        assert_eq!(
            f.ledger
                .withdraw(&admin, &other, TokenAmount::from_units(1), &mut f.tokens),
            Err(Error::TokenMismatch {
                configured: token,
                requested: other
            })
        );
    }

    #[test]
    fn test_reconfiguration_when_empty() {
        let mut f = setup();
        let admin = f.admin;
        let second = f
            .tokens
            .deploy(StandardToken::new(admin, 1, "Second", "SEC"))
            .unwrap();
        f.ledger.set_token_address(&admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_units(1));

        assert_eq!(
            f.ledger.set_token_address(&admin, second, &f.tokens),
            Err(Error::FundsStillHeld {
                token: f.token,
                held: TokenAmount::from_units(1)
            })
        );

        let token = f.token;
        f.ledger
            .withdraw(&admin, &token, TokenAmount::from_units(1), &mut f.tokens)
            .unwrap();
        f.ledger.set_token_address(&admin, second, &f.tokens).unwrap();
        assert_eq!(f.ledger.token_address(), Some(second));
    }

    #[test]
    fn test_reconfiguration_policies() {
        let mut never = setup_with(LedgerConfig::default().with_reconfiguration(ReconfigurationPolicy::Never));
        let admin = never.admin;
        let second = never
            .tokens
            .deploy(StandardToken::new(admin, 1, "Second", "SEC"))
            .unwrap();
        never.ledger.set_token_address(&admin, never.token, &never.tokens).unwrap();
        // Same token again is a no-op, not a reconfiguration.
        never.ledger.set_token_address(&admin, never.token, &never.tokens).unwrap();
        assert_eq!(
            never.ledger.set_token_address(&admin, second, &never.tokens),
            Err(Error::ReconfigurationDisabled(never.token))
        );
        assert_eq!(never.ledger.events().len(), 1);

        let mut always = setup_with(LedgerConfig::default().with_reconfiguration(ReconfigurationPolicy::Always));
        let second = always
            .tokens
            .deploy(StandardToken::new(admin, 1, "Second", "SEC"))
            .unwrap();
        always.ledger.set_token_address(&admin, always.token, &always.tokens).unwrap();
        fund(&mut always, TokenAmount::from_units(1));
        always.ledger.set_token_address(&admin, second, &always.tokens).unwrap();
        assert_eq!(always.ledger.token_address(), Some(second));
    }

    #[test]
    fn test_deposit_pulls_approved_funds() {
        let mut f = setup();
        let admin = f.admin;
        let ledger_address = f.ledger.address();
        f.ledger.set_token_address(&admin, f.token, &f.tokens).unwrap();
        f.tokens
            .get_mut(&f.token)
            .unwrap()
            .approve(&admin, &ledger_address, TokenAmount::from_whole(1000))
            .unwrap();

        f.ledger
            .deposit(&admin, TokenAmount::from_whole(1000), &mut f.tokens)
            .unwrap();

        assert_eq!(f.ledger.held_balance(&f.tokens).unwrap(), TokenAmount::from_whole(1000));
        assert!(matches!(
            f.ledger.events().last().unwrap().kind,
            LedgerEventKind::Deposit { .. }
        ));
    }

    #[test]
    fn test_deposit_without_allowance_is_rejected() {
        let mut f = setup();
        let admin = f.admin;
        f.ledger.set_token_address(&admin, f.token, &f.tokens).unwrap();

        let err = f
            .ledger
            .deposit(&admin, TokenAmount::from_whole(1), &mut f.tokens)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TransferRejected {
                source: TokenError::InsufficientAllowance { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_event_pruning_and_since() {
        let mut f = setup_with(LedgerConfig::default().with_max_events(2));
        let admin = f.admin;
        f.ledger.set_token_address(&admin, f.token, &f.tokens).unwrap();
        fund(&mut f, TokenAmount::from_units(10));

        let token = f.token;
        for _ in 0..3 {
            f.ledger
                .withdraw(&admin, &token, TokenAmount::from_units(1), &mut f.tokens)
                .unwrap();
        }

        let events = f.ledger.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 2);
        assert_eq!(events[1].sequence, 3);
        assert_eq!(f.ledger.events_since(3).len(), 1);
        assert!(f.ledger.events_since(4).is_empty());
    }
}
