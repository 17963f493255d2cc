//! Token Sale Distributor CLI
//!
//! Operator tool for a persisted custody ledger deployment and its tokens.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::{style, Term};
use serde_json::json;

use token_sale_distributor::cli::{CliConfig, LedgerStatus, OutputFormat, OutputFormatter};
use token_sale_distributor::core::amount::TokenAmount;
use token_sale_distributor::core::deployment::Deployment;
use token_sale_distributor::core::token::FungibleToken;
use token_sale_distributor::storage::{DeploymentStore, FileStore};
use token_sale_distributor::utils::crypto::Address;

/// Token Sale Distributor CLI - admin-controlled custody of a fungible token
#[derive(Parser)]
#[command(name = "tsd")]
#[command(version = token_sale_distributor::VERSION)]
#[command(about = "Command-line interface for the token sale distributor ledger", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, env = "TSD_CONFIG")]
    config: Option<PathBuf>,

    /// Path to data directory
    #[arg(short, long, env = "TSD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format (text, json, json-pretty)
    #[arg(short, long, env = "TSD_FORMAT")]
    format: Option<OutputFormat>,

    /// Deployment name inside the data directory
    #[arg(long, env = "TSD_DEPLOYMENT")]
    deployment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new custody ledger administered by `admin`
    Deploy {
        /// Administrator address
        #[arg(short, long)]
        admin: Address,
        /// Replace an existing deployment
        #[arg(long)]
        force: bool,
    },

    /// Token operations
    #[command(subcommand)]
    Token(TokenCommands),

    /// Set the managed token (admin only)
    SetToken {
        /// Calling address
        #[arg(short, long)]
        caller: Address,
        /// Token address
        #[arg(short, long)]
        token: Address,
    },

    /// Pull approved funds from the caller into the ledger
    Deposit {
        /// Calling address
        #[arg(short, long)]
        caller: Address,
        /// Amount in base units
        #[arg(short, long)]
        amount: TokenAmount,
    },

    /// Withdraw funds to the administrator (admin only)
    Withdraw {
        /// Calling address
        #[arg(short, long)]
        caller: Address,
        /// Token address
        #[arg(short, long)]
        token: Address,
        /// Amount in base units
        #[arg(short, long)]
        amount: TokenAmount,
    },

    /// Show ledger status
    Status,

    /// List ledger events
    Events {
        /// Only events with sequence >= this value
        #[arg(short, long, default_value = "0")]
        since: u64,
    },

    /// Account helpers
    #[command(subcommand)]
    Account(AccountCommands),
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Deploy a token, minting the initial supply to its owner
    Create {
        /// Token owner
        #[arg(short, long)]
        owner: Address,
        /// Token name
        #[arg(short, long)]
        name: String,
        /// Token symbol
        #[arg(short, long)]
        symbol: String,
        /// Initial supply in base units
        #[arg(long, default_value = "0")]
        supply: TokenAmount,
    },

    /// Mint tokens (token owner only)
    Mint {
        /// Token address
        #[arg(short, long)]
        token: Address,
        /// Calling address
        #[arg(short, long)]
        caller: Address,
        /// Recipient
        #[arg(long)]
        to: Address,
        /// Amount in base units
        #[arg(short, long)]
        amount: TokenAmount,
    },

    /// Transfer tokens
    Transfer {
        /// Token address
        #[arg(short, long)]
        token: Address,
        /// Calling address
        #[arg(short, long)]
        caller: Address,
        /// Recipient (`ledger` for the custody ledger)
        #[arg(long)]
        to: String,
        /// Amount in base units
        #[arg(short, long)]
        amount: TokenAmount,
    },

    /// Approve a spender (`ledger` for the custody ledger)
    Approve {
        /// Token address
        #[arg(short, long)]
        token: Address,
        /// Calling address
        #[arg(short, long)]
        caller: Address,
        /// Spender
        #[arg(long)]
        spender: String,
        /// Amount in base units
        #[arg(short, long)]
        amount: TokenAmount,
    },

    /// Show a balance (`ledger` for the custody ledger)
    Balance {
        /// Token address
        #[arg(short, long)]
        token: Address,
        /// Account to query
        #[arg(long)]
        account: String,
    },

    /// List deployed tokens
    List,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Generate a random address
    New,
    /// Derive a deterministic address from a label
    FromLabel {
        /// Label
        label: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════════════════════

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let term = Term::stdout();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    let output = OutputFormatter::new(config.format);

    if let Err(e) = run_command(&cli, &config, &output, &term) {
        eprintln!("{}", output.render_error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

fn run_command(
    cli: &Cli,
    config: &CliConfig,
    output: &OutputFormatter,
    term: &Term,
) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Deploy { admin, force } => cmd_deploy(config, *admin, *force, output),
        Commands::Token(cmd) => cmd_token(config, cmd, output),
        Commands::SetToken { caller, token } => with_deployment(config, |d| {
            d.set_token_address(caller, *token)?;
            output.success(&format!("Managed token set to {}", token));
            Ok(())
        }),
        Commands::Deposit { caller, amount } => with_deployment(config, |d| {
            d.deposit(caller, *amount)?;
            output.success(&format!("Deposited {} from {}", amount, caller));
            Ok(())
        }),
        Commands::Withdraw {
            caller,
            token,
            amount,
        } => with_deployment(config, |d| {
            let receipt = d.withdraw(caller, token, *amount)?;
            if output.format() == OutputFormat::Text {
                output.success(&format!(
                    "Withdrew {} to {} (event #{})",
                    receipt.amount, receipt.recipient, receipt.sequence
                ));
            } else {
                output.data(&receipt);
            }
            Ok(())
        }),
        Commands::Status => cmd_status(config, output, term),
        Commands::Events { since } => {
            let deployment = load_deployment(config)?;
            let events = deployment.ledger().events_since(*since);
            if output.format() == OutputFormat::Text {
                output.section("Ledger Events");
                for event in events {
                    let _ = term.write_line(&format!(
                        "  #{:<4} {}  {}",
                        event.sequence,
                        style(event.timestamp.to_rfc3339()).dim(),
                        serde_json::to_string(&event.kind)?
                    ));
                }
            } else {
                output.data(&events);
            }
            Ok(())
        }
        Commands::Account(cmd) => {
            let address = match cmd {
                AccountCommands::New => Address::random(),
                AccountCommands::FromLabel { label } => Address::from_label(label),
            };
            if output.format() == OutputFormat::Text {
                let _ = term.write_line(&address.to_hex());
            } else {
                output.data(&json!({ "address": address }));
            }
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_deploy(
    config: &CliConfig,
    admin: Address,
    force: bool,
    output: &OutputFormatter,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    if !force && store.load(&config.deployment)?.is_some() {
        anyhow::bail!(
            "Deployment '{}' already exists in {}. Use --force to overwrite.",
            config.deployment,
            config.data_dir.display()
        );
    }

    let deployment = Deployment::new(admin, config.ledger.clone())?;
    store.save(&config.deployment, &deployment)?;

    if output.format() == OutputFormat::Text {
        output.success(&format!("Ledger deployed at {}", deployment.ledger().address()));
        output.kv("Admin", deployment.ledger().admin());
        output.kv("Reconfiguration", config.ledger.reconfiguration);
    } else {
        output.data(&json!({
            "ledger": deployment.ledger().address(),
            "admin": deployment.ledger().admin(),
        }));
    }
    Ok(())
}

fn cmd_token(config: &CliConfig, cmd: &TokenCommands, output: &OutputFormatter) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Create {
            owner,
            name,
            symbol,
            supply,
        } => with_deployment(config, |d| {
            let address = d.deploy_token(*owner, name, symbol, *supply)?;
            if output.format() == OutputFormat::Text {
                output.success(&format!("Token {} deployed at {}", symbol, address));
            } else {
                output.data(&json!({ "token": address, "symbol": symbol }));
            }
            Ok(())
        }),
        TokenCommands::Mint {
            token,
            caller,
            to,
            amount,
        } => with_deployment(config, |d| {
            d.mint(token, caller, to, *amount)?;
            output.success(&format!("Minted {} to {}", amount, to));
            Ok(())
        }),
        TokenCommands::Transfer {
            token,
            caller,
            to,
            amount,
        } => with_deployment(config, |d| {
            let to = resolve_account(d, to)?;
            d.transfer(token, caller, &to, *amount)?;
            output.success(&format!("Transferred {} to {}", amount, to));
            Ok(())
        }),
        TokenCommands::Approve {
            token,
            caller,
            spender,
            amount,
        } => with_deployment(config, |d| {
            let spender = resolve_account(d, spender)?;
            d.approve(token, caller, &spender, *amount)?;
            output.success(&format!("Approved {} for {}", amount, spender));
            Ok(())
        }),
        TokenCommands::Balance { token, account } => {
            let deployment = load_deployment(config)?;
            let account = resolve_account(&deployment, account)?;
            let balance = deployment.balance_of(token, &account)?;
            let decimals = deployment.token(token)?.decimals();
            if output.format() == OutputFormat::Text {
                output.kv("Balance", balance.to_decimal_string(decimals));
            } else {
                output.data(&json!({ "account": account, "token": token, "balance": balance }));
            }
            Ok(())
        }
        TokenCommands::List => {
            let deployment = load_deployment(config)?;
            if output.format() == OutputFormat::Text {
                output.section("Tokens");
                for token in deployment.tokens().iter() {
                    output.kv(
                        token.symbol(),
                        format!(
                            "{} (supply {})",
                            token.address(),
                            token.total_supply().to_decimal_string(token.decimals())
                        ),
                    );
                }
            } else {
                let tokens: Vec<_> = deployment
                    .tokens()
                    .iter()
                    .map(|t| {
                        json!({
                            "address": t.address(),
                            "name": t.name(),
                            "symbol": t.symbol(),
                            "total_supply": t.total_supply(),
                        })
                    })
                    .collect();
                output.data(&tokens);
            }
            Ok(())
        }
    }
}

fn cmd_status(config: &CliConfig, output: &OutputFormatter, term: &Term) -> anyhow::Result<()> {
    let deployment = load_deployment(config)?;
    let status = LedgerStatus::of(&deployment)?;

    if output.format() != OutputFormat::Text {
        output.data(&status);
        return Ok(());
    }

    output.section("Custody Ledger");
    output.kv("Address", status.ledger);
    output.kv("Admin", status.admin);
    match (status.token, status.held_display()) {
        (Some(token), Some(held)) => {
            output.kv("Token", token);
            output.kv("Held", held);
        }
        _ => output.kv("Token", style("not configured").yellow()),
    }
    output.kv("Reconfiguration", status.reconfiguration);
    output.kv("Events", status.events);
    let _ = term.write_line("");
    output.kv("State hash", status.state_hash);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(cli: &Cli) -> anyhow::Result<CliConfig> {
    let path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let mut config = CliConfig::load_or_default(&path)?.with_env()?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(name) = &cli.deployment {
        config.deployment = name.clone();
    }

    config.validate()?;
    Ok(config)
}

fn open_store(config: &CliConfig) -> anyhow::Result<DeploymentStore<FileStore>> {
    Ok(DeploymentStore::new(FileStore::new(&config.data_dir)?))
}

fn load_deployment(config: &CliConfig) -> anyhow::Result<Deployment> {
    open_store(config)?.load(&config.deployment)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No deployment '{}' in {}. Run `tsd deploy --admin <ADDRESS>` first.",
            config.deployment,
            config.data_dir.display()
        )
    })
}

/// Load, mutate and save; nothing is written if `op` fails
fn with_deployment<F>(config: &CliConfig, op: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Deployment) -> anyhow::Result<()>,
{
    let store = open_store(config)?;
    let mut deployment = store.load(&config.deployment)?.ok_or_else(|| {
        anyhow::anyhow!("No deployment '{}'. Run `tsd deploy` first.", config.deployment)
    })?;
    op(&mut deployment)?;
    store.save(&config.deployment, &deployment)?;
    Ok(())
}

fn resolve_account(deployment: &Deployment, account: &str) -> anyhow::Result<Address> {
    if account.eq_ignore_ascii_case("ledger") {
        Ok(deployment.ledger().address())
    } else {
        Ok(account.parse()?)
    }
}
