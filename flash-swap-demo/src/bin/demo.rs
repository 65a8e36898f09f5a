//! Flash Swap Demo - Deploy and run one flash swap
//!
//! Deploys a flash-mintable token with its lender, a flash swap borrower and a
//! funded liquidity source, then borrows and repays inside a single atomic
//! settlement.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: "Stonks Token" (Stt), 1% fee, borrow 10 and extract 5
//! cargo run --bin flash-swap-demo
//!
//! # Or with command line arguments
//! cargo run --bin flash-swap-demo -- \
//!   --fee-bps 30 \
//!   --amount 250 \
//!   --extraction 0.5 \
//!   --events
//!
//! # Token settings from a JSON file
//! echo '{"name":"Stonks Token","symbol":"Stt","fee_basis_points":100}' > token.json
//! cargo run --bin flash-swap-demo -- --config token.json
//! ```

use anyhow::Context;
use clap::Parser;
use flash_swap_demo::prelude::*;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flash-swap-demo")]
#[command(about = "Deploy a flash-mintable token and run one flash swap", long_about = None)]
struct Args {
    /// Token name
    #[arg(long = "name", env = "TOKEN_NAME", default_value = "Stonks Token")]
    name: String,

    /// Token symbol
    #[arg(long = "symbol", env = "TOKEN_SYMBOL", default_value = "Stt")]
    symbol: String,

    /// Flash loan fee in basis points
    #[arg(
        long = "fee-bps",
        env = "FLASH_LOAN_FEE",
        default_value = "100",
        help = "Flash loan fee in basis points (100 = 1%)"
    )]
    fee_bps: u16,

    /// Amount to borrow, in whole tokens
    #[arg(
        short = 'a',
        long = "amount",
        env = "FLASH_LOAN_AMOUNT",
        default_value = "10",
        help = "Amount to borrow, decimal tokens (e.g. 10 or 2.5)"
    )]
    amount: String,

    /// Amount to draw from the liquidity source during the loan
    #[arg(
        short = 'x',
        long = "extraction",
        env = "FLASH_SWAP_EXTRACTION",
        help = "Amount to extract during the loan (defaults to half the amount)"
    )]
    extraction: Option<String>,

    /// JSON file with the token configuration
    #[arg(short = 'c', long = "config", env = "TOKEN_CONFIG")]
    config: Option<PathBuf>,

    /// Dump the ledger event journal as JSON lines
    #[arg(long = "events")]
    events: bool,
}

impl Args {
    fn token_config(&self) -> anyhow::Result<TokenConfig> {
        let config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str::<TokenConfig>(&raw)
                    .with_context(|| format!("Invalid token config in {}", path.display()))?
            }
            None => TokenConfig::new(self.name.clone(), self.symbol.clone(), self.fee_bps),
        };
        config.validate()?;
        Ok(config)
    }

    fn parse_amounts(&self) -> anyhow::Result<(Amount, Amount)> {
        let amount = parse_units(&self.amount)
            .map_err(|e| anyhow::anyhow!("Invalid amount '{}': {}", self.amount, e))?;
        let extraction = match &self.extraction {
            Some(raw) => parse_units(raw)
                .map_err(|e| anyhow::anyhow!("Invalid extraction '{}': {}", raw, e))?,
            None => amount / 2,
        };
        Ok((amount, extraction))
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.token_config()?;
    let (amount, extraction) = args.parse_amounts()?;
    let fee_rate = FeeRate::new(config.fee_basis_points)?;

    log::info!("=== Flash Swap Demo ===");
    log::info!("Token: {} ({})", config.name, config.symbol);
    log::info!("Fee: {} bps ({})", fee_rate.basis_points(), fee_rate.as_percent());
    log::info!("Amount: {}", format_units(amount));
    log::info!("Extraction: {}", format_units(extraction));
    log::info!("=======================\n");

    let mut deployment = Deployment::deploy(config, amount)?;

    log::info!("Balances before the flash swap:\n{}\n", deployment.balances());

    let result = deployment.run_flash_swap(amount, extraction);

    log::info!("Balances after the flash swap:\n{}\n", deployment.balances());

    if args.events {
        for record in deployment.ledger.events() {
            println!("{}", serde_json::to_string(&record)?);
        }
    }

    match result {
        Ok(outcome) => {
            log::info!("Flash Swap completed!");
            log::info!(
                "Paid {} tokens of lending fees ({})",
                format_units(outcome.loan.fee),
                fee_rate.as_percent()
            );
            if outcome.subsidy > 0 {
                log::info!(
                    "Extraction fell short of the fee, {} paid from prior holdings",
                    format_units(outcome.subsidy)
                );
            } else {
                log::info!("Profit: {}", format_units(outcome.profit));
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Flash swap failed: {:?}", e);
            anyhow::bail!("{}: {}", e.kind(), e)
        }
    }
}
