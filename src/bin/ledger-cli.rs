#![forbid(unsafe_code)]
//! Command-line front end: energy evaluation and scripted chain replay.

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use ledgerchain::blockchain::{Block, Blockchain};
use ledgerchain::config::{load_config, Config, TokenSpec};
use ledgerchain::crypto::{hash_to_hex, ZERO_HASH};
use ledgerchain::query::LedgerQuery;
use ledgerchain::transaction::{Transaction, TxKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when it does not exist
    #[arg(long, global = true, default_value = "ledger.toml")]
    config: PathBuf,

    /// Overrides `logging.level` from the configuration
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Computes the energy of a single transaction
    Energy {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        token: i32,
        /// Transaction kind, e.g. TRANSFER or claim-rewards
        #[arg(long, default_value = "TRANSFER")]
        kind: String,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Replays a JSON script of transaction batches onto a fresh chain and audits it
    Replay {
        script: PathBuf,
    },
}

/// A replay script. Each batch becomes one block.
#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default)]
    tokens: Vec<TokenSpec>,
    #[serde(default)]
    wallets: Vec<String>,
    batches: Vec<Batch>,
}

#[derive(Debug, Deserialize)]
struct Batch {
    /// Block timestamp in milliseconds; the current time when omitted.
    timestamp: Option<u64>,
    transactions: Vec<Transaction>,
}

fn init_logging(config: &Config, override_level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let level = override_level.unwrap_or(&config.logging.level);
    let level = Level::from_str(level).map_err(|e| format!("Invalid log level {:?}: {}", level, e))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config, cli.log_level.as_deref())?;

    match cli.command {
        Commands::Energy {
            from,
            to,
            amount,
            token,
            kind,
            memo,
        } => energy(&config, from, to, amount, token, &kind, memo),
        Commands::Replay { script } => replay(&config, &script),
    }
}

fn energy(
    config: &Config,
    from: String,
    to: String,
    amount: f64,
    token: i32,
    kind: &str,
    memo: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = TxKind::from_str(kind)?;
    let tx = Transaction::new(from, to, amount, token, kind).with_memo(memo)?;

    println!("{} {}", "Kind:".bright_cyan(), tx.kind);
    println!("{} {} bytes", "Serialized:".bright_cyan(), tx.serialized_len());
    println!("{} {:.9}", "Energy:".bright_cyan().bold(), tx.energy());

    // Token kinds come from the configured genesis registry.
    let chain = Blockchain::from_config(&config.genesis)?;
    match chain.energy_split(&tx) {
        Some(split) => {
            println!("{} {:.9}", "  bound: ".green(), split.bound);
            println!("{} {:.9}", "  reward:".green(), split.reward);
        }
        None => println!("{}", "  (no energy binding for this token)".dimmed()),
    }
    Ok(())
}

fn replay(config: &Config, script_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(script_path)
        .map_err(|e| format!("Failed to read script {}: {}", script_path.display(), e))?;
    let script: ReplayScript = serde_json::from_str(&contents)?;

    let mut chain = Blockchain::from_config(&config.genesis)?;
    for token in &script.tokens {
        chain.add_token_type(
            &token.name,
            &token.symbol,
            token.decimals,
            token.kind,
            token.energy_binding_factor,
        )?;
    }
    for address in &script.wallets {
        chain.find_or_create_wallet(address)?;
    }

    let mut rejected = 0usize;
    for (i, batch) in script.batches.into_iter().enumerate() {
        let block = match batch.timestamp {
            Some(ts) => chain.build_next_block(ts, batch.transactions),
            None => {
                let (index, prev) = match chain.tip() {
                    Some(tip) => (tip.index.wrapping_add(1), tip.hash),
                    None => (0, ZERO_HASH),
                };
                Block::new(index, prev, batch.transactions)
            }
        };
        let index = block.index;
        match chain.append_block(block) {
            Ok(()) => println!("{} batch {} -> block #{}", "✓".green(), i, index),
            Err(e) => {
                rejected += 1;
                println!("{} batch {} rejected: {}", "✗".red(), i, e);
            }
        }
    }

    print_balances(&chain);

    if let Some(tip) = chain.tip() {
        println!("{} {} (height {})", "Tip:".bright_cyan(), hash_to_hex(&tip.hash), chain.height());
    }
    if rejected > 0 {
        println!("{}", format!("{} batch(es) rejected", rejected).yellow());
    }

    match chain.audit(&config.audit.options()) {
        Ok(()) => {
            println!("{}", "Audit: OK".green().bold());
            Ok(())
        }
        Err(e) => {
            println!("{} {} ({})", "Audit:".red().bold(), e.code().red(), e);
            Err(e.into())
        }
    }
}

fn print_balances(chain: &Blockchain) {
    let mut header = vec![Cell::new("Address")
        .fg(TableColor::Cyan)
        .add_attribute(Attribute::Bold)];
    for token in chain.token_types() {
        header.push(
            Cell::new(&token.symbol)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
        );
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for wallet in chain.wallets() {
        let mut row = vec![Cell::new(&wallet.address)];
        for balance in &wallet.balances {
            row.push(Cell::new(format!("{:.8}", balance)).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    println!("{table}");
}
