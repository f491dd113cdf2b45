use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use splitrent::config::Config;
use splitrent::domain::address::is_valid_address;
use splitrent::domain::amount::Amount;
use splitrent::domain::envelope::inspect_envelope;
use splitrent::domain::network::classify_network;
use splitrent::domain::ports::LedgerGateway;
use splitrent::error::{LedgerError, PaymentError};
use splitrent::infrastructure::horizon::HorizonGateway;
use splitrent::interfaces::csv::history_writer::HistoryWriter;
use splitrent::interfaces::json::history_file::{ExportMetadata, import_history};
use splitrent::logging;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Horizon endpoint used by network commands
    #[arg(long, global = true, env = "SPLITRENT_HORIZON_URL")]
    horizon_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that an address is a valid public key
    CheckAddress { address: String },
    /// Check that an amount is acceptable for a single payment
    CheckAmount { amount: String },
    /// Classify a network name or passphrase
    Network { name: String },
    /// Fetch the native balance of an account
    Balance { address: String },
    /// Decode a base64 XDR transaction envelope
    Envelope { xdr: String },
    /// Work with exported history files
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Validate an export file and print its totals as JSON
    Summary {
        file: PathBuf,
        #[arg(long)]
        wallet: String,
    },
    /// Convert an export file to CSV on stdout
    Csv {
        file: PathBuf,
        #[arg(long)]
        wallet: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(logging::DEFAULT_FILTER).into_diagnostic()?;

    let mut config = Config::from_env();
    if let Some(url) = cli.horizon_url {
        config.horizon_url = url;
    }

    match cli.command {
        Command::CheckAddress { address } => {
            if !is_valid_address(&address) {
                return Err(PaymentError::InvalidAddress).into_diagnostic();
            }
            println!("valid");
        }
        Command::CheckAmount { amount } => {
            let amount = Amount::parse(&amount).ok_or(PaymentError::InvalidAmount).into_diagnostic()?;
            println!("{} XLM = {} stroops", amount, amount.to_stroops());
        }
        Command::Network { name } => {
            println!("{}", classify_network(Some(&name)));
        }
        Command::Balance { address } => {
            if !is_valid_address(&address) {
                return Err(PaymentError::InvalidAddress).into_diagnostic();
            }
            let horizon = HorizonGateway::new(&config).into_diagnostic()?;
            let account = match horizon.load_account(&address).await {
                Err(LedgerError::AccountNotFound(_)) => {
                    eprintln!("Fund the account on testnet first: {}", config.friendbot_url);
                    return Err(PaymentError::BalanceUnavailable).into_diagnostic();
                }
                result => result.into_diagnostic()?,
            };
            println!("{}", account.native_balance());
        }
        Command::Envelope { xdr } => {
            let summary = inspect_envelope(&xdr).into_diagnostic()?;
            println!("source: {}", summary.source);
            println!("sequence: {}", summary.sequence);
            println!("fee: {}", summary.fee);
            if let Some(max_time) = summary.max_time {
                println!("valid until: {max_time}");
            }
            println!("operations: {}", summary.operation_count);
            for payment in &summary.payments {
                let asset = if payment.native { "native" } else { "other" };
                println!(
                    "payment: {} stroops ({asset}) to {}",
                    payment.stroops, payment.destination
                );
            }
            println!("signatures: {}", summary.signature_count);
        }
        Command::History { command } => run_history(command)?,
    }

    Ok(())
}

fn run_history(command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::Summary { file, wallet } => {
            let file = File::open(file).into_diagnostic()?;
            let imported = import_history(file, &wallet).into_diagnostic()?;
            let metadata =
                ExportMetadata::summarize(&imported.transactions, &wallet, chrono::Utc::now());
            let json = serde_json::to_string_pretty(&metadata).into_diagnostic()?;
            println!("{json}");
            if imported.skipped > 0 {
                eprintln!("skipped {} malformed entries", imported.skipped);
            }
        }
        HistoryCommand::Csv { file, wallet } => {
            let file = File::open(file).into_diagnostic()?;
            let imported = import_history(file, &wallet).into_diagnostic()?;
            let stdout = io::stdout();
            HistoryWriter::new(stdout.lock())
                .write_history(&imported.transactions, &wallet)
                .into_diagnostic()?;
        }
    }
    Ok(())
}
