//! Replay tool: drive a wallet binary interactively from the terminal or a
//! piped command script, printing each raw response.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wallet_cli_driver::config::DriverConfig;
use wallet_cli_driver::driver::{WalletController, WalletProcessBuilder};

#[derive(Parser)]
#[command(
    name = "wallet-driver",
    about = "Replay commands against an interactive CLI wallet",
    version
)]
struct Cli {
    /// Path to the wallet binary; falls back to the config file.
    #[arg(long)]
    wallet_bin: Option<PathBuf>,

    /// Network selector (regtest, testnet, ...).
    #[arg(long)]
    network: Option<String>,

    /// Node RPC address.
    #[arg(long)]
    rpc_address: Option<String>,

    /// Node RPC cookie file.
    #[arg(long)]
    cookie_file: Option<PathBuf>,

    /// Driver configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra arguments passed to the wallet verbatim.
    #[arg(last = true)]
    extra_args: Vec<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };
    if let Some(network) = &cli.network {
        config.network = network.clone();
    }
    let wallet_bin = cli
        .wallet_bin
        .clone()
        .or_else(|| config.wallet_binary.clone())
        .ok_or("no wallet binary given (--wallet-bin or config wallet_binary)")?;

    let mut builder = WalletProcessBuilder::new()
        .network(&config.network)
        .extra_args(cli.extra_args.clone());
    if let Some(address) = &cli.rpc_address {
        builder = builder.rpc_address(address);
    }
    if let Some(cookie) = &cli.cookie_file {
        builder = builder.cookie_file(cookie);
    }

    let mut controller = WalletController::start(&wallet_bin, &builder, &config)?;
    tracing::info!(transcript = %controller.transcript_path().display(), "session started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command == "exit" {
            break;
        }
        let response = controller.send_command(command).await?;
        println!("{response}");
    }

    controller.stop().await;
    Ok(())
}
