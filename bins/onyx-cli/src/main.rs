//! Offline wallet CLI for the Onyx chain.
//!
//! Everything here works without a node: `send` reads UTXOs from a JSON
//! file and prints broadcast-ready hex. Passwords are always prompted,
//! never taken from argv.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use onyx_core::crypto::{sign_message, verify_message};
use onyx_core::network::Network;
use onyx_core::Address;
use onyx_wallet::{SpendLockRegistry, Wallet, WalletUtxo};

#[derive(Parser)]
#[command(name = "onyx-cli", version, about = "Offline wallet for the Onyx chain")]
struct Cli {
    /// Network: mainnet or testnet.
    #[arg(long, global = true, default_value = "mainnet")]
    network: String,

    /// Wallet file path. Defaults to ~/.onyx/wallet.dat.
    #[arg(long, global = true)]
    wallet: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new wallet and print its backup mnemonic once.
    New,
    /// Restore a wallet from a 24-word mnemonic read from stdin.
    Restore,
    /// Show the wallet address and network.
    Show {
        /// Also reveal the backup mnemonic (prompts for the password).
        #[arg(long)]
        mnemonic: bool,
    },
    /// Build and sign a spend from a UTXO file, printing broadcast hex.
    Send(SendArgs),
    /// Decode an address and print its components.
    DecodeAddress { address: String },
    /// Sign a message with the wallet key.
    SignMessage { message: String },
    /// Verify a signed message against an address.
    VerifyMessage {
        address: String,
        message: String,
        signature: String,
    },
}

#[derive(Args)]
struct SendArgs {
    /// JSON file holding the spendable UTXOs (array of {txid, vout, satoshis, address}).
    #[arg(long)]
    utxos: PathBuf,

    /// Recipient address.
    #[arg(long)]
    to: String,

    /// Amount to send, in satoshis.
    #[arg(long)]
    amount: u64,

    /// Fee rate in satoshis per byte.
    #[arg(long, default_value_t = 1)]
    fee_rate: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let network = parse_network(&cli.network)?;
    let wallet_path = resolve_wallet_path(cli.wallet)?;

    match cli.command {
        Command::New => cmd_new(&wallet_path, network),
        Command::Restore => cmd_restore(&wallet_path, network),
        Command::Show { mnemonic } => cmd_show(&wallet_path, mnemonic),
        Command::Send(args) => cmd_send(&wallet_path, &args),
        Command::DecodeAddress { address } => cmd_decode_address(&address),
        Command::SignMessage { message } => cmd_sign_message(&wallet_path, &message),
        Command::VerifyMessage { address, message, signature } => {
            cmd_verify_message(network, &address, &message, &signature)
        }
    }
}

fn cmd_new(path: &Path, network: Network) -> Result<()> {
    if path.exists() {
        bail!("wallet file already exists at {}", path.display());
    }
    let password = prompt_new_password()?;
    let wallet = Wallet::create(&password, network)?;
    ensure_parent_dir(path)?;
    wallet.save(path)?;

    let mnemonic = wallet.reveal_mnemonic(&password)?;
    println!("address: {}", wallet.address());
    println!("network: {network}");
    println!();
    println!("Write down this 24-word backup phrase. It is shown only once");
    println!("and anyone who learns it can spend your coins:");
    println!();
    println!("  {}", *mnemonic);
    Ok(())
}

fn cmd_restore(path: &Path, network: Network) -> Result<()> {
    if path.exists() {
        bail!("wallet file already exists at {}", path.display());
    }
    eprint!("Enter your 24-word mnemonic: ");
    io::stderr().flush()?;
    let mut phrase = String::new();
    io::stdin()
        .lock()
        .read_line(&mut phrase)
        .context("reading mnemonic")?;

    let password = prompt_new_password()?;
    let wallet = Wallet::restore(&phrase, &password, network)?;
    ensure_parent_dir(path)?;
    wallet.save(path)?;

    println!("address: {}", wallet.address());
    println!("network: {network}");
    Ok(())
}

fn cmd_show(path: &Path, reveal_mnemonic: bool) -> Result<()> {
    let wallet = load_wallet(path)?;
    println!("address: {}", wallet.address());
    println!("network: {}", wallet.network());
    if reveal_mnemonic {
        let password = rpassword::prompt_password("Wallet password: ")?;
        let mnemonic = wallet.reveal_mnemonic(&password)?;
        println!("mnemonic: {}", *mnemonic);
    }
    Ok(())
}

fn cmd_send(path: &Path, args: &SendArgs) -> Result<()> {
    let wallet = load_wallet(path)?;
    let utxos: Vec<WalletUtxo> = serde_json::from_slice(
        &fs::read(&args.utxos)
            .with_context(|| format!("reading UTXO file {}", args.utxos.display()))?,
    )
    .context("parsing UTXO file")?;

    let password = rpassword::prompt_password("Wallet password: ")?;
    let registry = SpendLockRegistry::new();
    let (signed, _reservation) = wallet.prepare_send(
        &utxos,
        &args.to,
        args.amount,
        args.fee_rate,
        &password,
        &registry,
    )?;

    println!("txid:   {}", signed.txid);
    println!("fee:    {} satoshis", signed.fee);
    println!("change: {} satoshis", signed.change);
    println!();
    println!("{}", signed.hex);
    Ok(())
}

fn cmd_decode_address(address: &str) -> Result<()> {
    let decoded = Address::parse(address).context("decoding address")?;
    println!("version: {:#04x}", decoded.version());
    println!("hash160: {}", hex::encode(decoded.hash160()));
    for network in [Network::Mainnet, Network::Testnet] {
        if decoded.matches_network(network.params()) {
            println!("network: {network}");
        }
    }
    Ok(())
}

fn cmd_sign_message(path: &Path, message: &str) -> Result<()> {
    let wallet = load_wallet(path)?;
    let password = rpassword::prompt_password("Wallet password: ")?;
    let keypair = wallet.unlock_keypair(&password)?;
    let signature = sign_message(message, &keypair, wallet.network().params());
    println!("address:   {}", wallet.address());
    println!("signature: {signature}");
    Ok(())
}

fn cmd_verify_message(
    network: Network,
    address: &str,
    message: &str,
    signature: &str,
) -> Result<()> {
    let address = Address::decode(address, network.params()).context("decoding address")?;
    if verify_message(message, signature, &address, network.params())? {
        println!("valid: signature matches {address}");
        Ok(())
    } else {
        bail!("invalid: signature was not made by {address}");
    }
}

fn parse_network(name: &str) -> Result<Network> {
    name.parse()
        .with_context(|| format!("unknown network {name:?} (expected mainnet or testnet)"))
}

fn resolve_wallet_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let home = dirs::home_dir().context("cannot determine home directory; pass --wallet")?;
    Ok(home.join(".onyx").join("wallet.dat"))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

fn load_wallet(path: &Path) -> Result<Wallet> {
    Wallet::load(path).with_context(|| format!("loading wallet from {}", path.display()))
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("Choose a wallet password: ")?;
    if password.is_empty() {
        bail!("password must not be empty");
    }
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("passwords do not match");
    }
    Ok(password)
}
