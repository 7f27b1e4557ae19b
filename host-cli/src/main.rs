use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use shared::SharedError;
use tracing_subscriber::EnvFilter;

mod application;
mod commands;
mod constants;
mod error;
mod prompt;
mod transport;

#[cfg(test)]
mod tests;

use crate::constants::{DEFAULT_COIN, DEFAULT_DEVICE, DEFAULT_ENTROPY_SIZE};
use crate::error::CliError;
use crate::prompt::TerminalPrompter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Host driver for Trezor and KeepKey signing tokens")]
pub struct Cli {
    /// Built-in device profile to talk to (trezor or keepkey).
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    pub device: String,

    /// JSON device profile; overrides --device.
    #[arg(long, value_name = "PATH")]
    pub profile_file: Option<PathBuf>,

    /// Log protocol traffic at debug level. RUST_LOG takes precedence.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Round-trip a message through the device.
    Ping(PingArgs),
    /// Print the device feature report.
    Features,
    /// Request random bytes from the device.
    Entropy {
        #[arg(long, default_value_t = DEFAULT_ENTROPY_SIZE)]
        size: u32,
    },
    /// Derive an address.
    Address(AddressArgs),
    /// Derive an extended public key.
    PublicKey(PublicKeyArgs),
    /// Sign a text message with the key at a derivation path.
    SignMessage(SignMessageArgs),
    /// Sign a login challenge for an identity URI.
    SignIdentity(SignIdentityArgs),
    /// Forget the cached PIN and passphrase.
    ClearSession,
    /// Change the device label.
    SetLabel { label: String },
    /// Work with the device-backed password vault.
    #[command(subcommand)]
    Vault(VaultCommand),
}

#[derive(Args, Debug, Clone)]
pub struct PingArgs {
    #[arg(default_value = "ping")]
    pub message: String,
    /// Require a button press.
    #[arg(long)]
    pub button: bool,
    /// Require the PIN.
    #[arg(long)]
    pub pin: bool,
    /// Require the passphrase.
    #[arg(long)]
    pub passphrase: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddressArgs {
    /// Derivation path such as m/44'/0'/0'/0/0.
    #[arg(long)]
    pub path: String,
    #[arg(long, default_value = DEFAULT_COIN)]
    pub coin: String,
    /// Also show the address on the device screen.
    #[arg(long)]
    pub show: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PublicKeyArgs {
    #[arg(long)]
    pub path: String,
    #[arg(long)]
    pub coin: Option<String>,
    /// ECDSA curve name, e.g. secp256k1 or nist256p1.
    #[arg(long)]
    pub curve: Option<String>,
    #[arg(long)]
    pub show: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SignMessageArgs {
    #[arg(long)]
    pub path: String,
    pub message: String,
    #[arg(long, default_value = DEFAULT_COIN)]
    pub coin: String,
}

#[derive(Args, Debug, Clone)]
pub struct SignIdentityArgs {
    /// Identity such as ssh://user@host:port/path.
    pub uri: String,
    #[arg(long, default_value_t = 0)]
    pub index: u32,
    /// Hidden challenge bytes as hex.
    #[arg(long, default_value = "")]
    pub challenge_hidden: String,
    /// Challenge text shown on the device screen.
    #[arg(long, default_value = "")]
    pub challenge_visual: String,
    #[arg(long)]
    pub curve: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum VaultCommand {
    /// List vault entries without unlocking them.
    List(VaultArgs),
    /// Unlock one entry and print its secrets.
    Show {
        #[command(flatten)]
        vault: VaultArgs,
        /// Entry identifier as stored in the vault file.
        #[arg(long)]
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct VaultArgs {
    /// Directory that holds the vault file.
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let provider = application::default_provider();
    let prompter = TerminalPrompter::stdio();
    let mut stdout = io::stdout().lock();

    if let Err(err) = application::execute(cli, &provider, prompter, &mut stdout) {
        match &err {
            CliError::Device(SharedError::Transport(_)) => {
                eprintln!("Transport failure: {err}");
            }
            CliError::Device(SharedError::Prompt(_)) => {
                eprintln!("Prompt aborted: {err}");
            }
            _ => {}
        }
        return Err(anyhow::Error::from(err));
    }

    Ok(())
}
