use std::io::Write;

use rand_core::{CryptoRng, RngCore};
use shared::{InteractionController, Link, Message, Prompter};

use crate::error::CliError;
use crate::{Command, VaultCommand};

pub mod device;
pub mod host_config;
pub mod vault;

pub fn run<L, P, R, W>(
    command: Command,
    controller: &mut InteractionController<L, P, R>,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    match command {
        Command::Ping(args) => device::ping(controller, &args, out),
        Command::Features => device::features(controller, out),
        Command::Entropy { size } => device::entropy(controller, size, out),
        Command::Address(args) => device::address(controller, &args, out),
        Command::PublicKey(args) => device::public_key(controller, &args, out),
        Command::SignMessage(args) => device::sign_message(controller, &args, out),
        Command::SignIdentity(args) => device::sign_identity(controller, &args, out),
        Command::ClearSession => device::clear_session(controller, out),
        Command::SetLabel { label } => device::set_label(controller, &label, out),
        Command::Vault(VaultCommand::List(args)) => vault::list(controller, &args.dir, out),
        Command::Vault(VaultCommand::Show { vault, id }) => {
            vault::show(controller, &vault.dir, &id, out)
        }
    }
}

/// Turn a device `Failure` into an error; pass every other terminal message through.
pub(crate) fn accepted(message: Message) -> Result<Message, CliError> {
    match message {
        Message::Failure { code, message } => Err(CliError::Failure { code, message }),
        other => Ok(other),
    }
}

pub(crate) fn unexpected(message: &Message) -> CliError {
    CliError::Unexpected(message.to_string())
}
