//! Commands that map one-to-one onto a device request.

use std::io::Write;

use log::debug;
use rand_core::{CryptoRng, RngCore};
use shared::path::{self, Path};
use shared::schema::{Identity, Settings};
use shared::{InteractionController, Link, Message, Prompter, Request};

use crate::commands::{accepted, unexpected};
use crate::error::CliError;
use crate::{AddressArgs, PingArgs, PublicKeyArgs, SignIdentityArgs, SignMessageArgs};

/// Parse path text, rejecting malformed and out-of-range input rather than sending `m`.
pub fn parse_path(text: &str) -> Result<Path, CliError> {
    let parsed = Path::parse(text);
    if parsed.is_empty() && path::normalize(text) != "m" {
        return Err(CliError::InvalidPath(text.to_owned()));
    }
    Ok(parsed)
}

fn call<L, P, R>(
    controller: &mut InteractionController<L, P, R>,
    request: Request,
) -> Result<Message, CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
{
    let message = accepted(controller.call(request)?)?;
    debug!("device answered after {} prompt(s)", controller.prompts());
    Ok(message)
}

fn success<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    request: Request,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    match call(controller, request)? {
        Message::Success(text) => {
            writeln!(out, "{text}")?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn ping<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    args: &PingArgs,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let request = Request::Ping {
        message: args.message.clone(),
        button_protection: args.button,
        pin_protection: args.pin,
        passphrase_protection: args.passphrase,
    };
    success(controller, request, out)
}

pub fn features<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    match call(controller, Request::GetFeatures)? {
        Message::Features(record) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn entropy<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    size: u32,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    match call(controller, Request::GetEntropy { size })? {
        Message::Entropy(bytes) => {
            writeln!(out, "{}", hex::encode(bytes))?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn address<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    args: &AddressArgs,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let request = Request::GetAddress {
        path: parse_path(&args.path)?,
        coin_name: Some(args.coin.clone()),
        show_display: args.show,
    };
    match call(controller, request)? {
        Message::Address(address) => {
            writeln!(out, "{address}")?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn public_key<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    args: &PublicKeyArgs,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let request = Request::GetPublicKey {
        path: parse_path(&args.path)?,
        ecdsa_curve_name: args.curve.clone(),
        coin_name: args.coin.clone(),
        show_display: args.show,
    };
    match call(controller, request)? {
        Message::PublicKey(record) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn sign_message<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    args: &SignMessageArgs,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let request = Request::SignMessage {
        path: parse_path(&args.path)?,
        message: args.message.as_bytes().to_vec(),
        coin_name: Some(args.coin.clone()),
    };
    match call(controller, request)? {
        Message::MessageSignature(record) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn sign_identity<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    args: &SignIdentityArgs,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let identity = Identity::from_uri(&args.uri, args.index)
        .ok_or_else(|| CliError::InvalidIdentity(args.uri.clone()))?;
    let request = Request::SignIdentity {
        identity,
        challenge_hidden: hex::decode(&args.challenge_hidden)?,
        challenge_visual: args.challenge_visual.clone(),
        ecdsa_curve_name: args.curve.clone(),
    };
    match call(controller, request)? {
        Message::SignedIdentity(record) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
            Ok(())
        }
        other => Err(unexpected(&other)),
    }
}

pub fn clear_session<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    success(controller, Request::ClearSession, out)
}

pub fn set_label<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    label: &str,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let settings = Settings {
        label: Some(label.to_owned()),
        ..Settings::default()
    };
    success(controller, Request::ApplySettings(settings), out)
}
