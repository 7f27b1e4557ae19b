use std::io::Write;
use std::path::Path;

use log::info;
use rand_core::{CryptoRng, RngCore};
use shared::{InteractionController, Link, Prompter};
use vault_core::{VaultError, VaultStorage, open_vault, read_vault, unlock_entry};

use crate::error::CliError;

fn load<L, P, R>(
    controller: &mut InteractionController<L, P, R>,
    dir: &Path,
) -> Result<VaultStorage, CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
{
    let keys = open_vault(controller)?;
    let storage = read_vault(dir, &keys)?;
    info!("vault holds {} entries", storage.entries.len());
    Ok(storage)
}

fn tag_titles(storage: &VaultStorage, tags: &[i64]) -> String {
    tags.iter()
        .map(|id| {
            storage
                .tags
                .get(&id.to_string())
                .map(|tag| tag.title.clone())
                .unwrap_or_else(|| id.to_string())
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Print one line per entry. Only the device-confirmed master secret is needed.
pub fn list<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    dir: &Path,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let storage = load(controller, dir)?;
    for (id, entry) in &storage.entries {
        writeln!(
            out,
            "{id}\t{}\t{}\t{}\t[{}]",
            entry.title,
            entry.username,
            entry.note,
            tag_titles(&storage, &entry.tags)
        )?;
    }
    Ok(())
}

/// Unlock a single entry on the device and print its secrets.
pub fn show<L, P, R, W>(
    controller: &mut InteractionController<L, P, R>,
    dir: &Path,
    id: &str,
    out: &mut W,
) -> Result<(), CliError>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
    W: Write + ?Sized,
{
    let storage = load(controller, dir)?;
    let entry = storage
        .entries
        .get(id)
        .ok_or_else(|| VaultError::EntryNotFound(id.to_owned()))?;
    let unlocked = unlock_entry(controller, entry)?;

    writeln!(out, "title:     {}", unlocked.title)?;
    writeln!(out, "username:  {}", unlocked.username)?;
    writeln!(out, "note:      {}", unlocked.note)?;
    writeln!(out, "password:  {}", unlocked.password.expose())?;
    writeln!(out, "safe note: {}", unlocked.safe_note.expose())?;
    writeln!(out, "tags:      {}", tag_titles(&storage, &unlocked.tags))?;
    Ok(())
}
