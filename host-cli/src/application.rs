use std::io::Write;

use log::info;
use shared::{DeviceProfile, InteractionController, Link, Prompter, Session};

use crate::Cli;
use crate::commands;
use crate::commands::host_config::load_profile;
use crate::error::CliError;

/// Opens a link to the device a profile describes.
pub trait LinkProvider {
    type Link: Link;

    fn connect(&self, profile: &DeviceProfile) -> Result<Self::Link, CliError>;
}

#[cfg(feature = "hid")]
pub fn default_provider() -> crate::transport::hid::HidLinkProvider {
    crate::transport::hid::HidLinkProvider
}

#[cfg(not(feature = "hid"))]
pub fn default_provider() -> crate::transport::UnavailableLinkProvider {
    crate::transport::UnavailableLinkProvider
}

/// Resolve the profile from `--profile-file`, falling back to the built-in `--device` preset.
pub fn select_profile(cli: &Cli) -> Result<DeviceProfile, CliError> {
    if let Some(path) = &cli.profile_file {
        return load_profile(path);
    }
    DeviceProfile::builtin(&cli.device).ok_or_else(|| CliError::UnknownDevice {
        name: cli.device.clone(),
        known: DeviceProfile::builtin_keys().join(", "),
    })
}

pub fn connect_link<P>(profile: &DeviceProfile, provider: &P) -> Result<P::Link, CliError>
where
    P: LinkProvider,
{
    info!(
        "connecting to {} ({:04x}:{:04x}, interface {})",
        profile.name, profile.vendor_id, profile.product_id, profile.interface
    );
    provider.connect(profile)
}

pub fn execute<P, Q, W>(
    cli: Cli,
    provider: &P,
    prompter: Q,
    out: &mut W,
) -> Result<(), CliError>
where
    P: LinkProvider,
    Q: Prompter,
    W: Write + ?Sized,
{
    let profile = select_profile(&cli)?;
    let link = connect_link(&profile, provider)?;
    let session = Session::new(link, profile);
    let mut controller = InteractionController::new(session, prompter);
    commands::run(cli.command, &mut controller, out)
}
