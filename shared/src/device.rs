//! Device profiles: which link to open and which schema to speak.

use serde::{Deserialize, Serialize};

use crate::link::DEFAULT_CHANNEL_MARKER;
use crate::schema::{KEEPKEY, SchemaTable, TREZOR};

/// Hex text of the constant the vault asks the device to encrypt. It is the same 32-byte
/// value repeated twice.
pub const VAULT_MASTER_VALUE_HEX: &str = concat!(
    "2d650551248d792eabf628f451200d7f51cb63e46aadcbb1038aacb05e8c8aee",
    "2d650551248d792eabf628f451200d7f51cb63e46aadcbb1038aacb05e8c8aee",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    Trezor,
    Keepkey,
}

impl DeviceFamily {
    pub fn schema(self) -> &'static SchemaTable {
        match self {
            DeviceFamily::Trezor => &TREZOR,
            DeviceFamily::Keepkey => &KEEPKEY,
        }
    }
}

/// Static facts about one device model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Display name used in on-device prompts, e.g. `TREZOR`.
    pub name: String,
    pub family: DeviceFamily,
    pub vendor_id: u16,
    pub product_id: u16,
    #[serde(default)]
    pub interface: i32,
    #[serde(default = "default_channel_marker")]
    pub channel_marker: u8,
    #[serde(default = "default_master_value")]
    pub master_value_hex: String,
    /// Largest response payload accepted; unlimited when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<usize>,
}

fn default_channel_marker() -> u8 {
    DEFAULT_CHANNEL_MARKER
}

fn default_master_value() -> String {
    VAULT_MASTER_VALUE_HEX.to_owned()
}

impl DeviceProfile {
    pub fn trezor() -> Self {
        Self {
            name: "TREZOR".to_owned(),
            family: DeviceFamily::Trezor,
            vendor_id: 0x534c,
            product_id: 0x0001,
            interface: 0,
            channel_marker: DEFAULT_CHANNEL_MARKER,
            master_value_hex: default_master_value(),
            max_payload: None,
        }
    }

    pub fn keepkey() -> Self {
        Self {
            name: "KEEPKEY".to_owned(),
            family: DeviceFamily::Keepkey,
            vendor_id: 0x2b24,
            product_id: 0x0001,
            interface: 0,
            channel_marker: DEFAULT_CHANNEL_MARKER,
            master_value_hex: default_master_value(),
            max_payload: None,
        }
    }

    /// Look up a built-in profile by its lowercase key.
    pub fn builtin(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "trezor" => Some(Self::trezor()),
            "keepkey" => Some(Self::keepkey()),
            _ => None,
        }
    }

    pub fn builtin_keys() -> &'static [&'static str] {
        &["trezor", "keepkey"]
    }

    pub fn schema(&self) -> &'static SchemaTable {
        self.family.schema()
    }

    /// Decode the master value sent to the device when deriving the vault secret.
    pub fn master_value(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(self.master_value_hex.trim())
    }
}
