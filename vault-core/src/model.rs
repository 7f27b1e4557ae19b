use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Type marker written in front of every encrypted field.
pub const BUFFER_FIELD_TYPE: &str = "Buffer";

/// Decrypted vault container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStorage {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub tags: BTreeMap<String, Tag>,
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "orderType", default)]
    pub order_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub active: String,
}

/// One stored credential. `password` and `safe_note` are sealed with the entry key that
/// the device recovers from `nonce`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: String,
    /// Hex text of the device-encrypted entry key.
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub password: EncryptedField,
    #[serde(default)]
    pub safe_note: EncryptedField,
    #[serde(default)]
    pub tags: Vec<i64>,
}

/// Encrypted bytes serialised as `{"type": "Buffer", "data": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<u8>,
}

impl EncryptedField {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            kind: BUFFER_FIELD_TYPE.to_owned(),
            data,
        }
    }
}

impl Default for EncryptedField {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Wrapper around sensitive strings that zeroize their memory on drop.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Entry with its sealed fields opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedEntry {
    pub title: String,
    pub username: String,
    pub note: String,
    pub password: SecretString,
    pub safe_note: SecretString,
    pub tags: Vec<i64>,
}

/// Plaintext for a new entry before it is sealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub username: String,
    pub note: String,
    pub password: SecretString,
    pub safe_note: SecretString,
    pub tags: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encrypted_field_uses_buffer_shape() {
        let field = EncryptedField::new(vec![1, 2, 255]);
        let value = serde_json::to_value(&field).expect("serialize");
        assert_eq!(value, json!({"type": "Buffer", "data": [1, 2, 255]}));
    }

    #[test]
    fn storage_reads_container_json() {
        let raw = json!({
            "version": "0.0.1",
            "config": {"orderType": "date"},
            "tags": {"0": {"title": "All", "icon": "home", "active": "active"}},
            "entries": {
                "1": {
                    "title": "mail",
                    "username": "alice",
                    "nonce": "abcd",
                    "note": "",
                    "password": {"type": "Buffer", "data": [9, 8]},
                    "safe_note": {"type": "Buffer", "data": []},
                    "tags": [0]
                }
            }
        });
        let storage: VaultStorage = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(storage.config.order_type, "date");
        assert_eq!(storage.tags["0"].title, "All");
        assert_eq!(storage.entries["1"].password.data, vec![9, 8]);
        assert_eq!(serde_json::to_value(&storage).expect("serialize"), raw);
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let secret = SecretString::from("hunter2");
        assert_eq!(secret.expose(), "hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
