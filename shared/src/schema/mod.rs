//! Typed requests and responses plus the per-family tables that map them to wire payloads.
//!
//! Both device families share message type codes and most field layouts. The layouts that
//! differ (Features, ApplySettings, ResetDevice, RecoveryDevice) live in [`trezor`] and
//! [`keepkey`]; a session picks one [`SchemaTable`] at construction.

use core::fmt;

use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroize;

use crate::frame::Envelope;
use crate::path::Path;

mod common;
pub mod keepkey;
pub mod proto;
pub mod trezor;

pub use keepkey::KEEPKEY;
pub use trezor::TREZOR;

macro_rules! message_types {
    ($($name:ident = $code:literal),* $(,)?) => {
        /// Numeric message type codes carried in the envelope header.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum MessageType {
            $($name = $code),*
        }

        impl MessageType {
            pub const fn code(self) -> u16 {
                self as u16
            }

            pub const fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(MessageType::$name),)*
                    _ => None,
                }
            }
        }
    };
}

message_types! {
    Initialize = 0,
    Ping = 1,
    Success = 2,
    Failure = 3,
    ChangePin = 4,
    WipeDevice = 5,
    GetEntropy = 9,
    Entropy = 10,
    GetPublicKey = 11,
    PublicKey = 12,
    ResetDevice = 14,
    Features = 17,
    PinMatrixRequest = 18,
    PinMatrixAck = 19,
    Cancel = 20,
    CipherKeyValue = 23,
    ClearSession = 24,
    ApplySettings = 25,
    ButtonRequest = 26,
    ButtonAck = 27,
    GetAddress = 29,
    Address = 30,
    EntropyRequest = 35,
    EntropyAck = 36,
    SignMessage = 38,
    VerifyMessage = 39,
    MessageSignature = 40,
    PassphraseRequest = 41,
    PassphraseAck = 42,
    EstimateTxSize = 43,
    TxSize = 44,
    RecoveryDevice = 45,
    WordRequest = 46,
    WordAck = 47,
    CipheredKeyValue = 48,
    SignIdentity = 53,
    SignedIdentity = 54,
    GetFeatures = 55,
    GetEcdhSessionKey = 61,
    EcdhSessionKey = 62,
}

impl TryFrom<u16> for MessageType {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        MessageType::from_code(value).ok_or(value)
    }
}

impl From<MessageType> for u16 {
    fn from(value: MessageType) -> Self {
        value.code()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{field} of {request} is not supported by the {family} schema")]
    Unsupported {
        request: &'static str,
        field: &'static str,
        family: &'static str,
    },
}

/// Device settings change. Fields left as `None` are not transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub language: Option<String>,
    pub label: Option<String>,
    pub use_passphrase: Option<bool>,
    /// Raw homescreen bitmap; trezor only.
    pub homescreen: Option<Vec<u8>>,
    /// keepkey only.
    pub auto_lock_delay_ms: Option<u32>,
    /// keepkey only.
    pub u2f_counter: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetOptions {
    pub display_random: bool,
    pub strength: u32,
    pub passphrase_protection: bool,
    pub pin_protection: bool,
    pub language: Option<String>,
    pub label: Option<String>,
    pub u2f_counter: Option<u32>,
    /// keepkey only.
    pub no_backup: Option<bool>,
    /// keepkey only.
    pub auto_lock_delay_ms: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryOptions {
    pub word_count: u32,
    pub passphrase_protection: bool,
    pub pin_protection: bool,
    pub language: Option<String>,
    pub label: Option<String>,
    pub enforce_wordlist: bool,
    pub u2f_counter: Option<u32>,
    /// trezor only.
    pub recovery_type: Option<u32>,
    /// keepkey only.
    pub use_character_cipher: Option<bool>,
    /// keepkey only.
    pub auto_lock_delay_ms: Option<u32>,
}

/// Identity used for SignIdentity and ECDH session keys, usually derived from a URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub proto: String,
    pub user: String,
    pub host: String,
    pub port: String,
    pub path: String,
    pub index: u32,
}

impl Identity {
    /// Split `scheme://[user@]host[:port][/path]`. Returns `None` without a scheme.
    pub fn from_uri(uri: &str, index: u32) -> Option<Self> {
        let (proto, rest) = uri.split_once("://")?;
        let (authority, path) = match rest.find('/') {
            Some(position) => rest.split_at(position),
            None => (rest, ""),
        };
        let (user, host_port) = match authority.rsplit_once('@') {
            Some((user, host_port)) => (user, host_port),
            None => ("", authority),
        };
        let (host, port) = host_port.split_once(':').unwrap_or((host_port, ""));

        Some(Self {
            proto: proto.to_owned(),
            user: user.to_owned(),
            host: host.to_owned(),
            port: port.to_owned(),
            path: path.to_owned(),
            index,
        })
    }
}

/// Host to device requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Initialize,
    GetFeatures,
    Ping {
        message: String,
        button_protection: bool,
        pin_protection: bool,
        passphrase_protection: bool,
    },
    ChangePin {
        remove: bool,
    },
    WipeDevice,
    ClearSession,
    Cancel,
    GetEntropy {
        size: u32,
    },
    GetPublicKey {
        path: Path,
        ecdsa_curve_name: Option<String>,
        coin_name: Option<String>,
        show_display: bool,
    },
    GetAddress {
        path: Path,
        coin_name: Option<String>,
        show_display: bool,
    },
    SignMessage {
        path: Path,
        message: Vec<u8>,
        coin_name: Option<String>,
    },
    VerifyMessage {
        address: String,
        signature: Vec<u8>,
        message: Vec<u8>,
        coin_name: Option<String>,
    },
    SignIdentity {
        identity: Identity,
        challenge_hidden: Vec<u8>,
        challenge_visual: String,
        ecdsa_curve_name: Option<String>,
    },
    GetEcdhSessionKey {
        identity: Identity,
        peer_public_key: Vec<u8>,
        ecdsa_curve_name: Option<String>,
    },
    EstimateTxSize {
        outputs_count: u32,
        inputs_count: u32,
        coin_name: Option<String>,
    },
    ApplySettings(Settings),
    ResetDevice(ResetOptions),
    RecoveryDevice(RecoveryOptions),
    CipherKeyValue {
        path: Path,
        key: String,
        value: Vec<u8>,
        encrypt: bool,
        ask_on_encrypt: bool,
        ask_on_decrypt: bool,
        iv: Option<Vec<u8>>,
    },
    PinMatrixAck {
        pin: String,
    },
    PassphraseAck {
        passphrase: String,
    },
    ButtonAck,
    WordAck {
        word: String,
    },
    EntropyAck {
        entropy: Vec<u8>,
    },
}

impl Request {
    pub fn message_type(&self) -> MessageType {
        match self {
            Request::Initialize => MessageType::Initialize,
            Request::GetFeatures => MessageType::GetFeatures,
            Request::Ping { .. } => MessageType::Ping,
            Request::ChangePin { .. } => MessageType::ChangePin,
            Request::WipeDevice => MessageType::WipeDevice,
            Request::ClearSession => MessageType::ClearSession,
            Request::Cancel => MessageType::Cancel,
            Request::GetEntropy { .. } => MessageType::GetEntropy,
            Request::GetPublicKey { .. } => MessageType::GetPublicKey,
            Request::GetAddress { .. } => MessageType::GetAddress,
            Request::SignMessage { .. } => MessageType::SignMessage,
            Request::VerifyMessage { .. } => MessageType::VerifyMessage,
            Request::SignIdentity { .. } => MessageType::SignIdentity,
            Request::GetEcdhSessionKey { .. } => MessageType::GetEcdhSessionKey,
            Request::EstimateTxSize { .. } => MessageType::EstimateTxSize,
            Request::ApplySettings(_) => MessageType::ApplySettings,
            Request::ResetDevice(_) => MessageType::ResetDevice,
            Request::RecoveryDevice(_) => MessageType::RecoveryDevice,
            Request::CipherKeyValue { .. } => MessageType::CipherKeyValue,
            Request::PinMatrixAck { .. } => MessageType::PinMatrixAck,
            Request::PassphraseAck { .. } => MessageType::PassphraseAck,
            Request::ButtonAck => MessageType::ButtonAck,
            Request::WordAck { .. } => MessageType::WordAck,
            Request::EntropyAck { .. } => MessageType::EntropyAck,
        }
    }

    /// Overwrite user secrets carried by prompt answers.
    pub fn scrub(&mut self) {
        match self {
            Request::PinMatrixAck { pin } => pin.zeroize(),
            Request::PassphraseAck { passphrase } => passphrase.zeroize(),
            Request::WordAck { word } => word.zeroize(),
            _ => {}
        }
    }
}

/// Which PIN the device is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMatrixKind {
    Current,
    NewFirst,
    NewSecond,
    Other(i32),
}

impl PinMatrixKind {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            None | Some(1) => PinMatrixKind::Current,
            Some(2) => PinMatrixKind::NewFirst,
            Some(3) => PinMatrixKind::NewSecond,
            Some(other) => PinMatrixKind::Other(other),
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            PinMatrixKind::Current => "Please enter current PIN:",
            PinMatrixKind::NewFirst => "Please enter new PIN:",
            PinMatrixKind::NewSecond => "Please re-enter new PIN:",
            PinMatrixKind::Other(_) => "Please enter PIN:",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub depth: Option<u32>,
    pub fingerprint: Option<u32>,
    pub child_num: Option<u32>,
    pub chain_code: Option<String>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicKeyRecord {
    pub node: Option<NodeRecord>,
    pub xpub: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRecord {
    pub policy_name: Option<String>,
    pub enabled: Option<bool>,
}

/// Device features normalised across both families.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeaturesRecord {
    pub vendor: Option<String>,
    pub major_version: Option<u32>,
    pub minor_version: Option<u32>,
    pub patch_version: Option<u32>,
    pub bootloader_mode: Option<bool>,
    pub device_id: Option<String>,
    pub pin_protection: Option<bool>,
    pub passphrase_protection: Option<bool>,
    pub language: Option<String>,
    pub label: Option<String>,
    pub initialized: Option<bool>,
    pub revision: Option<String>,
    pub bootloader_hash: Option<String>,
    pub imported: Option<bool>,
    pub pin_cached: Option<bool>,
    pub passphrase_cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_present: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignatureRecord {
    pub address: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignedIdentityRecord {
    pub address: Option<String>,
    pub public_key: Option<String>,
    pub signature: Option<String>,
}

/// Decoded device to host message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Success(String),
    Failure {
        code: Option<i32>,
        message: String,
    },
    Entropy(Vec<u8>),
    PublicKey(PublicKeyRecord),
    Address(String),
    Features(Box<FeaturesRecord>),
    CipheredKeyValue(Vec<u8>),
    MessageSignature(SignatureRecord),
    SignedIdentity(SignedIdentityRecord),
    EcdhSessionKey(Vec<u8>),
    TxSize(u32),
    PinMatrixRequest(PinMatrixKind),
    PassphraseRequest,
    ButtonRequest {
        code: Option<i32>,
        data: Option<String>,
    },
    WordRequest,
    EntropyRequest,
    /// Type code this schema has no decoder for.
    Uncaught {
        type_code: u16,
    },
    /// Known type code whose payload failed to decode.
    Malformed {
        message_type: MessageType,
        reason: String,
    },
}

impl Message {
    /// True for the messages that demand exactly one follow-up request.
    pub fn is_prompt(&self) -> bool {
        matches!(
            self,
            Message::PinMatrixRequest(_)
                | Message::PassphraseRequest
                | Message::ButtonRequest { .. }
                | Message::WordRequest
                | Message::EntropyRequest
        )
    }

    /// Human-facing rendering: text, hex, decimal count or a pretty JSON record.
    pub fn summary(&self) -> String {
        match self {
            Message::Success(text) => text.clone(),
            Message::Failure { message, .. } => message.clone(),
            Message::Entropy(bytes)
            | Message::CipheredKeyValue(bytes)
            | Message::EcdhSessionKey(bytes) => hex::encode(bytes),
            Message::PublicKey(record) => pretty(record),
            Message::Address(address) => address.clone(),
            Message::Features(record) => pretty(record),
            Message::MessageSignature(record) => pretty(record),
            Message::SignedIdentity(record) => pretty(record),
            Message::TxSize(size) => size.to_string(),
            Message::PinMatrixRequest(kind) => kind.prompt().to_owned(),
            Message::PassphraseRequest => "Enter your passphrase".to_owned(),
            Message::ButtonRequest { .. } => "Confirm action on device".to_owned(),
            Message::WordRequest => "Enter the word".to_owned(),
            Message::EntropyRequest => "Device requested host entropy".to_owned(),
            Message::Uncaught { type_code } => format!("Uncaught message type {type_code}"),
            Message::Malformed {
                message_type,
                reason,
            } => format!("Error unmarshalling {message_type:?}: {reason}"),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

fn pretty<T: Serialize>(record: &T) -> String {
    serde_json::to_string_pretty(record).unwrap_or_else(|err| format!("<unrenderable: {err}>"))
}

pub type EncodeFn = fn(&Request) -> Result<Vec<u8>, SchemaError>;
pub type DecodeFn = fn(&[u8]) -> Result<Message, prost::DecodeError>;

/// Per-family encoder and decoder dispatch.
pub struct SchemaTable {
    pub(crate) name: &'static str,
    pub(crate) encode: EncodeFn,
    pub(crate) decoders: &'static [(MessageType, DecodeFn)],
}

impl SchemaTable {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn encode(&self, request: &Request) -> Result<Envelope, SchemaError> {
        let payload = (self.encode)(request)?;
        Ok(Envelope::new(request.message_type().code(), payload))
    }

    /// Decode a response payload. Never fails; unknown and undecodable payloads are
    /// reported as [`Message::Uncaught`] and [`Message::Malformed`].
    pub fn decode(&self, type_code: u16, payload: &[u8]) -> Message {
        let Some(message_type) = MessageType::from_code(type_code) else {
            return Message::Uncaught { type_code };
        };
        let Some((_, decoder)) = self
            .decoders
            .iter()
            .find(|(candidate, _)| *candidate == message_type)
        else {
            return Message::Uncaught { type_code };
        };

        decoder(payload).unwrap_or_else(|err| Message::Malformed {
            message_type,
            reason: err.to_string(),
        })
    }

    pub fn decodes(&self, message_type: MessageType) -> bool {
        self.decoders
            .iter()
            .any(|(candidate, _)| *candidate == message_type)
    }
}

impl fmt::Debug for SchemaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaTable")
            .field("name", &self.name)
            .field("decoders", &self.decoders.len())
            .finish()
    }
}
