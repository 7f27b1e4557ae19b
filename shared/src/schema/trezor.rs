use prost::{DecodeError, Message as ProstMessage};

use super::common::{self, hex_field};
use super::{
    DecodeFn, FeaturesRecord, Message, MessageType, RecoveryOptions, Request, ResetOptions,
    SchemaError, SchemaTable, Settings,
};

const FAMILY: &str = "trezor";

pub static TREZOR: SchemaTable = SchemaTable {
    name: FAMILY,
    encode,
    decoders: DECODERS,
};

const DECODERS: &[(MessageType, DecodeFn)] = &[
    (MessageType::Success, common::decode_success),
    (MessageType::Failure, common::decode_failure),
    (MessageType::Entropy, common::decode_entropy),
    (MessageType::PublicKey, common::decode_public_key),
    (MessageType::Features, decode_features),
    (MessageType::PinMatrixRequest, common::decode_pin_matrix_request),
    (MessageType::ButtonRequest, common::decode_button_request),
    (MessageType::Address, common::decode_address),
    (MessageType::EntropyRequest, common::decode_entropy_request),
    (MessageType::MessageSignature, common::decode_message_signature),
    (MessageType::PassphraseRequest, common::decode_passphrase_request),
    (MessageType::TxSize, common::decode_tx_size),
    (MessageType::WordRequest, common::decode_word_request),
    (MessageType::CipheredKeyValue, common::decode_ciphered_key_value),
    (MessageType::SignedIdentity, common::decode_signed_identity),
    (MessageType::EcdhSessionKey, common::decode_ecdh_session_key),
];

#[derive(Clone, PartialEq, ProstMessage)]
pub struct Features {
    #[prost(string, optional, tag = "1")]
    pub vendor: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub major_version: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub minor_version: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub patch_version: Option<u32>,
    #[prost(bool, optional, tag = "5")]
    pub bootloader_mode: Option<bool>,
    #[prost(string, optional, tag = "6")]
    pub device_id: Option<String>,
    #[prost(bool, optional, tag = "7")]
    pub pin_protection: Option<bool>,
    #[prost(bool, optional, tag = "8")]
    pub passphrase_protection: Option<bool>,
    #[prost(string, optional, tag = "9")]
    pub language: Option<String>,
    #[prost(string, optional, tag = "10")]
    pub label: Option<String>,
    #[prost(bool, optional, tag = "12")]
    pub initialized: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "13")]
    pub revision: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "14")]
    pub bootloader_hash: Option<Vec<u8>>,
    #[prost(bool, optional, tag = "15")]
    pub imported: Option<bool>,
    #[prost(bool, optional, tag = "16")]
    pub pin_cached: Option<bool>,
    #[prost(bool, optional, tag = "17")]
    pub passphrase_cached: Option<bool>,
    #[prost(bool, optional, tag = "18")]
    pub firmware_present: Option<bool>,
    #[prost(string, optional, tag = "21")]
    pub model: Option<String>,
}

#[derive(Clone, PartialEq, ProstMessage)]
pub struct ApplySettings {
    #[prost(string, optional, tag = "1")]
    pub language: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub label: Option<String>,
    #[prost(bool, optional, tag = "3")]
    pub use_passphrase: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub homescreen: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, ProstMessage)]
pub struct ResetDevice {
    #[prost(bool, optional, tag = "1")]
    pub display_random: Option<bool>,
    #[prost(uint32, optional, tag = "2")]
    pub strength: Option<u32>,
    #[prost(bool, optional, tag = "3")]
    pub passphrase_protection: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    pub pin_protection: Option<bool>,
    #[prost(string, optional, tag = "5")]
    pub language: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub label: Option<String>,
    #[prost(uint32, optional, tag = "7")]
    pub u2f_counter: Option<u32>,
}

#[derive(Clone, PartialEq, ProstMessage)]
pub struct RecoveryDevice {
    #[prost(uint32, optional, tag = "1")]
    pub word_count: Option<u32>,
    #[prost(bool, optional, tag = "2")]
    pub passphrase_protection: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub pin_protection: Option<bool>,
    #[prost(string, optional, tag = "4")]
    pub language: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub label: Option<String>,
    #[prost(bool, optional, tag = "6")]
    pub enforce_wordlist: Option<bool>,
    #[prost(uint32, optional, tag = "8")]
    pub r#type: Option<u32>,
    #[prost(uint32, optional, tag = "9")]
    pub u2f_counter: Option<u32>,
}

fn reject(request: &'static str, field: &'static str) -> SchemaError {
    SchemaError::Unsupported {
        request,
        field,
        family: FAMILY,
    }
}

fn encode(request: &Request) -> Result<Vec<u8>, SchemaError> {
    match request {
        Request::ApplySettings(settings) => encode_settings(settings),
        Request::ResetDevice(options) => encode_reset(options),
        Request::RecoveryDevice(options) => encode_recovery(options),
        other => common::encode(other, FAMILY),
    }
}

fn encode_settings(settings: &Settings) -> Result<Vec<u8>, SchemaError> {
    if settings.auto_lock_delay_ms.is_some() {
        return Err(reject("ApplySettings", "auto_lock_delay_ms"));
    }
    if settings.u2f_counter.is_some() {
        return Err(reject("ApplySettings", "u2f_counter"));
    }
    Ok(ApplySettings {
        language: settings.language.clone(),
        label: settings.label.clone(),
        use_passphrase: settings.use_passphrase,
        homescreen: settings.homescreen.clone(),
    }
    .encode_to_vec())
}

fn encode_reset(options: &ResetOptions) -> Result<Vec<u8>, SchemaError> {
    if options.no_backup.is_some() {
        return Err(reject("ResetDevice", "no_backup"));
    }
    if options.auto_lock_delay_ms.is_some() {
        return Err(reject("ResetDevice", "auto_lock_delay_ms"));
    }
    Ok(ResetDevice {
        display_random: Some(options.display_random),
        strength: Some(options.strength),
        passphrase_protection: Some(options.passphrase_protection),
        pin_protection: Some(options.pin_protection),
        language: options.language.clone(),
        label: options.label.clone(),
        u2f_counter: options.u2f_counter,
    }
    .encode_to_vec())
}

fn encode_recovery(options: &RecoveryOptions) -> Result<Vec<u8>, SchemaError> {
    if options.use_character_cipher.is_some() {
        return Err(reject("RecoveryDevice", "use_character_cipher"));
    }
    if options.auto_lock_delay_ms.is_some() {
        return Err(reject("RecoveryDevice", "auto_lock_delay_ms"));
    }
    Ok(RecoveryDevice {
        word_count: Some(options.word_count),
        passphrase_protection: Some(options.passphrase_protection),
        pin_protection: Some(options.pin_protection),
        language: options.language.clone(),
        label: options.label.clone(),
        enforce_wordlist: Some(options.enforce_wordlist),
        r#type: options.recovery_type,
        u2f_counter: options.u2f_counter,
    }
    .encode_to_vec())
}

fn decode_features(bytes: &[u8]) -> Result<Message, DecodeError> {
    let features = Features::decode(bytes)?;
    Ok(Message::Features(Box::new(FeaturesRecord {
        vendor: features.vendor,
        major_version: features.major_version,
        minor_version: features.minor_version,
        patch_version: features.patch_version,
        bootloader_mode: features.bootloader_mode,
        device_id: features.device_id,
        pin_protection: features.pin_protection,
        passphrase_protection: features.passphrase_protection,
        language: features.language,
        label: features.label,
        initialized: features.initialized,
        revision: hex_field(features.revision),
        bootloader_hash: hex_field(features.bootloader_hash),
        imported: features.imported,
        pin_cached: features.pin_cached,
        passphrase_cached: features.passphrase_cached,
        firmware_present: features.firmware_present,
        model: features.model,
        policies: Vec::new(),
    })))
}
