use prost::{DecodeError, Message as ProstMessage};

use super::common::{self, hex_field};
use super::{
    DecodeFn, FeaturesRecord, Message, MessageType, PolicyRecord, RecoveryOptions, Request,
    ResetOptions, SchemaError, SchemaTable, Settings,
};

const FAMILY: &str = "keepkey";

pub static KEEPKEY: SchemaTable = SchemaTable {
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
pub struct Policy {
    #[prost(string, optional, tag = "1")]
    pub policy_name: Option<String>,
    #[prost(bool, optional, tag = "2")]
    pub enabled: Option<bool>,
}

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
    #[prost(message, repeated, tag = "18")]
    pub policies: Vec<Policy>,
}

#[derive(Clone, PartialEq, ProstMessage)]
pub struct ApplySettings {
    #[prost(string, optional, tag = "1")]
    pub language: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub label: Option<String>,
    #[prost(bool, optional, tag = "3")]
    pub use_passphrase: Option<bool>,
    #[prost(uint32, optional, tag = "4")]
    pub auto_lock_delay_ms: Option<u32>,
    #[prost(uint32, optional, tag = "5")]
    pub u2f_counter: Option<u32>,
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
    #[prost(bool, optional, tag = "7")]
    pub no_backup: Option<bool>,
    #[prost(uint32, optional, tag = "8")]
    pub auto_lock_delay_ms: Option<u32>,
    #[prost(uint32, optional, tag = "9")]
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
    #[prost(bool, optional, tag = "7")]
    pub use_character_cipher: Option<bool>,
    #[prost(uint32, optional, tag = "8")]
    pub auto_lock_delay_ms: Option<u32>,
    #[prost(uint32, optional, tag = "9")]
    pub u2f_counter: Option<u32>,
}

fn encode(request: &Request) -> Result<Vec<u8>, SchemaError> {
    match request {
        Request::ApplySettings(settings) => encode_settings(settings),
        Request::ResetDevice(options) => Ok(encode_reset(options)),
        Request::RecoveryDevice(options) => encode_recovery(options),
        other => common::encode(other, FAMILY),
    }
}

fn encode_settings(settings: &Settings) -> Result<Vec<u8>, SchemaError> {
    if settings.homescreen.is_some() {
        return Err(SchemaError::Unsupported {
            request: "ApplySettings",
            field: "homescreen",
            family: FAMILY,
        });
    }
    Ok(ApplySettings {
        language: settings.language.clone(),
        label: settings.label.clone(),
        use_passphrase: settings.use_passphrase,
        auto_lock_delay_ms: settings.auto_lock_delay_ms,
        u2f_counter: settings.u2f_counter,
    }
    .encode_to_vec())
}

fn encode_reset(options: &ResetOptions) -> Vec<u8> {
    ResetDevice {
        display_random: Some(options.display_random),
        strength: Some(options.strength),
        passphrase_protection: Some(options.passphrase_protection),
        pin_protection: Some(options.pin_protection),
        language: options.language.clone(),
        label: options.label.clone(),
        no_backup: options.no_backup,
        auto_lock_delay_ms: options.auto_lock_delay_ms,
        u2f_counter: options.u2f_counter,
    }
    .encode_to_vec()
}

fn encode_recovery(options: &RecoveryOptions) -> Result<Vec<u8>, SchemaError> {
    if options.recovery_type.is_some() {
        return Err(SchemaError::Unsupported {
            request: "RecoveryDevice",
            field: "recovery_type",
            family: FAMILY,
        });
    }
    Ok(RecoveryDevice {
        word_count: Some(options.word_count),
        passphrase_protection: Some(options.passphrase_protection),
        pin_protection: Some(options.pin_protection),
        language: options.language.clone(),
        label: options.label.clone(),
        enforce_wordlist: Some(options.enforce_wordlist),
        use_character_cipher: options.use_character_cipher,
        auto_lock_delay_ms: options.auto_lock_delay_ms,
        u2f_counter: options.u2f_counter,
    }
    .encode_to_vec())
}

fn decode_features(bytes: &[u8]) -> Result<Message, DecodeError> {
    let features = Features::decode(bytes)?;
    let policies = features
        .policies
        .into_iter()
        .map(|policy| PolicyRecord {
            policy_name: policy.policy_name,
            enabled: policy.enabled,
        })
        .collect();

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
        firmware_present: None,
        model: None,
        policies,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homescreen_is_rejected() {
        let settings = Settings {
            homescreen: Some(vec![0; 16]),
            ..Settings::default()
        };
        assert_eq!(
            KEEPKEY.encode(&Request::ApplySettings(settings)),
            Err(SchemaError::Unsupported {
                request: "ApplySettings",
                field: "homescreen",
                family: "keepkey",
            })
        );
    }

    #[test]
    fn settings_carry_auto_lock_at_tag_four() {
        let settings = Settings {
            auto_lock_delay_ms: Some(600_000),
            ..Settings::default()
        };
        let envelope = KEEPKEY
            .encode(&Request::ApplySettings(settings))
            .expect("encode");
        let decoded = ApplySettings::decode(envelope.payload.as_slice()).expect("decode");
        assert_eq!(decoded.auto_lock_delay_ms, Some(600_000));
        assert_eq!(decoded.label, None);
    }

    #[test]
    fn recovery_layout_differs_from_trezor() {
        let options = RecoveryOptions {
            word_count: 24,
            use_character_cipher: Some(true),
            u2f_counter: Some(3),
            ..RecoveryOptions::default()
        };
        let envelope = KEEPKEY
            .encode(&Request::RecoveryDevice(options))
            .expect("encode");
        let decoded = RecoveryDevice::decode(envelope.payload.as_slice()).expect("decode");
        assert_eq!(decoded.word_count, Some(24));
        assert_eq!(decoded.use_character_cipher, Some(true));
        assert_eq!(decoded.u2f_counter, Some(3));
    }

    #[test]
    fn features_carry_policies() {
        let features = Features {
            vendor: Some("keepkey.com".into()),
            revision: Some(vec![0xAB, 0xCD]),
            policies: vec![Policy {
                policy_name: Some("ShapeShift".into()),
                enabled: Some(false),
            }],
            ..Features::default()
        };
        let message = KEEPKEY.decode(MessageType::Features.code(), &features.encode_to_vec());
        let Message::Features(record) = message else {
            panic!("expected features, got {message:?}");
        };
        assert_eq!(record.revision.as_deref(), Some("abcd"));
        assert_eq!(record.policies.len(), 1);
        assert_eq!(record.model, None);

        let json: serde_json::Value =
            serde_json::from_str(&Message::Features(record).summary()).expect("json");
        assert_eq!(json["policies"][0]["policy_name"], "ShapeShift");
        assert!(json.get("model").is_none());
    }
}
