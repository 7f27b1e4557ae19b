//! Encoders and decoders whose field layout is identical on both families.

use prost::{DecodeError, Message as ProstMessage};

use super::proto;
use super::{
    Identity, Message, NodeRecord, PinMatrixKind, PublicKeyRecord, Request, SchemaError,
    SignatureRecord, SignedIdentityRecord,
};

pub(crate) fn encode(request: &Request, family: &'static str) -> Result<Vec<u8>, SchemaError> {
    let bytes = match request {
        Request::Initialize => proto::Initialize {}.encode_to_vec(),
        Request::GetFeatures => proto::GetFeatures {}.encode_to_vec(),
        Request::Ping {
            message,
            button_protection,
            pin_protection,
            passphrase_protection,
        } => proto::Ping {
            message: Some(message.clone()),
            button_protection: Some(*button_protection),
            pin_protection: Some(*pin_protection),
            passphrase_protection: Some(*passphrase_protection),
        }
        .encode_to_vec(),
        Request::ChangePin { remove } => proto::ChangePin {
            remove: Some(*remove),
        }
        .encode_to_vec(),
        Request::WipeDevice => proto::WipeDevice {}.encode_to_vec(),
        Request::ClearSession => proto::ClearSession {}.encode_to_vec(),
        Request::Cancel => proto::Cancel {}.encode_to_vec(),
        Request::GetEntropy { size } => proto::GetEntropy { size: Some(*size) }.encode_to_vec(),
        Request::GetPublicKey {
            path,
            ecdsa_curve_name,
            coin_name,
            show_display,
        } => proto::GetPublicKey {
            address_n: path.indices().to_vec(),
            ecdsa_curve_name: ecdsa_curve_name.clone(),
            show_display: Some(*show_display),
            coin_name: coin_name.clone(),
        }
        .encode_to_vec(),
        Request::GetAddress {
            path,
            coin_name,
            show_display,
        } => proto::GetAddress {
            address_n: path.indices().to_vec(),
            coin_name: coin_name.clone(),
            show_display: Some(*show_display),
        }
        .encode_to_vec(),
        Request::SignMessage {
            path,
            message,
            coin_name,
        } => proto::SignMessage {
            address_n: path.indices().to_vec(),
            message: Some(message.clone()),
            coin_name: coin_name.clone(),
        }
        .encode_to_vec(),
        Request::VerifyMessage {
            address,
            signature,
            message,
            coin_name,
        } => proto::VerifyMessage {
            address: Some(address.clone()),
            signature: Some(signature.clone()),
            message: Some(message.clone()),
            coin_name: coin_name.clone(),
        }
        .encode_to_vec(),
        Request::SignIdentity {
            identity,
            challenge_hidden,
            challenge_visual,
            ecdsa_curve_name,
        } => proto::SignIdentity {
            identity: Some(identity_proto(identity)),
            challenge_hidden: Some(challenge_hidden.clone()),
            challenge_visual: Some(challenge_visual.clone()),
            ecdsa_curve_name: ecdsa_curve_name.clone(),
        }
        .encode_to_vec(),
        Request::GetEcdhSessionKey {
            identity,
            peer_public_key,
            ecdsa_curve_name,
        } => proto::GetEcdhSessionKey {
            identity: Some(identity_proto(identity)),
            peer_public_key: Some(peer_public_key.clone()),
            ecdsa_curve_name: ecdsa_curve_name.clone(),
        }
        .encode_to_vec(),
        Request::EstimateTxSize {
            outputs_count,
            inputs_count,
            coin_name,
        } => proto::EstimateTxSize {
            outputs_count: Some(*outputs_count),
            inputs_count: Some(*inputs_count),
            coin_name: coin_name.clone(),
        }
        .encode_to_vec(),
        Request::CipherKeyValue {
            path,
            key,
            value,
            encrypt,
            ask_on_encrypt,
            ask_on_decrypt,
            iv,
        } => proto::CipherKeyValue {
            address_n: path.indices().to_vec(),
            key: Some(key.clone()),
            value: Some(value.clone()),
            encrypt: Some(*encrypt),
            ask_on_encrypt: Some(*ask_on_encrypt),
            ask_on_decrypt: Some(*ask_on_decrypt),
            iv: iv.clone().filter(|iv| !iv.is_empty()),
        }
        .encode_to_vec(),
        Request::PinMatrixAck { pin } => proto::PinMatrixAck {
            pin: Some(pin.clone()),
        }
        .encode_to_vec(),
        Request::PassphraseAck { passphrase } => proto::PassphraseAck {
            passphrase: Some(passphrase.clone()),
        }
        .encode_to_vec(),
        Request::ButtonAck => proto::ButtonAck {}.encode_to_vec(),
        Request::WordAck { word } => proto::WordAck {
            word: Some(word.clone()),
        }
        .encode_to_vec(),
        Request::EntropyAck { entropy } => proto::EntropyAck {
            entropy: Some(entropy.clone()),
        }
        .encode_to_vec(),
        Request::ApplySettings(_) => return Err(unsupported("ApplySettings", family)),
        Request::ResetDevice(_) => return Err(unsupported("ResetDevice", family)),
        Request::RecoveryDevice(_) => return Err(unsupported("RecoveryDevice", family)),
    };
    Ok(bytes)
}

fn unsupported(request: &'static str, family: &'static str) -> SchemaError {
    SchemaError::Unsupported {
        request,
        field: "layout",
        family,
    }
}

fn identity_proto(identity: &Identity) -> proto::Identity {
    proto::Identity {
        proto: Some(identity.proto.clone()),
        user: Some(identity.user.clone()),
        host: Some(identity.host.clone()),
        port: Some(identity.port.clone()),
        path: Some(identity.path.clone()),
        index: Some(identity.index),
    }
}

pub(crate) fn hex_field(bytes: Option<Vec<u8>>) -> Option<String> {
    bytes.map(hex::encode)
}

pub(crate) fn decode_success(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::Success::decode(bytes)?;
    Ok(Message::Success(message.message.unwrap_or_default()))
}

pub(crate) fn decode_failure(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::Failure::decode(bytes)?;
    Ok(Message::Failure {
        code: message.code,
        message: message.message.unwrap_or_default(),
    })
}

pub(crate) fn decode_entropy(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::Entropy::decode(bytes)?;
    Ok(Message::Entropy(message.entropy.unwrap_or_default()))
}

pub(crate) fn decode_public_key(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::PublicKey::decode(bytes)?;
    let node = message.node.map(|node| NodeRecord {
        depth: node.depth,
        fingerprint: node.fingerprint,
        child_num: node.child_num,
        chain_code: hex_field(node.chain_code),
        public_key: hex_field(node.public_key),
    });
    Ok(Message::PublicKey(PublicKeyRecord {
        node,
        xpub: message.xpub,
    }))
}

pub(crate) fn decode_address(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::Address::decode(bytes)?;
    Ok(Message::Address(message.address.unwrap_or_default()))
}

pub(crate) fn decode_ciphered_key_value(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::CipheredKeyValue::decode(bytes)?;
    Ok(Message::CipheredKeyValue(message.value.unwrap_or_default()))
}

pub(crate) fn decode_message_signature(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::MessageSignature::decode(bytes)?;
    Ok(Message::MessageSignature(SignatureRecord {
        address: message.address,
        signature: hex_field(message.signature),
    }))
}

pub(crate) fn decode_signed_identity(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::SignedIdentity::decode(bytes)?;
    Ok(Message::SignedIdentity(SignedIdentityRecord {
        address: message.address,
        public_key: hex_field(message.public_key),
        signature: hex_field(message.signature),
    }))
}

pub(crate) fn decode_ecdh_session_key(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::EcdhSessionKey::decode(bytes)?;
    Ok(Message::EcdhSessionKey(message.session_key.unwrap_or_default()))
}

pub(crate) fn decode_tx_size(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::TxSize::decode(bytes)?;
    Ok(Message::TxSize(message.tx_size.unwrap_or_default()))
}

pub(crate) fn decode_pin_matrix_request(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::PinMatrixRequest::decode(bytes)?;
    Ok(Message::PinMatrixRequest(PinMatrixKind::from_code(
        message.r#type,
    )))
}

pub(crate) fn decode_passphrase_request(bytes: &[u8]) -> Result<Message, DecodeError> {
    proto::PassphraseRequest::decode(bytes)?;
    Ok(Message::PassphraseRequest)
}

pub(crate) fn decode_button_request(bytes: &[u8]) -> Result<Message, DecodeError> {
    let message = proto::ButtonRequest::decode(bytes)?;
    Ok(Message::ButtonRequest {
        code: message.code,
        data: message.data,
    })
}

pub(crate) fn decode_word_request(bytes: &[u8]) -> Result<Message, DecodeError> {
    proto::WordRequest::decode(bytes)?;
    Ok(Message::WordRequest)
}

pub(crate) fn decode_entropy_request(bytes: &[u8]) -> Result<Message, DecodeError> {
    proto::EntropyRequest::decode(bytes)?;
    Ok(Message::EntropyRequest)
}
