//! Wire records shared by both device families.
//!
//! Field tags follow the devices' proto2 definitions; every scalar is `optional` so that
//! defaults are transmitted explicitly.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct Initialize {}

#[derive(Clone, PartialEq, Message)]
pub struct GetFeatures {}

#[derive(Clone, PartialEq, Message)]
pub struct Ping {
    #[prost(string, optional, tag = "1")]
    pub message: Option<String>,
    #[prost(bool, optional, tag = "2")]
    pub button_protection: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub pin_protection: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    pub passphrase_protection: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Success {
    #[prost(string, optional, tag = "1")]
    pub message: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Failure {
    #[prost(int32, optional, tag = "1")]
    pub code: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub message: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChangePin {
    #[prost(bool, optional, tag = "1")]
    pub remove: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WipeDevice {}

#[derive(Clone, PartialEq, Message)]
pub struct ClearSession {}

#[derive(Clone, PartialEq, Message)]
pub struct Cancel {}

#[derive(Clone, PartialEq, Message)]
pub struct GetEntropy {
    #[prost(uint32, optional, tag = "1")]
    pub size: Option<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Entropy {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub entropy: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HdNode {
    #[prost(uint32, optional, tag = "1")]
    pub depth: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub fingerprint: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub child_num: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub chain_code: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "5")]
    pub private_key: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "6")]
    pub public_key: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetPublicKey {
    #[prost(uint32, repeated, packed = "false", tag = "1")]
    pub address_n: Vec<u32>,
    #[prost(string, optional, tag = "2")]
    pub ecdsa_curve_name: Option<String>,
    #[prost(bool, optional, tag = "3")]
    pub show_display: Option<bool>,
    #[prost(string, optional, tag = "4")]
    pub coin_name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PublicKey {
    #[prost(message, optional, tag = "1")]
    pub node: Option<HdNode>,
    #[prost(string, optional, tag = "2")]
    pub xpub: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetAddress {
    #[prost(uint32, repeated, packed = "false", tag = "1")]
    pub address_n: Vec<u32>,
    #[prost(string, optional, tag = "2")]
    pub coin_name: Option<String>,
    #[prost(bool, optional, tag = "3")]
    pub show_display: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Address {
    #[prost(string, optional, tag = "1")]
    pub address: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignMessage {
    #[prost(uint32, repeated, packed = "false", tag = "1")]
    pub address_n: Vec<u32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub message: Option<Vec<u8>>,
    #[prost(string, optional, tag = "3")]
    pub coin_name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct VerifyMessage {
    #[prost(string, optional, tag = "1")]
    pub address: Option<String>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub signature: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub message: Option<Vec<u8>>,
    #[prost(string, optional, tag = "4")]
    pub coin_name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MessageSignature {
    #[prost(string, optional, tag = "1")]
    pub address: Option<String>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub signature: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Identity {
    #[prost(string, optional, tag = "1")]
    pub proto: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub user: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub host: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub port: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub path: Option<String>,
    #[prost(uint32, optional, tag = "6")]
    pub index: Option<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignIdentity {
    #[prost(message, optional, tag = "1")]
    pub identity: Option<Identity>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub challenge_hidden: Option<Vec<u8>>,
    #[prost(string, optional, tag = "3")]
    pub challenge_visual: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub ecdsa_curve_name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignedIdentity {
    #[prost(string, optional, tag = "1")]
    pub address: Option<String>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub public_key: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub signature: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetEcdhSessionKey {
    #[prost(message, optional, tag = "1")]
    pub identity: Option<Identity>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub peer_public_key: Option<Vec<u8>>,
    #[prost(string, optional, tag = "3")]
    pub ecdsa_curve_name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EcdhSessionKey {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub session_key: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EstimateTxSize {
    #[prost(uint32, optional, tag = "1")]
    pub outputs_count: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub inputs_count: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub coin_name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TxSize {
    #[prost(uint32, optional, tag = "1")]
    pub tx_size: Option<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CipherKeyValue {
    #[prost(uint32, repeated, packed = "false", tag = "1")]
    pub address_n: Vec<u32>,
    #[prost(string, optional, tag = "2")]
    pub key: Option<String>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub value: Option<Vec<u8>>,
    #[prost(bool, optional, tag = "4")]
    pub encrypt: Option<bool>,
    #[prost(bool, optional, tag = "5")]
    pub ask_on_encrypt: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub ask_on_decrypt: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub iv: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CipheredKeyValue {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub value: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PinMatrixRequest {
    #[prost(int32, optional, tag = "1")]
    pub r#type: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PinMatrixAck {
    #[prost(string, optional, tag = "1")]
    pub pin: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PassphraseRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct PassphraseAck {
    #[prost(string, optional, tag = "1")]
    pub passphrase: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ButtonRequest {
    #[prost(int32, optional, tag = "1")]
    pub code: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub data: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ButtonAck {}

#[derive(Clone, PartialEq, Message)]
pub struct WordRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct WordAck {
    #[prost(string, optional, tag = "1")]
    pub word: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EntropyRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct EntropyAck {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub entropy: Option<Vec<u8>>,
}
