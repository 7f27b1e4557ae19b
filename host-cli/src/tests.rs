use std::cell::RefCell;
use std::path::Path;

use clap::Parser;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use shared::frame::Envelope;
use shared::interaction::ScriptedPrompter;
use shared::link::memory::{DeviceModel, Reply, Script, SimulatedDevice, reply};
use shared::schema::{MessageType, proto, trezor};
use shared::DeviceProfile;
use vault_core::{
    EncryptedField, Entry, Tag, VaultStorage, derive_file_key, encrypt_blob_with_rng,
    write_vault,
};

use crate::application::{self, LinkProvider};
use crate::error::CliError;
use crate::Cli;

/// Hands out a borrowed simulated device so the test can inspect it afterwards.
struct BorrowedDevice<'a, M> {
    device: RefCell<Option<&'a mut SimulatedDevice<M>>>,
}

impl<'a, M> BorrowedDevice<'a, M> {
    fn new(device: &'a mut SimulatedDevice<M>) -> Self {
        Self {
            device: RefCell::new(Some(device)),
        }
    }
}

impl<'a, M: DeviceModel> LinkProvider for BorrowedDevice<'a, M> {
    type Link = &'a mut SimulatedDevice<M>;

    fn connect(&self, _profile: &DeviceProfile) -> Result<Self::Link, CliError> {
        self.device
            .borrow_mut()
            .take()
            .ok_or_else(|| CliError::Connect("device already connected".into()))
    }
}

fn run<M: DeviceModel>(
    args: &[&str],
    device: &mut SimulatedDevice<M>,
    prompter: ScriptedPrompter,
) -> Result<String, CliError> {
    let cli = Cli::try_parse_from(std::iter::once("token-cli").chain(args.iter().copied()))
        .expect("arguments parse");
    let provider = BorrowedDevice::new(device);
    let mut out = Vec::new();
    application::execute(cli, &provider, prompter, &mut out)?;
    Ok(String::from_utf8(out).expect("utf8 output"))
}

fn sent_types<M: DeviceModel>(device: &SimulatedDevice<M>) -> Vec<u16> {
    device.requests().iter().map(|r| r.message_type).collect()
}

fn success(text: &str) -> Envelope {
    reply(
        MessageType::Success,
        &proto::Success {
            message: Some(text.into()),
        },
    )
}

#[test]
fn ping_with_button_prints_reply() {
    let mut device = SimulatedDevice::new(
        Script::new()
            .respond(reply(
                MessageType::ButtonRequest,
                &proto::ButtonRequest::default(),
            ))
            .respond(success("hello")),
    );

    let output = run(&["ping", "hello", "--button"], &mut device, ScriptedPrompter::default())
        .expect("ping");
    assert_eq!(output, "hello\n");
    assert_eq!(
        sent_types(&device),
        vec![MessageType::Ping.code(), MessageType::ButtonAck.code()]
    );
}

#[test]
fn features_print_as_json() {
    let features = trezor::Features {
        vendor: Some("bitcointrezor.com".into()),
        major_version: Some(1),
        label: Some("My TREZOR".into()),
        revision: Some(vec![0xde, 0xad]),
        ..trezor::Features::default()
    };
    let mut device =
        SimulatedDevice::new(Script::new().respond(reply(MessageType::Features, &features)));

    let output = run(&["features"], &mut device, ScriptedPrompter::default()).expect("features");
    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["label"], "My TREZOR");
    assert_eq!(value["major_version"], 1);
    assert_eq!(value["revision"], "dead");
}

#[test]
fn entropy_is_printed_as_hex() {
    let mut device = SimulatedDevice::new(Script::new().respond(reply(
        MessageType::Entropy,
        &proto::Entropy {
            entropy: Some(vec![0x01, 0xab, 0xff]),
        },
    )));

    let output = run(&["entropy", "--size", "3"], &mut device, ScriptedPrompter::default())
        .expect("entropy");
    assert_eq!(output, "01abff\n");
}

#[test]
fn pin_protected_address() {
    let mut device = SimulatedDevice::new(
        Script::new()
            .respond(reply(
                MessageType::PinMatrixRequest,
                &proto::PinMatrixRequest { r#type: Some(1) },
            ))
            .respond(reply(
                MessageType::Address,
                &proto::Address {
                    address: Some("1BoatSLRHtKNngkdXEeobR76b53LETtpyT".into()),
                },
            )),
    );

    let output = run(
        &["address", "--path", "m/44'/0'/0'/0/0"],
        &mut device,
        ScriptedPrompter::default().with_pin("1357"),
    )
    .expect("address");
    assert_eq!(output, "1BoatSLRHtKNngkdXEeobR76b53LETtpyT\n");
    assert_eq!(
        sent_types(&device),
        vec![MessageType::GetAddress.code(), MessageType::PinMatrixAck.code()]
    );
}

#[test]
fn invalid_path_never_reaches_device() {
    let mut device = SimulatedDevice::new(Script::new());
    let err = run(
        &["public-key", "--path", "m/44'/x"],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect_err("invalid path");
    assert!(matches!(err, CliError::InvalidPath(_)));
    assert!(device.requests().is_empty());
}

#[test]
fn device_failure_becomes_error() {
    let mut device = SimulatedDevice::new(Script::new().respond(reply(
        MessageType::Failure,
        &proto::Failure {
            code: Some(4),
            message: Some("Action cancelled by user".into()),
        },
    )));

    let err = run(&["set-label", "work"], &mut device, ScriptedPrompter::default())
        .expect_err("failure");
    assert!(matches!(
        err,
        CliError::Failure { code: Some(4), ref message } if message == "Action cancelled by user"
    ));
    assert_eq!(sent_types(&device), vec![MessageType::ApplySettings.code()]);
}

#[test]
fn sign_message_prints_signature() {
    use prost::Message as _;

    let mut device = SimulatedDevice::new(Script::new().respond(reply(
        MessageType::MessageSignature,
        &proto::MessageSignature {
            address: Some("1BoatSLRHtKNngkdXEeobR76b53LETtpyT".into()),
            signature: Some(vec![0x1f, 0x20]),
        },
    )));

    let output = run(
        &["sign-message", "--path", "m/44'/0'/0'/0/0", "hello"],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect("sign message");
    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["address"], "1BoatSLRHtKNngkdXEeobR76b53LETtpyT");
    assert_eq!(value["signature"], "1f20");

    let sent = proto::SignMessage::decode(device.requests()[0].payload.as_slice())
        .expect("sign message request");
    assert_eq!(sent.address_n.len(), 5);
    assert_eq!(sent.message.as_deref(), Some(b"hello".as_slice()));
    assert_eq!(sent.coin_name.as_deref(), Some("Bitcoin"));
}

#[test]
fn sign_identity_sends_parsed_uri() {
    use prost::Message as _;

    let mut device = SimulatedDevice::new(
        Script::new()
            .respond(reply(
                MessageType::ButtonRequest,
                &proto::ButtonRequest::default(),
            ))
            .respond(reply(
                MessageType::SignedIdentity,
                &proto::SignedIdentity {
                    address: Some("1Fx".into()),
                    public_key: Some(vec![0x02, 0x03]),
                    signature: Some(vec![0xaa]),
                },
            )),
    );

    let output = run(
        &[
            "sign-identity",
            "https://satoshi@bitcoin.org/login",
            "--challenge-hidden",
            "cafe",
            "--challenge-visual",
            "login",
        ],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect("sign identity");
    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["public_key"], "0203");
    assert_eq!(
        sent_types(&device),
        vec![MessageType::SignIdentity.code(), MessageType::ButtonAck.code()]
    );

    let sent = proto::SignIdentity::decode(device.requests()[0].payload.as_slice())
        .expect("sign identity request");
    let identity = sent.identity.expect("identity");
    assert_eq!(identity.user.as_deref(), Some("satoshi"));
    assert_eq!(identity.host.as_deref(), Some("bitcoin.org"));
    assert_eq!(identity.path.as_deref(), Some("/login"));
    assert_eq!(sent.challenge_hidden, Some(vec![0xca, 0xfe]));
}

#[test]
fn identity_without_scheme_never_reaches_device() {
    let mut device = SimulatedDevice::new(Script::new());
    let err = run(
        &["sign-identity", "bitcoin.org"],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect_err("missing scheme");
    assert!(matches!(err, CliError::InvalidIdentity(_)));
    assert!(device.requests().is_empty());
}

#[test]
fn unknown_device_is_reported_before_connecting() {
    let mut device = SimulatedDevice::new(Script::new());
    let err = run(
        &["--device", "ledger", "clear-session"],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect_err("unknown");
    assert!(matches!(err, CliError::UnknownDevice { .. }));
}

/// Device whose CipherKeyValue is XOR with a fixed byte, confirming when asked to.
#[derive(Default)]
struct XorVaultDevice {
    pending: Option<Vec<u8>>,
}

const XOR_KEY: u8 = 0x5A;

fn xor(value: &[u8]) -> Vec<u8> {
    value.iter().map(|byte| byte ^ XOR_KEY).collect()
}

impl DeviceModel for XorVaultDevice {
    fn respond(&mut self, request: &Envelope) -> Vec<Reply> {
        use prost::Message as _;

        let ciphered = |value: Vec<u8>| {
            Reply::Envelope(reply(
                MessageType::CipheredKeyValue,
                &proto::CipheredKeyValue { value: Some(value) },
            ))
        };
        if request.message_type == MessageType::ButtonAck.code() {
            return self.pending.take().map(ciphered).into_iter().collect();
        }
        let Ok(decoded) = proto::CipherKeyValue::decode(request.payload.as_slice()) else {
            return Vec::new();
        };
        let value = xor(&decoded.value.unwrap_or_default());
        let ask = if decoded.encrypt.unwrap_or(false) {
            decoded.ask_on_encrypt.unwrap_or(false)
        } else {
            decoded.ask_on_decrypt.unwrap_or(false)
        };
        if ask {
            self.pending = Some(value);
            vec![Reply::Envelope(reply(
                MessageType::ButtonRequest,
                &proto::ButtonRequest::default(),
            ))]
        } else {
            vec![ciphered(value)]
        }
    }
}

fn write_fixture_vault(dir: &Path) {
    let master_value = DeviceProfile::trezor().master_value().expect("master value");
    let keys = derive_file_key(&hex::encode(xor(&master_value))).expect("keys");

    let entry_key = [0x42u8; 32];
    let mut rng = ChaCha20Rng::from_seed([0xAA; 32]);
    let password = encrypt_blob_with_rng(br#""hunter2""#, &entry_key, &mut rng).expect("seal");

    let mut storage = VaultStorage {
        version: "0.0.1".into(),
        ..VaultStorage::default()
    };
    storage.tags.insert(
        "1".into(),
        Tag {
            title: "Email".into(),
            icon: "mail".into(),
            active: String::new(),
        },
    );
    storage.entries.insert(
        "7".into(),
        Entry {
            title: "mail.example.com".into(),
            username: "alice".into(),
            nonce: hex::encode(xor(&entry_key)),
            note: "personal".into(),
            password: EncryptedField::new(password),
            safe_note: EncryptedField::default(),
            tags: vec![1],
        },
    );
    write_vault(dir, &keys, &storage).expect("write vault");
}

#[test]
fn vault_list_prints_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture_vault(dir.path());
    let dir_arg = dir.path().to_string_lossy().into_owned();

    let mut device = SimulatedDevice::new(XorVaultDevice::default());
    let output = run(
        &["vault", "list", "--dir", &dir_arg],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect("list");
    assert_eq!(output, "7\tmail.example.com\talice\tpersonal\t[Email]\n");
    assert_eq!(
        sent_types(&device),
        vec![MessageType::CipherKeyValue.code(), MessageType::ButtonAck.code()]
    );
}

#[test]
fn vault_show_unlocks_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture_vault(dir.path());
    let dir_arg = dir.path().to_string_lossy().into_owned();

    let mut device = SimulatedDevice::new(XorVaultDevice::default());
    let output = run(
        &["vault", "show", "--dir", &dir_arg, "--id", "7"],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect("show");
    assert!(output.contains("password:  hunter2\n"));
    assert!(output.contains("safe note: \n"));
    assert!(output.contains("tags:      Email\n"));
    assert_eq!(device.requests().len(), 4);
}

#[test]
fn vault_show_unknown_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture_vault(dir.path());
    let dir_arg = dir.path().to_string_lossy().into_owned();

    let mut device = SimulatedDevice::new(XorVaultDevice::default());
    let err = run(
        &["vault", "show", "--dir", &dir_arg, "--id", "99"],
        &mut device,
        ScriptedPrompter::default(),
    )
    .expect_err("missing entry");
    assert!(err.to_string().contains("99"));
}
