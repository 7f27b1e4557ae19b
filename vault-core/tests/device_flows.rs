//! Vault flows against a simulated device that implements CipherKeyValue with a reversible
//! keystream and asks for button confirmation where the request demands it.

use prost::Message as _;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use shared::device::DeviceProfile;
use shared::interaction::{InteractionController, ScriptedPrompter};
use shared::link::memory::{DeviceModel, Reply, SimulatedDevice, reply};
use shared::path::hardened;
use shared::schema::{MessageType, proto};
use shared::session::Session;
use shared::frame::Envelope;
use vault_core::{
    NewEntry, SecretString, VaultError, VaultStorage, derive_file_key, fetch_master_secret,
    open_vault, read_vault, seal_entry, unlock_entry, write_vault,
};

/// Encrypts and decrypts by XOR with a keystream derived from the prompt text.
#[derive(Default)]
struct VaultDevice {
    pending: Option<Vec<u8>>,
    confirmations: usize,
    requests: Vec<proto::CipherKeyValue>,
    refuse: bool,
}

fn keystream(key: &str, index: usize) -> u8 {
    let seed = key.bytes().fold(0u8, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte));
    seed.wrapping_add(index as u8).wrapping_mul(0x9D) ^ 0x5A
}

fn transform(request: &proto::CipherKeyValue) -> Vec<u8> {
    let key = request.key.clone().unwrap_or_default();
    request
        .value
        .clone()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, byte)| byte ^ keystream(&key, index))
        .collect()
}

fn ciphered(value: Vec<u8>) -> Reply {
    Reply::Envelope(reply(
        MessageType::CipheredKeyValue,
        &proto::CipheredKeyValue { value: Some(value) },
    ))
}

impl DeviceModel for VaultDevice {
    fn respond(&mut self, request: &Envelope) -> Vec<Reply> {
        if request.message_type == MessageType::ButtonAck.code() {
            self.confirmations += 1;
            return match self.pending.take() {
                Some(value) => vec![ciphered(value)],
                None => Vec::new(),
            };
        }
        if request.message_type != MessageType::CipherKeyValue.code() {
            return Vec::new();
        }

        let Ok(decoded) = proto::CipherKeyValue::decode(request.payload.as_slice()) else {
            return Vec::new();
        };
        if self.refuse {
            return vec![Reply::Envelope(reply(
                MessageType::Failure,
                &proto::Failure {
                    code: Some(4),
                    message: Some("Action cancelled by user".into()),
                },
            ))];
        }

        let value = transform(&decoded);
        let ask = if decoded.encrypt.unwrap_or(false) {
            decoded.ask_on_encrypt.unwrap_or(false)
        } else {
            decoded.ask_on_decrypt.unwrap_or(false)
        };
        self.requests.push(decoded);

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

type Controller = InteractionController<SimulatedDevice<VaultDevice>, ScriptedPrompter, ChaCha20Rng>;

fn controller(profile: DeviceProfile) -> Controller {
    let session = Session::new(SimulatedDevice::new(VaultDevice::default()), profile);
    InteractionController::with_rng(
        session,
        ScriptedPrompter::default(),
        ChaCha20Rng::from_seed([0xAA; 32]),
    )
}

fn device(controller: Controller) -> SimulatedDevice<VaultDevice> {
    controller.into_session().into_link()
}

#[test]
fn master_secret_scenario_names_vault_file() {
    let profile = DeviceProfile::trezor();
    let mut controller = controller(profile.clone());

    let keys = open_vault(&mut controller).expect("open");
    assert_eq!(controller.prompts(), 1);

    let device = device(controller);
    let request = &device.model().requests[0];
    assert_eq!(request.address_n, vec![hardened(10016), 0]);
    assert_eq!(request.key.as_deref(), Some("Activate TREZOR Password Manager?"));
    assert_eq!(request.encrypt, Some(true));
    assert_eq!(request.ask_on_encrypt, Some(true));
    assert_eq!(request.ask_on_decrypt, Some(true));
    assert_eq!(request.iv, None);
    assert_eq!(device.model().confirmations, 1);

    let expected_master = hex::encode(transform(request));
    let expected = derive_file_key(&expected_master).expect("derive");
    assert_eq!(keys.filename, expected.filename);
    assert_eq!(keys.enc_key(), expected.enc_key());
    assert_eq!(expected_master.len(), 128);
}

#[test]
fn master_secret_is_hex_of_ciphered_value() {
    let mut controller = controller(DeviceProfile::keepkey());
    let master = fetch_master_secret(&mut controller).expect("master");

    let device = device(controller);
    assert_eq!(master.as_str(), hex::encode(transform(&device.model().requests[0])));
}

#[test]
fn sealed_entry_unlocks_through_device() {
    let mut controller = controller(DeviceProfile::trezor());
    let mut rng = ChaCha20Rng::from_seed([0x17; 32]);

    let draft = NewEntry {
        title: "mail.example.com".into(),
        username: "alice".into(),
        note: "work account".into(),
        password: SecretString::from("correct \"horse\" battery"),
        safe_note: SecretString::from("recovery codes: 1234"),
        tags: vec![1],
    };
    let entry = seal_entry(&mut controller, &draft, &mut rng).expect("seal");
    assert_eq!(controller.prompts(), 0);
    assert_eq!(entry.nonce.len(), 64);
    assert_eq!(entry.password.kind, "Buffer");

    let unlocked = unlock_entry(&mut controller, &entry).expect("unlock");
    assert_eq!(controller.prompts(), 1);
    assert_eq!(unlocked.password.expose(), "correct \"horse\" battery");
    assert_eq!(unlocked.safe_note.expose(), "recovery codes: 1234");
    assert_eq!(unlocked.note, "work account");

    let device = device(controller);
    let requests = &device.model().requests;
    assert_eq!(requests[0].key.as_deref(), Some("Unlock mail.example.com for user alice?"));
    assert_eq!(requests[0].encrypt, Some(true));
    assert_eq!(requests[0].ask_on_encrypt, Some(false));
    assert_eq!(requests[1].encrypt, Some(false));
    assert_eq!(requests[1].value.as_ref().map(Vec::len), Some(32));
}

#[test]
fn refused_confirmation_is_reported() {
    let session = Session::new(
        SimulatedDevice::new(VaultDevice {
            refuse: true,
            ..VaultDevice::default()
        }),
        DeviceProfile::trezor(),
    );
    let mut controller = InteractionController::with_rng(
        session,
        ScriptedPrompter::default(),
        ChaCha20Rng::from_seed([0xAA; 32]),
    );

    let err = open_vault(&mut controller).expect_err("refused");
    assert!(matches!(err, VaultError::Refused(message) if message == "Action cancelled by user"));
}

#[test]
fn vault_written_with_device_keys_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut controller = controller(DeviceProfile::trezor());
    let keys = open_vault(&mut controller).expect("open");

    let mut storage = VaultStorage {
        version: "0.0.1".into(),
        ..VaultStorage::default()
    };
    let draft = NewEntry {
        title: "bank".into(),
        username: "bob".into(),
        password: SecretString::from("pin-0000"),
        ..NewEntry::default()
    };
    let mut rng = ChaCha20Rng::from_seed([0x01; 32]);
    let entry = seal_entry(&mut controller, &draft, &mut rng).expect("seal");
    storage.entries.insert("0".into(), entry);

    write_vault(dir.path(), &keys, &storage).expect("write");
    let restored = read_vault(dir.path(), &keys).expect("read");
    assert_eq!(restored, storage);

    let unlocked = unlock_entry(&mut controller, &restored.entries["0"]).expect("unlock");
    assert_eq!(unlocked.password.expose(), "pin-0000");
    assert_eq!(unlocked.safe_note.expose(), "");
}
