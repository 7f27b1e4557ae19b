//! Drives the device's interactive prompts until a terminal message arrives.
//!
//! Every device request may be answered by a prompt (PIN matrix, passphrase, button,
//! recovery word, host entropy) that demands exactly one follow-up request. The controller
//! walks those prompts as an explicit state machine. There is no bound on the number of
//! round trips.

use log::debug;
use rand_core::{CryptoRng, OsRng, RngCore};

use crate::error::SharedError;
use crate::link::Link;
use crate::schema::{Message, PinMatrixKind, Request};
use crate::session::{Response, Session};

/// Bytes of host entropy supplied in answer to an entropy request.
pub const HOST_ENTROPY_SIZE: usize = 32;

/// Source of user answers for the device's prompts.
pub trait Prompter {
    /// PIN as positions on the scrambled matrix shown on the device.
    fn pin(&mut self, kind: PinMatrixKind) -> Result<String, SharedError>;

    /// Passphrase; an empty string is a valid answer.
    fn passphrase(&mut self) -> Result<String, SharedError>;

    /// One recovery word.
    fn word(&mut self) -> Result<String, SharedError>;

    /// Called when the device waits for a physical button press.
    fn confirm_on_device(&mut self, _code: Option<i32>) {}
}

impl<T> Prompter for &mut T
where
    T: Prompter + ?Sized,
{
    fn pin(&mut self, kind: PinMatrixKind) -> Result<String, SharedError> {
        (**self).pin(kind)
    }

    fn passphrase(&mut self) -> Result<String, SharedError> {
        (**self).passphrase()
    }

    fn word(&mut self) -> Result<String, SharedError> {
        (**self).word()
    }

    fn confirm_on_device(&mut self, code: Option<i32>) {
        (**self).confirm_on_device(code)
    }
}

/// Prompter for unattended use: empty passphrase, refuses PIN and word entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn pin(&mut self, _kind: PinMatrixKind) -> Result<String, SharedError> {
        Err(SharedError::Prompt(
            "device requires a PIN but no interactive prompter is available".into(),
        ))
    }

    fn passphrase(&mut self) -> Result<String, SharedError> {
        Ok(String::new())
    }

    fn word(&mut self) -> Result<String, SharedError> {
        Err(SharedError::Prompt(
            "device requires a recovery word but no interactive prompter is available".into(),
        ))
    }
}

/// Prompter answering from fixed queues, for tests and scripted runs.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    pub pins: std::collections::VecDeque<String>,
    pub passphrases: std::collections::VecDeque<String>,
    pub words: std::collections::VecDeque<String>,
    pub confirmations: usize,
    pub pin_kinds: Vec<PinMatrixKind>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedPrompter {
    pub fn with_pin(mut self, pin: &str) -> Self {
        self.pins.push_back(pin.to_owned());
        self
    }

    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrases.push_back(passphrase.to_owned());
        self
    }

    pub fn with_word(mut self, word: &str) -> Self {
        self.words.push_back(word.to_owned());
        self
    }
}

#[cfg(any(test, feature = "testing"))]
impl Prompter for ScriptedPrompter {
    fn pin(&mut self, kind: PinMatrixKind) -> Result<String, SharedError> {
        self.pin_kinds.push(kind);
        self.pins
            .pop_front()
            .ok_or_else(|| SharedError::Prompt("no scripted PIN left".into()))
    }

    fn passphrase(&mut self) -> Result<String, SharedError> {
        self.passphrases
            .pop_front()
            .ok_or_else(|| SharedError::Prompt("no scripted passphrase left".into()))
    }

    fn word(&mut self) -> Result<String, SharedError> {
        self.words
            .pop_front()
            .ok_or_else(|| SharedError::Prompt("no scripted word left".into()))
    }

    fn confirm_on_device(&mut self, _code: Option<i32>) {
        self.confirmations += 1;
    }
}

#[derive(Debug)]
enum State {
    Send(Request),
    PinMatrix(PinMatrixKind),
    Passphrase,
    Word,
    Button(Option<i32>),
    Entropy,
    Finished(Response),
}

pub struct InteractionController<L, P, R = OsRng> {
    session: Session<L>,
    prompter: P,
    rng: R,
    prompts: usize,
}

impl<L, P> InteractionController<L, P, OsRng>
where
    L: Link,
    P: Prompter,
{
    pub fn new(session: Session<L>, prompter: P) -> Self {
        Self::with_rng(session, prompter, OsRng)
    }
}

impl<L, P, R> InteractionController<L, P, R>
where
    L: Link,
    P: Prompter,
    R: RngCore + CryptoRng,
{
    pub fn with_rng(session: Session<L>, prompter: P, rng: R) -> Self {
        Self {
            session,
            prompter,
            rng,
            prompts: 0,
        }
    }

    pub fn session(&self) -> &Session<L> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<L> {
        &mut self.session
    }

    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    pub fn into_session(self) -> Session<L> {
        self.session
    }

    /// Prompts answered during the most recent [`run`](Self::run).
    pub fn prompts(&self) -> usize {
        self.prompts
    }

    /// Send `request` and answer prompts until the device replies with a terminal message.
    ///
    /// `Failure` is terminal and returned like any other result. Link errors end the run
    /// immediately.
    pub fn run(&mut self, request: Request) -> Result<Response, SharedError> {
        self.prompts = 0;
        let mut state = State::Send(request);

        loop {
            state = match state {
                State::Send(mut request) => {
                    let result = self.session.call(&request);
                    request.scrub();
                    classify(result?)?
                }
                State::PinMatrix(kind) => {
                    debug!("device requested PIN ({kind:?})");
                    let pin = self.prompter.pin(kind)?;
                    self.answered(Request::PinMatrixAck { pin })
                }
                State::Passphrase => {
                    debug!("device requested passphrase");
                    let passphrase = self.prompter.passphrase()?;
                    self.answered(Request::PassphraseAck { passphrase })
                }
                State::Word => {
                    debug!("device requested recovery word");
                    let word = self.prompter.word()?;
                    self.answered(Request::WordAck { word })
                }
                State::Button(code) => {
                    debug!("device waits for button confirmation (code {code:?})");
                    self.prompter.confirm_on_device(code);
                    self.answered(Request::ButtonAck)
                }
                State::Entropy => {
                    let mut entropy = vec![0u8; HOST_ENTROPY_SIZE];
                    self.rng
                        .try_fill_bytes(&mut entropy)
                        .map_err(|err| SharedError::Entropy(err.to_string()))?;
                    debug!("supplying {HOST_ENTROPY_SIZE} bytes of host entropy");
                    self.answered(Request::EntropyAck { entropy })
                }
                State::Finished(response) => return Ok(response),
            };
        }
    }

    /// Like [`run`](Self::run) but returns only the terminal message.
    pub fn call(&mut self, request: Request) -> Result<Message, SharedError> {
        self.run(request).map(|response| response.message)
    }

    fn answered(&mut self, request: Request) -> State {
        self.prompts += 1;
        State::Send(request)
    }
}

fn classify(response: Response) -> Result<State, SharedError> {
    let next = match &response.message {
        Message::PinMatrixRequest(kind) => State::PinMatrix(*kind),
        Message::PassphraseRequest => State::Passphrase,
        Message::WordRequest => State::Word,
        Message::ButtonRequest { code, .. } => State::Button(*code),
        Message::EntropyRequest => State::Entropy,
        Message::Malformed {
            message_type,
            reason,
        } => {
            return Err(SharedError::Decode {
                message_type: *message_type,
                reason: reason.clone(),
            });
        }
        _ => State::Finished(response),
    };
    Ok(next)
}
