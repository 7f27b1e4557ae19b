use std::io::{self, BufRead, StdinLock, Stdout, Write};

use log::debug;
use shared::schema::PinMatrixKind;
use shared::{Prompter, SharedError};
use zeroize::Zeroizing;

/// Layout of the scrambled matrix; the device shows which digit sits at each position.
const PIN_MATRIX_HELP: &str = "\
Use the numeric keypad layout to describe number positions. The device shows the scrambled digits.
    7 8 9
    4 5 6
    1 2 3";

/// Prompter reading answers line by line from a terminal.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R, W> TerminalPrompter<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<Zeroizing<String>, SharedError> {
        write!(self.output, "{question} ").map_err(prompt_error)?;
        self.output.flush().map_err(prompt_error)?;

        let mut line = Zeroizing::new(String::new());
        let read = self.input.read_line(&mut line).map_err(prompt_error)?;
        if read == 0 {
            return Err(SharedError::Prompt("input closed".into()));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

fn prompt_error(err: io::Error) -> SharedError {
    SharedError::Prompt(err.to_string())
}

/// Matrix positions are the digits 1 through 9.
fn is_matrix_pin(pin: &str) -> bool {
    !pin.is_empty() && pin.bytes().all(|byte| (b'1'..=b'9').contains(&byte))
}

impl<R, W> Prompter for TerminalPrompter<R, W>
where
    R: BufRead,
    W: Write,
{
    fn pin(&mut self, kind: PinMatrixKind) -> Result<String, SharedError> {
        writeln!(self.output, "{PIN_MATRIX_HELP}").map_err(prompt_error)?;
        let pin = self.ask(kind.prompt())?;
        let pin = pin.trim();
        if !is_matrix_pin(pin) {
            return Err(SharedError::Prompt(
                "PIN must consist of matrix positions 1-9".into(),
            ));
        }
        Ok(pin.to_owned())
    }

    fn passphrase(&mut self) -> Result<String, SharedError> {
        Ok(self.ask("Passphrase required:")?.to_string())
    }

    fn word(&mut self) -> Result<String, SharedError> {
        let word = self.ask("Enter one word of mnemonic:")?;
        Ok(word.trim().to_ascii_lowercase())
    }

    fn confirm_on_device(&mut self, _code: Option<i32>) {
        if let Err(err) = writeln!(self.output, "Please confirm the action on your device.") {
            debug!("failed to show confirmation hint: {err}");
        }
    }
}
