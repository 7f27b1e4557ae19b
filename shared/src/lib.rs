//! Host-side protocol stack for PIN-protected signing tokens.
//!
//! Layers, leaves first:
//!
//! - [`path`] parses and formats hierarchical derivation paths (`m/10016'/0`).
//! - [`link`] is the contract with the physical 64-byte report channel.
//! - [`frame`] splits envelopes into reports and reassembles them.
//! - [`schema`] maps message type codes to typed requests and responses per device family.
//! - [`session`] sends one request and reads one decoded response.
//! - [`interaction`] drives PIN, passphrase, button, word and entropy prompts to a final result.

pub mod device;
pub mod error;
pub mod frame;
pub mod interaction;
pub mod link;
pub mod path;
pub mod schema;
pub mod session;

pub use device::{DeviceFamily, DeviceProfile};
pub use error::SharedError;
pub use interaction::{InteractionController, NonInteractive, Prompter};
pub use link::{Link, LinkError};
pub use path::Path;
pub use schema::{Message, MessageType, Request};
pub use session::{Response, Session};
