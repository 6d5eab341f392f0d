//! Live console core logic.
//!
//! Credential gating, the settings surface state, session lifecycle and
//! video visibility. Pure Rust, no UI dependencies; native shells drive it
//! through [`ConsoleHandle`] and listen for [`ViewEvent`]s.

pub mod config;
pub mod console;
pub mod credential;
pub mod errors;
pub mod events;
pub mod gate;
pub mod session;
pub mod settings_form;
pub mod store;
pub mod visibility;

pub use config::{Config, StoreBackend};
pub use console::{Console, ConsoleHandle, channel};
pub use credential::{CREDENTIAL_KEY, Credential};
pub use errors::ConsoleError;
pub use events::{ConsoleEvent, StreamRef, StreamSource, ViewEvent, ViewListener};
pub use gate::{ActiveView, CredentialBadge, CredentialGate, GateState};
pub use session::{SessionConnector, SessionSlot, SessionTransport, SlotChange};
pub use settings_form::SettingsForm;
pub use store::{CredentialStore, FileStore, MemoryStore};
pub use visibility::{StreamVisibility, is_visible};

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub use store::KeyringStore;
