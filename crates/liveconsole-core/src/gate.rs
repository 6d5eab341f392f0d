//! Credential gate.
//!
//! Decides between the live session view and the "no credential"
//! placeholder, and owns the open/closed state of the settings surface.
//!
//! The auto-open rule lives in [`CredentialGate::evaluate`] and runs once per
//! event cycle: while no credential is stored the surface is forced open, so
//! closing it without submitting a key only lasts until the next cycle. The
//! user cannot get past the gate without supplying a credential.

use serde::Serialize;

use crate::credential::{CREDENTIAL_KEY, Credential};
use crate::errors::ConsoleError;
use crate::store::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NoCredential,
    HasCredential,
}

impl GateState {
    pub fn of(credential: Option<&Credential>) -> Self {
        match credential {
            Some(_) => Self::HasCredential,
            None => Self::NoCredential,
        }
    }
}

/// Which of the two mutually exclusive top-level views is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    Session,
    Placeholder,
}

/// Indicator drawn on the settings button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBadge {
    Configured,
    Missing,
}

pub struct CredentialGate<S> {
    store: S,
    modal_open: bool,
}

impl<S: CredentialStore> CredentialGate<S> {
    /// The surface starts closed; the first [`evaluate`](Self::evaluate)
    /// opens it if the store is empty.
    pub fn new(store: S) -> Self {
        Self {
            store,
            modal_open: false,
        }
    }

    /// Read the persisted credential. An unreadable store counts as empty.
    pub fn current_credential(&self) -> Option<Credential> {
        match self.store.get(CREDENTIAL_KEY) {
            Ok(value) => Credential::from_stored(value),
            Err(e) => {
                tracing::warn!("credential store unreadable, treating as empty: {e}");
                None
            }
        }
    }

    pub fn state(&self) -> GateState {
        GateState::of(self.current_credential().as_ref())
    }

    pub fn active_view(&self) -> ActiveView {
        match self.state() {
            GateState::HasCredential => ActiveView::Session,
            GateState::NoCredential => ActiveView::Placeholder,
        }
    }

    pub fn badge(&self) -> CredentialBadge {
        match self.state() {
            GateState::HasCredential => CredentialBadge::Configured,
            GateState::NoCredential => CredentialBadge::Missing,
        }
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    /// Persist `token` as the credential and close the surface.
    ///
    /// The token is stored as entered. An empty token clears the slot, which
    /// sends the gate back to the placeholder on the next evaluation. If the
    /// write fails the surface stays open.
    pub fn submit(&mut self, token: &str) -> Result<(), ConsoleError> {
        let value = Credential::new(token);
        self.store
            .set(CREDENTIAL_KEY, value.as_ref().map(Credential::expose))?;
        tracing::info!(present = value.is_some(), "credential submitted");
        self.modal_open = false;
        Ok(())
    }

    pub fn request_open(&mut self) {
        if !self.modal_open {
            tracing::debug!("settings surface opened on request");
        }
        self.modal_open = true;
    }

    /// Does not touch the credential.
    pub fn request_close(&mut self) {
        if self.modal_open {
            tracing::debug!("settings surface closed on request");
        }
        self.modal_open = false;
    }

    /// Apply the per-cycle transition rule and return the credential it saw.
    pub fn evaluate(&mut self) -> Option<Credential> {
        let credential = self.current_credential();
        if credential.is_none() && !self.modal_open {
            tracing::info!("no credential stored, forcing settings surface open");
            self.modal_open = true;
        }
        credential
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, ConsoleError> {
            Err(ConsoleError::Store("disk on fire".into()))
        }

        fn set(&self, _key: &str, _value: Option<&str>) -> Result<(), ConsoleError> {
            Err(ConsoleError::Store("disk on fire".into()))
        }
    }

    #[test]
    fn no_stored_credential_blocks_and_opens() {
        let mut gate = CredentialGate::new(MemoryStore::new());
        assert_eq!(gate.evaluate(), None);
        assert_eq!(gate.active_view(), ActiveView::Placeholder);
        assert_eq!(gate.badge(), CredentialBadge::Missing);
        assert!(gate.is_modal_open());
    }

    #[test]
    fn stored_credential_selects_session_without_modal() {
        let mut gate = CredentialGate::new(MemoryStore::with_entry(CREDENTIAL_KEY, "abc"));
        assert_eq!(gate.evaluate().unwrap().expose(), "abc");
        assert_eq!(gate.active_view(), ActiveView::Session);
        assert_eq!(gate.badge(), CredentialBadge::Configured);
        assert!(!gate.is_modal_open());
    }

    #[test]
    fn stored_empty_string_is_absent() {
        let gate = CredentialGate::new(MemoryStore::with_entry(CREDENTIAL_KEY, ""));
        assert_eq!(gate.state(), GateState::NoCredential);
        assert_eq!(gate.active_view(), ActiveView::Placeholder);
    }

    #[test]
    fn submit_stores_and_closes() {
        let store = MemoryStore::new();
        let mut gate = CredentialGate::new(store.clone());
        gate.evaluate();
        gate.submit("sk-test-123").unwrap();
        gate.evaluate();

        assert_eq!(gate.current_credential().unwrap().expose(), "sk-test-123");
        assert_eq!(store.get(CREDENTIAL_KEY).unwrap().as_deref(), Some("sk-test-123"));
        assert!(!gate.is_modal_open());
        assert_eq!(gate.active_view(), ActiveView::Session);
    }

    #[test]
    fn submit_does_not_validate_format() {
        let mut gate = CredentialGate::new(MemoryStore::new());
        gate.submit("definitely not a key").unwrap();
        assert_eq!(gate.active_view(), ActiveView::Session);
    }

    #[test]
    fn submit_empty_reopens_on_next_cycle() {
        let mut gate = CredentialGate::new(MemoryStore::with_entry(CREDENTIAL_KEY, "old"));
        gate.submit("").unwrap();
        assert!(!gate.is_modal_open());
        gate.evaluate();
        assert_eq!(gate.active_view(), ActiveView::Placeholder);
        assert!(gate.is_modal_open());
    }

    #[test]
    fn request_open_is_idempotent() {
        let mut gate = CredentialGate::new(MemoryStore::with_entry(CREDENTIAL_KEY, "abc"));
        gate.request_open();
        gate.request_open();
        assert!(gate.is_modal_open());
    }

    #[test]
    fn open_then_close_with_credential_keeps_session() {
        let mut gate = CredentialGate::new(MemoryStore::with_entry(CREDENTIAL_KEY, "abc"));
        gate.evaluate();
        gate.request_open();
        gate.evaluate();
        gate.request_close();
        gate.evaluate();
        assert!(!gate.is_modal_open());
        assert_eq!(gate.current_credential().unwrap().expose(), "abc");
        assert_eq!(gate.active_view(), ActiveView::Session);
    }

    #[test]
    fn close_without_credential_is_overridden_next_cycle() {
        let mut gate = CredentialGate::new(MemoryStore::new());
        gate.evaluate();
        gate.request_close();
        assert!(!gate.is_modal_open());
        gate.evaluate();
        assert!(gate.is_modal_open());
    }

    #[test]
    fn unreadable_store_counts_as_empty() {
        let mut gate = CredentialGate::new(BrokenStore);
        assert_eq!(gate.evaluate(), None);
        assert!(gate.is_modal_open());
    }

    #[test]
    fn failed_submit_keeps_surface_open() {
        let mut gate = CredentialGate::new(BrokenStore);
        gate.evaluate();
        assert!(gate.submit("abc").is_err());
        assert!(gate.is_modal_open());
    }

    #[test]
    fn external_clear_returns_to_placeholder() {
        let store = MemoryStore::with_entry(CREDENTIAL_KEY, "abc");
        let mut gate = CredentialGate::new(store.clone());
        gate.evaluate();
        store.set(CREDENTIAL_KEY, None).unwrap();
        assert_eq!(gate.evaluate(), None);
        assert_eq!(gate.active_view(), ActiveView::Placeholder);
        assert!(gate.is_modal_open());
    }
}
