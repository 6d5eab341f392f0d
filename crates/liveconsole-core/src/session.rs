//! Live session lifecycle.
//!
//! The transport itself is external. The slot only decides when one exists:
//! there is a session exactly while the gate holds a credential, and a
//! changed credential replaces it.

use url::Url;
use uuid::Uuid;

use crate::credential::Credential;
use crate::errors::ConsoleError;

/// A connected (or connecting) bidirectional session.
///
/// Protocol errors are the transport's to report; the slot only closes it.
pub trait SessionTransport: Send {
    fn close(&mut self);
}

/// Builds transports for the slot.
pub trait SessionConnector: Send {
    fn connect(
        &mut self,
        endpoint: &Url,
        credential: &Credential,
    ) -> Result<Box<dyn SessionTransport>, ConsoleError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    Unchanged,
    Opened(Uuid),
    Replaced { closed: Uuid, opened: Uuid },
    Closed(Uuid),
}

struct ActiveSession {
    id: Uuid,
    credential: Credential,
    transport: Box<dyn SessionTransport>,
}

pub struct SessionSlot<C> {
    connector: C,
    active: Option<ActiveSession>,
    /// Credential whose last connect attempt failed. Not retried until a new
    /// submission clears it.
    failed: Option<Credential>,
}

impl<C: SessionConnector> SessionSlot<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            active: None,
            failed: None,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|s| s.id)
    }

    pub fn clear_failure(&mut self) {
        self.failed = None;
    }

    /// Bring the slot in line with the gate's current credential.
    pub fn sync(
        &mut self,
        endpoint: &Url,
        credential: Option<&Credential>,
    ) -> Result<SlotChange, ConsoleError> {
        let Some(credential) = credential else {
            self.failed = None;
            return Ok(self.close().map_or(SlotChange::Unchanged, SlotChange::Closed));
        };

        if self.active.as_ref().is_some_and(|s| &s.credential == credential) {
            return Ok(SlotChange::Unchanged);
        }
        if self.failed.as_ref() == Some(credential) {
            return Ok(self.close().map_or(SlotChange::Unchanged, SlotChange::Closed));
        }

        let closed = self.close();
        let transport = match self.connector.connect(endpoint, credential) {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("session connect failed: {e}");
                self.failed = Some(credential.clone());
                return Err(e);
            }
        };

        let id = Uuid::new_v4();
        tracing::info!(%id, %endpoint, "session opened");
        self.active = Some(ActiveSession {
            id,
            credential: credential.clone(),
            transport,
        });
        Ok(match closed {
            Some(closed) => SlotChange::Replaced { closed, opened: id },
            None => SlotChange::Opened(id),
        })
    }

    /// Tear down the current session, if any.
    pub fn close(&mut self) -> Option<Uuid> {
        let mut session = self.active.take()?;
        session.transport.close();
        tracing::info!(id = %session.id, "session closed");
        Some(session.id)
    }
}

impl<C> Drop for SessionSlot<C> {
    fn drop(&mut self) {
        if let Some(session) = self.active.as_mut() {
            session.transport.close();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingConnector;
    use super::*;

    fn endpoint() -> Url {
        Url::parse("wss://live.example.com/ws").unwrap()
    }

    fn cred(s: &str) -> Credential {
        Credential::new(s).unwrap()
    }

    #[test]
    fn opens_only_with_credential() {
        let connector = RecordingConnector::default();
        let mut slot = SessionSlot::new(connector.clone());

        assert_eq!(slot.sync(&endpoint(), None).unwrap(), SlotChange::Unchanged);
        assert!(slot.session_id().is_none());

        let change = slot.sync(&endpoint(), Some(&cred("a"))).unwrap();
        assert!(matches!(change, SlotChange::Opened(_)));
        assert_eq!(connector.entries(), vec!["connect live.example.com a"]);
    }

    #[test]
    fn same_credential_keeps_session() {
        let connector = RecordingConnector::default();
        let mut slot = SessionSlot::new(connector.clone());
        slot.sync(&endpoint(), Some(&cred("a"))).unwrap();
        let id = slot.session_id();
        assert_eq!(slot.sync(&endpoint(), Some(&cred("a"))).unwrap(), SlotChange::Unchanged);
        assert_eq!(slot.session_id(), id);
        assert_eq!(connector.entries().len(), 1);
    }

    #[test]
    fn new_credential_replaces_session() {
        let connector = RecordingConnector::default();
        let mut slot = SessionSlot::new(connector.clone());
        slot.sync(&endpoint(), Some(&cred("a"))).unwrap();
        let change = slot.sync(&endpoint(), Some(&cred("b"))).unwrap();
        assert!(matches!(change, SlotChange::Replaced { .. }));
        assert_eq!(
            connector.entries(),
            vec!["connect live.example.com a", "close a", "connect live.example.com b"]
        );
    }

    #[test]
    fn absent_credential_tears_down() {
        let connector = RecordingConnector::default();
        let mut slot = SessionSlot::new(connector.clone());
        let SlotChange::Opened(id) = slot.sync(&endpoint(), Some(&cred("a"))).unwrap() else {
            panic!("expected Opened");
        };
        assert_eq!(slot.sync(&endpoint(), None).unwrap(), SlotChange::Closed(id));
        assert!(slot.session_id().is_none());
        assert_eq!(connector.entries().last().unwrap(), "close a");
    }

    #[test]
    fn failed_credential_is_not_retried_until_cleared() {
        let connector = RecordingConnector::default();
        *connector.fail.lock().unwrap() = true;
        let mut slot = SessionSlot::new(connector.clone());

        assert!(slot.sync(&endpoint(), Some(&cred("bad"))).is_err());
        assert_eq!(slot.sync(&endpoint(), Some(&cred("bad"))).unwrap(), SlotChange::Unchanged);
        assert_eq!(connector.entries(), vec!["refused bad"]);

        *connector.fail.lock().unwrap() = false;
        slot.clear_failure();
        assert!(matches!(
            slot.sync(&endpoint(), Some(&cred("bad"))).unwrap(),
            SlotChange::Opened(_)
        ));
    }

    #[test]
    fn drop_closes_active_session() {
        let connector = RecordingConnector::default();
        {
            let mut slot = SessionSlot::new(connector.clone());
            slot.sync(&endpoint(), Some(&cred("a"))).unwrap();
        }
        assert_eq!(connector.entries().last().unwrap(), "close a");
    }
}
