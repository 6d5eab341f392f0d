use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::credential::Credential;
use crate::errors::ConsoleError;
use crate::events::{ConsoleEvent, EventEmitter, StreamRef, ViewEvent, ViewListener};
use crate::gate::{ActiveView, CredentialBadge, CredentialGate};
use crate::session::{SessionConnector, SessionSlot, SlotChange};
use crate::store::CredentialStore;
use crate::visibility::StreamVisibility;

const QUEUE_CAPACITY: usize = 64;

/// What listeners last heard about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    view: ActiveView,
    modal_open: bool,
    badge: CredentialBadge,
    visible: bool,
}

/// Composes the credential gate, the session slot and video visibility.
///
/// Every event is applied and then followed by one evaluation cycle, so the
/// auto-open rule and user toggles take effect in arrival order.
pub struct Console<S, C> {
    endpoint: Url,
    gate: CredentialGate<S>,
    session: SessionSlot<C>,
    visibility: StreamVisibility,
    stream: Option<StreamRef>,
    emitter: EventEmitter,
    last: Option<Snapshot>,
}

impl<S: CredentialStore, C: SessionConnector> Console<S, C> {
    pub fn new(config: &Config, store: S, connector: C) -> Self {
        Self {
            endpoint: config.endpoint().clone(),
            gate: CredentialGate::new(store),
            session: SessionSlot::new(connector),
            visibility: StreamVisibility::default(),
            stream: None,
            emitter: EventEmitter::new(),
            last: None,
        }
    }

    /// Register a listener for view notifications.
    pub fn add_listener(&self, listener: Arc<dyn ViewListener>) {
        self.emitter.add_listener(listener);
    }

    pub fn active_view(&self) -> ActiveView {
        self.gate.active_view()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.gate.current_credential()
    }

    pub fn is_modal_open(&self) -> bool {
        self.gate.is_modal_open()
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    pub fn stream(&self) -> Option<&StreamRef> {
        self.stream.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.session_id()
    }

    /// Apply one event, then run the evaluation cycle.
    pub fn handle(&mut self, event: ConsoleEvent) {
        self.apply(event);
        self.cycle();
    }

    fn apply(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::OpenSettings => self.gate.request_open(),
            ConsoleEvent::CloseSettings => self.gate.request_close(),
            ConsoleEvent::SubmitCredential(token) => {
                self.session.clear_failure();
                if let Err(e) = self.gate.submit(&token) {
                    tracing::error!("failed to persist credential: {e}");
                    self.emitter.emit(ViewEvent::StoreFailed {
                        message: e.to_string(),
                    });
                }
            }
            ConsoleEvent::SurfaceMounted => {
                tracing::debug!("video surface mounted");
                self.visibility.mount_present = true;
            }
            ConsoleEvent::SurfaceUnmounted => {
                tracing::debug!("video surface unmounted");
                self.visibility.mount_present = false;
            }
            ConsoleEvent::StreamChanged(stream) => {
                tracing::debug!(?stream, "capture stream changed");
                self.visibility.stream_present = stream.is_some();
                self.stream = stream;
            }
            ConsoleEvent::Refresh => {}
        }
    }

    /// One evaluation cycle: gate rule, session lifecycle, then notify.
    pub fn cycle(&mut self) {
        let credential = self.gate.evaluate();
        let (view, badge) = match credential {
            Some(_) => (ActiveView::Session, CredentialBadge::Configured),
            None => (ActiveView::Placeholder, CredentialBadge::Missing),
        };

        // The video surface lives inside the session view.
        if view == ActiveView::Placeholder && self.visibility.mount_present {
            tracing::debug!("session view unmounted, detaching video surface");
            self.visibility.mount_present = false;
        }

        let before = self.session.session_id();
        let lifecycle = match self.session.sync(&self.endpoint, credential.as_ref()) {
            Ok(change) => session_events(change),
            // A failed connect has already released whatever was open.
            Err(e) => before
                .map(|session_id| ViewEvent::SessionClosed { session_id })
                .into_iter()
                .chain([ViewEvent::SessionFailed {
                    message: e.to_string(),
                }])
                .collect(),
        };

        self.publish(Snapshot {
            view,
            modal_open: self.gate.is_modal_open(),
            badge,
            visible: self.visibility.is_visible(),
        });
        for event in lifecycle {
            self.emitter.emit(event);
        }
    }

    fn publish(&mut self, next: Snapshot) {
        let prev = self.last.replace(next);

        if prev.map(|p| p.view) != Some(next.view) {
            self.emitter.emit(ViewEvent::ViewChanged { view: next.view });
        }
        if prev.map(|p| p.modal_open) != Some(next.modal_open) {
            self.emitter.emit(ViewEvent::ModalChanged {
                open: next.modal_open,
            });
        }
        if prev.map(|p| p.badge) != Some(next.badge) {
            self.emitter.emit(ViewEvent::BadgeChanged { badge: next.badge });
        }
        if prev.map(|p| p.visible) != Some(next.visible) {
            self.emitter.emit(ViewEvent::VisibilityChanged {
                visible: next.visible,
            });
        }
    }

    /// Drain the event queue until every [`ConsoleHandle`] is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<ConsoleEvent>) -> Self {
        self.cycle();
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        tracing::debug!("console event queue closed");
        self
    }
}

fn session_events(change: SlotChange) -> Vec<ViewEvent> {
    match change {
        SlotChange::Unchanged => Vec::new(),
        SlotChange::Opened(session_id) => vec![ViewEvent::SessionOpened { session_id }],
        SlotChange::Replaced { closed, opened } => vec![
            ViewEvent::SessionClosed { session_id: closed },
            ViewEvent::SessionOpened { session_id: opened },
        ],
        SlotChange::Closed(session_id) => vec![ViewEvent::SessionClosed { session_id }],
    }
}

/// Sending side of the console's event queue.
#[derive(Clone)]
pub struct ConsoleHandle {
    tx: mpsc::Sender<ConsoleEvent>,
}

pub fn channel() -> (ConsoleHandle, mpsc::Receiver<ConsoleEvent>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (ConsoleHandle { tx }, rx)
}

impl ConsoleHandle {
    pub async fn send(&self, event: ConsoleEvent) -> Result<(), ConsoleError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| ConsoleError::QueueClosed)
    }

    /// For callers outside the async runtime, e.g. a stdin reader thread.
    pub fn blocking_send(&self, event: ConsoleEvent) -> Result<(), ConsoleError> {
        self.tx
            .blocking_send(event)
            .map_err(|_| ConsoleError::QueueClosed)
    }

    /// Forward the capture collaborator's stream reports into the queue.
    ///
    /// The current value is sent first. The task ends when either side of the
    /// watch channel or the console goes away.
    pub fn forward_stream(
        &self,
        mut streams: watch::Receiver<Option<StreamRef>>,
    ) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            loop {
                let current = streams.borrow_and_update().clone();
                if tx.send(ConsoleEvent::StreamChanged(current)).await.is_err() {
                    break;
                }
                if streams.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
