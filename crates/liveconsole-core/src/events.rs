use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use uuid::Uuid;

use crate::gate::{ActiveView, CredentialBadge};

/// Inputs to the console, applied strictly in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// User pressed the settings button.
    OpenSettings,
    /// User cancelled or dismissed the settings surface.
    CloseSettings,
    /// Raw string entered in the settings surface.
    SubmitCredential(String),
    SurfaceMounted,
    SurfaceUnmounted,
    /// Latest value reported by the capture collaborator.
    StreamChanged(Option<StreamRef>),
    /// Re-run the evaluation cycle without any other change.
    Refresh,
}

/// Handle to a capture/display stream owned by the capture collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRef {
    pub id: String,
    pub source: StreamSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSource {
    Webcam,
    ScreenCapture,
}

/// Notifications emitted by the core to UI listeners, only on change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    ViewChanged { view: ActiveView },
    ModalChanged { open: bool },
    BadgeChanged { badge: CredentialBadge },
    VisibilityChanged { visible: bool },
    SessionOpened { session_id: Uuid },
    SessionClosed { session_id: Uuid },
    SessionFailed { message: String },
    StoreFailed { message: String },
}

/// Trait for receiving view notifications from the core.
pub trait ViewListener: Send + Sync {
    fn on_event(&self, event: ViewEvent);
}

/// Dispatches view notifications to every registered listener.
///
/// Listeners are called in registration order, outside the registry lock,
/// so a listener may register further listeners from its callback. Those
/// only see later events.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Vec<Arc<dyn ViewListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn ViewListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn emit(&self, event: ViewEvent) {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_event(event.clone());
        }
    }
}
