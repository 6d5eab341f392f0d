//! Settings surface form state.
//!
//! Holds the draft typed into the credential field. The only rule the form
//! enforces is that the field is filled in; the raw string is handed on
//! unvalidated. The form outlives the surface being hidden, so a cancelled
//! draft is still there when the surface reopens.

use crate::events::ConsoleEvent;

pub const TITLE: &str = "Settings";
pub const DESCRIPTION: &str = "API Key is stored locally on this device.";
pub const FIELD_LABEL: &str = "API Key";
pub const FIELD_PLACEHOLDER: &str = "Enter your API key";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    draft: String,
}

impl SettingsForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, value: impl Into<String>) {
        self.draft = value.into();
    }

    pub fn can_save(&self) -> bool {
        !self.draft.is_empty()
    }

    /// Events for the save button: submit the draft, then close.
    /// Returns nothing while the field is empty.
    pub fn save(&mut self) -> Option<[ConsoleEvent; 2]> {
        if !self.can_save() {
            return None;
        }
        let token = std::mem::take(&mut self.draft);
        Some([ConsoleEvent::SubmitCredential(token), ConsoleEvent::CloseSettings])
    }

    pub fn cancel(&self) -> ConsoleEvent {
        ConsoleEvent::CloseSettings
    }
}
