// Optimistic value state for one (video, field) editor slot

use serde::Serialize;

use crate::fields::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    /// Displayed value matches what the server last accepted
    Confirmed,
    /// Local edit not yet sent
    PendingLocal,
    Saving,
    /// Last save was rejected; displayed value is back at the confirmed one
    RolledBack,
}

/// Confirmed and displayed value of one field, with explicit transitions.
///
/// A save carries the value displayed when it began. Edits made while it is
/// in flight move the state back to `PendingLocal` so the caller dispatches
/// again once the current save settles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableValue {
    confirmed: Option<FieldValue>,
    displayed: Option<FieldValue>,
    state: SaveState,
    error: Option<String>,
    retry_available: bool,
    in_flight: bool,
}

impl EditableValue {
    pub fn new(confirmed: Option<FieldValue>) -> Self {
        Self {
            displayed: confirmed.clone(),
            confirmed,
            state: SaveState::Confirmed,
            error: None,
            retry_available: false,
            in_flight: false,
        }
    }

    pub fn confirmed(&self) -> Option<&FieldValue> {
        self.confirmed.as_ref()
    }

    pub fn displayed(&self) -> Option<&FieldValue> {
        self.displayed.as_ref()
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn retry_available(&self) -> bool {
        self.retry_available
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Editors are inert while a save is in flight
    pub fn is_disabled(&self) -> bool {
        self.in_flight
    }

    /// True when a local edit is waiting and nothing is in flight
    pub fn needs_dispatch(&self) -> bool {
        self.state == SaveState::PendingLocal && !self.in_flight && !self.retry_available
    }

    /// Apply a user edit optimistically and clear any prior error
    pub fn edit(&mut self, value: Option<FieldValue>) {
        self.displayed = value;
        self.error = None;
        self.retry_available = false;
        self.state = SaveState::PendingLocal;
    }

    /// Start a save of the displayed value. `None` when there is nothing to
    /// send or a save is already in flight.
    pub fn begin_save(&mut self) -> Option<Option<FieldValue>> {
        if self.state != SaveState::PendingLocal || self.in_flight {
            return None;
        }
        self.in_flight = true;
        self.retry_available = false;
        self.state = SaveState::Saving;
        Some(self.displayed.clone())
    }

    /// Server accepted the save and echoed `saved`
    pub fn complete_ok(&mut self, saved: Option<FieldValue>) {
        self.in_flight = false;
        self.confirmed = saved.clone();
        if self.state == SaveState::Saving {
            self.displayed = saved;
            self.state = SaveState::Confirmed;
        }
    }

    /// Server rejected the save. Without a newer edit the displayed value
    /// reverts to the confirmed one; with one, the newer edit stays pending.
    pub fn complete_err(&mut self, message: impl Into<String>) {
        self.in_flight = false;
        self.error = Some(message.into());
        if self.state == SaveState::Saving {
            self.displayed = self.confirmed.clone();
            self.state = SaveState::RolledBack;
        }
    }

    /// Transport failure: keep the local value and offer a retry
    pub fn complete_unavailable(&mut self, message: impl Into<String>) {
        self.in_flight = false;
        self.error = Some(message.into());
        self.retry_available = true;
        self.state = SaveState::PendingLocal;
    }

    /// Re-arm a save after a transport failure
    pub fn retry(&mut self) -> bool {
        if !self.retry_available {
            return false;
        }
        self.retry_available = false;
        self.error = None;
        true
    }
}
