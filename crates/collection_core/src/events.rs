//! Typed item events flowing from renderers back into the controller.

use std::path::PathBuf;

use crossbeam_channel::{Sender, TrySendError};
use shared::domain::ItemId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEvent {
    Toggled { id: ItemId },
    ExportRequested { id: ItemId },
    RemoveRequested { id: ItemId },
}

impl ItemEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggled { .. } => "toggled",
            Self::ExportRequested { .. } => "export_requested",
            Self::RemoveRequested { .. } => "remove_requested",
        }
    }
}

/// Sender handed to one renderer, bound to the id of the item it draws.
#[derive(Debug, Clone)]
pub struct EventSink {
    id: ItemId,
    tx: Sender<ItemEvent>,
}

impl EventSink {
    pub fn new(id: ItemId, tx: Sender<ItemEvent>) -> Self {
        Self { id, tx }
    }

    pub fn toggled(&self) {
        self.emit(ItemEvent::Toggled {
            id: self.id.clone(),
        });
    }

    pub fn export_requested(&self) {
        self.emit(ItemEvent::ExportRequested {
            id: self.id.clone(),
        });
    }

    pub fn remove_requested(&self) {
        self.emit(ItemEvent::RemoveRequested {
            id: self.id.clone(),
        });
    }

    fn emit(&self, event: ItemEvent) {
        let name = event.name();
        match self.tx.try_send(event) {
            Ok(()) => tracing::debug!(event = name, id = %self.id, "queued item event"),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(event = name, id = %self.id, "item event queue is full; event dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!(event = name, id = %self.id, "controller is gone; event dropped");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved { destination: PathBuf },
    Cancelled,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Toggled { id: ItemId, enabled: bool },
    Exported(ExportOutcome),
    Removed { id: ItemId },
}
