//! Collection controller: owns the item collection of one kind, keeps it in
//! step with the renderers and the backing store, and handles item events.

use std::{path::PathBuf, sync::Arc};

use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use shared::{
    domain::{CollectionKind, ItemId, Metadata},
    protocol::{DetailsMap, EnabledMap},
};

use crate::{
    config::ControllerConfig,
    dialog::{
        FileFilter, LogNotifier, MissingSavePathPicker, Notice, Notifier, SaveDialogOptions,
        SavePathPicker,
    },
    error::{CollectionError, Result},
    events::{EventOutcome, EventSink, ExportOutcome, ItemEvent},
    i18n::{Localizer, TextKey},
    renderer::{ItemRenderer, RenderTarget, RendererFactory},
    store::{BackingStore, StoreClient},
};

pub struct CollectionItem {
    pub id: ItemId,
    pub metadata: Metadata,
    pub enabled: bool,
    renderer: Box<dyn ItemRenderer>,
}

impl CollectionItem {
    pub fn renderer(&self) -> &dyn ItemRenderer {
        self.renderer.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControllerState {
    Unloaded,
    Loaded,
}

pub struct CollectionController {
    kind: CollectionKind,
    state: ControllerState,
    store: StoreClient,
    renderers: Box<dyn RendererFactory>,
    target: Box<dyn RenderTarget>,
    picker: Arc<dyn SavePathPicker>,
    notifier: Arc<dyn Notifier>,
    texts: Localizer,
    default_export_dir: Option<PathBuf>,
    items: IndexMap<ItemId, CollectionItem>,
    events_tx: Sender<ItemEvent>,
    events_rx: Receiver<ItemEvent>,
}

impl CollectionController {
    /// Controller without a save dialog; exports are treated as cancelled
    /// and notices go to the log.
    pub fn new(
        kind: CollectionKind,
        store: Arc<dyn BackingStore>,
        renderers: Box<dyn RendererFactory>,
        target: Box<dyn RenderTarget>,
    ) -> Self {
        Self::new_with_dependencies(
            kind,
            &ControllerConfig::default(),
            store,
            renderers,
            target,
            Arc::new(MissingSavePathPicker),
            Arc::new(LogNotifier),
        )
    }

    pub fn new_with_dependencies(
        kind: CollectionKind,
        config: &ControllerConfig,
        store: Arc<dyn BackingStore>,
        renderers: Box<dyn RendererFactory>,
        target: Box<dyn RenderTarget>,
        picker: Arc<dyn SavePathPicker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            kind,
            state: ControllerState::Unloaded,
            store: StoreClient::new(store, kind, config.request_timeout),
            renderers,
            target,
            picker,
            notifier,
            texts: Localizer::new(config.locale),
            default_export_dir: config.default_export_dir.clone(),
            items: IndexMap::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn is_loaded(&self) -> bool {
        self.state == ControllerState::Loaded
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &ItemId) -> Option<&CollectionItem> {
        self.items.get(id)
    }

    /// Item ids in render order.
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.items.keys()
    }

    pub fn enabled_map(&self) -> EnabledMap {
        self.items
            .iter()
            .map(|(id, item)| (id.clone(), item.enabled))
            .collect()
    }

    /// Fetches the collection from the store, builds a renderer per item and
    /// renders the list. Returns the number of items loaded.
    pub async fn load(&mut self) -> Result<usize> {
        if self.is_loaded() {
            return Err(CollectionError::AlreadyLoaded(self.kind));
        }

        let details = self.store.get_details().await?;
        check_ids(&details)?;

        for (id, entry) in details {
            let mut metadata = entry.metadata;
            metadata.kind = Some(self.kind);
            let sink = EventSink::new(id.clone(), self.events_tx.clone());
            let renderer = self.renderers.create(&metadata, entry.enabled, sink);
            self.items.insert(
                id.clone(),
                CollectionItem {
                    id,
                    metadata,
                    enabled: entry.enabled,
                    renderer,
                },
            );
        }

        self.state = ControllerState::Loaded;
        tracing::info!(kind = %self.kind, count = self.items.len(), "collection loaded");
        self.render();
        Ok(self.items.len())
    }

    pub fn render(&mut self) {
        self.target.clear();
        for item in self.items.values() {
            self.target.append(item.renderer.element());
        }
        tracing::debug!(kind = %self.kind, count = self.items.len(), "collection rendered");
    }

    /// Routes one item event to its handler.
    pub async fn dispatch(&mut self, event: ItemEvent) -> Result<EventOutcome> {
        match event {
            ItemEvent::Toggled { id } => {
                let enabled = self.on_toggled(&id)?;
                Ok(EventOutcome::Toggled { id, enabled })
            }
            ItemEvent::ExportRequested { id } => {
                let outcome = self.on_export_requested(&id).await?;
                Ok(EventOutcome::Exported(outcome))
            }
            ItemEvent::RemoveRequested { id } => {
                self.on_remove_requested(&id).await?;
                Ok(EventOutcome::Removed { id })
            }
        }
    }

    /// Handles every event renderers have queued so far, in arrival order.
    pub async fn process_pending_events(&mut self) -> Vec<Result<EventOutcome>> {
        let mut results = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            results.push(self.dispatch(event).await);
        }
        results
    }

    /// Copies the renderer's checked state into the item record.
    pub fn on_toggled(&mut self, id: &ItemId) -> Result<bool> {
        let kind = self.kind;
        let item = self.items.get_mut(id).ok_or_else(|| not_found(kind, id))?;
        item.enabled = item.renderer.is_checked();
        tracing::debug!(kind = %kind, id = %id, enabled = item.enabled, "item toggled");
        Ok(item.enabled)
    }

    pub async fn on_export_requested(&mut self, id: &ItemId) -> Result<ExportOutcome> {
        if !self.items.contains_key(id) {
            return Err(not_found(self.kind, id));
        }

        let descriptor = self.kind.export_descriptor();
        let file_name = self.store.package(id).await?;
        let default_path = match &self.default_export_dir {
            Some(dir) => dir.join(&file_name),
            None => PathBuf::from(&file_name),
        };

        let options = SaveDialogOptions {
            title: self.texts.text(TextKey::ExportTo).to_string(),
            filters: vec![FileFilter {
                label: descriptor.type_label,
                extensions: vec![descriptor.file_extension],
            }],
            default_path,
        };
        let Some(destination) = self.picker.pick_save_path(options).await else {
            tracing::info!(kind = %self.kind, id = %id, "export cancelled");
            return Ok(ExportOutcome::Cancelled);
        };

        match self.store.export(id, destination.clone()).await {
            Ok(()) => {
                tracing::info!(
                    kind = %self.kind,
                    id = %id,
                    destination = %destination.display(),
                    "item exported"
                );
                self.notifier
                    .notify(Notice::info(self.texts.text(TextKey::ExportSucceeded)));
                Ok(ExportOutcome::Saved { destination })
            }
            Err(err) => {
                let reason = err.user_reason();
                tracing::warn!(kind = %self.kind, id = %id, "export failed: {err}");
                self.notifier.notify(Notice::error(
                    self.texts.format(TextKey::ExportFailed, &[reason.as_str()]),
                ));
                Ok(ExportOutcome::Failed { reason })
            }
        }
    }

    /// Detaches the item, deletes it from the store and from the collection,
    /// then re-renders. A rejected delete leaves the item in place.
    pub async fn on_remove_requested(&mut self, id: &ItemId) -> Result<()> {
        let element = self
            .items
            .get(id)
            .map(|item| item.renderer.element())
            .ok_or_else(|| not_found(self.kind, id))?;
        self.target.detach(element);

        if let Err(err) = self.store.remove(id).await {
            tracing::warn!(kind = %self.kind, id = %id, "remove rejected: {err}");
            self.render();
            return Err(err);
        }

        self.items.shift_remove(id);
        tracing::info!(kind = %self.kind, id = %id, "item removed");
        self.render();
        Ok(())
    }

    /// Flips the editable flag of every item. Local only.
    pub fn change_editable(&mut self) {
        for item in self.items.values_mut() {
            let editable = item.renderer.is_editable();
            item.renderer.set_editable(!editable);
        }
    }

    /// Submits every item's enabled flag to the store.
    pub async fn save(&self) -> Result<()> {
        if !self.is_loaded() {
            return Err(CollectionError::NotLoaded(self.kind));
        }
        self.store.persist(self.enabled_map()).await?;
        tracing::info!(kind = %self.kind, count = self.items.len(), "collection state saved");
        Ok(())
    }
}

fn check_ids(details: &DetailsMap) -> Result<()> {
    match details.iter().find(|(key, entry)| **key != entry.metadata.id) {
        Some((key, entry)) => Err(CollectionError::MismatchedId {
            key: key.clone(),
            metadata_id: entry.metadata.id.clone(),
        }),
        None => Ok(()),
    }
}

fn not_found(kind: CollectionKind, id: &ItemId) -> CollectionError {
    tracing::error!(kind = %kind, id = %id, "event for an item that is not in the collection");
    CollectionError::NotFound {
        kind,
        id: id.clone(),
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
