//! Controller for named, toggleable collections of installable items
//! (extensions, resource packs, tools) kept in sync with a backing store.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod dialog;
pub mod error;
pub mod events;
pub mod i18n;
pub mod renderer;
pub mod store;

pub use bridge::StoreBridge;
pub use config::{load_config, ControllerConfig};
pub use controller::{CollectionController, CollectionItem};
pub use dialog::{
    FileFilter, LogNotifier, MissingSavePathPicker, Notice, NoticeLevel, Notifier,
    SaveDialogOptions, SavePathPicker,
};
pub use error::CollectionError;
pub use events::{EventOutcome, EventSink, ExportOutcome, ItemEvent};
pub use i18n::{Locale, Localizer, TextKey};
pub use renderer::{ElementId, ItemRenderer, RenderTarget, RendererFactory};
pub use store::{BackingStore, StoreClient};
