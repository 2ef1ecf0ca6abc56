//! Seams to the presentation layer: item renderers and the list they are drawn into.

use shared::domain::Metadata;

use crate::events::EventSink;

/// Opaque handle to the visual element a renderer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

pub trait ItemRenderer {
    fn element(&self) -> ElementId;
    fn is_checked(&self) -> bool;
    fn is_editable(&self) -> bool;
    fn set_editable(&mut self, editable: bool);
}

pub trait RendererFactory {
    /// Builds the renderer for one item. The renderer reports user actions
    /// through `events`.
    fn create(&self, metadata: &Metadata, enabled: bool, events: EventSink)
        -> Box<dyn ItemRenderer>;
}

/// The list container items are drawn into.
pub trait RenderTarget {
    fn clear(&mut self);
    fn append(&mut self, element: ElementId);
    fn detach(&mut self, element: ElementId);
}
