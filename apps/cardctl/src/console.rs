//! Terminal stand-ins for the item list, the save dialog and user notices.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use collection_core::{
    ElementId, EventSink, ItemRenderer, Notice, NoticeLevel, Notifier, RenderTarget,
    RendererFactory, SaveDialogOptions, SavePathPicker,
};
use shared::domain::{ItemId, Metadata};

struct Row {
    id: ItemId,
    label: String,
    checked: bool,
    editable: bool,
    events: EventSink,
}

#[derive(Default)]
struct BoardState {
    next_element: u64,
    rows: HashMap<ElementId, Row>,
    visible: Vec<ElementId>,
}

/// Text list of items. Serves as both the renderer factory and the render
/// target for one controller.
#[derive(Clone, Default)]
pub struct ConsoleBoard(Arc<Mutex<BoardState>>);

impl ConsoleBoard {
    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Events sender of the visible row drawing `id`.
    pub fn events_for(&self, id: &ItemId) -> Option<EventSink> {
        let state = self.state();
        state
            .visible
            .iter()
            .filter_map(|element| state.rows.get(element))
            .find(|row| row.id == *id)
            .map(|row| row.events.clone())
    }

    /// Sets the checkbox of `id` and reports the click. Returns false when
    /// no visible row draws `id`.
    pub fn click_checkbox(&self, id: &ItemId, checked: bool) -> bool {
        let events = {
            let mut state = self.state();
            let Some(element) = state.visible.iter().copied().find(|element| {
                state.rows.get(element).is_some_and(|row| row.id == *id)
            }) else {
                return false;
            };
            let Some(row) = state.rows.get_mut(&element) else {
                return false;
            };
            row.checked = checked;
            row.events.clone()
        };
        events.toggled();
        true
    }

    pub fn lines(&self) -> Vec<String> {
        let state = self.state();
        state
            .visible
            .iter()
            .filter_map(|element| state.rows.get(element))
            .map(|row| {
                format!(
                    "[{}] {} ({}){}",
                    if row.checked { "x" } else { " " },
                    row.id,
                    row.label,
                    if row.editable { "" } else { " [locked]" }
                )
            })
            .collect()
    }

    pub fn print(&self) {
        let lines = self.lines();
        if lines.is_empty() {
            println!("(no items)");
        }
        for line in lines {
            println!("{line}");
        }
    }
}

struct ConsoleRow {
    element: ElementId,
    board: ConsoleBoard,
}

impl ItemRenderer for ConsoleRow {
    fn element(&self) -> ElementId {
        self.element
    }

    fn is_checked(&self) -> bool {
        self.board
            .state()
            .rows
            .get(&self.element)
            .is_some_and(|row| row.checked)
    }

    fn is_editable(&self) -> bool {
        self.board
            .state()
            .rows
            .get(&self.element)
            .is_some_and(|row| row.editable)
    }

    fn set_editable(&mut self, editable: bool) {
        if let Some(row) = self.board.state().rows.get_mut(&self.element) {
            row.editable = editable;
        }
    }
}

impl Drop for ConsoleRow {
    fn drop(&mut self) {
        let mut state = self.board.state();
        state.rows.remove(&self.element);
        state.visible.retain(|visible| *visible != self.element);
    }
}

impl RendererFactory for ConsoleBoard {
    fn create(
        &self,
        metadata: &Metadata,
        enabled: bool,
        events: EventSink,
    ) -> Box<dyn ItemRenderer> {
        let element = {
            let mut state = self.state();
            state.next_element += 1;
            let element = ElementId(state.next_element);
            state.rows.insert(
                element,
                Row {
                    id: metadata.id.clone(),
                    label: metadata.display_name().to_string(),
                    checked: enabled,
                    editable: true,
                    events,
                },
            );
            element
        };
        Box::new(ConsoleRow {
            element,
            board: self.clone(),
        })
    }
}

impl RenderTarget for ConsoleBoard {
    fn clear(&mut self) {
        self.state().visible.clear();
    }

    fn append(&mut self, element: ElementId) {
        self.state().visible.push(element);
    }

    fn detach(&mut self, element: ElementId) {
        self.state().visible.retain(|visible| *visible != element);
    }
}

/// Answers the save dialog with a path fixed on the command line, or
/// cancels when none was given.
pub struct PresetPicker {
    pub destination: Option<PathBuf>,
}

#[async_trait]
impl SavePathPicker for PresetPicker {
    async fn pick_save_path(&self, options: SaveDialogOptions) -> Option<PathBuf> {
        let filters: Vec<String> = options
            .filters
            .iter()
            .map(|filter| format!("{} (*.{})", filter.label, filter.extensions.join(", *.")))
            .collect();
        tracing::debug!(
            title = %options.title,
            filters = %filters.join("; "),
            suggested = %options.default_path.display(),
            "save dialog requested"
        );
        self.destination.clone()
    }
}

#[cfg(feature = "native-dialog")]
pub struct NativePicker;

#[cfg(feature = "native-dialog")]
#[async_trait]
impl SavePathPicker for NativePicker {
    async fn pick_save_path(&self, options: SaveDialogOptions) -> Option<PathBuf> {
        let mut dialog = rfd::AsyncFileDialog::new().set_title(options.title.as_str());
        for filter in &options.filters {
            dialog = dialog.add_filter(filter.label.as_str(), filter.extensions.as_slice());
        }
        let dir = options.default_path.parent();
        if let Some(dir) = dir.filter(|dir| !dir.as_os_str().is_empty()) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = options.default_path.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        dialog
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => eprintln!("{}", notice.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use collection_core::ItemEvent;
    use crossbeam_channel::unbounded;

    use super::*;

    #[test]
    fn board_lists_visible_rows_in_append_order() {
        let (tx, _rx) = unbounded();
        let mut board = ConsoleBoard::default();
        let a = board.create(
            &Metadata::new("a").with_name("Alpha"),
            true,
            EventSink::new(ItemId::from("a"), tx.clone()),
        );
        let b = board.create(
            &Metadata::new("b"),
            false,
            EventSink::new(ItemId::from("b"), tx),
        );

        board.append(b.element());
        board.append(a.element());
        assert_eq!(board.lines(), vec!["[ ] b (b)", "[x] a (Alpha)"]);

        board.detach(b.element());
        assert_eq!(board.lines(), vec!["[x] a (Alpha)"]);
        assert!(board.events_for(&ItemId::from("b")).is_none());
    }

    #[test]
    fn clicking_a_checkbox_updates_row_and_reports_toggle() {
        let (tx, rx) = unbounded();
        let mut board = ConsoleBoard::default();
        let mut row = board.create(
            &Metadata::new("a"),
            false,
            EventSink::new(ItemId::from("a"), tx),
        );
        board.append(row.element());

        assert!(board.click_checkbox(&ItemId::from("a"), true));
        assert!(!board.click_checkbox(&ItemId::from("zzz"), true));
        assert!(row.is_checked());
        assert_eq!(
            rx.try_recv().expect("event"),
            ItemEvent::Toggled {
                id: ItemId::from("a")
            }
        );

        row.set_editable(false);
        assert_eq!(board.lines(), vec!["[x] a (a) [locked]"]);
    }

    #[test]
    fn detached_and_dropped_rows_ignore_clicks() {
        let (tx, rx) = unbounded();
        let mut board = ConsoleBoard::default();
        let row = board.create(
            &Metadata::new("a"),
            false,
            EventSink::new(ItemId::from("a"), tx),
        );
        board.append(row.element());

        board.detach(row.element());
        assert!(!board.click_checkbox(&ItemId::from("a"), true));
        assert!(!row.is_checked());
        assert!(rx.try_recv().is_err());

        drop(row);
        assert!(board.state().rows.is_empty());
        assert!(board.lines().is_empty());
    }
}
