//! Save-path picker and user notification seams.

use std::path::PathBuf;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub label: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDialogOptions {
    pub title: String,
    pub filters: Vec<FileFilter>,
    pub default_path: PathBuf,
}

#[async_trait]
pub trait SavePathPicker: Send + Sync {
    /// `None` means the user cancelled.
    async fn pick_save_path(&self, options: SaveDialogOptions) -> Option<PathBuf>;
}

pub struct MissingSavePathPicker;

#[async_trait]
impl SavePathPicker for MissingSavePathPicker {
    async fn pick_save_path(&self, options: SaveDialogOptions) -> Option<PathBuf> {
        tracing::warn!(
            default_path = %options.default_path.display(),
            "no save-path picker configured; treating export as cancelled"
        );
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.message, "user notice"),
            NoticeLevel::Error => tracing::error!(notice = %notice.message, "user notice"),
        }
    }
}
