/// Native dialogs: folder picker and message boxes

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;

pub fn select_folder() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Select Folder with DNG Photos")
        .pick_folder()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A message box waiting to be shown, so it can travel as a UI message
/// and open after the log has been redrawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(level: Level, title: &str, description: impl Into<String>) -> Self {
        Notice { level, title: title.to_string(), description: description.into() }
    }

    pub fn show(&self) {
        show(self.level, &self.title, &self.description);
    }
}

pub fn warning(title: &str, description: &str) {
    show(Level::Warning, title, description);
}

pub fn error(title: &str, description: &str) {
    show(Level::Error, title, description);
}

fn show(level: Level, title: &str, description: &str) {
    let level = match level {
        Level::Info => MessageLevel::Info,
        Level::Warning => MessageLevel::Warning,
        Level::Error => MessageLevel::Error,
    };
    let _ = MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_carries_summary_text() {
        let notice = Notice::new(Level::Info, "Done", format!("Converted: {}", 3));
        assert_eq!(notice.level, Level::Info);
        assert_eq!(notice.title, "Done");
        assert_eq!(notice.description, "Converted: 3");
        assert_eq!(notice.clone(), notice);
    }
}
