use std::sync::Mutex;

use tracing::{info, warn};

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Sink for user-facing notices raised by the form engines.
///
/// The engines never render anything themselves; a UI layer decides
/// how a notice is shown.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn warn(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }
}

/// Default sink forwarding notices to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!(notice = message, "user notice"),
            NoticeLevel::Warning => warn!(notice = message, "user notice"),
        }
    }
}

/// Recording sink for tests
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(NoticeLevel, String)> {
        self.entries.lock().expect("notifier lock poisoned").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(level, _)| *level == NoticeLevel::Warning)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(level, _)| *level == NoticeLevel::Info)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.entries
            .lock()
            .expect("notifier lock poisoned")
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_separates_levels() {
        let notifier = RecordingNotifier::new();
        notifier.warn("missing fields");
        notifier.info("nothing to save");

        assert_eq!(notifier.warnings(), vec!["missing fields".to_string()]);
        assert_eq!(notifier.infos(), vec!["nothing to save".to_string()]);
    }
}
