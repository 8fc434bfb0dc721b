use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

/// Messages delivered to the identity that started an import or export.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn import_completed(&self, recipient: &str, import_id: &str);

    async fn import_failed(&self, recipient: &str, import_id: &str);

    async fn export_completed(&self, recipient: &str, export_id: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn import_completed(&self, recipient: &str, import_id: &str) {
        info!(recipient, import_id, "Import completed");
    }

    async fn import_failed(&self, recipient: &str, import_id: &str) {
        info!(recipient, import_id, "Import failed");
    }

    async fn export_completed(&self, recipient: &str, export_id: &str) {
        info!(recipient, export_id, "Export ready for download");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ImportCompleted { recipient: String, import_id: String },
    ImportFailed { recipient: String, import_id: String },
    ExportCompleted { recipient: String, export_id: String },
}

/// Keeps every notification in memory for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.notices.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn import_completed(&self, recipient: &str, import_id: &str) {
        self.notices.lock().await.push(Notice::ImportCompleted {
            recipient: recipient.to_string(),
            import_id: import_id.to_string(),
        });
    }

    async fn import_failed(&self, recipient: &str, import_id: &str) {
        self.notices.lock().await.push(Notice::ImportFailed {
            recipient: recipient.to_string(),
            import_id: import_id.to_string(),
        });
    }

    async fn export_completed(&self, recipient: &str, export_id: &str) {
        self.notices.lock().await.push(Notice::ExportCompleted {
            recipient: recipient.to_string(),
            export_id: export_id.to_string(),
        });
    }
}
