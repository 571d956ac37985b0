use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

// Stands in for the host notification facility.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) {
        info!("notification: {title} {body}");
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    messages: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}
