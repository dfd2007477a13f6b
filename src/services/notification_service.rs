use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::notification::{Notice, Notification};
use crate::repository::NotificationStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification channel is closed")]
    Closed,
}

/// One-way hand-off for notices. Implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notice: Notice) -> std::result::Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct ChannelNotificationSink {
    sender: mpsc::UnboundedSender<Notice>,
}

impl NotificationSink for ChannelNotificationSink {
    fn dispatch(&self, notice: Notice) -> std::result::Result<(), NotifyError> {
        self.sender.send(notice).map_err(|_| NotifyError::Closed)
    }
}

/// Drains queued notices into the inbox. Insert failures are logged and the
/// notice is dropped.
pub struct NotificationWorker {
    receiver: mpsc::UnboundedReceiver<Notice>,
    store: Arc<dyn NotificationStore>,
}

pub fn notification_channel(
    store: Arc<dyn NotificationStore>,
) -> (ChannelNotificationSink, NotificationWorker) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        ChannelNotificationSink { sender },
        NotificationWorker { receiver, store },
    )
}

impl NotificationWorker {
    /// Handles one notice. Returns `false` once every sender is gone.
    pub async fn run_once(&mut self) -> bool {
        let Some(notice) = self.receiver.recv().await else {
            return false;
        };
        match self.store.insert_notification(&notice).await {
            Ok(row) => {
                tracing::debug!(notification_id = %row.id, recipient_id = %notice.recipient_id, "notification stored");
            }
            Err(e) => {
                tracing::error!(error = %e, recipient_id = %notice.recipient_id, "failed to store notification");
            }
        }
        true
    }

    pub async fn run(mut self) {
        while self.run_once().await {}
        tracing::info!("notification worker stopped");
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self.store.list_for_recipient(user_id).await?)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        Ok(self.store.mark_all_read(user_id).await?)
    }
}
