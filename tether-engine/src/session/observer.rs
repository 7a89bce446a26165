use crate::session::Notification;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiver of outward notifications, implemented by the embedding application.
///
/// Called from a dedicated delivery task, one notification at a time, in the
/// order the engine produced them. Each notification is delivered after the
/// state change it reports has been applied, so the implementation may issue
/// engine commands of its own.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Forwards notifications into an unbounded channel.
#[derive(Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Observer for ChannelObserver {
    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            debug!("Notification receiver gone, dropping {:?}", e.0);
        }
    }
}
