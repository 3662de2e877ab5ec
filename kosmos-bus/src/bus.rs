//! The message bus itself (spec §4.6), grounded on `llmspell-events::bus::EventBus`'s
//! publish/subscribe shape, generalized to per-sender FIFO handler dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::cancel::CancellationRegistry;
use crate::dedup::DedupWindow;
use crate::error::{BusError, Result};
use crate::message::AgentMessage;

const DEFAULT_DEDUP_WINDOW: usize = 1024;

/// A handler registered for one `(from_agent, response_type)` pair.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, message: AgentMessage, cancel: CancellationToken) -> Result<()>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(AgentMessage, CancellationToken) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<()>> + Send,
{
    async fn handle(&self, message: AgentMessage, cancel: CancellationToken) -> Result<()> {
        self(message, cancel).await
    }
}

/// Typed inter-agent message bus. Handlers are registered per
/// `(from_agent, response_type)`; delivery to a single recipient is FIFO
/// per sender because each sender's messages flow through one channel
/// drained by one serialized dispatch task.
pub struct MessageBus {
    handlers: Arc<DashMap<(String, String), Arc<dyn Handler>>>,
    senders: DashMap<String, mpsc::UnboundedSender<AgentMessage>>,
    cancellation: Arc<CancellationRegistry>,
    dedup: DedupWindow,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(DashMap::new()),
            senders: DashMap::new(),
            cancellation: Arc::new(CancellationRegistry::new()),
            dedup: DedupWindow::new(DEFAULT_DEDUP_WINDOW),
        }
    }

    /// Register a handler for messages of `response_type` coming from `from_agent`.
    pub fn register_handler(&self, from_agent: impl Into<String>, response_type: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert((from_agent.into(), response_type.into()), handler);
    }

    /// Signal cancellation for every handler tracking `correlation_id`.
    pub fn cancel(&self, correlation_id: &str) {
        self.cancellation.cancel(correlation_id);
    }

    /// Send a message. Delivery is asynchronous and FIFO relative to every
    /// other message previously sent by the same `sender`.
    ///
    /// # Errors
    /// Returns [`BusError::NoHandler`] if no handler matches `(sender, msg_type)`.
    #[instrument(skip(self, message), fields(sender = %message.sender, msg_type = %message.msg_type, correlation_id = %message.correlation_id))]
    pub fn send(&self, message: AgentMessage) -> Result<()> {
        let key = (message.sender.clone(), message.msg_type.clone());
        if !self.handlers.contains_key(&key) {
            return Err(BusError::NoHandler(key.0, key.1));
        }

        if !self.dedup.observe(&message.id) {
            debug!(message_id = %message.id, "dropping duplicate message delivery");
            return Ok(());
        }

        let sender_name = message.sender.clone();
        let tx = self
            .senders
            .entry(sender_name.clone())
            .or_insert_with(|| self.spawn_dispatch_task(sender_name))
            .clone();
        tx.send(message).map_err(|e| BusError::ChannelClosed(e.0.sender))
    }

    fn spawn_dispatch_task(&self, sender_name: String) -> mpsc::UnboundedSender<AgentMessage> {
        let (tx, mut rx) = mpsc::unbounded_channel::<AgentMessage>();
        let handlers = self.handlers.clone();
        let cancellation = self.cancellation.clone();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let key = (message.sender.clone(), message.msg_type.clone());
                let Some(handler) = handlers.get(&key).map(|h| h.clone()) else {
                    warn!(sender = %sender_name, msg_type = %message.msg_type, "handler deregistered after send, dropping message");
                    continue;
                };
                let correlation_id = message.correlation_id.clone();
                let token = cancellation.token_for(&correlation_id);
                if let Err(error) = handler.handle(message, token).await {
                    warn!(%error, sender = %sender_name, "handler returned an error");
                }
                cancellation.clear(&correlation_id);
            }
        });

        tx
    }
}
