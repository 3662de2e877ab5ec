//! Typed inter-agent message bus with per-sender FIFO dispatch and
//! correlation-id cancellation (spec §4.6).

pub mod bus;
pub mod cancel;
mod dedup;
pub mod error;
pub mod message;

pub use bus::{Handler, MessageBus};
pub use cancel::CancellationRegistry;
pub use error::{BusError, Result};
pub use message::AgentMessage;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn send_without_handler_fails() {
        let bus = MessageBus::new();
        let message = AgentMessage::new("HypothesisProposed", "HypothesisGeneratorAgent", "director", json!({}));
        let err = bus.send(message).unwrap_err();
        assert!(matches!(err, BusError::NoHandler(_, _)));
    }

    #[tokio::test]
    async fn handler_receives_messages_in_fifo_order_per_sender() {
        let bus = MessageBus::new();
        let order: Arc<parking_lot::Mutex<Vec<i64>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let order_clone = order.clone();

        bus.register_handler(
            "ExperimentDesignerAgent",
            "ProtocolDesigned",
            Arc::new(move |message: AgentMessage, _cancel: tokio_util::sync::CancellationToken| {
                let order = order_clone.clone();
                async move {
                    let seq = message.content["seq"].as_i64().unwrap();
                    order.lock().push(seq);
                    Ok(())
                }
            }),
        );

        for seq in 0..5 {
            let message = AgentMessage::new("ProtocolDesigned", "ExperimentDesignerAgent", "director", json!({"seq": seq}));
            bus.send(message).unwrap();
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn duplicate_message_id_delivered_once() {
        let bus = MessageBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        bus.register_handler(
            "Analyst",
            "VerdictReady",
            Arc::new(move |_message: AgentMessage, _cancel: tokio_util::sync::CancellationToken| {
                let count = count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        let message = AgentMessage::new("VerdictReady", "Analyst", "director", json!({}));
        bus.send(message.clone()).unwrap();
        bus.send(message).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_token_for_correlation_id_is_observable() {
        let bus = MessageBus::new();
        let cancelled = Arc::new(AtomicUsize::new(0));
        let cancelled_clone = cancelled.clone();

        bus.register_handler(
            "SandboxExecutor",
            "RunStarted",
            Arc::new(move |_message: AgentMessage, cancel: tokio_util::sync::CancellationToken| {
                let cancelled = cancelled_clone.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    if cancel.is_cancelled() {
                        cancelled.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(())
                }
            }),
        );

        let message = AgentMessage::new("RunStarted", "SandboxExecutor", "director", json!({}));
        let correlation_id = message.correlation_id.clone();
        bus.send(message).unwrap();
        bus.cancel(&correlation_id);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }
}
