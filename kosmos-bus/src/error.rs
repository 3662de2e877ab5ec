use thiserror::Error;

pub type Result<T> = std::result::Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no handler registered for (from_agent={0}, response_type={1})")]
    NoHandler(String, String),

    #[error("recipient channel closed: {0}")]
    ChannelClosed(String),

    #[error("handler failed: {0}")]
    HandlerFailed(String),
}
