//! Correlation-id-targeted cancellation (spec §4.6, §5), grounded on the
//! `tokio_util::sync::CancellationToken` usage in
//! `llmspell-agents::lifecycle::state_machine`.

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// Tracks one cancellation token per in-flight correlation id. Handlers
/// check their token at suspension points and unwind without partial
/// writes; the registry entry is removed once the correlation group
/// finishes, cancelled or not.
#[derive(Default)]
pub struct CancellationRegistry {
    tokens: DashMap<String, CancellationToken>,
}

impl CancellationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain the token for `correlation_id`, creating one if this is the
    /// first handler to observe this correlation group.
    pub fn token_for(&self, correlation_id: &str) -> CancellationToken {
        self.tokens
            .entry(correlation_id.to_string())
            .or_insert_with(CancellationToken::new)
            .clone()
    }

    /// Signal cancellation for `correlation_id`; a no-op if no handler has
    /// ever observed this correlation group.
    pub fn cancel(&self, correlation_id: &str) {
        if let Some(token) = self.tokens.get(correlation_id) {
            token.cancel();
        }
    }

    /// Drop the tracked token once the correlation group has finished.
    pub fn clear(&self, correlation_id: &str) {
        self.tokens.remove(correlation_id);
    }
}
