use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

pub mod provider;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The external capability is unreachable or replied with a non-success status.
    #[error("provider error: {0}")]
    Provider(String),
    /// The provider throttled the request; the orchestrator retries with backoff.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },
}

/// Generation parameters forwarded to the provider.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_owned(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Uniform interface over heterogeneous LLM providers.
///
/// Implementations normalize the provider reply to plain text before
/// returning; nothing above this trait inspects provider response shapes.
pub trait CompletionClient: Send + Sync {
    fn complete(
        &self,
        prompt: String,
        options: CompletionOptions,
    ) -> BoxFuture<'static, Result<String, CompletionError>>;
}
