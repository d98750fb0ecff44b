//! Model invocation capability
//!
//! One operation: send a prompt, get text back, bounded by a hard
//! wall-clock deadline. Providers differ only in transport shape; the
//! orchestrator never sees anything but this trait.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// One invocation request.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// Provider-specific model identifier
    pub model: String,
    /// The complete decision prompt
    pub prompt: String,
    /// Opaque provider configuration (temperature, max tokens, ...)
    pub config: Value,
    /// Hard deadline; the transport is cancelled when it elapses
    pub timeout: Duration,
}

/// A successful invocation.
#[derive(Debug, Clone)]
pub struct InvokeResponse {
    pub text: String,
    pub prompt_tokens: Option<u32>,
    pub response_tokens: Option<u32>,
    pub cost_estimate: Option<Decimal>,
}

/// Transport failure taxonomy.
///
/// Only `Transient` is retryable, and only once; everything else is
/// terminal for the round.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvokeError {
    #[error("model did not answer within {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("provider rejected credentials: {message}")]
    Auth { message: String },

    #[error("transient transport failure: {message}")]
    Transient { message: String },

    #[error("invocation cancelled")]
    Cancelled,
}

/// One language-model provider.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, InvokeError>;

    /// Provider tag used in logs and the registry.
    fn provider(&self) -> &'static str;
}

/// Invoke with the retry policy applied: transient failures retry
/// exactly once, everything else returns immediately.
pub async fn invoke_with_retry(
    client: &dyn ModelClient,
    request: &InvokeRequest,
) -> Result<InvokeResponse, InvokeError> {
    match client.invoke(request).await {
        Err(InvokeError::Transient { message }) => {
            warn!(
                provider = client.provider(),
                model = %request.model,
                %message,
                "transient transport failure, retrying once"
            );
            client.invoke(request).await
        }
        other => other,
    }
}

/// Map an HTTP status from a provider into the failure taxonomy.
pub(crate) fn classify_status(status: u16, body: String) -> InvokeError {
    match status {
        401 | 403 => InvokeError::Auth { message: body },
        _ => InvokeError::Transient {
            message: format!("status {status}: {body}"),
        },
    }
}
