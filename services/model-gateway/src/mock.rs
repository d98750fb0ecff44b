//! Scripted model client for tests and dry runs

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::client::{InvokeError, InvokeRequest, InvokeResponse, ModelClient};

/// One scripted step.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(String),
    /// Answer after a pause; used to race rounds against state changes
    DelayedReply(Duration, String),
    Fail(InvokeError),
    /// Sleep longer than any reasonable deadline; used to exercise
    /// overlap and timeout behavior
    Hang(Duration),
}

/// Pops scripted steps in order; when the script runs dry it answers
/// with a hold decision so background ticks stay harmless.
pub struct MockClient {
    script: Mutex<VecDeque<Scripted>>,
}

impl MockClient {
    pub fn new(steps: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
        }
    }

    pub fn always_hold() -> Self {
        Self::new([])
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().push_back(step);
    }
}

#[async_trait]
impl ModelClient for MockClient {
    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, InvokeError> {
        let step = self.script.lock().pop_front();
        match step {
            Some(Scripted::Reply(text)) => Ok(InvokeResponse {
                text,
                prompt_tokens: Some(u32::try_from(request.prompt.len() / 4).unwrap_or(u32::MAX)),
                response_tokens: Some(32),
                cost_estimate: None,
            }),
            Some(Scripted::DelayedReply(duration, text)) => {
                tokio::time::sleep(duration).await;
                Ok(InvokeResponse {
                    text,
                    prompt_tokens: None,
                    response_tokens: None,
                    cost_estimate: None,
                })
            }
            Some(Scripted::Fail(error)) => Err(error),
            Some(Scripted::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Err(InvokeError::Timeout {
                    elapsed_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                })
            }
            None => Ok(InvokeResponse {
                text: r#"{ "decision": "hold", "reasoning": "no signal", "orders": [] }"#.into(),
                prompt_tokens: None,
                response_tokens: None,
                cost_estimate: None,
            }),
        }
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn request() -> InvokeRequest {
        InvokeRequest {
            model: "m".into(),
            prompt: "p".into(),
            config: Value::Null,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let client = MockClient::new([
            Scripted::Reply("first".into()),
            Scripted::Fail(InvokeError::Cancelled),
        ]);

        assert_eq!(client.invoke(&request()).await.unwrap().text, "first");
        assert!(matches!(
            client.invoke(&request()).await,
            Err(InvokeError::Cancelled)
        ));
        // Script exhausted → hold
        assert!(client
            .invoke(&request())
            .await
            .unwrap()
            .text
            .contains("hold"));
    }
}
