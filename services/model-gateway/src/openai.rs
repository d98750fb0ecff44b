//! OpenAI-compatible chat-completions adapter
//!
//! Covers OpenAI itself plus the compatible endpoints (Azure OpenAI,
//! DeepSeek, Qwen, local gateways) by swapping the base URL; the wire
//! shape is identical.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{classify_status, InvokeError, InvokeRequest, InvokeResponse, ModelClient};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    provider: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

impl OpenAiCompatClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        provider: &'static str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            provider,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_BASE_URL, api_key, "openai")
    }

    fn body(request: &InvokeRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        for key in ["max_tokens", "temperature", "top_p"] {
            if let Some(value) = request.config.get(key) {
                body[key] = value.clone();
            }
        }
        body
    }

    fn decode(response: ChatResponse) -> Result<InvokeResponse, InvokeError> {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(InvokeError::Transient {
                message: "reply carried no message content".into(),
            });
        }

        let usage = response.usage;
        Ok(InvokeResponse {
            text,
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            response_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
            cost_estimate: None,
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, InvokeError> {
        let started = std::time::Instant::now();
        let call = async {
            let response = self
                .http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&Self::body(request))
                .send()
                .await
                .map_err(|e| InvokeError::Transient {
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_status(status.as_u16(), body));
            }

            let decoded: ChatResponse =
                response.json().await.map_err(|e| InvokeError::Transient {
                    message: format!("malformed provider payload: {e}"),
                })?;
            Self::decode(decoded)
        };

        match tokio::time::timeout(request.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(InvokeError::Timeout {
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    fn provider(&self) -> &'static str {
        self.provider
    }
}
