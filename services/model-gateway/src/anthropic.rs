//! Anthropic Messages API adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::client::{classify_status, InvokeError, InvokeRequest, InvokeResponse, ModelClient};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u64 = 2048;

pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_defaults(api_key: impl Into<String>) -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_BASE_URL, api_key)
    }

    fn body(request: &InvokeRequest) -> Value {
        let max_tokens = request
            .config
            .get("max_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let mut body = json!({
            "model": request.model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        if let Some(temperature) = request.config.get("temperature") {
            body["temperature"] = temperature.clone();
        }
        body
    }

    fn decode(response: MessagesResponse) -> Result<InvokeResponse, InvokeError> {
        let text: String = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(InvokeError::Transient {
                message: "reply carried no text content".into(),
            });
        }

        let usage = response.usage;
        Ok(InvokeResponse {
            text,
            prompt_tokens: usage.as_ref().and_then(|u| u.input_tokens),
            response_tokens: usage.as_ref().and_then(|u| u.output_tokens),
            cost_estimate: None,
        })
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, InvokeError> {
        let started = std::time::Instant::now();
        let call = async {
            let response = self
                .http
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
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

            let decoded: MessagesResponse =
                response.json().await.map_err(|e| InvokeError::Transient {
                    message: format!("malformed provider payload: {e}"),
                })?;
            Self::decode(decoded)
        };

        match tokio::time::timeout(request.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(InvokeError::Timeout {
                elapsed_ms: duration_ms(started.elapsed()),
            }),
        }
    }

    fn provider(&self) -> &'static str {
        "anthropic"
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
