//! Anthropic Messages API provider.
//!
//! Distinct request/response shape from the OpenAI-compatible family: a
//! top-level `system` field instead of a system message, and SSE events
//! typed by `event:`/`type` rather than a single `delta.content` shape.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{CompletionOptions, LlmProvider, TokenStream};
use crate::{LlmError, LlmResult};

const DEFAULT_MAX_TOKENS: u32 = 4096;
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: String,
        timeout_seconds: u64,
    ) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn request_builder(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum StreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: StreamDelta },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct StreamDelta {
    text: Option<String>,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LlmResult<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": self.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "system": options.system,
            "temperature": options.temperature,
            "messages": [AnthropicMessage { role: "user", content: prompt }],
            "stream": false,
        });

        let response = self.request_builder(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!("{status}: {text}")));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        Ok(parsed.content.into_iter().map(|b| b.text).collect())
    }

    fn stream_complete(&self, prompt: &str, options: &CompletionOptions) -> TokenStream {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": self.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "system": options.system,
            "temperature": options.temperature,
            "messages": [AnthropicMessage { role: "user", content: prompt }],
            "stream": true,
        });
        let request = self.request_builder(&url).json(&body);

        Box::pin(async_stream::stream! {
            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(LlmError::from(e));
                    return;
                }
            };
            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                yield Err(LlmError::Request(format!("{status}: {text}")));
                return;
            }

            let mut buffer = String::new();
            let mut bytes = response.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(LlmError::from(e));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline_at) = buffer.find('\n') {
                    let line = buffer[..newline_at].trim().to_string();
                    buffer.drain(..=newline_at);

                    let Some(data) = line.strip_prefix("data:") else { continue };
                    let data = data.trim();
                    if data.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<StreamEvent>(data) {
                        Ok(StreamEvent::ContentBlockDelta { delta }) => {
                            if let Some(text) = delta.text {
                                if !text.is_empty() {
                                    yield Ok(text);
                                }
                            }
                        }
                        Ok(StreamEvent::Other) => {}
                        Err(e) => yield Err(LlmError::Decode(e.to_string())),
                    }
                }
            }
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_concatenates_content_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"text": "Hello, "}, {"text": "world"}]
            })))
            .mount(&server)
            .await;

        let provider =
            AnthropicProvider::new(server.uri(), "claude-test", "sk-ant-test".to_string(), 30)
                .unwrap();
        let text = provider
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn stream_complete_decodes_content_block_deltas_only() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"type\":\"message_start\"}\n\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"text\":\"ab\"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"text\":\"cd\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider =
            AnthropicProvider::new(server.uri(), "claude-test", "sk-ant-test".to_string(), 30)
                .unwrap();
        let tokens: Vec<String> = provider
            .stream_complete("hi", &CompletionOptions::default())
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(tokens, vec!["ab".to_string(), "cd".to_string()]);
    }
}
