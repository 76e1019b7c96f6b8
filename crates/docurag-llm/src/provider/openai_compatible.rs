//! OpenAI-compatible chat-completions provider.
//!
//! Speaks the `/chat/completions` request/response shape shared by OpenAI,
//! DeepSeek, Moonshot (Kimi), and any local OpenAI-compatible inference
//! server — the same "one schema, many base URLs" grouping the original
//! Python source uses (Moonshot is built with the OpenAI client, just a
//! different `base_url`).

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{CompletionOptions, LlmProvider, TokenStream};
use crate::{LlmError, LlmResult};

pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    name: &'static str,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: &'static str,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
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
            name,
        })
    }

    fn request_builder(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    fn messages_payload(&self, prompt: &str, options: &CompletionOptions) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });
        messages
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChatChunkChoice>,
}

#[derive(Deserialize)]
struct ChatChunkChoice {
    delta: ChatChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChatChunkDelta {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": self.messages_payload(prompt, options),
            "temperature": options.temperature,
            "stream": false,
        });

        let response = self.request_builder(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!("{status}: {text}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Decode("empty choices array".to_string()))
    }

    fn stream_complete(&self, prompt: &str, options: &CompletionOptions) -> TokenStream {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": self.messages_payload(prompt, options),
            "temperature": options.temperature,
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
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }

                    match serde_json::from_str::<ChatCompletionChunk>(data) {
                        Ok(parsed) => {
                            for choice in parsed.choices {
                                if let Some(content) = choice.delta.content {
                                    if !content.is_empty() {
                                        yield Ok(content);
                                    }
                                }
                            }
                        }
                        Err(e) => yield Err(LlmError::Decode(e.to_string())),
                    }
                }
            }
        })
    }

    fn provider_name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider(server: &MockServer) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new("test", server.uri(), "test-model", None, 30).unwrap()
    }

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "the answer"}}]
            })))
            .mount(&server)
            .await;

        let provider = provider(&server).await;
        let text = provider
            .complete("what is it?", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "the answer");
    }

    #[tokio::test]
    async fn complete_surfaces_non_success_status_as_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = provider(&server).await;
        let result = provider.complete("q", &CompletionOptions::default()).await;
        assert!(matches!(result, Err(LlmError::Request(_))));
    }

    #[tokio::test]
    async fn stream_complete_decodes_sse_chunks_in_order() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let provider = provider(&server).await;
        let tokens: Vec<String> = provider
            .stream_complete("q", &CompletionOptions::default())
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(tokens, vec!["Hel".to_string(), "lo".to_string()]);
    }
}
