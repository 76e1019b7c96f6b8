//! Google Gemini `generateContent`/`streamGenerateContent` provider.
//!
//! The API key travels as a query parameter rather than a header, and
//! streaming responses are requested with `alt=sse` to get the same
//! `data:`-prefixed line framing as the other providers instead of
//! Gemini's default bare-JSON-array streaming shape.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use super::{CompletionOptions, LlmProvider, TokenStream};
use crate::{LlmError, LlmResult};

pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GoogleProvider {
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

    fn request_body(&self, prompt: &str, options: &CompletionOptions) -> serde_json::Value {
        let contents = vec![json!({
            "role": "user",
            "parts": [{"text": prompt}],
        })];

        let mut body = json!({ "contents": contents });
        if let Some(temperature) = options.temperature {
            body["generationConfig"] = json!({ "temperature": temperature });
        }
        if let Some(system) = &options.system {
            body["systemInstruction"] = json!({ "parts": [{"text": system}] });
        }
        body
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LlmResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = self.request_body(prompt, options);

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!("{status}: {text}")));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<String>())
            .ok_or_else(|| LlmError::Decode("empty candidates array".to_string()))?;
        Ok(text)
    }

    fn stream_complete(&self, prompt: &str, options: &CompletionOptions) -> TokenStream {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        );
        let body = self.request_body(prompt, options);
        let request = self.client.post(&url).json(&body);

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

                    match serde_json::from_str::<GenerateContentResponse>(data) {
                        Ok(parsed) => {
                            for candidate in parsed.candidates {
                                for part in candidate.content.parts {
                                    if !part.text.is_empty() {
                                        yield Ok(part.text);
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
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}}]
            })))
            .mount(&server)
            .await;

        let provider =
            GoogleProvider::new(server.uri(), "gemini-test", "test-key".to_string(), 30).unwrap();
        let text = provider
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn stream_complete_decodes_sse_candidate_parts() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ab\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"cd\"}]}}]}\n\n",
        );
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider =
            GoogleProvider::new(server.uri(), "gemini-test", "test-key".to_string(), 30).unwrap();
        let tokens: Vec<String> = provider
            .stream_complete("hi", &CompletionOptions::default())
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(tokens, vec!["ab".to_string(), "cd".to_string()]);
    }
}
