//! `LlmGateway`: resolves the configured provider once at construction and
//! exposes the uniform surface the rest of the engine depends on —
//! `complete`/`stream_complete` plus the `condense`/`rerank` conveniences
//! built on top of them. Constructed once in bootstrap and stored in
//! `AppState`, never a module-level singleton.

use std::sync::Arc;

use async_trait::async_trait;
use docurag_config::LlmConfig;
use docurag_retrieval::{RetrievalError, RetrievalResult};

use crate::prompts::{
    CONDENSE_SYSTEM_PROMPT, CONTEXTUAL_PREFIX_PREVIEW_CHARS, SYSTEM_PROMPT, condense_prompt,
    contextual_prefix_prompt, rerank_prompt,
};
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::google::GoogleProvider;
use crate::provider::openai_compatible::OpenAiCompatibleProvider;
use crate::provider::{CompletionOptions, LlmProvider, TokenStream};
use crate::{LlmError, LlmResult};

const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const DEFAULT_GOOGLE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const DEFAULT_DEEPSEEK_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MOONSHOT_URL: &str = "https://api.moonshot.cn/v1";

pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
}

impl LlmGateway {
    /// Resolve `config.provider` to a concrete `LlmProvider`. Cloud
    /// providers without an `api_key` fail here rather than at first use —
    /// `ApplicationConfig::validate` should already have caught this, but
    /// the gateway doesn't trust that as its only line of defense.
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let provider = build_provider(config)?;
        Ok(Self { provider })
    }

    pub async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LlmResult<String> {
        self.provider.complete(prompt, options).await
    }

    pub fn stream_complete(&self, prompt: &str, options: &CompletionOptions) -> TokenStream {
        self.provider.stream_complete(prompt, options)
    }

    /// Rewrite a follow-up question into a standalone one, given prior
    /// conversation history. Empty history short-circuits to the query
    /// unchanged — there's nothing to condense against.
    pub async fn condense(&self, history: &str, query: &str) -> LlmResult<String> {
        if history.trim().is_empty() {
            return Ok(query.to_string());
        }

        let options = CompletionOptions {
            system: Some(CONDENSE_SYSTEM_PROMPT.to_string()),
            temperature: Some(0.0),
        };
        let result = self.complete(&condense_prompt(history, query), &options).await?;
        Ok(result.trim().to_string())
    }

    /// Generate a 1-2 sentence contextual prefix for a chunk (contextual
    /// retrieval): one LLM call per chunk, given the first
    /// `CONTEXTUAL_PREFIX_PREVIEW_CHARS` characters of its text plus the
    /// owning document's name and extension. Callers treat failures as
    /// non-fatal and fall back to the chunk's unprefixed text.
    pub async fn contextualize(&self, document_name: &str, document_type: &str, chunk_text: &str) -> LlmResult<String> {
        let preview: String = chunk_text.chars().take(CONTEXTUAL_PREFIX_PREVIEW_CHARS).collect();
        let options = CompletionOptions { system: None, temperature: Some(0.0) };
        let result = self
            .complete(&contextual_prefix_prompt(document_name, document_type, &preview), &options)
            .await?;
        Ok(result.trim().to_string())
    }

    /// Score every document for relevance to `query` with a single batched
    /// LLM call, mirroring the LLM-as-judge pattern used for passage
    /// scoring in the retrieval pack's evaluation harness.
    pub async fn rerank(&self, query: &str, documents: &[String]) -> LlmResult<Vec<f32>> {
        let options = CompletionOptions {
            system: Some(SYSTEM_PROMPT.to_string()),
            temperature: Some(0.0),
        };
        let response = self.complete(&rerank_prompt(query, documents), &options).await?;

        let json_start = response.find('[').ok_or_else(|| {
            LlmError::Decode(format!("rerank response had no JSON array: {response}"))
        })?;
        let json_end = response.rfind(']').ok_or_else(|| {
            LlmError::Decode(format!("rerank response had no JSON array: {response}"))
        })?;
        let scores: Vec<f32> = serde_json::from_str(&response[json_start..=json_end])
            .map_err(|e| LlmError::Decode(format!("invalid rerank scores: {e}")))?;

        if scores.len() != documents.len() {
            return Err(LlmError::Decode(format!(
                "expected {} rerank scores, got {}",
                documents.len(),
                scores.len()
            )));
        }

        Ok(scores)
    }
}

#[async_trait]
impl docurag_retrieval::Reranker for LlmGateway {
    async fn rerank(&self, query: &str, documents: &[String]) -> RetrievalResult<Vec<f32>> {
        LlmGateway::rerank(self, query, documents)
            .await
            .map_err(|e| RetrievalError::Rerank(e.to_string()))
    }
}

fn build_provider(config: &LlmConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider_name = config.provider.to_lowercase();
    let timeout = config.timeout_seconds;

    let require_api_key = |name: &str| -> LlmResult<String> {
        config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Config(format!("{name} requires an api_key")))
    };

    match provider_name.as_str() {
        "local" => {
            let base_url = config
                .base_url
                .clone()
                .ok_or_else(|| LlmError::Config("local provider requires base_url".to_string()))?;
            Ok(Arc::new(OpenAiCompatibleProvider::new(
                "local",
                base_url,
                &config.model,
                None,
                timeout,
            )?))
        }
        "openai" => {
            let base_url = config.base_url.clone().unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
            Ok(Arc::new(OpenAiCompatibleProvider::new(
                "openai",
                base_url,
                &config.model,
                Some(require_api_key("openai")?),
                timeout,
            )?))
        }
        "deepseek" => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DEEPSEEK_URL.to_string());
            Ok(Arc::new(OpenAiCompatibleProvider::new(
                "deepseek",
                base_url,
                &config.model,
                Some(require_api_key("deepseek")?),
                timeout,
            )?))
        }
        "moonshot" => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_MOONSHOT_URL.to_string());
            Ok(Arc::new(OpenAiCompatibleProvider::new(
                "moonshot",
                base_url,
                &config.model,
                Some(require_api_key("moonshot")?),
                timeout,
            )?))
        }
        "anthropic" => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_URL.to_string());
            Ok(Arc::new(AnthropicProvider::new(
                base_url,
                &config.model,
                require_api_key("anthropic")?,
                timeout,
            )?))
        }
        "google" => {
            let base_url = config.base_url.clone().unwrap_or_else(|| DEFAULT_GOOGLE_URL.to_string());
            Ok(Arc::new(GoogleProvider::new(
                base_url,
                &config.model,
                require_api_key("google")?,
                timeout,
            )?))
        }
        other => Err(LlmError::UnsupportedProvider(other.to_string())),
    }
}
