//! `LlmProvider`: the raw per-backend completion capability.
//!
//! Mirrors the `EmbeddingProvider`/`EmbeddingService` split in the
//! embedding client crate — one trait per backend implementation, no
//! batching/stats concerns mixed in (those live on `LlmGateway`).

pub mod anthropic;
pub mod google;
pub mod openai_compatible;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::LlmResult;

/// Per-call generation options. `system` sets the system prompt; omitted
/// temperature defers to the provider's default.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub system: Option<String>,
    pub temperature: Option<f32>,
}

pub type TokenStream = Pin<Box<dyn Stream<Item = LlmResult<String>> + Send>>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a complete response for `prompt`.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> LlmResult<String>;

    /// Generate a response as a stream of incremental token strings.
    fn stream_complete(&self, prompt: &str, options: &CompletionOptions) -> TokenStream;

    /// Identifier of the backend in use, for logging.
    fn provider_name(&self) -> &str;
}
