//! Provider-agnostic LLM gateway
//!
//! Uniform `complete`/`stream_complete` surface over a local OpenAI-compatible
//! inference server or one of five cloud providers (OpenAI, Anthropic,
//! Google, DeepSeek, Moonshot), selected by `LlmConfig::provider` at
//! construction time. Also implements the retrieval crate's `Reranker`
//! trait over a single batched scoring call, since no cross-encoder
//! dependency exists in this stack.

pub mod error;
pub mod gateway;
pub mod prompts;
pub mod provider;

pub use error::{LlmError, LlmResult};
pub use gateway::LlmGateway;
pub use provider::{CompletionOptions, LlmProvider, TokenStream};
