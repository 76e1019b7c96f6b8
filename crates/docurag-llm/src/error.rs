use thiserror::Error;

/// Result type alias for LLM gateway operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors surfaced by the LLM gateway. `Request`/`Unavailable`/`Transport`
/// are transient (worth a caller-side retry per §4.B); `Decode`/`Config`
/// are not.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(String),

    #[error("unexpected llm response: {0}")]
    Decode(String),

    #[error("llm endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("llm configuration error: {0}")]
    Config(String),

    #[error("unsupported llm provider: {0}")]
    UnsupportedProvider(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl LlmError {
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Unavailable(_) | Self::Transport(_))
    }
}
