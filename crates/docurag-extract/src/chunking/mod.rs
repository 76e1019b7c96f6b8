pub mod splitter;
pub mod tiktoken_counter;

pub use splitter::{DEFAULT_OVERLAP_TOKENS, DEFAULT_TARGET_TOKENS, TextSpan, split_into_spans};
pub use tiktoken_counter::TiktokenCounter;
