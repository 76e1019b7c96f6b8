//! Tiktoken-based token counting for the chunk splitter

use tiktoken_rs::{CoreBPE, cl100k_base};

/// Wraps a `cl100k_base` tiktoken encoder for counting and slicing tokens.
///
/// `cl100k_base` is the encoding shared by GPT-3.5/GPT-4-family models;
/// token counts here are an estimate for non-OpenAI embedding/LLM backends,
/// good enough to size chunks consistently.
pub struct TiktokenCounter {
    encoder: CoreBPE,
}

impl TiktokenCounter {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            encoder: cl100k_base()?,
        })
    }

    pub fn count(&self, text: &str) -> usize {
        self.encoder.encode_ordinary(text).len()
    }

    /// Decode a token-index range back into text, used by the sliding window
    /// splitter to materialize an overlapping chunk boundary.
    pub fn decode_range(&self, tokens: &[u32], start: usize, end: usize) -> String {
        let slice = &tokens[start..end.min(tokens.len())];
        self.encoder.decode(slice.to_vec()).unwrap_or_default()
    }

    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.encoder.encode_ordinary(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_simple_text() {
        let counter = TiktokenCounter::new().unwrap();
        assert!(counter.count("Hello, world!") > 0);
    }

    #[test]
    fn empty_text_counts_zero() {
        let counter = TiktokenCounter::new().unwrap();
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn encode_decode_round_trips() {
        let counter = TiktokenCounter::new().unwrap();
        let tokens = counter.encode("the quick brown fox");
        let text = counter.decode_range(&tokens, 0, tokens.len());
        assert_eq!(text, "the quick brown fox");
    }
}
