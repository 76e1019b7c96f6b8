//! Token-windowed splitter for plain-text and markdown content
//!
//! Splits on sentence boundaries where possible, then packs sentences into
//! token windows of `target_tokens` with `overlap_tokens` carried into the
//! next window so retrieval context isn't severed mid-thought.

use super::tiktoken_counter::TiktokenCounter;

pub const DEFAULT_TARGET_TOKENS: usize = 500;
pub const DEFAULT_OVERLAP_TOKENS: usize = 50;

/// One text span produced by the splitter, ready to become a `Chunk`.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub token_count: usize,
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?') {
            let next_is_boundary = bytes
                .get(i + 1)
                .is_none_or(|&n| n == b' ' || n == b'\n');
            if next_is_boundary {
                let end = i + 1;
                let candidate = text[start..end].trim();
                if !candidate.is_empty() {
                    sentences.push(candidate);
                }
                start = end;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    if sentences.is_empty() && !text.trim().is_empty() {
        sentences.push(text.trim());
    }

    sentences
}

/// Pack sentences into overlapping token windows.
pub fn split_into_spans(
    text: &str,
    target_tokens: usize,
    overlap_tokens: usize,
) -> anyhow::Result<Vec<TextSpan>> {
    let counter = TiktokenCounter::new()?;
    let sentences = split_sentences(text);

    let mut spans = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0usize;

    for sentence in sentences {
        let sentence_tokens = counter.count(sentence);

        if current_tokens + sentence_tokens > target_tokens && !current.is_empty() {
            let joined = current.join(" ");
            spans.push(TextSpan {
                text: joined,
                token_count: current_tokens,
            });

            // carry the tail of the window forward as overlap
            let mut overlap_sentences = Vec::new();
            let mut overlap_count = 0usize;
            for s in current.iter().rev() {
                let t = counter.count(s);
                if overlap_count + t > overlap_tokens {
                    break;
                }
                overlap_sentences.push(*s);
                overlap_count += t;
            }
            overlap_sentences.reverse();
            current = overlap_sentences;
            current_tokens = overlap_count;
        }

        current.push(sentence);
        current_tokens += sentence_tokens;
    }

    if !current.is_empty() {
        spans.push(TextSpan {
            text: current.join(" "),
            token_count: current_tokens,
        });
    }

    Ok(spans.into_iter().filter(|s| !s.text.trim().is_empty()).collect())
}
