//! Prompt composition for the chat loop's generation step (4.L step 6).
//!
//! Follows the retrieval pack's `get_context_prompt` shape: numbered context
//! block, an explicit abstain instruction, then conversation history and the
//! user's question, handed to the LLM as a single user-role prompt with the
//! fixed system prompt attached separately via `CompletionOptions`.

use docurag_state::{ChatMessage, MessageRole};
use docurag_vector_store::ScoredChunk;

pub const ABSTAIN_PHRASE: &str = "I don't have enough information to answer this question.";

pub fn compose(context: &[ScoredChunk], history: &[ChatMessage], query: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("Context:\n");
    if context.is_empty() {
        prompt.push_str("(no relevant context found)\n");
    }
    for (i, sc) in context.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n\n", i + 1, sc.chunk.text));
    }

    prompt.push_str(&format!(
        "Answer the question using only the context above. If the context does not contain \
enough information to answer, respond with exactly this sentence and nothing else: \
\"{ABSTAIN_PHRASE}\"\n\n"
    ));

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for message in history {
            let role = match message.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            prompt.push_str(&format!("{role}: {}\n", message.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Question: {query}\n"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use docurag_vector_store::{Chunk, Primitive};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn chunk(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                chunk_id: "c1".to_string(),
                document_id: Uuid::new_v4(),
                chunk_index: 0,
                text: text.to_string(),
                embedding: None,
                metadata: HashMap::<String, Primitive>::new(),
            },
            similarity: 0.9,
        }
    }

    #[test]
    fn includes_abstain_phrase_instruction() {
        let prompt = compose(&[chunk("some fact")], &[], "what is it?");
        assert!(prompt.contains(ABSTAIN_PHRASE));
    }

    #[test]
    fn numbers_context_entries_starting_at_one() {
        let prompt = compose(&[chunk("first"), chunk("second")], &[], "q");
        assert!(prompt.contains("[1] first"));
        assert!(prompt.contains("[2] second"));
    }

    #[test]
    fn empty_context_still_states_no_relevant_context() {
        let prompt = compose(&[], &[], "q");
        assert!(prompt.contains("no relevant context found"));
    }

    #[test]
    fn omits_conversation_section_when_history_is_empty() {
        let prompt = compose(&[chunk("x")], &[], "q");
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn includes_history_turns_when_present() {
        let history = vec![ChatMessage {
            role: MessageRole::User,
            content: "earlier question".to_string(),
        }];
        let prompt = compose(&[chunk("x")], &history, "q");
        assert!(prompt.contains("user: earlier question"));
    }
}
